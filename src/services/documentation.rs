use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Hit Parade Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::competition::start_competition,
        crate::routes::competition::get_competition,
        crate::routes::competition::quit_competition,
        crate::routes::competition::begin_scan,
        crate::routes::competition::scan,
        crate::routes::competition::scan_failed,
        crate::routes::competition::draw,
        crate::routes::competition::guess,
        crate::routes::competition::reveal,
        crate::routes::competition::complete_turn,
        crate::routes::competition::skip_turn,
        crate::routes::competition::poll,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::competition::StartCompetitionRequest,
            crate::dto::competition::CompetitionSnapshot,
            crate::dto::competition::ScanResponse,
            crate::dto::competition::RevealResponse,
            crate::dto::competition::TurnReportResponse,
            crate::dto::sse::PlaybackEvent,
            crate::dto::sse::NoMatchEvent,
            crate::dto::sse::CompetitionFinishedEvent,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "competition", description = "Turn-by-turn competition control"),
    )
)]
pub struct ApiDoc;
