use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::post,
};
use axum_valid::Valid;

use crate::{
    dto::competition::{
        CompetitionSnapshot, GuessRequest, RevealResponse, ScanRequest, ScanResponse,
        StartCompetitionRequest, TurnReportResponse,
    },
    error::AppError,
    services::competition_service,
    state::SharedState,
};

/// Host-screen endpoints driving the single competition of this process.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/competition",
            post(start_competition)
                .get(get_competition)
                .delete(quit_competition),
        )
        .route("/competition/scan/start", post(begin_scan))
        .route("/competition/scan", post(scan))
        .route("/competition/scan/failed", post(scan_failed))
        .route("/competition/draw", post(draw))
        .route("/competition/guess", post(guess))
        .route("/competition/reveal", post(reveal))
        .route("/competition/complete", post(complete_turn))
        .route("/competition/skip", post(skip_turn))
        .route("/competition/poll", post(poll))
}

/// Start a competition from settings and a song list.
#[utoipa::path(
    post,
    path = "/competition",
    tag = "competition",
    request_body = StartCompetitionRequest,
    responses(
        (status = 200, description = "Competition started", body = CompetitionSnapshot),
        (status = 400, description = "Invalid settings or song list"),
        (status = 409, description = "A competition is already running")
    )
)]
pub async fn start_competition(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<StartCompetitionRequest>>,
) -> Result<Json<CompetitionSnapshot>, AppError> {
    Ok(Json(
        competition_service::start_competition(&state, payload).await?,
    ))
}

/// Current competition snapshot.
#[utoipa::path(
    get,
    path = "/competition",
    tag = "competition",
    responses(
        (status = 200, description = "Current snapshot", body = CompetitionSnapshot),
        (status = 404, description = "No competition loaded")
    )
)]
pub async fn get_competition(
    State(state): State<SharedState>,
) -> Result<Json<CompetitionSnapshot>, AppError> {
    Ok(Json(competition_service::get_competition(&state).await?))
}

/// Abandon the current competition.
#[utoipa::path(
    delete,
    path = "/competition",
    tag = "competition",
    responses(
        (status = 204, description = "Competition discarded"),
        (status = 404, description = "No competition loaded")
    )
)]
pub async fn quit_competition(State(state): State<SharedState>) -> Result<StatusCode, AppError> {
    competition_service::quit_competition(&state).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Open the scanner for the active player.
#[utoipa::path(
    post,
    path = "/competition/scan/start",
    tag = "competition",
    responses(
        (status = 200, description = "Waiting for a scan", body = CompetitionSnapshot),
        (status = 409, description = "A song is already resolved or the game is over")
    )
)]
pub async fn begin_scan(
    State(state): State<SharedState>,
) -> Result<Json<CompetitionSnapshot>, AppError> {
    Ok(Json(competition_service::begin_scan(&state).await?))
}

/// Deliver a decoded card identifier.
#[utoipa::path(
    post,
    path = "/competition/scan",
    tag = "competition",
    request_body = ScanRequest,
    responses(
        (status = 200, description = "Scan result (matched or not_found)", body = ScanResponse),
        (status = 409, description = "A song is already resolved or the game is over")
    )
)]
pub async fn scan(
    State(state): State<SharedState>,
    Json(payload): Json<ScanRequest>,
) -> Result<Json<ScanResponse>, AppError> {
    Ok(Json(competition_service::scan(&state, payload).await?))
}

/// The scanner gave up without a code.
#[utoipa::path(
    post,
    path = "/competition/scan/failed",
    tag = "competition",
    responses((status = 200, description = "Turn back to idle", body = CompetitionSnapshot))
)]
pub async fn scan_failed(
    State(state): State<SharedState>,
) -> Result<Json<CompetitionSnapshot>, AppError> {
    Ok(Json(competition_service::scan_failed(&state).await?))
}

/// Draw a random unused song for the active turn.
#[utoipa::path(
    post,
    path = "/competition/draw",
    tag = "competition",
    responses(
        (status = 200, description = "Song drawn", body = ScanResponse),
        (status = 409, description = "No song left or a song is already resolved")
    )
)]
pub async fn draw(State(state): State<SharedState>) -> Result<Json<ScanResponse>, AppError> {
    Ok(Json(competition_service::draw(&state).await?))
}

/// Toggle or set one guess category.
#[utoipa::path(
    post,
    path = "/competition/guess",
    tag = "competition",
    request_body = GuessRequest,
    responses(
        (status = 200, description = "Guess recorded", body = CompetitionSnapshot),
        (status = 409, description = "No song resolved yet")
    )
)]
pub async fn guess(
    State(state): State<SharedState>,
    Json(payload): Json<GuessRequest>,
) -> Result<Json<CompetitionSnapshot>, AppError> {
    Ok(Json(competition_service::guess(&state, payload).await?))
}

/// Reveal the answers of the active turn.
#[utoipa::path(
    post,
    path = "/competition/reveal",
    tag = "competition",
    responses(
        (status = 200, description = "Answers revealed", body = RevealResponse),
        (status = 409, description = "No song resolved yet")
    )
)]
pub async fn reveal(State(state): State<SharedState>) -> Result<Json<RevealResponse>, AppError> {
    Ok(Json(competition_service::reveal(&state).await?))
}

/// Score the active turn.
#[utoipa::path(
    post,
    path = "/competition/complete",
    tag = "competition",
    responses(
        (status = 200, description = "Turn scored", body = TurnReportResponse),
        (status = 409, description = "No song resolved yet or the game is over")
    )
)]
pub async fn complete_turn(
    State(state): State<SharedState>,
) -> Result<Json<TurnReportResponse>, AppError> {
    Ok(Json(competition_service::complete_turn(&state).await?))
}

/// Skip the active turn.
#[utoipa::path(
    post,
    path = "/competition/skip",
    tag = "competition",
    responses(
        (status = 200, description = "Turn skipped", body = TurnReportResponse),
        (status = 409, description = "No skip left or the game is over")
    )
)]
pub async fn skip_turn(
    State(state): State<SharedState>,
) -> Result<Json<TurnReportResponse>, AppError> {
    Ok(Json(competition_service::skip_turn(&state).await?))
}

/// Check elapsed time now instead of waiting for the background timer.
#[utoipa::path(
    post,
    path = "/competition/poll",
    tag = "competition",
    responses((status = 200, description = "Current snapshot after the check", body = CompetitionSnapshot))
)]
pub async fn poll(State(state): State<SharedState>) -> Result<Json<CompetitionSnapshot>, AppError> {
    Ok(Json(competition_service::poll(&state).await?))
}
