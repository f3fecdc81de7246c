use crate::{dto::health::HealthResponse, state::SharedState};

/// Report liveness together with a couple of cheap runtime facts.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    HealthResponse::ok(
        state.has_competition().await,
        state.public_sse().subscriber_count(),
    )
}
