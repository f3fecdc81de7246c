use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always "ok" while the process serves requests.
    pub status: String,
    /// Whether a competition is currently loaded.
    pub competition_loaded: bool,
    /// Connected SSE subscribers.
    pub sse_subscribers: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(competition_loaded: bool, sse_subscribers: usize) -> Self {
        Self {
            status: "ok".to_string(),
            competition_loaded,
            sse_subscribers,
        }
    }
}
