mod sse;

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    config::AppConfig,
    engine::{
        CompetitionEngine,
        clock::{Clock, SystemClock},
    },
    error::ServiceError,
};

pub use self::sse::SseHub;

pub type SharedState = Arc<AppState>;

/// Central application state: the single competition slot, the SSE hub and the loaded config.
pub struct AppState {
    config: Arc<AppConfig>,
    clock: Arc<dyn Clock>,
    sse: SseHub,
    competition: RwLock<Option<CompetitionEngine>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig) -> SharedState {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Same as [`AppState::new`] with an explicit time source.
    pub fn with_clock(config: AppConfig, clock: Arc<dyn Clock>) -> SharedState {
        Arc::new(Self {
            sse: SseHub::new(config.sse_capacity()),
            config: Arc::new(config),
            clock,
            competition: RwLock::new(None),
        })
    }

    /// Configuration loaded at startup.
    pub fn config(&self) -> Arc<AppConfig> {
        self.config.clone()
    }

    /// Time source handed to every new engine.
    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.sse
    }

    /// Whether a competition (running or finished) is loaded.
    pub async fn has_competition(&self) -> bool {
        self.competition.read().await.is_some()
    }

    /// Run `f` against the loaded engine under a read lock.
    pub async fn with_engine<F, T>(&self, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&CompetitionEngine) -> Result<T, ServiceError>,
    {
        let guard = self.competition.read().await;
        let engine = guard.as_ref().ok_or_else(no_competition)?;
        f(engine)
    }

    /// Run `f` against the loaded engine under the write lock, so events never interleave.
    pub async fn with_engine_mut<F, T>(&self, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut CompetitionEngine) -> Result<T, ServiceError>,
    {
        let mut guard = self.competition.write().await;
        let engine = guard.as_mut().ok_or_else(no_competition)?;
        f(engine)
    }

    /// Install a freshly built engine. A finished game is replaced, a running one is not.
    pub async fn install_engine<F, T>(&self, build: F) -> Result<T, ServiceError>
    where
        F: FnOnce() -> Result<(CompetitionEngine, T), ServiceError>,
    {
        let mut guard = self.competition.write().await;
        if guard.as_ref().is_some_and(|engine| engine.result().is_none()) {
            return Err(ServiceError::InvalidState(
                "a competition is already running".into(),
            ));
        }
        let (engine, value) = build()?;
        *guard = Some(engine);
        Ok(value)
    }

    /// Discard the loaded engine, returning whether there was one.
    pub async fn clear_engine(&self) -> bool {
        self.competition.write().await.take().is_some()
    }
}

fn no_competition() -> ServiceError {
    ServiceError::NotFound("no competition loaded".into())
}
