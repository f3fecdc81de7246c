use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::competition::{GameResultDto, GameStatsDto},
    engine::snapshot::PlaybackIntent,
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across the SSE channel.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Build an event from an already serialised payload.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
/// Instruction for the playback collaborator (video player on the host screen).
pub enum PlaybackEvent {
    Play { song_id: String },
    Reveal { song_id: String },
    Stop,
}

impl From<&PlaybackIntent> for PlaybackEvent {
    fn from(intent: &PlaybackIntent) -> Self {
        match intent {
            PlaybackIntent::Play { song_id } => PlaybackEvent::Play {
                song_id: song_id.clone(),
            },
            PlaybackIntent::Reveal { song_id } => PlaybackEvent::Reveal {
                song_id: song_id.clone(),
            },
            PlaybackIntent::Stop => PlaybackEvent::Stop,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a scanned code matches no unused song.
pub struct NoMatchEvent {
    pub scanned: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast once when the game ends.
pub struct CompetitionFinishedEvent {
    pub result: GameResultDto,
    pub stats: GameStatsDto,
    /// RFC 3339 wall-clock time of the announcement.
    pub finished_at: String,
}
