use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        competition::CompetitionSnapshot,
        now_rfc3339,
        sse::{CompetitionFinishedEvent, NoMatchEvent, PlaybackEvent, ServerEvent},
    },
    engine::snapshot::PlaybackIntent,
    state::SharedState,
};

pub(crate) const EVENT_SNAPSHOT: &str = "competition.snapshot";
pub(crate) const EVENT_PLAYBACK: &str = "playback";
pub(crate) const EVENT_NO_MATCH: &str = "scan.no_match";
pub(crate) const EVENT_FINISHED: &str = "competition.finished";

/// Broadcast the full competition state after a transition.
pub fn broadcast_snapshot(state: &SharedState, snapshot: &CompetitionSnapshot) {
    send_public_event(state, EVENT_SNAPSHOT, snapshot);
}

/// Forward drained playback intents, in order, to the host screen.
pub fn broadcast_playback(state: &SharedState, intents: &[PlaybackIntent]) {
    for intent in intents {
        send_public_event(state, EVENT_PLAYBACK, &PlaybackEvent::from(intent));
    }
}

/// Broadcast that a scanned code matched nothing.
pub fn broadcast_no_match(state: &SharedState, scanned: &str) {
    let payload = NoMatchEvent {
        scanned: scanned.to_string(),
    };
    send_public_event(state, EVENT_NO_MATCH, &payload);
}

/// Broadcast the final result when the game ends.
pub fn broadcast_finished(state: &SharedState, snapshot: &CompetitionSnapshot) {
    let Some(result) = snapshot.result.clone() else {
        return;
    };
    let payload = CompetitionFinishedEvent {
        result,
        stats: snapshot.stats,
        finished_at: now_rfc3339(),
    };
    send_public_event(state, EVENT_FINISHED, &payload);
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}
