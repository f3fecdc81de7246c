//! Competition lifecycle: every event runs under the engine write lock, then the
//! resulting snapshot and playback intents are broadcast on the public stream.

use tracing::{debug, info};

use crate::{
    dto::competition::{
        CompetitionSnapshot, GuessRequest, PlayerSummary, RevealResponse, ScanRequest,
        ScanResponse, ScanResultKind, SongDto, StartCompetitionRequest, TurnReportResponse,
    },
    engine::{
        CompetitionEngine, EngineError, TurnReport, snapshot::PlaybackIntent,
        song_pool::ScanOutcome,
    },
    error::ServiceError,
    services::{sse_events, sse_service},
    state::SharedState,
};

/// Validate the request, build the engine and install it as the current competition.
pub async fn start_competition(
    state: &SharedState,
    request: StartCompetitionRequest,
) -> Result<CompetitionSnapshot, ServiceError> {
    let defaults = state.config().defaults();
    let clock = state.clock();

    let snapshot = state
        .install_engine(|| {
            let (settings, songs) = request.into_parts(defaults)?;
            let engine = CompetitionEngine::new(settings, songs, clock)?;
            let snapshot = CompetitionSnapshot::from(&engine.snapshot());
            Ok((engine, snapshot))
        })
        .await?;

    sse_events::broadcast_snapshot(state, &snapshot);
    Ok(snapshot)
}

/// Current snapshot of the loaded competition.
pub async fn get_competition(state: &SharedState) -> Result<CompetitionSnapshot, ServiceError> {
    state
        .with_engine(|engine| Ok(CompetitionSnapshot::from(&engine.snapshot())))
        .await
}

/// Abandon the loaded competition, running or finished.
pub async fn quit_competition(state: &SharedState) -> Result<(), ServiceError> {
    if !state.clear_engine().await {
        return Err(ServiceError::NotFound("no competition loaded".into()));
    }

    info!("competition abandoned");
    sse_events::broadcast_playback(state, &[PlaybackIntent::Stop]);
    sse_service::broadcast_public_info(state.public_sse(), "competition abandoned");
    Ok(())
}

/// Open the scanner for the active player.
pub async fn begin_scan(state: &SharedState) -> Result<CompetitionSnapshot, ServiceError> {
    let ((), snapshot) = run_event(state, CompetitionEngine::begin_scan).await?;
    Ok(snapshot)
}

/// The scanner gave up without reading a code.
pub async fn scan_failed(state: &SharedState) -> Result<CompetitionSnapshot, ServiceError> {
    let ((), snapshot) = run_event(state, CompetitionEngine::scan_failed).await?;
    Ok(snapshot)
}

/// Resolve a scanned code; a miss is answered with `not_found` and announced on SSE.
pub async fn scan(state: &SharedState, request: ScanRequest) -> Result<ScanResponse, ServiceError> {
    let (outcome, competition) =
        run_event(state, |engine| engine.scan(&request.scanned)).await?;

    let (result, song_id) = match outcome {
        ScanOutcome::Matched(song) => (ScanResultKind::Matched, Some(song.external_id)),
        ScanOutcome::NotFound { scanned } => {
            sse_events::broadcast_no_match(state, &scanned);
            (ScanResultKind::NotFound, None)
        }
    };

    Ok(ScanResponse {
        result,
        scanned: request.scanned,
        song_id,
        competition,
    })
}

/// Pick a random unused song for the active turn instead of scanning a card.
pub async fn draw(state: &SharedState) -> Result<ScanResponse, ServiceError> {
    let (song, competition) = run_event(state, |engine| {
        let mut rng = rand::rng();
        engine.draw(&mut rng)
    })
    .await?;

    Ok(ScanResponse {
        result: ScanResultKind::Matched,
        scanned: String::new(),
        song_id: Some(song.external_id),
        competition,
    })
}

/// Toggle one guess category, or set it when the request carries `correct`.
pub async fn guess(
    state: &SharedState,
    request: GuessRequest,
) -> Result<CompetitionSnapshot, ServiceError> {
    let category = request.category.into();
    let (_, snapshot) = run_event(state, |engine| match request.correct {
        Some(correct) => engine.set_guess(category, correct),
        None => engine.toggle_guess(category),
    })
    .await?;
    Ok(snapshot)
}

/// Reveal the answers of the active turn.
pub async fn reveal(state: &SharedState) -> Result<RevealResponse, ServiceError> {
    let (song, competition) = run_event(state, CompetitionEngine::reveal).await?;
    Ok(RevealResponse {
        song: SongDto::from(&song),
        competition,
    })
}

/// Score the active turn and move to the next player.
pub async fn complete_turn(state: &SharedState) -> Result<TurnReportResponse, ServiceError> {
    let (report, competition) = run_event(state, CompetitionEngine::complete_turn).await?;
    turn_report(report, competition)
}

/// Skip the active turn.
pub async fn skip_turn(state: &SharedState) -> Result<TurnReportResponse, ServiceError> {
    let (report, competition) = run_event(state, CompetitionEngine::skip).await?;
    turn_report(report, competition)
}

/// On-demand elapsed-time check requested by the host screen.
pub async fn poll(state: &SharedState) -> Result<CompetitionSnapshot, ServiceError> {
    let (_, snapshot) = run_event(state, |engine| Ok(engine.poll())).await?;
    Ok(snapshot)
}

/// Elapsed-time check run by the background timer. Only publishes when the game just ended.
pub async fn poll_timer(state: &SharedState) -> Result<bool, ServiceError> {
    let finished = state
        .with_engine_mut(|engine| {
            if engine.result().is_some() {
                return Ok(None);
            }
            engine.poll();
            let current = engine.snapshot();
            if !current.is_finished() {
                return Ok(None);
            }
            debug!(winners = ?current.winners(), "timer closed the competition");
            Ok(Some((
                CompetitionSnapshot::from(&current),
                engine.take_playback_intents(),
            )))
        })
        .await?;

    match finished {
        Some((snapshot, intents)) => {
            publish(state, &snapshot, &intents, true);
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Apply one engine event atomically and broadcast what it produced.
async fn run_event<F, T>(
    state: &SharedState,
    event: F,
) -> Result<(T, CompetitionSnapshot), ServiceError>
where
    F: FnOnce(&mut CompetitionEngine) -> Result<T, EngineError>,
{
    let (value, snapshot, intents, finished_now) = state
        .with_engine_mut(|engine| {
            let was_finished = engine.result().is_some();
            let value = event(engine)?;
            let current = engine.snapshot();
            let finished_now = !was_finished && current.is_finished();
            if finished_now {
                debug!(winners = ?current.winners(), "publishing final standings");
            }
            let snapshot = CompetitionSnapshot::from(&current);
            Ok((value, snapshot, engine.take_playback_intents(), finished_now))
        })
        .await?;

    publish(state, &snapshot, &intents, finished_now);
    Ok((value, snapshot))
}

fn publish(
    state: &SharedState,
    snapshot: &CompetitionSnapshot,
    intents: &[PlaybackIntent],
    finished_now: bool,
) {
    sse_events::broadcast_playback(state, intents);
    sse_events::broadcast_snapshot(state, snapshot);
    if finished_now {
        sse_events::broadcast_finished(state, snapshot);
    }
}

fn turn_report(
    report: TurnReport,
    competition: CompetitionSnapshot,
) -> Result<TurnReportResponse, ServiceError> {
    let player: PlayerSummary = competition
        .players
        .get(report.player)
        .cloned()
        .ok_or_else(|| ServiceError::NotFound(format!("player {}", report.player)))?;

    Ok(TurnReportResponse::new(
        player,
        &report.outcome,
        report.song.as_ref(),
        competition,
    ))
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use serde_json::{Value, json};
    use tokio::sync::broadcast;

    use super::*;
    use crate::{
        config::AppConfig,
        dto::{
            competition::{CompetitionStatusDto, FinishReasonDto, GuessCategoryDto, TurnOutcomeKind},
            sse::ServerEvent,
        },
        engine::clock::ManualClock,
        services::sse_events::{EVENT_FINISHED, EVENT_NO_MATCH, EVENT_PLAYBACK, EVENT_SNAPSHOT},
        state::AppState,
    };

    fn setup() -> (SharedState, ManualClock) {
        let clock = ManualClock::new();
        let state = AppState::with_clock(AppConfig::default(), Arc::new(clock.clone()));
        (state, clock)
    }

    fn start_request(body: Value) -> StartCompetitionRequest {
        serde_json::from_value(body).unwrap()
    }

    fn songs(n: usize) -> Value {
        (1..=n)
            .map(|i| {
                json!({
                    "external_id": format!("{i:03}"),
                    "title": format!("Title {i}"),
                    "artist": format!("Artist {i}"),
                    "year": 1980 + i,
                })
            })
            .collect()
    }

    fn drain(receiver: &mut broadcast::Receiver<ServerEvent>) -> Vec<ServerEvent> {
        std::iter::from_fn(|| receiver.try_recv().ok()).collect()
    }

    fn names(events: &[ServerEvent]) -> Vec<&str> {
        events
            .iter()
            .filter_map(|event| event.event.as_deref())
            .collect()
    }

    async fn scan_and_complete(state: &SharedState, id: &str, guessed: &[GuessCategoryDto]) {
        begin_scan(state).await.unwrap();
        let scanned = scan(
            state,
            ScanRequest {
                scanned: id.to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(scanned.result, ScanResultKind::Matched);
        for category in guessed {
            guess(
                state,
                GuessRequest {
                    category: *category,
                    correct: None,
                },
            )
            .await
            .unwrap();
        }
        complete_turn(state).await.unwrap();
    }

    #[tokio::test]
    async fn full_turn_broadcasts_playback_and_snapshots() {
        let (state, _clock) = setup();
        let mut receiver = state.public_sse().subscribe();

        let started = start_competition(
            &state,
            start_request(json!({
                "player_names": ["Ada", "Bob"],
                "game_mode": "points",
                "target_score": 20,
                "songs": songs(4),
            })),
        )
        .await
        .unwrap();
        assert_eq!(started.status, CompetitionStatusDto::InProgress);
        assert_eq!(started.remaining_songs, 4);

        begin_scan(&state).await.unwrap();
        scan(
            &state,
            ScanRequest {
                scanned: "002".into(),
            },
        )
        .await
        .unwrap();
        for category in [GuessCategoryDto::Artist, GuessCategoryDto::Title, GuessCategoryDto::Year] {
            guess(&state, GuessRequest { category, correct: Some(true) })
                .await
                .unwrap();
        }
        let revealed = reveal(&state).await.unwrap();
        assert_eq!(revealed.song.title, "Title 2");

        let report = complete_turn(&state).await.unwrap();
        assert_eq!(report.outcome, TurnOutcomeKind::Completed);
        assert_eq!(report.points.map(|points| points.total), Some(4));
        assert_eq!(report.player.name, "Ada");
        assert_eq!(report.competition.turn.map(|turn| turn.player_id), Some(1));

        let events = drain(&mut receiver);
        let playback: Vec<Value> = events
            .iter()
            .filter(|event| event.event.as_deref() == Some(EVENT_PLAYBACK))
            .map(|event| serde_json::from_str(&event.data).unwrap())
            .collect();
        assert_eq!(
            playback,
            vec![
                json!({ "action": "play", "song_id": "002" }),
                json!({ "action": "reveal", "song_id": "002" }),
                json!({ "action": "stop" }),
            ]
        );
        assert_eq!(names(&events).first(), Some(&EVENT_SNAPSHOT));
    }

    #[tokio::test]
    async fn unknown_code_is_not_an_error() {
        let (state, _clock) = setup();
        start_competition(
            &state,
            start_request(json!({
                "player_names": ["Ada"],
                "game_mode": "points",
                "target_score": 5,
                "songs": songs(2),
            })),
        )
        .await
        .unwrap();
        let mut receiver = state.public_sse().subscribe();

        let response = scan(
            &state,
            ScanRequest {
                scanned: "999".into(),
            },
        )
        .await
        .unwrap();

        assert_eq!(response.result, ScanResultKind::NotFound);
        assert_eq!(response.competition.remaining_songs, 2);
        assert!(names(&drain(&mut receiver)).contains(&EVENT_NO_MATCH));
    }

    #[tokio::test]
    async fn running_game_cannot_be_replaced_until_quit() {
        let (state, _clock) = setup();
        let body = json!({
            "player_names": ["Ada", "Bob"],
            "game_mode": "rounds",
            "maximum_rounds": 2,
            "songs": songs(6),
        });

        start_competition(&state, start_request(body.clone()))
            .await
            .unwrap();
        let err = start_competition(&state, start_request(body.clone()))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        quit_competition(&state).await.unwrap();
        assert!(matches!(
            get_competition(&state).await,
            Err(ServiceError::NotFound(_))
        ));
        start_competition(&state, start_request(body)).await.unwrap();
    }

    #[tokio::test]
    async fn invalid_settings_are_rejected() {
        let (state, _clock) = setup();
        let err = start_competition(
            &state,
            start_request(json!({
                "player_names": ["Ada", "Bob"],
                "game_mode": "points",
                "target_score": 10,
                "songs": [
                    { "external_id": "1", "title": "A", "artist": "A" },
                    { "external_id": "1", "title": "B", "artist": "B" },
                ],
            })),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert!(!state.has_competition().await);
    }

    #[tokio::test]
    async fn oversized_point_values_are_rejected() {
        let (state, _clock) = setup();
        let err = start_competition(
            &state,
            start_request(json!({
                "player_names": ["Ada"],
                "game_mode": "points",
                "target_score": 10,
                "points": { "artist": 3_000_000_000u32, "title": 3_000_000_000u32, "year": 1, "bonus": 1 },
                "songs": songs(3),
            })),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert!(!state.has_competition().await);
    }

    #[tokio::test]
    async fn skip_budget_is_enforced() {
        let (state, _clock) = setup();
        start_competition(
            &state,
            start_request(json!({
                "player_names": ["Ada"],
                "game_mode": "points",
                "target_score": 10,
                "skips_per_player": 1,
                "songs": songs(5),
            })),
        )
        .await
        .unwrap();

        let report = skip_turn(&state).await.unwrap();
        assert_eq!(report.outcome, TurnOutcomeKind::Skipped);
        assert_eq!(report.skip_cost, Some(0));
        assert!(!report.competition.skip_available);

        let err = skip_turn(&state).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn timer_ends_time_based_game_at_round_boundary() {
        let (state, clock) = setup();
        start_competition(
            &state,
            start_request(json!({
                "player_names": ["Ada", "Bob"],
                "game_mode": "time_based",
                "game_duration_minutes": 1,
                "songs": songs(10),
            })),
        )
        .await
        .unwrap();
        let mut receiver = state.public_sse().subscribe();

        clock.advance(Duration::from_secs(90));
        scan_and_complete(&state, "001", &[GuessCategoryDto::Artist]).await;
        assert!(!poll_timer(&state).await.unwrap(), "round still in progress");

        scan_and_complete(&state, "002", &[]).await;
        let snapshot = get_competition(&state).await.unwrap();
        assert_eq!(snapshot.status, CompetitionStatusDto::Finished);
        let result = snapshot.result.unwrap();
        assert_eq!(result.reason, FinishReasonDto::TimeExpired);
        assert_eq!(result.winners.len(), 1);
        assert_eq!(result.winners[0].name, "Ada");
        assert!(names(&drain(&mut receiver)).contains(&EVENT_FINISHED));

        assert!(!poll_timer(&state).await.unwrap());
        assert!(matches!(
            begin_scan(&state).await,
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn timer_waits_for_an_open_scanner() {
        let (state, clock) = setup();
        start_competition(
            &state,
            start_request(json!({
                "player_names": ["Ada", "Bob"],
                "game_mode": "time_based",
                "game_duration_minutes": 1,
                "songs": songs(10),
            })),
        )
        .await
        .unwrap();
        scan_and_complete(&state, "001", &[]).await;
        scan_and_complete(&state, "002", &[]).await;

        begin_scan(&state).await.unwrap();
        clock.advance(Duration::from_secs(120));
        assert!(!poll_timer(&state).await.unwrap(), "scanner is open");
        let snapshot = get_competition(&state).await.unwrap();
        assert_eq!(snapshot.status, CompetitionStatusDto::InProgress);

        scan_failed(&state).await.unwrap();
        assert!(poll_timer(&state).await.unwrap());
        let result = get_competition(&state).await.unwrap().result.unwrap();
        assert_eq!(result.reason, FinishReasonDto::TimeExpired);
        assert_eq!(result.winners.len(), 2);
    }

    #[tokio::test]
    async fn draw_picks_an_unused_song() {
        let (state, _clock) = setup();
        start_competition(
            &state,
            start_request(json!({
                "player_names": ["Ada"],
                "game_mode": "points",
                "target_score": 3,
                "songs": songs(1),
            })),
        )
        .await
        .unwrap();

        let drawn = draw(&state).await.unwrap();
        assert_eq!(drawn.song_id.as_deref(), Some("001"));
        let turn = drawn.competition.turn.unwrap();
        assert!(turn.song.is_none());
    }
}
