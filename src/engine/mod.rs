//! Competition engine: turn rotation, song pool, scoring, skips and win conditions.
//!
//! Every public method processes one discrete event synchronously. Callers serialise
//! access (the service layer holds the engine behind a write lock) and read an
//! [`EngineSnapshot`] after each transition.

pub mod clock;
pub mod game_mode;
pub mod roster;
pub mod scoring;
pub mod settings;
pub mod snapshot;
pub mod song_pool;
pub mod turn;

use std::{
    collections::HashSet,
    sync::Arc,
    time::{Duration, Instant},
};

use rand::Rng;
use thiserror::Error;
use tracing::{debug, info, warn};

use self::{
    clock::Clock,
    game_mode::{FinishReason, GameModeEvaluator, GameResult, PoolStatus, TurnContext, Verdict},
    roster::{PlayerId, PlayerRoster},
    scoring::{GuessCategory, Guesses},
    settings::{CompetitionSettings, SettingsError},
    snapshot::{EngineSnapshot, GameStats, GameStatus, PlaybackIntent, TurnSnapshot},
    song_pool::{ScanOutcome, Song, SongPool},
    turn::{InvalidTurnAction, Turn, TurnOutcome, TurnPhase},
};

/// Actions the engine refuses without changing any state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The game is over; only snapshots can be read.
    #[error("the game is already finished")]
    GameFinished,
    /// The action does not fit the active turn's phase.
    #[error(transparent)]
    InvalidTurn(#[from] InvalidTurnAction),
    /// The active player has no skip left.
    #[error("player {player} has used {skips_used} of {skips_allowed} skips")]
    SkipUnavailable {
        /// Seat of the active player.
        player: PlayerId,
        /// Skips already used.
        skips_used: u32,
        /// Skips allowed per player.
        skips_allowed: u32,
    },
    /// A random draw was requested but every song has been played.
    #[error("no unused song is left to draw")]
    NoSongAvailable,
}

/// What happened when a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    /// Player whose turn ended.
    pub player: PlayerId,
    /// Song consumed by the turn, if one had been resolved.
    pub song: Option<Song>,
    /// Score or skip result.
    pub outcome: TurnOutcome,
    /// Decision of the win-condition evaluator.
    pub verdict: Verdict,
}

/// Single authoritative instance of a running competition.
pub struct CompetitionEngine {
    settings: CompetitionSettings,
    pool: SongPool,
    roster: PlayerRoster,
    evaluator: GameModeEvaluator,
    turn: Option<Turn>,
    completed_rounds: u32,
    settled: Option<PlayerRoster>,
    clock: Arc<dyn Clock>,
    started_at: Instant,
    finished_at: Option<Instant>,
    playback: Vec<PlaybackIntent>,
}

impl CompetitionEngine {
    /// Validate `settings` and `songs`, then seat the players. Player 0 starts.
    pub fn new(
        settings: CompetitionSettings,
        songs: Vec<Song>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SettingsError> {
        settings.validate()?;
        validate_songs(&songs)?;

        let roster = PlayerRoster::new(settings.player_names.iter().cloned());
        let pool = SongPool::new(songs);
        let started_at = clock.now();

        info!(
            players = roster.len(),
            songs = pool.remaining(),
            mode = ?settings.mode,
            "competition started"
        );

        let mut engine = Self {
            evaluator: GameModeEvaluator::new(settings.mode),
            settings,
            pool,
            roster,
            turn: Some(Turn::new(0)),
            completed_rounds: 0,
            settled: None,
            clock,
            started_at,
            finished_at: None,
            playback: Vec::new(),
        };
        engine.check_song_supply();
        Ok(engine)
    }

    /// Configuration the game was started with.
    pub fn settings(&self) -> &CompetitionSettings {
        &self.settings
    }

    /// Live standings.
    pub fn roster(&self) -> &PlayerRoster {
        &self.roster
    }

    /// Song supply.
    pub fn pool(&self) -> &SongPool {
        &self.pool
    }

    /// Final result once the game is over.
    pub fn result(&self) -> Option<&GameResult> {
        self.evaluator.result()
    }

    /// Open the scanner for the active player.
    pub fn begin_scan(&mut self) -> Result<(), EngineError> {
        self.active_turn()?.begin_scan()?;
        Ok(())
    }

    /// The scanner gave up without a code; the turn goes back to idle.
    pub fn scan_failed(&mut self) -> Result<(), EngineError> {
        self.active_turn()?.scan_failed()?;
        Ok(())
    }

    /// Resolve a decoded identifier for the active turn.
    ///
    /// A miss is reported as [`ScanOutcome::NotFound`] and leaves the pool untouched.
    pub fn scan(&mut self, scanned: &str) -> Result<ScanOutcome, EngineError> {
        self.active_turn()?.ready_for_song()?;
        let outcome = self.pool.resolve(scanned);
        let turn = self.active_turn()?;

        match &outcome {
            ScanOutcome::Matched(song) => {
                turn.resolve(song.clone())?;
                debug!(player = turn.player(), song_id = %song.external_id, "scan matched");
                self.playback.push(PlaybackIntent::Play {
                    song_id: song.external_id.clone(),
                });
            }
            ScanOutcome::NotFound { scanned } => {
                turn.no_match()?;
                debug!(player = turn.player(), %scanned, "scan matched no unused song");
            }
        }

        Ok(outcome)
    }

    /// Resolve the active turn to a random unused song instead of scanning a card.
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Song, EngineError> {
        self.active_turn()?.ready_for_song()?;
        let song = self.pool.draw(rng).ok_or(EngineError::NoSongAvailable)?;

        let turn = self.active_turn()?;
        turn.resolve(song.clone())?;
        debug!(player = turn.player(), song_id = %song.external_id, "song drawn");
        self.playback.push(PlaybackIntent::Play {
            song_id: song.external_id.clone(),
        });
        Ok(song)
    }

    /// Flip one guess category of the active turn.
    pub fn toggle_guess(&mut self, category: GuessCategory) -> Result<Guesses, EngineError> {
        Ok(self.active_turn()?.toggle_guess(category)?)
    }

    /// Set one guess category of the active turn.
    pub fn set_guess(
        &mut self,
        category: GuessCategory,
        correct: bool,
    ) -> Result<Guesses, EngineError> {
        Ok(self.active_turn()?.set_guess(category, correct)?)
    }

    /// Reveal the answers of the active turn.
    pub fn reveal(&mut self) -> Result<Song, EngineError> {
        let song = self.active_turn()?.reveal()?.clone();
        self.playback.push(PlaybackIntent::Reveal {
            song_id: song.external_id.clone(),
        });
        Ok(song)
    }

    /// Score the active turn, consume its song and move on.
    pub fn complete_turn(&mut self) -> Result<TurnReport, EngineError> {
        let points = self.settings.points;
        let turn = self.active_turn()?;
        let player = turn.player();
        let (song, breakdown) = turn.complete(&points)?;

        self.roster.apply(player, breakdown);
        self.pool.mark_used(&song);
        self.playback.push(PlaybackIntent::Stop);

        info!(
            player,
            song_id = %song.external_id,
            points = breakdown.total(),
            "turn completed"
        );

        let verdict = self.end_turn(player);
        Ok(TurnReport {
            player,
            song: Some(song),
            outcome: TurnOutcome::Completed(breakdown),
            verdict,
        })
    }

    /// Skip the active turn if the player still has a skip left.
    ///
    /// The skip costs `skip_cost` points (never below zero) and consumes the resolved song, if any.
    pub fn skip(&mut self) -> Result<TurnReport, EngineError> {
        let skips_allowed = self.settings.skips_per_player;
        let cost = self.settings.skip_cost;
        let turn = self.active_turn()?;
        let player = turn.player();
        let song = turn.song().cloned();

        let Some(charged) = self.roster.skip(player, skips_allowed, cost) else {
            let skips_used = self
                .roster
                .get(player)
                .map(|p| p.skips_used)
                .unwrap_or_default();
            return Err(EngineError::SkipUnavailable {
                player,
                skips_used,
                skips_allowed,
            });
        };

        if let Some(song) = &song {
            self.pool.mark_used(song);
        }
        self.playback.push(PlaybackIntent::Stop);

        info!(player, cost = charged, song_id = ?song.as_ref().map(|s| &s.external_id), "turn skipped");

        let verdict = self.end_turn(player);
        Ok(TurnReport {
            player,
            song,
            outcome: TurnOutcome::Skipped { cost: charged },
            verdict,
        })
    }

    /// Re-check the win condition without a turn ending (elapsed-time polling).
    ///
    /// Only acts at a round boundary, so a round in progress always completes.
    pub fn poll(&mut self) -> GameStatus {
        if self.result().is_none() && self.at_round_boundary() {
            let verdict = self.evaluate(true);
            if let Verdict::Finished(result) = verdict {
                self.finish(&result);
            }
        }
        self.status()
    }

    /// Hand pending playback intents to the caller.
    pub fn take_playback_intents(&mut self) -> Vec<PlaybackIntent> {
        std::mem::take(&mut self.playback)
    }

    /// Current overall status.
    pub fn status(&self) -> GameStatus {
        if let Some(result) = self.evaluator.result() {
            return GameStatus::Finished(result.clone());
        }
        match self.evaluator.contenders() {
            Some(contenders) => GameStatus::SuddenDeath {
                contenders: contenders.to_vec(),
            },
            None => GameStatus::InProgress,
        }
    }

    /// Derived statistics.
    pub fn stats(&self) -> GameStats {
        GameStats {
            total_rounds: self.completed_rounds,
            total_songs_played: self.pool.used_count(),
            elapsed_minutes: self.elapsed().as_secs() / 60,
            was_sudden_death: self.evaluator.was_sudden_death(),
        }
    }

    /// Immutable picture of the whole game for the presentation layer.
    pub fn snapshot(&self) -> EngineSnapshot {
        let skip_available = self.turn.as_ref().is_some_and(|turn| {
            self.roster
                .get(turn.player())
                .is_some_and(|player| player.skips_used < self.settings.skips_per_player)
        });

        EngineSnapshot {
            status: self.status(),
            turn: self.turn.as_ref().map(|turn| TurnSnapshot {
                player: turn.player(),
                phase: turn.phase(),
                song: turn.song().cloned(),
                guessed: turn.guessed(),
                revealed: turn.revealed(),
            }),
            players: self.roster.players().to_vec(),
            leaderboard: self.roster.leaderboard(),
            stats: self.stats(),
            remaining_songs: self.pool.remaining(),
            no_more_turns: self.settled.is_some(),
            year_data_available: self.pool.has_year_data(),
            skip_available,
        }
    }

    fn active_turn(&mut self) -> Result<&mut Turn, EngineError> {
        self.turn.as_mut().ok_or(EngineError::GameFinished)
    }

    fn elapsed(&self) -> Duration {
        let until = self.finished_at.unwrap_or_else(|| self.clock.now());
        until.saturating_duration_since(self.started_at)
    }

    fn rotation_start(&self) -> PlayerId {
        self.evaluator
            .contenders()
            .and_then(|contenders| contenders.first().copied())
            .unwrap_or(0)
    }

    fn at_round_boundary(&self) -> bool {
        self.completed_rounds > 0
            && self.turn.as_ref().is_some_and(|turn| {
                turn.phase() == TurnPhase::Idle && turn.player() == self.rotation_start()
            })
    }

    /// Advance the rotation after `player`'s turn and consult the evaluator.
    fn end_turn(&mut self, player: PlayerId) -> Verdict {
        let next = match self.evaluator.contenders() {
            Some(contenders) => self.roster.next_eligible_index(player, contenders),
            None => self.roster.next_player_index(player),
        };
        let round_complete = next <= player;
        if round_complete {
            self.completed_rounds += 1;
            self.check_song_supply();
        }

        let verdict = self.evaluate(round_complete);
        match &verdict {
            Verdict::Continue => self.turn = Some(Turn::new(next)),
            Verdict::SuddenDeath { contenders } => {
                info!(?contenders, round = self.completed_rounds, "sudden death");
                self.turn = Some(Turn::new(contenders.first().copied().unwrap_or(next)));
                // Fewer players now share the remaining songs.
                self.check_song_supply();
            }
            Verdict::Finished(result) => self.finish(result),
        }
        verdict
    }

    fn evaluate(&mut self, round_complete: bool) -> Verdict {
        let elapsed = self.elapsed();
        let pool = match &self.settled {
            Some(settled) if self.pool.exhausted() => PoolStatus::Exhausted { settled },
            Some(settled) => PoolStatus::RunningLow { settled },
            None => PoolStatus::Plenty,
        };
        let ctx = TurnContext {
            roster: &self.roster,
            completed_rounds: self.completed_rounds,
            round_complete,
            elapsed,
            remaining_songs: self.pool.remaining(),
            pool,
        };
        self.evaluator.check(&ctx)
    }

    /// At a round boundary, remember the standings when the next round cannot be fully played.
    fn check_song_supply(&mut self) {
        let turns_needed = self
            .evaluator
            .contenders()
            .map_or(self.roster.len(), <[PlayerId]>::len);
        if self.pool.remaining() >= turns_needed {
            self.settled = None;
            return;
        }

        if self.settled.is_none() {
            warn!(
                remaining = self.pool.remaining(),
                turns_needed,
                round = self.completed_rounds,
                "not enough songs left for a full round"
            );
        }
        self.settled = Some(self.roster.clone());
    }

    fn finish(&mut self, result: &GameResult) {
        if result.reason == FinishReason::PoolExhausted {
            if let Some(settled) = self.settled.take() {
                self.roster = settled;
            }
            self.settled = Some(self.roster.clone());
        }

        self.turn = None;
        self.finished_at = Some(self.clock.now());
        if self.playback.last() != Some(&PlaybackIntent::Stop) {
            self.playback.push(PlaybackIntent::Stop);
        }

        info!(
            winners = ?result.winners,
            reason = ?result.reason,
            rounds = self.completed_rounds,
            "competition finished"
        );
    }
}

fn validate_songs(songs: &[Song]) -> Result<(), SettingsError> {
    if songs.is_empty() {
        return Err(SettingsError::EmptySongList);
    }

    let mut seen = HashSet::with_capacity(songs.len());
    for (position, song) in songs.iter().enumerate() {
        if song.external_id.trim().is_empty() {
            return Err(SettingsError::EmptySongId(position));
        }
        if !seen.insert(song.external_id.as_str()) {
            return Err(SettingsError::DuplicateSongId(song.external_id.clone()));
        }
    }
    Ok(())
}
