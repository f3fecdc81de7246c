use crate::engine::{
    game_mode::GameResult,
    roster::{Player, PlayerId},
    scoring::Guesses,
    song_pool::Song,
    turn::TurnPhase,
};

/// Intents for the playback collaborator, drained after each engine event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackIntent {
    /// Start playing the song with this identifier.
    Play {
        /// Identifier of the song.
        song_id: String,
    },
    /// Show the answer for the song with this identifier.
    Reveal {
        /// Identifier of the song.
        song_id: String,
    },
    /// Stop whatever is playing.
    Stop,
}

/// Overall state of the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameStatus {
    /// Regular play.
    InProgress,
    /// Tie-break sub-game; only `contenders` take turns.
    SuddenDeath {
        /// Seats still in contention.
        contenders: Vec<PlayerId>,
    },
    /// Game over.
    Finished(GameResult),
}

/// Derived statistics, recomputed on every snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameStats {
    /// Rounds fully played (sudden-death rounds included).
    pub total_rounds: u32,
    /// Songs consumed by completed or skipped turns.
    pub total_songs_played: usize,
    /// Whole minutes since the game started.
    pub elapsed_minutes: u64,
    /// Whether a sudden-death tie-break was played.
    pub was_sudden_death: bool,
}

/// View of the active turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnSnapshot {
    /// Player taking the turn.
    pub player: PlayerId,
    /// Turn phase.
    pub phase: TurnPhase,
    /// Resolved song, if any.
    pub song: Option<Song>,
    /// Guesses marked so far.
    pub guessed: Guesses,
    /// Whether the answers are on screen.
    pub revealed: bool,
}

/// Immutable picture of the engine handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSnapshot {
    /// Overall status.
    pub status: GameStatus,
    /// Active turn, absent once the game is over.
    pub turn: Option<TurnSnapshot>,
    /// Players in seat order.
    pub players: Vec<Player>,
    /// Players ranked by score for display.
    pub leaderboard: Vec<Player>,
    /// Derived statistics.
    pub stats: GameStats,
    /// Songs still unused.
    pub remaining_songs: usize,
    /// Set once a round boundary found fewer songs than players left to play.
    pub no_more_turns: bool,
    /// Whether the list carries year data (year toggle and bonus are pointless otherwise).
    pub year_data_available: bool,
    /// Whether the active player may still skip.
    pub skip_available: bool,
}

impl EngineSnapshot {
    /// Whether the game is over.
    pub fn is_finished(&self) -> bool {
        matches!(self.status, GameStatus::Finished(_))
    }

    /// Winning seats once finished, empty otherwise.
    pub fn winners(&self) -> &[PlayerId] {
        match &self.status {
            GameStatus::Finished(result) => &result.winners,
            _ => &[],
        }
    }
}
