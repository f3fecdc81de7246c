use thiserror::Error;

/// Largest table the engine accepts.
pub const MAX_PLAYERS: usize = 10;

/// Points awarded per correctly guessed category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointValues {
    /// Awarded when the artist is guessed.
    pub artist: u32,
    /// Awarded when the title is guessed.
    pub title: u32,
    /// Awarded when the release year is guessed (songs with a year only).
    pub year: u32,
    /// Awarded on top when all three categories are guessed on a song with a year.
    pub bonus: u32,
}

impl PointValues {
    /// Highest total a single turn can award (saturating).
    pub fn max_per_turn(&self) -> u32 {
        self.checked_max_per_turn().unwrap_or(u32::MAX)
    }

    /// Highest total a single turn can award, or `None` if it does not fit in a `u32`.
    pub fn checked_max_per_turn(&self) -> Option<u32> {
        self.artist
            .checked_add(self.title)?
            .checked_add(self.year)?
            .checked_add(self.bonus)
    }
}

/// How a tie at the end of a rounds-mode game is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreakPolicy {
    /// Every tied player is reported as a winner.
    HighestScore,
    /// Same outcome as [`TieBreakPolicy::HighestScore`]; kept apart so the UI can word it differently.
    MultipleWinners,
    /// Tied players keep playing rounds until one of them pulls ahead.
    SuddenDeath,
}

/// Win condition of a game, with the threshold that belongs to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    /// First player reaching `target_score` wins.
    Points {
        /// Score to reach.
        target_score: u32,
    },
    /// Highest score once the clock runs out (checked at round boundaries).
    TimeBased {
        /// Game length in minutes.
        duration_minutes: u32,
    },
    /// Highest score after a fixed number of rounds.
    Rounds {
        /// Number of full rounds to play.
        maximum_rounds: u32,
        /// What to do when several players share the top score.
        tie_break: TieBreakPolicy,
    },
}

/// Immutable configuration of one competition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompetitionSettings {
    /// Number of seats at the table (1 to [`MAX_PLAYERS`]).
    pub number_of_players: usize,
    /// Win condition.
    pub mode: GameMode,
    /// Per-category point values.
    pub points: PointValues,
    /// Skips each player may use during the game.
    pub skips_per_player: u32,
    /// Points taken from the active player on every skip (score floors at zero).
    pub skip_cost: u32,
    /// Display names, one per seat, in turn order.
    pub player_names: Vec<String>,
}

/// Reasons a settings bundle cannot start a game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// Player count outside `1..=MAX_PLAYERS`.
    #[error("number of players must be between 1 and {MAX_PLAYERS} (got {0})")]
    PlayerCount(usize),
    /// `player_names` does not have one entry per seat.
    #[error("expected {expected} player names, got {got}")]
    PlayerNamesMismatch {
        /// Declared number of players.
        expected: usize,
        /// Names actually supplied.
        got: usize,
    },
    /// A player name is empty or whitespace only.
    #[error("player name at seat {0} must not be empty")]
    EmptyPlayerName(usize),
    /// The threshold of the selected mode is zero.
    #[error("{0} must be strictly positive")]
    NonPositiveThreshold(&'static str),
    /// The point values of one perfect turn add up past `u32::MAX`.
    #[error("point values are too large: one turn would exceed u32::MAX points")]
    PointValuesTooLarge,
    /// No song was supplied for the game.
    #[error("song list must contain at least one song")]
    EmptySongList,
    /// A song carries an empty identifier and could never be scanned reliably.
    #[error("song at position {0} has an empty identifier")]
    EmptySongId(usize),
    /// Two songs share an identifier, so a scan could not tell them apart.
    #[error("song identifier `{0}` appears more than once")]
    DuplicateSongId(String),
}

impl CompetitionSettings {
    /// Check every construction-time rule; the engine refuses to start otherwise.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(1..=MAX_PLAYERS).contains(&self.number_of_players) {
            return Err(SettingsError::PlayerCount(self.number_of_players));
        }

        if self.player_names.len() != self.number_of_players {
            return Err(SettingsError::PlayerNamesMismatch {
                expected: self.number_of_players,
                got: self.player_names.len(),
            });
        }

        if let Some(seat) = self
            .player_names
            .iter()
            .position(|name| name.trim().is_empty())
        {
            return Err(SettingsError::EmptyPlayerName(seat));
        }

        if self.points.checked_max_per_turn().is_none() {
            return Err(SettingsError::PointValuesTooLarge);
        }

        match self.mode {
            GameMode::Points { target_score: 0 } => {
                Err(SettingsError::NonPositiveThreshold("target score"))
            }
            GameMode::TimeBased {
                duration_minutes: 0,
            } => Err(SettingsError::NonPositiveThreshold("game duration")),
            GameMode::Rounds {
                maximum_rounds: 0, ..
            } => Err(SettingsError::NonPositiveThreshold("maximum rounds")),
            _ => Ok(()),
        }
    }
}
