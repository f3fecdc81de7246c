use thiserror::Error;

use crate::engine::{
    roster::PlayerId,
    scoring::{self, GuessCategory, Guesses, ScoreBreakdown},
    settings::PointValues,
    song_pool::Song,
};

/// Where the active turn stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// No song yet.
    Idle,
    /// The scan collaborator has been asked for a code.
    AwaitingScan,
    /// A song is playing and guesses can be toggled.
    Resolved,
    /// The answers are shown; guesses can still be toggled.
    Revealed,
}

/// Actions a turn can be asked to perform, used to report rejected ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnAction {
    /// Open the scanner.
    BeginScan,
    /// Deliver a scanned song.
    Resolve,
    /// Report a scan that produced nothing.
    ScanFailed,
    /// Toggle or set a guess.
    Guess,
    /// Show the answers.
    Reveal,
    /// Finish the turn and score it.
    Complete,
}

/// Error returned when an action does not fit the current turn phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{action:?} is not allowed while the turn is {phase:?}")]
pub struct InvalidTurnAction {
    /// Rejected action.
    pub action: TurnAction,
    /// Phase the turn was in.
    pub phase: TurnPhase,
}

/// How a finished turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The turn was scored.
    Completed(ScoreBreakdown),
    /// The player skipped and paid `cost` points.
    Skipped {
        /// Points actually removed (after flooring at zero).
        cost: u32,
    },
}

/// One player's encounter with one song.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    player: PlayerId,
    song: Option<Song>,
    guessed: Guesses,
    phase: TurnPhase,
}

impl Turn {
    /// Fresh idle turn for `player`.
    pub fn new(player: PlayerId) -> Self {
        Self {
            player,
            song: None,
            guessed: Guesses::default(),
            phase: TurnPhase::Idle,
        }
    }

    /// Player taking this turn.
    pub fn player(&self) -> PlayerId {
        self.player
    }

    /// Current phase.
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Song being played, once resolved.
    pub fn song(&self) -> Option<&Song> {
        self.song.as_ref()
    }

    /// Guesses marked so far.
    pub fn guessed(&self) -> Guesses {
        self.guessed
    }

    /// Whether the answers have been revealed.
    pub fn revealed(&self) -> bool {
        self.phase == TurnPhase::Revealed
    }

    /// Idle → AwaitingScan. Asking again while already waiting is harmless.
    pub fn begin_scan(&mut self) -> Result<(), InvalidTurnAction> {
        self.require(TurnAction::BeginScan, &[TurnPhase::Idle, TurnPhase::AwaitingScan])?;
        self.phase = TurnPhase::AwaitingScan;
        Ok(())
    }

    /// Back to Idle after the scanner gave up.
    pub fn scan_failed(&mut self) -> Result<(), InvalidTurnAction> {
        self.require(TurnAction::ScanFailed, &[TurnPhase::Idle, TurnPhase::AwaitingScan])?;
        self.phase = TurnPhase::Idle;
        Ok(())
    }

    /// Fails unless the turn can still take a song (idle or waiting for a scan).
    pub fn ready_for_song(&self) -> Result<(), InvalidTurnAction> {
        self.require(TurnAction::Resolve, &[TurnPhase::Idle, TurnPhase::AwaitingScan])
    }

    /// Back to Idle after a scan that matched nothing; the song pool is untouched.
    pub fn no_match(&mut self) -> Result<(), InvalidTurnAction> {
        self.require(TurnAction::Resolve, &[TurnPhase::Idle, TurnPhase::AwaitingScan])?;
        self.phase = TurnPhase::Idle;
        Ok(())
    }

    /// Attach the resolved song and start guessing.
    pub fn resolve(&mut self, song: Song) -> Result<(), InvalidTurnAction> {
        self.require(TurnAction::Resolve, &[TurnPhase::Idle, TurnPhase::AwaitingScan])?;
        self.song = Some(song);
        self.phase = TurnPhase::Resolved;
        Ok(())
    }

    /// Mark one category as guessed or not. Repeating the same value changes nothing.
    pub fn set_guess(
        &mut self,
        category: GuessCategory,
        correct: bool,
    ) -> Result<Guesses, InvalidTurnAction> {
        self.require(TurnAction::Guess, &[TurnPhase::Resolved, TurnPhase::Revealed])?;
        self.guessed.set(category, correct);
        Ok(self.guessed)
    }

    /// Flip one category.
    pub fn toggle_guess(&mut self, category: GuessCategory) -> Result<Guesses, InvalidTurnAction> {
        let current = self.guessed.get(category);
        self.set_guess(category, !current)
    }

    /// Expose the answers. Scores nothing by itself.
    pub fn reveal(&mut self) -> Result<&Song, InvalidTurnAction> {
        self.require(TurnAction::Reveal, &[TurnPhase::Resolved, TurnPhase::Revealed])?;
        self.phase = TurnPhase::Revealed;
        self.song.as_ref().ok_or(InvalidTurnAction {
            action: TurnAction::Reveal,
            phase: self.phase,
        })
    }

    /// Score the turn against `points`. The caller applies the result and discards the turn.
    pub fn complete(&self, points: &PointValues) -> Result<(Song, ScoreBreakdown), InvalidTurnAction> {
        self.require(TurnAction::Complete, &[TurnPhase::Resolved, TurnPhase::Revealed])?;
        let song = self.song.clone().ok_or(InvalidTurnAction {
            action: TurnAction::Complete,
            phase: self.phase,
        })?;
        let breakdown = scoring::score(&self.guessed, points, &song);
        Ok((song, breakdown))
    }

    fn require(&self, action: TurnAction, allowed: &[TurnPhase]) -> Result<(), InvalidTurnAction> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(InvalidTurnAction {
                action,
                phase: self.phase,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::song_pool::tests::song;

    const POINTS: PointValues = PointValues {
        artist: 1,
        title: 2,
        year: 1,
        bonus: 2,
    };

    #[test]
    fn scan_guess_reveal_complete() {
        let mut turn = Turn::new(0);
        turn.begin_scan().unwrap();
        assert_eq!(turn.phase(), TurnPhase::AwaitingScan);

        turn.resolve(song("42", Some(2001))).unwrap();
        turn.toggle_guess(GuessCategory::Artist).unwrap();
        turn.toggle_guess(GuessCategory::Title).unwrap();
        turn.toggle_guess(GuessCategory::Title).unwrap();
        turn.set_guess(GuessCategory::Year, true).unwrap();

        assert_eq!(turn.reveal().unwrap().external_id, "42");
        assert!(turn.revealed());
        turn.toggle_guess(GuessCategory::Title).unwrap();

        let (played, breakdown) = turn.complete(&POINTS).unwrap();
        assert_eq!(played.external_id, "42");
        assert_eq!(breakdown.total(), 6);
    }

    #[test]
    fn failed_scan_returns_to_idle() {
        let mut turn = Turn::new(1);
        turn.begin_scan().unwrap();
        turn.scan_failed().unwrap();
        assert_eq!(turn.phase(), TurnPhase::Idle);
        assert!(turn.song().is_none());
    }

    #[test]
    fn guessing_needs_a_song() {
        let mut turn = Turn::new(0);
        let err = turn.toggle_guess(GuessCategory::Artist).unwrap_err();
        assert_eq!(
            err,
            InvalidTurnAction {
                action: TurnAction::Guess,
                phase: TurnPhase::Idle
            }
        );
        assert!(turn.complete(&POINTS).is_err());
        assert!(turn.reveal().is_err());
    }

    #[test]
    fn cannot_scan_twice_in_one_turn() {
        let mut turn = Turn::new(0);
        turn.resolve(song("1", None)).unwrap();
        let err = turn.resolve(song("2", None)).unwrap_err();
        assert_eq!(err.phase, TurnPhase::Resolved);
        assert_eq!(turn.song().map(|s| s.external_id.as_str()), Some("1"));
    }
}
