//! Win-condition evaluation, run after every completed or skipped turn.

use std::time::Duration;

use crate::engine::{
    roster::{PlayerId, PlayerRoster},
    settings::{GameMode, TieBreakPolicy},
};

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// A player reached the target score.
    TargetReached,
    /// The configured duration elapsed and the round in progress finished.
    TimeExpired,
    /// The configured number of rounds was played.
    RoundLimitReached,
    /// A sudden-death round separated the tied players.
    SuddenDeathResolved,
    /// Too few songs were left for another round.
    PoolExhausted,
}

/// Final outcome of a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResult {
    /// Winning seats, in seat order. Several entries mean a shared win.
    pub winners: Vec<PlayerId>,
    /// What ended the game.
    pub reason: FinishReason,
}

/// Decision taken after a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Keep playing.
    Continue,
    /// Rounds ended in a tie and only `contenders` keep playing.
    SuddenDeath {
        /// Tied seats entering sudden death.
        contenders: Vec<PlayerId>,
    },
    /// The game is over.
    Finished(GameResult),
}

/// Song supply as seen at evaluation time.
#[derive(Debug, Clone, Copy)]
pub enum PoolStatus<'a> {
    /// Enough songs for another full round.
    Plenty,
    /// A round boundary found fewer songs than turns; play goes on with what is left.
    RunningLow {
        /// Standings at the last fully completed round.
        settled: &'a PlayerRoster,
    },
    /// No song is left after the warning: the game must end on `settled` standings.
    Exhausted {
        /// Standings at the last fully completed round.
        settled: &'a PlayerRoster,
    },
}

/// Inputs of one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct TurnContext<'a> {
    /// Live standings.
    pub roster: &'a PlayerRoster,
    /// Rounds fully played so far (sudden-death rounds included).
    pub completed_rounds: u32,
    /// Whether the last turn closed a round.
    pub round_complete: bool,
    /// Time since the game started.
    pub elapsed: Duration,
    /// Songs still unused.
    pub remaining_songs: usize,
    /// Song supply status.
    pub pool: PoolStatus<'a>,
}

/// State machine over completed turns deciding when and how the game ends.
#[derive(Debug, Clone)]
pub struct GameModeEvaluator {
    mode: GameMode,
    contenders: Option<Vec<PlayerId>>,
    was_sudden_death: bool,
    result: Option<GameResult>,
}

impl GameModeEvaluator {
    /// Evaluator for `mode`, starting in regular play.
    pub fn new(mode: GameMode) -> Self {
        Self {
            mode,
            contenders: None,
            was_sudden_death: false,
            result: None,
        }
    }

    /// Seats still in contention while sudden death is running.
    pub fn contenders(&self) -> Option<&[PlayerId]> {
        self.contenders.as_deref()
    }

    /// Whether sudden death was ever entered.
    pub fn was_sudden_death(&self) -> bool {
        self.was_sudden_death
    }

    /// Final result once the game is over.
    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }

    /// Evaluate the standings after a turn. Once finished, the result never changes.
    pub fn check(&mut self, ctx: &TurnContext<'_>) -> Verdict {
        if let Some(result) = &self.result {
            return Verdict::Finished(result.clone());
        }

        let verdict = match self.contenders.clone() {
            Some(contenders) => self.evaluate_sudden_death(ctx, contenders),
            None => self.evaluate_regular(ctx),
        };

        match &verdict {
            Verdict::Finished(result) => {
                self.contenders = None;
                self.result = Some(result.clone());
            }
            Verdict::SuddenDeath { contenders } => {
                self.contenders = Some(contenders.clone());
                self.was_sudden_death = true;
            }
            Verdict::Continue => {}
        }

        verdict
    }

    fn evaluate_regular(&self, ctx: &TurnContext<'_>) -> Verdict {
        match self.mode {
            GameMode::Points { target_score } => {
                let reached: Vec<PlayerId> = ctx
                    .roster
                    .players()
                    .iter()
                    .filter(|player| player.score >= target_score)
                    .map(|player| player.id)
                    .collect();
                if !reached.is_empty() {
                    return finished(reached, FinishReason::TargetReached);
                }
            }
            GameMode::TimeBased { duration_minutes } => {
                let limit = Duration::from_secs(u64::from(duration_minutes) * 60);
                if ctx.round_complete && ctx.elapsed >= limit {
                    return finished(ctx.roster.leaders(), FinishReason::TimeExpired);
                }
            }
            GameMode::Rounds {
                maximum_rounds,
                tie_break,
            } => {
                if ctx.round_complete && ctx.completed_rounds >= maximum_rounds {
                    return settle_tie(ctx, ctx.roster.leaders(), tie_break);
                }
            }
        }

        match ctx.pool {
            PoolStatus::Exhausted { settled } => {
                finished(settled.leaders(), FinishReason::PoolExhausted)
            }
            _ => Verdict::Continue,
        }
    }

    fn evaluate_sudden_death(&self, ctx: &TurnContext<'_>, contenders: Vec<PlayerId>) -> Verdict {
        if ctx.round_complete {
            let ahead = ctx.roster.leaders_among(&contenders);
            if ahead.len() == 1 {
                return finished(ahead, FinishReason::SuddenDeathResolved);
            }
            if let PoolStatus::Exhausted { .. } = ctx.pool {
                return finished(ahead, FinishReason::PoolExhausted);
            }
            if ahead.len() < contenders.len() {
                // Players who fell behind drop out of contention.
                return Verdict::SuddenDeath { contenders: ahead };
            }
            return Verdict::Continue;
        }

        match ctx.pool {
            PoolStatus::Exhausted { settled } => finished(
                settled.leaders_among(&contenders),
                FinishReason::PoolExhausted,
            ),
            _ => Verdict::Continue,
        }
    }
}

/// Apply the rounds-mode tie-break to the players sharing the top score.
fn settle_tie(ctx: &TurnContext<'_>, leaders: Vec<PlayerId>, policy: TieBreakPolicy) -> Verdict {
    if leaders.len() <= 1 {
        return finished(leaders, FinishReason::RoundLimitReached);
    }

    match policy {
        TieBreakPolicy::HighestScore | TieBreakPolicy::MultipleWinners => {
            finished(leaders, FinishReason::RoundLimitReached)
        }
        TieBreakPolicy::SuddenDeath if ctx.remaining_songs < leaders.len() => {
            finished(leaders, FinishReason::PoolExhausted)
        }
        TieBreakPolicy::SuddenDeath => Verdict::SuddenDeath {
            contenders: leaders,
        },
    }
}

fn finished(winners: Vec<PlayerId>, reason: FinishReason) -> Verdict {
    Verdict::Finished(GameResult { winners, reason })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scoring::ScoreBreakdown;

    fn roster_with(scores: &[u32]) -> PlayerRoster {
        let mut roster = PlayerRoster::new((0..scores.len()).map(|i| format!("P{i}")));
        for (id, score) in scores.iter().enumerate() {
            roster.apply(
                id,
                ScoreBreakdown {
                    artist: *score,
                    ..Default::default()
                },
            );
        }
        roster
    }

    fn ctx(roster: &PlayerRoster, completed_rounds: u32, round_complete: bool) -> TurnContext<'_> {
        TurnContext {
            roster,
            completed_rounds,
            round_complete,
            elapsed: Duration::ZERO,
            remaining_songs: 50,
            pool: PoolStatus::Plenty,
        }
    }

    #[test]
    fn points_mode_finishes_on_threshold() {
        let mut evaluator = GameModeEvaluator::new(GameMode::Points { target_score: 10 });
        let below = roster_with(&[9, 3]);
        assert_eq!(evaluator.check(&ctx(&below, 0, false)), Verdict::Continue);

        let reached = roster_with(&[9, 10]);
        assert_eq!(
            evaluator.check(&ctx(&reached, 0, false)),
            finished(vec![1], FinishReason::TargetReached)
        );
        assert!(evaluator.result().is_some());
    }

    #[test]
    fn time_mode_waits_for_round_boundary() {
        let mut evaluator = GameModeEvaluator::new(GameMode::TimeBased {
            duration_minutes: 5,
        });
        let roster = roster_with(&[4, 4, 1]);
        let mut late = ctx(&roster, 2, false);
        late.elapsed = Duration::from_secs(6 * 60);
        assert_eq!(evaluator.check(&late), Verdict::Continue);

        late.round_complete = true;
        assert_eq!(
            evaluator.check(&late),
            finished(vec![0, 1], FinishReason::TimeExpired)
        );
    }

    #[test]
    fn rounds_mode_shared_win_policies() {
        for policy in [TieBreakPolicy::HighestScore, TieBreakPolicy::MultipleWinners] {
            let mut evaluator = GameModeEvaluator::new(GameMode::Rounds {
                maximum_rounds: 3,
                tie_break: policy,
            });
            let roster = roster_with(&[7, 2, 7]);
            assert_eq!(evaluator.check(&ctx(&roster, 2, true)), Verdict::Continue);
            assert_eq!(
                evaluator.check(&ctx(&roster, 3, true)),
                finished(vec![0, 2], FinishReason::RoundLimitReached)
            );
        }
    }

    #[test]
    fn sudden_death_runs_until_a_contender_pulls_ahead() {
        let mut evaluator = GameModeEvaluator::new(GameMode::Rounds {
            maximum_rounds: 1,
            tie_break: TieBreakPolicy::SuddenDeath,
        });
        let tied = roster_with(&[5, 5, 1]);
        assert_eq!(
            evaluator.check(&ctx(&tied, 1, true)),
            Verdict::SuddenDeath {
                contenders: vec![0, 1]
            }
        );
        assert!(evaluator.was_sudden_death());

        let mid_round = roster_with(&[5, 8, 1]);
        assert_eq!(evaluator.check(&ctx(&mid_round, 1, false)), Verdict::Continue);

        let still_tied = roster_with(&[6, 6, 9]);
        assert_eq!(evaluator.check(&ctx(&still_tied, 2, true)), Verdict::Continue);

        let separated = roster_with(&[6, 8, 9]);
        assert_eq!(
            evaluator.check(&ctx(&separated, 3, true)),
            finished(vec![1], FinishReason::SuddenDeathResolved)
        );
    }

    #[test]
    fn sudden_death_drops_players_who_fall_behind() {
        let mut evaluator = GameModeEvaluator::new(GameMode::Rounds {
            maximum_rounds: 1,
            tie_break: TieBreakPolicy::SuddenDeath,
        });
        evaluator.check(&ctx(&roster_with(&[3, 3, 3]), 1, true));

        assert_eq!(
            evaluator.check(&ctx(&roster_with(&[4, 4, 3]), 2, true)),
            Verdict::SuddenDeath {
                contenders: vec![0, 1]
            }
        );
        assert_eq!(evaluator.contenders(), Some(&[0, 1][..]));
    }

    #[test]
    fn exhausted_pool_finishes_on_settled_standings() {
        let mut evaluator = GameModeEvaluator::new(GameMode::Points { target_score: 100 });
        let settled = roster_with(&[3, 5]);
        let live = roster_with(&[9, 5]);
        let mut context = ctx(&live, 1, false);
        context.pool = PoolStatus::RunningLow { settled: &settled };
        assert_eq!(evaluator.check(&context), Verdict::Continue);

        context.pool = PoolStatus::Exhausted { settled: &settled };
        assert_eq!(
            evaluator.check(&context),
            finished(vec![1], FinishReason::PoolExhausted)
        );
    }

    #[test]
    fn sudden_death_without_songs_is_a_shared_win() {
        let mut evaluator = GameModeEvaluator::new(GameMode::Rounds {
            maximum_rounds: 1,
            tie_break: TieBreakPolicy::SuddenDeath,
        });
        let roster = roster_with(&[2, 2]);
        let mut context = ctx(&roster, 1, true);
        context.remaining_songs = 1;
        assert_eq!(
            evaluator.check(&context),
            finished(vec![0, 1], FinishReason::PoolExhausted)
        );
        assert!(!evaluator.was_sudden_death());
    }
}
