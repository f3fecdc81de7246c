use crate::engine::scoring::ScoreBreakdown;

/// Stable seat index of a player (turn order).
pub type PlayerId = usize;

/// Player state accumulated over a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Seat index.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Current score, never negative.
    pub score: u32,
    /// Skips spent so far.
    pub skips_used: u32,
    /// Points earned per category, kept for the end-game breakdown.
    pub points: ScoreBreakdown,
    /// Turns completed or skipped.
    pub turns_played: u32,
}

impl Player {
    fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            score: 0,
            skips_used: 0,
            points: ScoreBreakdown::default(),
            turns_played: 0,
        }
    }
}

/// Ordered players of a game. Only completed or skipped turns mutate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRoster {
    players: Vec<Player>,
}

impl PlayerRoster {
    /// Seat players in the order their names are given.
    pub fn new<I>(names: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let players = names
            .into_iter()
            .enumerate()
            .map(|(id, name)| Player::new(id, name))
            .collect();
        Self { players }
    }

    /// Number of seats.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether nobody is seated.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Look up a player by seat.
    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    /// Players in seat order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Credit a completed turn to `id`.
    pub fn apply(&mut self, id: PlayerId, breakdown: ScoreBreakdown) {
        if let Some(player) = self.players.get_mut(id) {
            player.points += breakdown;
            player.score = player.score.saturating_add(breakdown.total());
            player.turns_played += 1;
        }
    }

    /// Charge a skip to `id` when its budget allows, returning the points actually removed.
    ///
    /// Returns `None` (and changes nothing) once `skips_allowed` skips have been used.
    pub fn skip(&mut self, id: PlayerId, skips_allowed: u32, cost: u32) -> Option<u32> {
        let player = self.players.get_mut(id)?;
        if player.skips_used >= skips_allowed {
            return None;
        }

        let charged = cost.min(player.score);
        player.score -= charged;
        player.skips_used += 1;
        player.turns_played += 1;
        Some(charged)
    }

    /// Players sorted by descending score; equal scores keep seat order. Display only.
    pub fn leaderboard(&self) -> Vec<Player> {
        let mut ranked = self.players.clone();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked
    }

    /// Round-robin successor of `current`.
    pub fn next_player_index(&self, current: PlayerId) -> PlayerId {
        (current + 1) % self.players.len().max(1)
    }

    /// Successor of `current` restricted to `eligible` seats (used during sudden death).
    pub fn next_eligible_index(&self, current: PlayerId, eligible: &[PlayerId]) -> PlayerId {
        let mut next = self.next_player_index(current);
        for _ in 0..self.players.len() {
            if eligible.contains(&next) {
                return next;
            }
            next = self.next_player_index(next);
        }
        next
    }

    /// Seats holding the highest score among `candidates`, in seat order.
    pub fn leaders_among(&self, candidates: &[PlayerId]) -> Vec<PlayerId> {
        let best = candidates
            .iter()
            .filter_map(|id| self.get(*id))
            .map(|player| player.score)
            .max();

        match best {
            Some(best) => candidates
                .iter()
                .copied()
                .filter(|id| self.get(*id).is_some_and(|player| player.score == best))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Seats holding the highest score overall.
    pub fn leaders(&self) -> Vec<PlayerId> {
        let everyone: Vec<PlayerId> = (0..self.players.len()).collect();
        self.leaders_among(&everyone)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn roster(names: &[&str]) -> PlayerRoster {
        PlayerRoster::new(names.iter().map(|name| name.to_string()))
    }

    #[test]
    fn apply_accumulates_categories_and_total() {
        let mut roster = roster(&["Ada", "Bob"]);
        let breakdown = ScoreBreakdown {
            artist: 1,
            title: 2,
            year: 1,
            bonus: 2,
        };
        roster.apply(0, breakdown);
        roster.apply(0, breakdown);

        let ada = roster.get(0).unwrap();
        assert_eq!(ada.score, 12);
        assert_eq!(ada.points.title, 4);
        assert_eq!(ada.turns_played, 2);
        assert_eq!(roster.get(1).unwrap().score, 0);
    }

    #[test]
    fn apply_saturates_at_the_score_ceiling() {
        let mut roster = roster(&["Ada"]);
        let breakdown = ScoreBreakdown {
            artist: u32::MAX - 1,
            ..Default::default()
        };
        roster.apply(0, breakdown);
        roster.apply(0, breakdown);

        let ada = roster.get(0).unwrap();
        assert_eq!(ada.score, u32::MAX);
        assert_eq!(ada.points.artist, u32::MAX);
        assert_eq!(ada.turns_played, 2);
    }

    #[test]
    fn skip_floors_score_and_respects_budget() {
        let mut roster = roster(&["Ada"]);
        roster.apply(
            0,
            ScoreBreakdown {
                artist: 1,
                ..Default::default()
            },
        );

        assert_eq!(roster.skip(0, 2, 3), Some(1));
        assert_eq!(roster.get(0).unwrap().score, 0);
        assert_eq!(roster.skip(0, 2, 3), Some(0));
        assert_eq!(roster.skip(0, 2, 3), None);
        assert_eq!(roster.get(0).unwrap().skips_used, 2);
    }

    #[test]
    fn leaderboard_is_stable_on_ties() {
        let mut roster = roster(&["Ada", "Bob", "Cy"]);
        let one = ScoreBreakdown {
            artist: 1,
            ..Default::default()
        };
        roster.apply(1, one);
        roster.apply(2, one);

        let names: Vec<_> = roster.leaderboard().into_iter().map(|p| p.name).collect();
        assert_eq!(names, ["Bob", "Cy", "Ada"]);
        assert_eq!(roster.leaders(), vec![1, 2]);
    }

    #[test]
    fn eligible_rotation_skips_other_seats() {
        let roster = roster(&["Ada", "Bob", "Cy", "Di"]);
        assert_eq!(roster.next_eligible_index(0, &[0, 2]), 2);
        assert_eq!(roster.next_eligible_index(2, &[0, 2]), 0);
        assert_eq!(roster.next_eligible_index(3, &[1]), 1);
    }

    proptest! {
        #[test]
        fn rotation_visits_every_seat_once_per_cycle(count in 1usize..=10, start in 0usize..10) {
            let names: Vec<String> = (0..count).map(|i| format!("P{i}")).collect();
            let roster = PlayerRoster::new(names);
            let start = start % count;

            let mut seen = vec![false; count];
            let mut current = start;
            for _ in 0..count {
                prop_assert!(!seen[current]);
                seen[current] = true;
                current = roster.next_player_index(current);
            }
            prop_assert_eq!(current, start);
            prop_assert!(seen.into_iter().all(|visited| visited));
        }

        #[test]
        fn skip_never_raises_score(cost in 0u32..10, earned in 0u32..10, allowed in 0u32..3) {
            let mut roster = PlayerRoster::new(vec!["Ada".to_string()]);
            roster.apply(0, ScoreBreakdown { artist: earned, ..Default::default() });

            for _ in 0..4 {
                let before = roster.get(0).unwrap().clone();
                match roster.skip(0, allowed, cost) {
                    Some(_) => {
                        let after = roster.get(0).unwrap();
                        prop_assert!(after.score <= before.score);
                        prop_assert_eq!(after.skips_used, before.skips_used + 1);
                    }
                    None => {
                        prop_assert_eq!(before.skips_used, allowed);
                        prop_assert_eq!(roster.get(0).unwrap(), &before);
                    }
                }
            }
        }
    }
}
