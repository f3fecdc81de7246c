//! Pure conversion of a turn's guesses into points.

use std::ops::AddAssign;

use crate::engine::{settings::PointValues, song_pool::Song};

/// The three attributes a player can guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessCategory {
    /// Performing artist.
    Artist,
    /// Song title.
    Title,
    /// Release year.
    Year,
}

/// Which categories were guessed correctly during a turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Guesses {
    /// Artist guessed.
    pub artist: bool,
    /// Title guessed.
    pub title: bool,
    /// Year guessed.
    pub year: bool,
}

impl Guesses {
    /// Read one category.
    pub fn get(&self, category: GuessCategory) -> bool {
        match category {
            GuessCategory::Artist => self.artist,
            GuessCategory::Title => self.title,
            GuessCategory::Year => self.year,
        }
    }

    /// Overwrite one category.
    pub fn set(&mut self, category: GuessCategory, correct: bool) {
        match category {
            GuessCategory::Artist => self.artist = correct,
            GuessCategory::Title => self.title = correct,
            GuessCategory::Year => self.year = correct,
        }
    }

    /// True when every category is marked correct.
    pub fn all(&self) -> bool {
        self.artist && self.title && self.year
    }
}

/// Points earned per category, either for one turn or accumulated over a game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreBreakdown {
    /// Points from the artist category.
    pub artist: u32,
    /// Points from the title category.
    pub title: u32,
    /// Points from the year category.
    pub year: u32,
    /// Bonus for a perfect guess.
    pub bonus: u32,
}

impl ScoreBreakdown {
    /// Sum of every category.
    pub fn total(&self) -> u32 {
        self.artist
            .saturating_add(self.title)
            .saturating_add(self.year)
            .saturating_add(self.bonus)
    }
}

impl AddAssign for ScoreBreakdown {
    fn add_assign(&mut self, rhs: Self) {
        self.artist = self.artist.saturating_add(rhs.artist);
        self.title = self.title.saturating_add(rhs.title);
        self.year = self.year.saturating_add(rhs.year);
        self.bonus = self.bonus.saturating_add(rhs.bonus);
    }
}

/// Score one turn.
///
/// Year points and the bonus both need the song to carry a year, so a year-less song
/// caps out at artist + title no matter what was toggled.
pub fn score(guessed: &Guesses, points: &PointValues, song: &Song) -> ScoreBreakdown {
    let has_year = song.year.is_some();
    let award = |hit: bool, value: u32| if hit { value } else { 0 };

    ScoreBreakdown {
        artist: award(guessed.artist, points.artist),
        title: award(guessed.title, points.title),
        year: award(guessed.year && has_year, points.year),
        bonus: award(guessed.all() && has_year, points.bonus),
    }
}
