use indexmap::IndexSet;
use rand::{Rng, seq::IteratorRandom};

/// Song record supplied by the song-list collaborator. Identity is `external_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
    /// Identifier printed on the card (matched against scanned codes).
    pub external_id: String,
    /// Song title.
    pub title: String,
    /// Performing artist.
    pub artist: String,
    /// Release year, absent on lists that do not carry it.
    pub year: Option<u16>,
}

/// Result of matching a scanned code against the unused songs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The code resolved to a song that has not been played yet.
    Matched(Song),
    /// Nothing unused matched; carries the raw scanned text for display.
    NotFound {
        /// Text received from the scan collaborator.
        scanned: String,
    },
}

/// Songs of the active list together with the set already consumed.
#[derive(Debug, Clone)]
pub struct SongPool {
    all: Vec<Song>,
    used: IndexSet<String>,
    has_year_data: bool,
}

impl SongPool {
    /// Build a pool from the validated song list, computing the list-level year flag once.
    pub fn new(songs: Vec<Song>) -> Self {
        let has_year_data = songs.iter().any(|song| song.year.is_some());
        Self {
            all: songs,
            used: IndexSet::new(),
            has_year_data,
        }
    }

    /// Match `scanned` against unused songs.
    ///
    /// An exact identifier match wins; otherwise the first unused song whose identifier
    /// contains the scanned text, or is contained in it, is returned.
    pub fn resolve(&self, scanned: &str) -> ScanOutcome {
        let needle = scanned.trim();
        if needle.is_empty() {
            return ScanOutcome::NotFound {
                scanned: scanned.to_string(),
            };
        }

        let exact = self.unused().find(|song| song.external_id == needle);
        let found = exact.or_else(|| {
            self.unused().find(|song| {
                needle.contains(song.external_id.as_str()) || song.external_id.contains(needle)
            })
        });

        match found {
            Some(song) => ScanOutcome::Matched(song.clone()),
            None => ScanOutcome::NotFound {
                scanned: scanned.to_string(),
            },
        }
    }

    /// Pick a uniformly random unused song.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Song> {
        self.unused().choose(rng).cloned()
    }

    /// Record `song` as consumed. Calling it twice has no further effect.
    pub fn mark_used(&mut self, song: &Song) {
        if self.all.iter().any(|known| known.external_id == song.external_id) {
            self.used.insert(song.external_id.clone());
        }
    }

    /// Songs still available.
    pub fn remaining(&self) -> usize {
        self.all.len() - self.used.len()
    }

    /// True once every song has been consumed.
    pub fn exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Number of songs consumed so far.
    pub fn used_count(&self) -> usize {
        self.used.len()
    }

    /// Whether `external_id` has already been consumed.
    pub fn is_used(&self, external_id: &str) -> bool {
        self.used.contains(external_id)
    }

    /// Whether at least one song of the list carries a year.
    pub fn has_year_data(&self) -> bool {
        self.has_year_data
    }

    fn unused(&self) -> impl Iterator<Item = &Song> {
        self.all
            .iter()
            .filter(|song| !self.used.contains(&song.external_id))
    }
}
