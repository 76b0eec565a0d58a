use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The leaderboard never holds more than this many entries.
pub const MAX_LEADERBOARD_ENTRIES: usize = 10;

/// One finished quiz on the local leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
    pub recorded_at: DateTime<Utc>,
}

/// Bounded local leaderboard, best percentage first.
///
/// Appended to by every finished session but owned by none of them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Leaderboard(Vec<LeaderboardEntry>);

impl Leaderboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Insert an entry, keeping descending percentage order and the size
    /// bound. Ties keep the earlier entry first.
    pub fn record(&mut self, entry: LeaderboardEntry) {
        self.0.push(entry);
        self.0.sort_by(|a, b| b.percentage.cmp(&a.percentage));
        self.0.truncate(MAX_LEADERBOARD_ENTRIES);
    }
}
