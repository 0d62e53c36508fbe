//! High score leaderboard
//!
//! Keeps the top [`MAX_HIGH_SCORES`] records ordered by score, newest first on
//! ties. Local and remote lists merge into the same shape.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 25;

/// A single persisted score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub name: String,
    pub score: u64,
    /// Unix timestamp (ms) when achieved
    pub timestamp: u64,
}

impl ScoreRecord {
    pub fn new(name: impl Into<String>, score: u64, timestamp: u64) -> Self {
        Self {
            name: name.into(),
            score,
            timestamp,
        }
    }

    /// Score descending, then most recent first
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then_with(|| other.timestamp.cmp(&self.timestamp))
    }
}

/// Current time as Unix milliseconds
pub fn now_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// High score leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Leaderboard {
    pub entries: Vec<ScoreRecord>,
}

impl Leaderboard {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build from an arbitrary list (sorted, deduplicated, truncated)
    pub fn from_records(records: Vec<ScoreRecord>) -> Self {
        let mut board = Self { entries: records };
        board.normalize();
        board
    }

    fn normalize(&mut self) {
        self.entries
            .sort_by(|a, b| a.rank_cmp(b).then_with(|| a.name.cmp(&b.name)));
        self.entries.dedup();
        self.entries.truncate(MAX_HIGH_SCORES);
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    ///
    /// A new score ranks above existing equal scores since it is more recent.
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score >= e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add a record; returns the rank achieved (1-indexed) or None if it didn't qualify
    pub fn add(&mut self, record: ScoreRecord) -> Option<usize> {
        if !self.qualifies(record.score) {
            return None;
        }

        let pos = self
            .entries
            .iter()
            .position(|e| record.rank_cmp(e) == Ordering::Less)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, record);
        self.entries.truncate(MAX_HIGH_SCORES);

        Some(pos + 1)
    }

    /// Union with `other`, dropping exact duplicates
    pub fn merge(&mut self, other: impl IntoIterator<Item = ScoreRecord>) {
        self.entries.extend(other);
        self.normalize();
    }

    /// The first `limit` records
    pub fn top(&self, limit: usize) -> &[ScoreRecord] {
        &self.entries[..limit.min(self.entries.len())]
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }
}
