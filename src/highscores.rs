//! High score leaderboard system
//!
//! One top-10 list per play mode, sorted descending. Persisted through the
//! host's key-value store.

use serde::{Deserialize, Serialize};

use crate::persistence::KeyValueStore;
use crate::session::PlayMode;

/// Maximum number of high scores to keep per mode
pub const MAX_HIGH_SCORES: usize = 10;

/// High score lists for both modes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HighScores {
    pub progression: Vec<i64>,
    pub timed_attempts: Vec<i64>,
}

impl HighScores {
    const STORAGE_KEY: &'static str = "astro_fling_highscores";

    /// Create empty leaderboard
    pub fn new() -> Self {
        Self::default()
    }

    /// Scores for a mode, best first
    pub fn scores(&self, mode: PlayMode) -> &[i64] {
        match mode {
            PlayMode::Progression => &self.progression,
            PlayMode::TimedAttempts => &self.timed_attempts,
        }
    }

    fn scores_mut(&mut self, mode: PlayMode) -> &mut Vec<i64> {
        match mode {
            PlayMode::Progression => &mut self.progression,
            PlayMode::TimedAttempts => &mut self.timed_attempts,
        }
    }

    /// Whether a score may be recorded at all in a mode
    ///
    /// Progression never records zero or less; Timed-Attempts accepts zero.
    pub fn accepts(mode: PlayMode, score: i64) -> bool {
        match mode {
            PlayMode::Progression => score > 0,
            PlayMode::TimedAttempts => score >= 0,
        }
    }

    /// Add a score: append, sort descending, truncate.
    /// Returns the rank achieved (1-indexed) or None if it didn't make the list
    pub fn add_score(&mut self, mode: PlayMode, score: i64) -> Option<usize> {
        if !Self::accepts(mode, score) {
            return None;
        }

        let list = self.scores_mut(mode);
        list.push(score);
        list.sort_unstable_by(|a, b| b.cmp(a));
        list.truncate(MAX_HIGH_SCORES);

        // Ties rank at the first equal entry
        list.iter().position(|&s| s == score).map(|i| i + 1)
    }

    /// Get the top score for a mode (if any)
    pub fn top_score(&self, mode: PlayMode) -> Option<i64> {
        self.scores(mode).first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.progression.is_empty() && self.timed_attempts.is_empty()
    }

    /// Drop entries that could not have been recorded and restore ordering
    fn normalized(mut self) -> Self {
        for mode in [PlayMode::Progression, PlayMode::TimedAttempts] {
            let list = self.scores_mut(mode);
            list.retain(|&s| Self::accepts(mode, s));
            list.sort_unstable_by(|a, b| b.cmp(a));
            list.truncate(MAX_HIGH_SCORES);
        }
        self
    }

    /// Load high scores from the store
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.load_json::<HighScores>(Self::STORAGE_KEY) {
            Ok(Some(scores)) => {
                let scores = scores.normalized();
                log::info!(
                    "Loaded high scores ({} progression, {} timed)",
                    scores.progression.len(),
                    scores.timed_attempts.len()
                );
                scores
            }
            Ok(None) => {
                log::info!("No high scores found, starting fresh");
                Self::new()
            }
            Err(e) => {
                log::warn!("High scores unreadable ({e}), starting fresh");
                Self::new()
            }
        }
    }

    /// Save high scores to the store
    pub fn save(&self, store: &mut dyn KeyValueStore) {
        match store.save_json(Self::STORAGE_KEY, self) {
            Ok(()) => log::info!("High scores saved"),
            Err(e) => log::warn!("Failed to save high scores: {e}"),
        }
    }
}
