use super::{GameDocument, GameStore};
use crate::{
    error::GameResult,
    types::{now, Timestamp, UserId},
};
use serde::{Deserialize, Serialize};

/// The leaderboard never holds more entries than this.
pub const LEADERBOARD_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id:       UserId,
    pub user_name:     String,
    pub score:         i64,
    pub business_type: String,
    #[serde(deserialize_with = "crate::types::de_timestamp")]
    pub timestamp:     Timestamp,
}

impl GameDocument {
    /// Append an entry, re-sort descending by score and keep the top
    /// `LEADERBOARD_CAPACITY`. The sort is stable: among equal scores
    /// earlier entries stay ahead.
    pub fn push_leaderboard(
        &mut self,
        user_id: &str,
        score: i64,
        business_type: &str,
        at: Timestamp,
    ) {
        let user_name = self
            .users
            .get(user_id)
            .map(|u| u.name.clone())
            .unwrap_or_else(|| "Unknown".to_string());
        self.leaderboard.push(LeaderboardEntry {
            user_id: user_id.to_string(),
            user_name,
            score,
            business_type: business_type.to_string(),
            timestamp: at,
        });
        self.leaderboard.sort_by(|a, b| b.score.cmp(&a.score));
        self.leaderboard.truncate(LEADERBOARD_CAPACITY);
    }
}

impl GameStore {
    pub fn update_leaderboard(&self, user_id: &str, score: i64, business_type: &str) -> GameResult<()> {
        self.transact(|doc| {
            doc.push_leaderboard(user_id, score, business_type, now());
            Ok(())
        })
    }

    pub fn leaderboard(&self, limit: usize) -> Vec<LeaderboardEntry> {
        self.view(|doc| doc.leaderboard.iter().take(limit).cloned().collect())
    }
}
