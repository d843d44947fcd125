use super::{GameDocument, GameStore};
use crate::{
    error::{GameError, GameResult, ValidationError},
    types::{new_id, now, Timestamp, UserId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub user_id:      UserId,
    pub name:         String,
    pub language:     String,
    #[serde(deserialize_with = "crate::types::de_timestamp")]
    pub created_at:   Timestamp,
    pub total_score:  i64,
    pub games_played: u32,
    #[serde(default)]
    pub achievements: Vec<String>,
}

impl GameDocument {
    pub fn insert_user(&mut self, name: &str, language: &str, at: Timestamp) -> GameResult<UserId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingField { field: "name" }.into());
        }
        let user_id = new_id("user", at);
        self.users.insert(
            user_id.clone(),
            User {
                user_id: user_id.clone(),
                name: name.to_string(),
                language: language.to_string(),
                created_at: at,
                total_score: 0,
                games_played: 0,
                achievements: Vec::new(),
            },
        );
        Ok(user_id)
    }

    pub fn user(&self, user_id: &str) -> GameResult<&User> {
        self.users
            .get(user_id)
            .ok_or_else(|| GameError::not_found("user", user_id))
    }

    pub fn user_mut(&mut self, user_id: &str) -> GameResult<&mut User> {
        self.users
            .get_mut(user_id)
            .ok_or_else(|| GameError::not_found("user", user_id))
    }

    /// Add a decision score to the user's total and count one more game.
    pub fn add_user_score(&mut self, user_id: &str, score: i64) -> GameResult<()> {
        let user = self.user_mut(user_id)?;
        user.total_score += score;
        user.games_played += 1;
        Ok(())
    }
}

impl GameStore {
    pub fn create_user(&self, name: &str, language: &str) -> GameResult<UserId> {
        let user_id = self.transact(|doc| doc.insert_user(name, language, now()))?;
        log::info!("user: created {user_id} ({language})");
        Ok(user_id)
    }

    pub fn get_user(&self, user_id: &str) -> Option<User> {
        self.view(|doc| doc.users.get(user_id).cloned())
    }

    pub fn update_user_score(&self, user_id: &str, score: i64) -> GameResult<()> {
        self.transact(|doc| doc.add_user_score(user_id, score))
    }

    /// Most recently created users first.
    pub fn recent_users(&self, limit: usize) -> Vec<User> {
        self.view(|doc| {
            let mut users: Vec<User> = doc.users.values().cloned().collect();
            users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            users.truncate(limit);
            users
        })
    }
}
