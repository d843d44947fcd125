use crate::{
    ai::ScenarioSource,
    error::{GameResult, ValidationError},
    scenario::ScenarioRecord,
    types::{BusinessId, UserId},
};
use serde::{Deserialize, Serialize};

/// The scenario currently on screen for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveScenario {
    pub business_id: BusinessId,
    pub round:       u32,
    pub record:      ScenarioRecord,
    pub source:      ScenarioSource,
}

/// Per-player context passed to every gameplay operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    pub user_id:          UserId,
    /// Display name of the language, e.g. "Telugu".
    pub language:         String,
    pub business_id:      Option<BusinessId>,
    pub current_scenario: Option<ActiveScenario>,
}

impl GameSession {
    pub fn new(user_id: UserId, language: &str) -> Self {
        Self {
            user_id,
            language: language.to_string(),
            business_id: None,
            current_scenario: None,
        }
    }

    pub fn business_id(&self) -> GameResult<&BusinessId> {
        self.business_id
            .as_ref()
            .ok_or_else(|| ValidationError::NoBusinessSelected.into())
    }

    /// Switch to `business_id`, dropping any scenario of another business.
    pub fn select_business(&mut self, business_id: BusinessId) {
        if self
            .current_scenario
            .as_ref()
            .is_some_and(|s| s.business_id != business_id)
        {
            self.current_scenario = None;
        }
        self.business_id = Some(business_id);
    }
}
