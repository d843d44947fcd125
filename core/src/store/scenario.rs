use super::{GameDocument, GameStore};
use crate::{
    error::{GameError, GameResult},
    types::{new_id, BusinessId, ScenarioResultId, Timestamp},
};
use serde::{Deserialize, Serialize};

/// One scored decision. Immutable once saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    #[serde(default)]
    pub result_id:       ScenarioResultId,
    pub business_id:     BusinessId,
    pub round:           u32,
    /// 1-based option index.
    pub option_selected: usize,
    pub score:           u32,
    pub risk:            u32,
    pub reward:          u32,
    pub realism:         u32,
    #[serde(default)]
    pub scenario:        String,
    #[serde(default)]
    pub option_text:     String,
    #[serde(deserialize_with = "crate::types::de_timestamp")]
    pub timestamp:       Timestamp,
}

impl GameDocument {
    pub fn insert_scenario_result(&mut self, mut result: ScenarioResult) -> ScenarioResultId {
        let result_id = new_id("scen", result.timestamp);
        result.result_id = result_id.clone();
        self.scenarios.insert(result_id.clone(), result);
        result_id
    }

    /// Results of one business in round order.
    pub fn business_results(&self, business_id: &str) -> Vec<&ScenarioResult> {
        let mut results: Vec<&ScenarioResult> = self
            .scenarios
            .values()
            .filter(|s| s.business_id == business_id)
            .collect();
        results.sort_by_key(|s| (s.round, s.timestamp));
        results
    }
}

impl GameStore {
    pub fn save_scenario_result(&self, result: ScenarioResult) -> GameResult<ScenarioResultId> {
        self.transact(|doc| Ok(doc.insert_scenario_result(result)))
    }

    pub fn business_scenarios(&self, business_id: &str) -> Vec<ScenarioResult> {
        self.view(|doc| doc.business_results(business_id).into_iter().cloned().collect())
    }

    /// Oldest results first, at most `limit`.
    pub fn list_scenario_results(&self, limit: usize) -> Vec<ScenarioResult> {
        self.view(|doc| {
            let mut results: Vec<ScenarioResult> = doc.scenarios.values().cloned().collect();
            results.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
            results.truncate(limit);
            results
        })
    }

    pub fn delete_scenario_result(&self, result_id: &str) -> GameResult<()> {
        self.transact(|doc| {
            doc.scenarios
                .remove(result_id)
                .map(|_| ())
                .ok_or_else(|| GameError::not_found("scenario result", result_id))
        })?;
        log::info!("scenario: deleted result {result_id}");
        Ok(())
    }
}
