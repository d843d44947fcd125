use super::{GameDocument, GameStore};
use crate::{
    ai::ProviderKind,
    error::{GameResult, ValidationError},
    scenario::ScenarioRecord,
    types::{now, Money, Timestamp},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Operator-authored settings. Unknown keys survive a load/persist cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminSettings {
    #[serde(default)]
    pub scenario_templates:  Vec<ScenarioTemplate>,
    #[serde(default, deserialize_with = "crate::types::de_money_map")]
    pub market_prices:       BTreeMap<String, Money>,
    #[serde(default)]
    pub event_probabilities: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_provider:         Option<ProviderKind>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub api_key_set:         bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::types::de_opt_timestamp"
    )]
    pub price_updated_at:    Option<Timestamp>,
    #[serde(flatten)]
    pub extra:               serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioTemplate {
    /// `tmpl_<n>`, numbered from 1 in insertion order.
    pub id:            String,
    #[serde(deserialize_with = "crate::types::de_timestamp")]
    pub created_at:    Timestamp,
    pub business_type: String,
    #[serde(flatten)]
    pub record:        ScenarioRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStatistics {
    pub total_users:        usize,
    pub total_businesses:   usize,
    pub total_scenarios:    usize,
    pub active_auctions:    usize,
    pub total_games_played: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessAnalytics {
    pub total_rounds:   usize,
    pub average_score:  f64,
    pub decisions_made: usize,
    /// Best single-round score; None before the first decision.
    pub best_round:     Option<u32>,
    pub worst_round:    Option<u32>,
    pub total_score:    i64,
}

impl GameDocument {
    pub fn statistics(&self) -> StoreStatistics {
        StoreStatistics {
            total_users:        self.users.len(),
            total_businesses:   self.businesses.len(),
            total_scenarios:    self.scenarios.len(),
            active_auctions:    self.active_auction_count(),
            total_games_played: self.users.values().map(|u| u.games_played as u64).sum(),
        }
    }

    pub fn business_analytics(&self, business_id: &str) -> BusinessAnalytics {
        let scores: Vec<u32> = self
            .business_results(business_id)
            .iter()
            .map(|s| s.score)
            .collect();
        let total: i64 = scores.iter().map(|&s| s as i64).sum();
        BusinessAnalytics {
            total_rounds:   scores.len(),
            average_score:  if scores.is_empty() { 0.0 } else { total as f64 / scores.len() as f64 },
            decisions_made: scores.len(),
            best_round:     scores.iter().copied().max(),
            worst_round:    scores.iter().copied().min(),
            total_score:    total,
        }
    }

    /// Count of businesses per business type.
    pub fn business_type_distribution(&self) -> BTreeMap<String, usize> {
        let mut dist = BTreeMap::new();
        for b in self.businesses.values() {
            *dist.entry(b.business_type.clone()).or_insert(0) += 1;
        }
        dist
    }
}

impl GameStore {
    pub fn admin_settings(&self) -> AdminSettings {
        self.view(|doc| doc.admin_settings.clone())
    }

    pub fn update_admin_settings(&self, f: impl FnOnce(&mut AdminSettings)) -> GameResult<()> {
        self.transact(|doc| {
            f(&mut doc.admin_settings);
            Ok(())
        })
    }

    pub fn add_scenario_template(
        &self,
        business_type: &str,
        record: ScenarioRecord,
    ) -> GameResult<String> {
        record.validate().map_err(ValidationError::InvalidScenario)?;
        let id = self.transact(|doc| {
            let templates = &mut doc.admin_settings.scenario_templates;
            let id = format!("tmpl_{}", templates.len() + 1);
            templates.push(ScenarioTemplate {
                id: id.clone(),
                created_at: now(),
                business_type: business_type.to_string(),
                record,
            });
            Ok(id)
        })?;
        log::info!("admin: added scenario template {id} ({business_type})");
        Ok(id)
    }

    pub fn scenario_templates(&self) -> Vec<ScenarioTemplate> {
        self.view(|doc| doc.admin_settings.scenario_templates.clone())
    }

    /// Merge `prices` into the stored market prices and stamp the update.
    pub fn update_market_prices(&self, prices: BTreeMap<String, Money>) -> GameResult<()> {
        self.transact(|doc| {
            doc.admin_settings.market_prices.extend(prices);
            doc.admin_settings.price_updated_at = Some(now());
            Ok(())
        })
    }

    pub fn market_prices(&self) -> BTreeMap<String, Money> {
        self.view(|doc| doc.admin_settings.market_prices.clone())
    }

    pub fn statistics(&self) -> StoreStatistics {
        self.view(|doc| doc.statistics())
    }

    pub fn business_analytics(&self, business_id: &str) -> BusinessAnalytics {
        self.view(|doc| doc.business_analytics(business_id))
    }

    /// The whole document as pretty-printed JSON.
    pub fn export_json(&self) -> GameResult<String> {
        Ok(self.view(|doc| serde_json::to_string_pretty(doc))?)
    }

    /// Replace the whole document. A malformed import changes nothing.
    pub fn import_json(&self, json: &str) -> GameResult<()> {
        let mut doc: GameDocument = serde_json::from_str(json)?;
        doc.restore_keys();
        log::info!(
            "admin: importing document with {} users, {} businesses",
            doc.users.len(),
            doc.businesses.len()
        );
        self.write(doc);
        Ok(())
    }
}
