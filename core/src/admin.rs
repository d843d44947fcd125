//! Operator surface: inspect and edit stored game data.
//!
//! Obtained through `Game::admin(password)`.

use crate::{
    ai::{ConnectionReport, ProviderKind, ScenarioProvider},
    auction,
    error::{GameResult, ValidationError},
    game::Game,
    scenario::ScenarioRecord,
    store::{LeaderboardEntry, ScenarioResult, ScenarioTemplate, StoreStatistics, User},
    types::{now, AuctionId, Money},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const RECENT_USERS: usize = 10;
pub const RESULT_PAGE: usize = 20;
pub const TOP_PERFORMERS: usize = 20;

/// Market price keys offered by the price editor.
pub const MARKET_PRICE_KEYS: [&str; 6] = [
    "dairy_cow",
    "goat",
    "chickens_10",
    "seeds_50kg",
    "fertilizer_100kg",
    "feed_500kg",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiSettings {
    pub provider:    ProviderKind,
    pub api_key_set: bool,
    pub model:       String,
    pub api_base:    String,
    pub env_key:     String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    pub business_types: BTreeMap<String, usize>,
    pub top_performers: Vec<LeaderboardEntry>,
}

pub struct AdminPanel<'a> {
    game: &'a Game,
}

impl<'a> AdminPanel<'a> {
    pub(crate) fn new(game: &'a Game) -> Self {
        Self { game }
    }

    pub fn statistics(&self) -> StoreStatistics {
        self.game.store().statistics()
    }

    pub fn recent_users(&self) -> Vec<User> {
        self.game.store().recent_users(RECENT_USERS)
    }

    pub fn scenario_results(&self) -> Vec<ScenarioResult> {
        self.game.store().list_scenario_results(RESULT_PAGE)
    }

    pub fn delete_scenario_result(&self, result_id: &str) -> GameResult<()> {
        self.game.store().delete_scenario_result(result_id)
    }

    pub fn add_template(&self, business_type: &str, record: ScenarioRecord) -> GameResult<String> {
        if self.game.config().business_type(business_type).is_none() {
            return Err(ValidationError::UnknownBusinessType(business_type.to_string()).into());
        }
        self.game.store().add_scenario_template(business_type, record)
    }

    pub fn templates(&self) -> Vec<ScenarioTemplate> {
        self.game.store().scenario_templates()
    }

    pub fn market_prices(&self) -> BTreeMap<String, Money> {
        self.game.store().market_prices()
    }

    /// Merge new prices. Negative prices are rejected.
    pub fn update_market_prices(&self, prices: BTreeMap<String, Money>) -> GameResult<()> {
        if let Some((key, &value)) = prices.iter().find(|(_, &v)| v < 0) {
            log::warn!("admin: rejected negative price for {key}");
            return Err(ValidationError::OutOfRange {
                field: "market price",
                min: 0,
                max: Money::MAX,
                value,
            }
            .into());
        }
        log::info!("admin: updating {} market price(s)", prices.len());
        self.game.store().update_market_prices(prices)
    }

    /// The saved provider (or the configured default) and its endpoint.
    pub fn ai_settings(&self) -> AiSettings {
        let saved = self.game.store().admin_settings();
        let ai = &self.game.config().ai;
        let provider = saved.ai_provider.unwrap_or(ai.default_provider);
        let config = ai.provider(provider);
        AiSettings {
            provider,
            api_key_set: saved.api_key_set,
            model:       config.map(|c| c.model.clone()).unwrap_or_default(),
            api_base:    config.map(|c| c.api_base.clone()).unwrap_or_default(),
            env_key:     config.map(|c| c.env_key.clone()).unwrap_or_default(),
        }
    }

    /// Save the provider choice. Takes effect the next time a game opens.
    pub fn update_ai_settings(&self, provider: ProviderKind, api_key_set: bool) -> GameResult<()> {
        self.game.store().update_admin_settings(|s| {
            s.ai_provider = Some(provider);
            s.api_key_set = api_key_set;
        })?;
        log::info!("admin: AI provider set to {provider} (key set: {api_key_set})");
        Ok(())
    }

    /// Probe `provider` with the fixed test context. Uses the live
    /// provider when it matches, else resolves one from the environment.
    pub fn test_connection(&self, provider: ProviderKind) -> ConnectionReport {
        if self.game.provider().kind() == provider {
            return self.game.provider().test_connection();
        }
        let config = self.game.config();
        ScenarioProvider::from_env(&config.ai, provider, &config.game.base_language).test_connection()
    }

    pub fn analytics(&self) -> Analytics {
        Analytics {
            business_types: self.game.store().view(|doc| doc.business_type_distribution()),
            top_performers: self.game.store().leaderboard(TOP_PERFORMERS),
        }
    }

    pub fn export_json(&self) -> GameResult<String> {
        self.game.store().export_json()
    }

    pub fn import_json(&self, json: &str) -> GameResult<()> {
        self.game.store().import_json(json)
    }

    pub fn close_auction(&self, auction_id: &str) -> GameResult<()> {
        self.game.store().close_auction(auction_id)
    }

    pub fn close_expired_auctions(&self) -> GameResult<Vec<AuctionId>> {
        let at = now();
        self.game.store().transact(|doc| Ok(auction::close_expired(doc, at)))
    }
}
