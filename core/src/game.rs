//! The game facade: the one entry point gameplay callers use.
//!
//! Every operation takes the caller's `GameSession`, reads or mutates
//! the store through a single transaction, and returns a typed result.
//! The scenario provider is always called outside the store lock.

use crate::{
    admin::AdminPanel,
    ai::{BusinessContext, ScenarioProvider},
    auction::{self, BidHistoryEntry, BidReceipt, ListingRequest},
    config::GameConfig,
    error::{GameError, GameResult, ValidationError},
    lifecycle::{self, BusinessSetup, Decision, DecisionOutcome},
    rng::{GameRng, RngSlot},
    scenario::{roll_dynamic_event, OPTION_COUNT},
    scoring::Scorer,
    session::{ActiveScenario, GameSession},
    store::{Auction, Business, BusinessAnalytics, GameStore, LeaderboardEntry},
    types::{now, AuctionId},
};

pub struct Game {
    config:      GameConfig,
    store:       GameStore,
    provider:    ScenarioProvider,
    scorer:      Scorer,
    auction_rng: GameRng,
    event_rng:   GameRng,
}

impl Game {
    pub fn new(config: GameConfig, store: GameStore, provider: ScenarioProvider, seed: u64) -> Self {
        let scorer = Scorer::new(&config.scoring);
        Self {
            config,
            store,
            provider,
            scorer,
            auction_rng: GameRng::new(seed, RngSlot::Auction),
            event_rng: GameRng::new(seed, RngSlot::Events),
        }
    }

    /// Wire a game from the data/ directory and a store path.
    /// `.db` / `.sqlite` paths use the SQLite backend, anything else a
    /// JSON file. The AI provider is the one saved in the admin
    /// settings, else the configured default.
    pub fn open(data_dir: &str, store_path: &str, seed: u64) -> anyhow::Result<Self> {
        let config = GameConfig::load(data_dir)?;
        let store = if store_path.ends_with(".db") || store_path.ends_with(".sqlite") {
            GameStore::open_sqlite(store_path)?
        } else {
            GameStore::open_json(store_path)?
        };
        let kind = store
            .admin_settings()
            .ai_provider
            .unwrap_or(config.ai.default_provider);
        let provider = ScenarioProvider::from_env(&config.ai, kind, &config.game.base_language);
        log::info!(
            "game: store={store_path} provider={kind} credential={}",
            provider.has_credential()
        );
        Ok(Self::new(config, store, provider, seed))
    }

    /// In-memory store, test config, fallback-only provider, seed 42.
    pub fn build_test() -> GameResult<Self> {
        let config = GameConfig::default_test();
        let provider = ScenarioProvider::fallback_only(
            config.ai.default_provider,
            &config.game.base_language,
        );
        Ok(Self::new(config, GameStore::in_memory()?, provider, 42))
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut GameConfig {
        &mut self.config
    }

    pub fn store(&self) -> &GameStore {
        &self.store
    }

    pub fn provider(&self) -> &ScenarioProvider {
        &self.provider
    }

    pub fn set_provider(&mut self, provider: ScenarioProvider) {
        log::info!("game: scenario provider set to {}", provider.kind());
        self.provider = provider;
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    // ── Sessions and businesses ────────────────────────────────────

    /// Create the player's user record and open a session.
    pub fn start_session(&self, name: &str, language: &str) -> GameResult<GameSession> {
        if !self.config.game.languages.contains_key(language) {
            return Err(ValidationError::UnsupportedLanguage(language.to_string()).into());
        }
        let user_id = self.store.create_user(name, language)?;
        Ok(GameSession::new(user_id, language))
    }

    /// Reattach to an existing user.
    pub fn resume_session(&self, user_id: &str) -> GameResult<GameSession> {
        let user = self
            .store
            .get_user(user_id)
            .ok_or_else(|| GameError::not_found("user", user_id))?;
        Ok(GameSession::new(user.user_id, &user.language))
    }

    pub fn create_business(&self, session: &mut GameSession, setup: BusinessSetup) -> GameResult<Business> {
        let business = lifecycle::new_business(&self.config, &session.user_id, setup, &session.language, now())
            .inspect_err(|e| log::warn!("business setup rejected: {e}"))?;
        let business_id = self.store.create_business(business)?;
        session.select_business(business_id.clone());
        self.store
            .get_business(&business_id)
            .ok_or_else(|| GameError::not_found("business", business_id))
    }

    /// Continue one of the session user's businesses.
    pub fn resume_business(&self, session: &mut GameSession, business_id: &str) -> GameResult<Business> {
        let business = self
            .store
            .get_business(business_id)
            .filter(|b| b.user_id == session.user_id)
            .ok_or_else(|| GameError::not_found("business", business_id))?;
        session.select_business(business.business_id.clone());
        Ok(business)
    }

    pub fn user_businesses(&self, session: &GameSession) -> Vec<Business> {
        self.store.user_businesses(&session.user_id)
    }

    pub fn current_business(&self, session: &GameSession) -> GameResult<Business> {
        let business_id = session.business_id()?;
        self.store
            .get_business(business_id)
            .ok_or_else(|| GameError::not_found("business", business_id.as_str()))
    }

    // ── Scenarios ──────────────────────────────────────────────────

    pub fn business_context(business: &Business) -> BusinessContext {
        BusinessContext {
            business_type:   business.business_type.clone(),
            location:        business.location.clone(),
            capital:         business.capital,
            resources:       business.resources.clone(),
            employment_mode: business.employment_mode.label().to_string(),
            round:           business.current_round,
        }
    }

    /// The scenario for the current round. Reuses the one already on
    /// screen for this round; otherwise generates (AI or fallback),
    /// may attach a dynamic event, and localizes it.
    pub fn next_scenario(&mut self, session: &mut GameSession) -> GameResult<ActiveScenario> {
        let business = self.current_business(session)?;
        if !business.is_active() {
            return Err(ValidationError::BusinessCompleted(business.business_id).into());
        }
        if let Some(active) = session.current_scenario.as_ref().filter(|s| {
            s.business_id == business.business_id && s.round == business.current_round
        }) {
            return Ok(active.clone());
        }

        let generated = self.provider.generate(&Self::business_context(&business));
        let mut record = generated.record;
        if self.config.game.enable_dynamic_events && record.event.is_none() {
            record.event = roll_dynamic_event(&self.config.dynamic_events, &mut self.event_rng);
            if let Some(event) = &record.event {
                log::info!("business={} round={} event: {}", business.business_id, business.current_round, event.description);
            }
        }
        if session.language != self.config.game.base_language {
            let language = session.language.clone();
            record = record.map_text(|text| self.provider.translate(text, &language));
        }

        let active = ActiveScenario {
            business_id: business.business_id,
            round:       business.current_round,
            record,
            source:      generated.source,
        };
        session.current_scenario = Some(active.clone());
        Ok(active)
    }

    /// Score the chosen 1-based option of the scenario on screen and
    /// record it. The scenario is consumed only when recording succeeds.
    pub fn choose_option(&self, session: &mut GameSession, option: usize) -> GameResult<DecisionOutcome> {
        let active = session
            .current_scenario
            .as_ref()
            .ok_or(ValidationError::NoScenario)?;
        if !(1..=OPTION_COUNT).contains(&option) {
            return Err(ValidationError::InvalidOption { chosen: option, available: OPTION_COUNT }.into());
        }
        let record = &active.record;
        let decision = Decision {
            business_id: active.business_id.clone(),
            option,
            metrics:     record.metrics(option),
            scenario:    record.scenario.clone(),
            option_text: record.options.get(option - 1).cloned().unwrap_or_default(),
            consequence: record.consequences.get(option - 1).cloned(),
        };
        let settings = &self.config.game;
        let outcome = self
            .store
            .transact(|doc| lifecycle::record_decision(doc, &self.scorer, settings, decision, now()))
            .inspect_err(|e| log::warn!("decision rejected: {e}"))?;
        session.current_scenario = None;
        Ok(outcome)
    }

    pub fn business_analytics(&self, session: &GameSession) -> GameResult<BusinessAnalytics> {
        Ok(self.store.business_analytics(session.business_id()?))
    }

    pub fn leaderboard(&self, limit: usize) -> Vec<LeaderboardEntry> {
        self.store.leaderboard(limit)
    }

    // ── Auctions ───────────────────────────────────────────────────

    /// Close expired listings, then top up sample listings.
    /// Returns the ids of newly seeded listings.
    pub fn refresh_auctions(&mut self) -> GameResult<Vec<AuctionId>> {
        let at = now();
        let settings = &self.config.auction;
        let catalog = &self.config.auction_items;
        let rng = &mut self.auction_rng;
        self.store.transact(|doc| {
            auction::close_expired(doc, at);
            Ok(auction::seed_samples(doc, settings, catalog, rng, at))
        })
    }

    pub fn active_auctions(&self) -> Vec<Auction> {
        self.store.active_auctions()
    }

    /// Bid with the session's current business.
    pub fn place_bid(&self, session: &GameSession, auction_id: &str, amount: i64) -> GameResult<BidReceipt> {
        let business_id = session.business_id()?;
        self.store
            .transact(|doc| auction::place_bid(doc, &self.config.auction, auction_id, business_id, amount, now()))
            .inspect_err(|e| log::warn!("auction={auction_id} bid={amount} rejected: {e}"))
    }

    /// List an item for sale on behalf of the session user.
    pub fn list_item(&self, session: &GameSession, req: ListingRequest) -> GameResult<AuctionId> {
        let listing = auction::new_listing(&self.config.auction, Some(session.user_id.clone()), req, now())?;
        self.store.create_auction(listing)
    }

    pub fn bid_history(&self, session: &GameSession) -> Vec<BidHistoryEntry> {
        self.store.view(|doc| auction::bid_history(doc, &session.user_id))
    }

    // ── Admin ──────────────────────────────────────────────────────

    /// Open the admin surface. The only check is the configured password.
    pub fn admin(&self, password: &str) -> GameResult<AdminPanel<'_>> {
        if password != self.config.game.admin_password {
            log::warn!("admin: rejected password");
            return Err(ValidationError::InvalidPassword.into());
        }
        Ok(AdminPanel::new(self))
    }
}
