use crate::{
    ai::ProviderKind,
    auction::ListingRequest,
    error::{GameError, GameResult},
    game::Game,
    lifecycle::BusinessSetup,
    scenario::ScenarioRecord,
    session::GameSession,
    types::Money,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// All player-issued commands.
/// Variants are only ever appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    // ── Session ───────────────────────────────────
    StartSession { name: String, language: String },
    ResumeSession { user_id: String },

    // ── Business ──────────────────────────────────
    CreateBusiness { setup: BusinessSetup },
    ResumeBusiness { business_id: String },
    ListBusinesses,

    // ── Scenarios ─────────────────────────────────
    NextScenario,
    ChooseOption { option: usize },
    BusinessAnalytics,
    Leaderboard { #[serde(default = "default_limit")] limit: usize },

    // ── Auctions ──────────────────────────────────
    RefreshAuctions,
    ListAuctions,
    PlaceBid { auction_id: String, amount: Money },
    ListItem { listing: ListingRequest },
    BidHistory,

    // ── Admin ─────────────────────────────────────
    Admin { password: String, action: AdminAction },
}

fn default_limit() -> usize {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AdminAction {
    Statistics,
    RecentUsers,
    ScenarioResults,
    DeleteScenarioResult { result_id: String },
    AddTemplate { business_type: String, record: ScenarioRecord },
    Templates,
    MarketPrices,
    UpdateMarketPrices { prices: BTreeMap<String, Money> },
    AiSettings,
    UpdateAiSettings { provider: ProviderKind, api_key_set: bool },
    TestConnection { provider: ProviderKind },
    Analytics,
    Export,
    Import { document: Value },
    CloseAuction { auction_id: String },
    CloseExpired,
}

fn session_of(session: &mut Option<GameSession>) -> GameResult<&mut GameSession> {
    session
        .as_mut()
        .ok_or_else(|| GameError::Other(anyhow::anyhow!("no session; send start_session first")))
}

impl Game {
    /// Apply one command and return its result as JSON.
    /// `session` is created by `start_session` / `resume_session`.
    pub fn execute(&mut self, session: &mut Option<GameSession>, cmd: PlayerCommand) -> GameResult<Value> {
        log::debug!("command: {cmd:?}");
        let reply = match cmd {
            PlayerCommand::StartSession { name, language } => {
                let s = self.start_session(&name, &language)?;
                let reply = serde_json::to_value(&s)?;
                *session = Some(s);
                reply
            }
            PlayerCommand::ResumeSession { user_id } => {
                let s = self.resume_session(&user_id)?;
                let reply = serde_json::to_value(&s)?;
                *session = Some(s);
                reply
            }
            PlayerCommand::CreateBusiness { setup } => {
                serde_json::to_value(self.create_business(session_of(session)?, setup)?)?
            }
            PlayerCommand::ResumeBusiness { business_id } => {
                serde_json::to_value(self.resume_business(session_of(session)?, &business_id)?)?
            }
            PlayerCommand::ListBusinesses => {
                serde_json::to_value(self.user_businesses(session_of(session)?))?
            }
            PlayerCommand::NextScenario => {
                serde_json::to_value(self.next_scenario(session_of(session)?)?)?
            }
            PlayerCommand::ChooseOption { option } => {
                serde_json::to_value(self.choose_option(session_of(session)?, option)?)?
            }
            PlayerCommand::BusinessAnalytics => {
                serde_json::to_value(self.business_analytics(session_of(session)?)?)?
            }
            PlayerCommand::Leaderboard { limit } => serde_json::to_value(self.leaderboard(limit))?,
            PlayerCommand::RefreshAuctions => json!({ "seeded": self.refresh_auctions()? }),
            PlayerCommand::ListAuctions => serde_json::to_value(self.active_auctions())?,
            PlayerCommand::PlaceBid { auction_id, amount } => {
                serde_json::to_value(self.place_bid(session_of(session)?, &auction_id, amount)?)?
            }
            PlayerCommand::ListItem { listing } => {
                json!({ "auction_id": self.list_item(session_of(session)?, listing)? })
            }
            PlayerCommand::BidHistory => serde_json::to_value(self.bid_history(session_of(session)?))?,
            PlayerCommand::Admin { password, action } => self.execute_admin(&password, action)?,
        };
        Ok(reply)
    }

    fn execute_admin(&self, password: &str, action: AdminAction) -> GameResult<Value> {
        let admin = self.admin(password)?;
        let reply = match action {
            AdminAction::Statistics => serde_json::to_value(admin.statistics())?,
            AdminAction::RecentUsers => serde_json::to_value(admin.recent_users())?,
            AdminAction::ScenarioResults => serde_json::to_value(admin.scenario_results())?,
            AdminAction::DeleteScenarioResult { result_id } => {
                admin.delete_scenario_result(&result_id)?;
                json!({ "deleted": result_id })
            }
            AdminAction::AddTemplate { business_type, record } => {
                json!({ "template_id": admin.add_template(&business_type, record)? })
            }
            AdminAction::Templates => serde_json::to_value(admin.templates())?,
            AdminAction::MarketPrices => serde_json::to_value(admin.market_prices())?,
            AdminAction::UpdateMarketPrices { prices } => {
                admin.update_market_prices(prices)?;
                serde_json::to_value(admin.market_prices())?
            }
            AdminAction::AiSettings => serde_json::to_value(admin.ai_settings())?,
            AdminAction::UpdateAiSettings { provider, api_key_set } => {
                admin.update_ai_settings(provider, api_key_set)?;
                serde_json::to_value(admin.ai_settings())?
            }
            AdminAction::TestConnection { provider } => serde_json::to_value(admin.test_connection(provider))?,
            AdminAction::Analytics => serde_json::to_value(admin.analytics())?,
            AdminAction::Export => serde_json::from_str(&admin.export_json()?)?,
            AdminAction::Import { document } => {
                admin.import_json(&document.to_string())?;
                serde_json::to_value(admin.statistics())?
            }
            AdminAction::CloseAuction { auction_id } => {
                admin.close_auction(&auction_id)?;
                json!({ "closed": [auction_id] })
            }
            AdminAction::CloseExpired => json!({ "closed": admin.close_expired_auctions()? }),
        };
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse_from_tagged_json() {
        let cmd: PlayerCommand = serde_json::from_str(
            r#"{"cmd": "create_business", "setup": {
                "business_type": "Retail Shop", "location": "Kondapur",
                "employment_mode": "Mixed (Self + Hired)"}}"#,
        )
        .unwrap();
        match cmd {
            PlayerCommand::CreateBusiness { setup } => {
                assert_eq!(setup.revenue_goal, 50_000);
                assert_eq!(setup.investment_priorities, vec!["Working Capital".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }

        let cmd: PlayerCommand = serde_json::from_str(
            r#"{"cmd": "admin", "password": "admin123", "action": {"action": "test_connection", "provider": "anthropic"}}"#,
        )
        .unwrap();
        assert!(matches!(
            cmd,
            PlayerCommand::Admin { action: AdminAction::TestConnection { provider: ProviderKind::Anthropic }, .. }
        ));
    }

    #[test]
    fn gameplay_without_session_is_an_error() {
        let mut game = Game::build_test().unwrap();
        let mut session = None;
        assert!(game.execute(&mut session, PlayerCommand::NextScenario).is_err());
        game.execute(
            &mut session,
            PlayerCommand::StartSession { name: "Lakshmi".into(), language: "English".into() },
        )
        .unwrap();
        assert!(session.is_some());
    }

    #[test]
    fn play_and_inspect_through_commands() {
        let mut game = Game::build_test().unwrap();
        let mut session = None;
        let run = |game: &mut Game, session: &mut Option<GameSession>, json: &str| {
            game.execute(session, serde_json::from_str(json).unwrap()).unwrap()
        };
        run(&mut game, &mut session, r#"{"cmd": "start_session", "name": "Ravi", "language": "English"}"#);
        let business = run(
            &mut game,
            &mut session,
            r#"{"cmd": "create_business", "setup": {"business_type": "Dairy Farming",
                "location": "Peerancheru", "employment_mode": "Self-operated"}}"#,
        );
        assert_eq!(business["capital"], 50_000);

        let scenario = run(&mut game, &mut session, r#"{"cmd": "next_scenario"}"#);
        assert_eq!(scenario["source"], "fallback");
        let outcome = run(&mut game, &mut session, r#"{"cmd": "choose_option", "option": 2}"#);
        assert_eq!(outcome["score"], 81);
        assert_eq!(outcome["tier"], "excellent");

        let stats = run(
            &mut game,
            &mut session,
            r#"{"cmd": "admin", "password": "admin123", "action": {"action": "statistics"}}"#,
        );
        assert_eq!(stats["total_scenarios"], 1);
        let denied = game.execute(
            &mut session,
            serde_json::from_str(r#"{"cmd": "admin", "password": "nope", "action": {"action": "export"}}"#).unwrap(),
        );
        assert!(denied.is_err());
    }
}
