//! Operator surface: password gate, statistics, templates, prices,
//! analytics and result maintenance.

use ruralsim_core::{
    ai::{ProviderKind, ScenarioSource},
    error::ValidationError,
    game::Game,
    lifecycle::BusinessSetup,
    scenario::fallback_scenario,
    store::EmploymentMode,
};
use std::collections::BTreeMap;

fn played(game: &mut Game, name: &str, business_type: &str, decisions: usize) {
    let mut session = game.start_session(name, "English").expect("session");
    game.create_business(
        &mut session,
        BusinessSetup::new(business_type, "Village", EmploymentMode::SelfOperated),
    )
    .expect("business");
    for _ in 0..decisions {
        game.next_scenario(&mut session).expect("scenario");
        game.choose_option(&mut session, 2).expect("choose");
    }
}

#[test]
fn wrong_password_is_rejected() {
    let game = Game::build_test().expect("game");
    let err = game.admin("letmein").err().expect("rejected");
    assert_eq!(err.as_validation(), Some(&ValidationError::InvalidPassword));
    assert!(game.admin("admin123").is_ok());
}

#[test]
fn statistics_and_analytics() {
    let mut game = Game::build_test().expect("game");
    played(&mut game, "A", "Dairy Farming", 2);
    played(&mut game, "B", "Dairy Farming", 1);
    played(&mut game, "C", "Fishing Business", 0);

    let admin = game.admin("admin123").expect("admin");
    let stats = admin.statistics();
    assert_eq!(stats.total_users, 3);
    assert_eq!(stats.total_businesses, 3);
    assert_eq!(stats.total_scenarios, 3);
    assert_eq!(stats.total_games_played, 3);

    let analytics = admin.analytics();
    assert_eq!(analytics.business_types["Dairy Farming"], 2);
    assert_eq!(analytics.business_types["Fishing Business"], 1);
    assert_eq!(analytics.top_performers.len(), 3);

    assert_eq!(admin.recent_users().len(), 3);
    assert_eq!(admin.scenario_results().len(), 3);
}

#[test]
fn delete_scenario_result() {
    let mut game = Game::build_test().expect("game");
    played(&mut game, "A", "Dairy Farming", 2);
    let admin = game.admin("admin123").expect("admin");
    let results = admin.scenario_results();
    admin.delete_scenario_result(&results[0].result_id).expect("delete");
    assert_eq!(admin.scenario_results().len(), 1);
    assert!(admin.delete_scenario_result(&results[0].result_id).is_err());
}

#[test]
fn templates_are_validated_and_numbered() {
    let game = Game::build_test().expect("game");
    let admin = game.admin("admin123").expect("admin");

    let id = admin
        .add_template("Poultry Farm", fallback_scenario("Poultry Farm"))
        .expect("template");
    assert_eq!(id, "tmpl_1");
    let id = admin
        .add_template("Solar Leasing", fallback_scenario("Solar Leasing"))
        .expect("template");
    assert_eq!(id, "tmpl_2");

    let mut broken = fallback_scenario("Dairy Farming");
    broken.options.pop();
    assert!(admin.add_template("Dairy Farming", broken).is_err());
    assert!(admin.add_template("Car Wash", fallback_scenario("Dairy Farming")).is_err());

    let templates = admin.templates();
    assert_eq!(templates.len(), 2);
    assert_eq!(templates[1].business_type, "Solar Leasing");
}

#[test]
fn market_prices_merge_and_reject_negatives() {
    let game = Game::build_test().expect("game");
    let admin = game.admin("admin123").expect("admin");

    admin
        .update_market_prices(BTreeMap::from([("goat".to_string(), 8_000), ("dairy_cow".to_string(), 35_000)]))
        .expect("prices");
    admin
        .update_market_prices(BTreeMap::from([("goat".to_string(), 9_000)]))
        .expect("prices");
    let prices = admin.market_prices();
    assert_eq!(prices["goat"], 9_000);
    assert_eq!(prices["dairy_cow"], 35_000);
    assert!(game.store().admin_settings().price_updated_at.is_some());

    assert!(admin
        .update_market_prices(BTreeMap::from([("goat".to_string(), -1)]))
        .is_err());
    assert_eq!(admin.market_prices()["goat"], 9_000);
}

#[test]
fn ai_settings_and_connection_test_without_credentials() {
    let game = Game::build_test().expect("game");
    let admin = game.admin("admin123").expect("admin");

    let settings = admin.ai_settings();
    assert_eq!(settings.provider, game.config().ai.default_provider);
    assert!(!settings.api_key_set);

    admin.update_ai_settings(ProviderKind::Anthropic, true).expect("save");
    let settings = admin.ai_settings();
    assert_eq!(settings.provider, ProviderKind::Anthropic);
    assert!(settings.api_key_set);
    assert_eq!(settings.env_key, "ANTHROPIC_API_KEY");

    let report = admin.test_connection(game.provider().kind());
    assert!(!report.credential);
    assert_eq!(report.source, ScenarioSource::Fallback);
    assert_eq!(report.record, fallback_scenario("Dairy Farming"));
}
