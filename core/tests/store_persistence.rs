//! Persistence through both document backends: reopen, degrade on a
//! damaged file, export and import.

use ruralsim_core::store::{EmploymentMode, GameDocument, GameStore};
use std::collections::BTreeMap;

fn populate(store: &GameStore) -> String {
    let user_id = store.create_user("Padma", "Telugu").expect("user");
    store
        .update_market_prices(BTreeMap::from([("goat".to_string(), 8_500)]))
        .expect("prices");
    store.update_leaderboard(&user_id, 64, "Poultry Farm").expect("leaderboard");
    user_id
}

#[test]
fn json_store_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("game_data.json");
    let path = path.to_str().expect("utf-8 path");

    let user_id = {
        let store = GameStore::open_json(path).expect("open");
        populate(&store)
    };
    let raw = std::fs::read_to_string(path).expect("file written");
    assert!(raw.contains("\n  \"users\""), "document is pretty-printed");

    let store = GameStore::open_json(path).expect("reopen");
    let user = store.get_user(&user_id).expect("user persisted");
    assert_eq!(user.name, "Padma");
    assert_eq!(store.market_prices()["goat"], 8_500);
    assert_eq!(store.leaderboard(5)[0].user_name, "Padma");
}

#[test]
fn sqlite_store_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("game.db");
    let path = path.to_str().expect("utf-8 path");

    let user_id = {
        let store = GameStore::open_sqlite(path).expect("open");
        populate(&store)
    };
    let store = GameStore::open_sqlite(path).expect("reopen");
    assert!(store.get_user(&user_id).is_some());
    assert_eq!(store.statistics().total_users, 1);
}

#[test]
fn missing_file_is_initialized_with_an_empty_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("fresh.json");
    let store = GameStore::open_json(path.to_str().expect("utf-8 path")).expect("open");
    assert_eq!(store.read(), GameDocument::default());

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("initialized")).expect("json");
    assert!(value["admin_settings"]["scenario_templates"].is_array());
}

#[test]
fn malformed_file_degrades_to_an_empty_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ this is not json").expect("write");

    let store = GameStore::open_json(path.to_str().expect("utf-8 path")).expect("open");
    assert_eq!(store.read(), GameDocument::default());
    // Still usable.
    store.create_user("Ravi", "English").expect("user");
    assert_eq!(store.statistics().total_users, 1);
}

#[test]
fn unknown_admin_keys_survive_a_round_trip() {
    let store = GameStore::in_memory().expect("store");
    store
        .import_json(r#"{"users": {}, "admin_settings": {"feature_flags": {"beta": true}}}"#)
        .expect("import");
    let exported: serde_json::Value =
        serde_json::from_str(&store.export_json().expect("export")).expect("json");
    assert_eq!(exported["admin_settings"]["feature_flags"]["beta"], true);
    assert!(exported["auctions"].is_object());
}

#[test]
fn import_replaces_the_document_and_bad_import_changes_nothing() {
    let source = GameStore::in_memory().expect("store");
    let user_id = populate(&source);
    let exported = source.export_json().expect("export");

    let target = GameStore::in_memory().expect("store");
    target.create_user("Someone Else", "Hindi").expect("user");
    target.import_json(&exported).expect("import");
    assert_eq!(target.read(), source.read());
    assert!(target.get_user(&user_id).is_some());

    let before = target.read();
    assert!(target.import_json("[1, 2, 3]").is_err());
    assert_eq!(target.read(), before);
}

/// A document in the older layout: records keyed by id
/// without embedded ids, naive timestamps, float prices and bids.
const LEGACY_DOCUMENT: &str = r#"{
  "users": {
    "user_20240101_120000_Ravi": {
      "name": "Ravi", "language": "Telugu",
      "created_at": "2024-01-01T12:00:00.123456",
      "total_score": 81, "games_played": 1, "achievements": []
    }
  },
  "businesses": {
    "biz_20240101_120100": {
      "user_id": "user_20240101_120000_Ravi",
      "created_at": "2024-01-01T12:01:00.000001",
      "current_round": 2, "total_score": 81, "status": "active",
      "business_type": "Dairy Farming", "location": "Peerancheru",
      "employment_mode": "Self-operated", "capital": 42900.0,
      "resources": {"cows": 5, "land_acres": 2, "equipment": ["milking machine"]},
      "investment_priority": ["Working Capital", "Marketing"],
      "revenue_goal": 50000, "timeline": "3 months", "language": "Telugu",
      "updated_at": "2024-01-01T12:05:00"
    }
  },
  "scenarios": {
    "scen_20240101_120500": {
      "business_id": "biz_20240101_120100",
      "timestamp": "2024-01-01T12:05:00.5",
      "round": 1, "option_selected": 2, "score": 81,
      "risk": 8, "reward": 9, "realism": 7
    }
  },
  "leaderboard": [
    {"user_id": "user_20240101_120000_Ravi", "user_name": "Ravi", "score": 81,
     "business_type": "Dairy Farming", "timestamp": "2024-01-01T12:05:00.6"}
  ],
  "auctions": {
    "auct_20240101_120200": {
      "created_at": "2024-01-01T12:02:00.1", "status": "active",
      "bids": [{"user_id": "user_20240101_120000_Ravi", "amount": 7100.0,
                "timestamp": "2024-01-01T12:03:00.2"}],
      "item_name": "Goat", "description": "Breeding goat", "category": "livestock",
      "starting_price": 5600, "current_bid": 7100.0, "market_value": 8000,
      "highest_bidder": "user_20240101_120000_Ravi",
      "ends_at": "2024-01-01T12:03:00.3"
    }
  },
  "admin_settings": {
    "scenario_templates": [],
    "market_prices": {"goat": 8000.0, "dairy_cow": 35000},
    "event_probabilities": {},
    "price_updated_at": "2024-01-01T11:00:00.9",
    "ai_provider": "openai", "api_key_set": true
  }
}"#;

#[test]
fn legacy_document_loads_and_survives_writes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("game_data.json");
    std::fs::write(&path, LEGACY_DOCUMENT).expect("write");
    let path = path.to_str().expect("utf-8 path");

    let store = GameStore::open_json(path).expect("open");
    let user = store.get_user("user_20240101_120000_Ravi").expect("legacy user kept");
    assert_eq!(user.user_id, "user_20240101_120000_Ravi");
    assert_eq!(user.total_score, 81);

    let business = store.get_business("biz_20240101_120100").expect("legacy business kept");
    assert_eq!(business.business_id, "biz_20240101_120100");
    assert_eq!(business.capital, 42_900);
    assert_eq!(business.employment_mode, EmploymentMode::SelfOperated);
    assert_eq!(business.investment_priorities, vec!["Working Capital", "Marketing"]);
    assert!(business.updated_at.is_some());

    let results = store.business_scenarios("biz_20240101_120100");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].result_id, "scen_20240101_120500");
    assert_eq!(store.business_analytics("biz_20240101_120100").best_round, Some(81));

    let auction = store.get_auction("auct_20240101_120200").expect("legacy auction kept");
    assert_eq!(auction.auction_id, "auct_20240101_120200");
    assert_eq!(auction.current_bid, 7_100);
    assert_eq!(auction.bids[0].amount, 7_100);
    assert!(auction.seller_id.is_none());

    assert_eq!(store.leaderboard(10).len(), 1);
    assert_eq!(store.market_prices()["goat"], 8_000);
    assert!(store.admin_settings().api_key_set);

    store.create_user("Padma", "Hindi").expect("user");
    drop(store);

    let reopened = GameStore::open_json(path).expect("reopen");
    assert_eq!(reopened.statistics().total_users, 2);
    assert!(reopened.get_user("user_20240101_120000_Ravi").is_some());
    assert_eq!(reopened.leaderboard(10)[0].user_name, "Ravi");
}
