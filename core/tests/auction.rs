//! Auction rules end to end: listing, bidding with capital holds,
//! closing and sample seeding.

use chrono::Duration;
use ruralsim_core::{
    auction::{self, ListingRequest},
    error::ValidationError,
    game::Game,
    lifecycle::BusinessSetup,
    session::GameSession,
    store::{AuctionStatus, EmploymentMode},
    types::now,
};

fn player(game: &Game, name: &str, business_type: &str) -> GameSession {
    let mut session = game.start_session(name, "English").expect("session");
    game.create_business(
        &mut session,
        BusinessSetup::new(business_type, "Village", EmploymentMode::SelfOperated),
    )
    .expect("business");
    session
}

fn listing(market_value: i64) -> ListingRequest {
    ListingRequest {
        category:       "livestock".into(),
        item_name:      "Goat".into(),
        description:    "Breeding goat, 2 years old".into(),
        market_value,
        starting_price: None,
        duration_secs:  300,
    }
}

fn capital(game: &Game, session: &GameSession) -> i64 {
    game.current_business(session).expect("business").capital
}

#[test]
fn accepted_bid_moves_the_lead_and_holds_capital() {
    let game = Game::build_test().expect("game");
    let seller = player(&game, "Seller", "Retail Shop");
    let buyer = player(&game, "Buyer", "Dairy Farming");
    let id = game.list_item(&seller, listing(10_000)).expect("listing");

    let receipt = game.place_bid(&buyer, &id, 7_100).expect("bid");
    assert_eq!(receipt.remaining_capital, 50_000 - 7_100);
    assert_eq!(receipt.refunded, None);
    assert_eq!(capital(&game, &buyer), 42_900);

    let a = game.store().get_auction(&id).expect("auction");
    assert_eq!(a.current_bid, 7_100);
    assert_eq!(a.highest_bidder.as_deref(), Some(buyer.user_id.as_str()));
    assert_eq!(a.bids.len(), 1);
    assert_eq!(a.seller_id.as_deref(), Some(seller.user_id.as_str()));
}

#[test]
fn rejected_bids_change_nothing() {
    let game = Game::build_test().expect("game");
    let seller = player(&game, "Seller", "Retail Shop");
    let buyer = player(&game, "Buyer", "Organic Farming");
    let low = game.list_item(&seller, listing(10_000)).expect("listing");
    let mut land = listing(100_000);
    land.category = "land".into();
    land.item_name = "Half acre".into();
    let high = game.list_item(&seller, land).expect("listing");
    let before = game.store().read();

    let err = game.place_bid(&buyer, &low, 7_099).unwrap_err();
    assert_eq!(
        err.as_validation(),
        Some(&ValidationError::BidTooLow { minimum: 7_100, offered: 7_099 })
    );

    // Organic Farming starts with 40,000.
    let err = game.place_bid(&buyer, &high, 70_100).unwrap_err();
    assert!(matches!(err.as_validation(), Some(ValidationError::InsufficientCapital { .. })));

    assert!(game.place_bid(&buyer, "auct_missing", 9_000).is_err());
    assert_eq!(game.store().read(), before);
}

#[test]
fn outbid_holder_is_refunded() {
    let game = Game::build_test().expect("game");
    let seller = player(&game, "Seller", "Retail Shop");
    let first = player(&game, "First", "Dairy Farming");
    let second = player(&game, "Second", "Dairy Farming");
    let id = game.list_item(&seller, listing(10_000)).expect("listing");

    game.place_bid(&first, &id, 7_100).expect("first bid");
    let receipt = game.place_bid(&second, &id, 7_200).expect("second bid");
    let first_business = first.business_id.clone().expect("business id");
    assert_eq!(receipt.refunded, Some((first_business, 7_100)));
    assert_eq!(capital(&game, &first), 50_000);
    assert_eq!(capital(&game, &second), 50_000 - 7_200);

    let a = game.store().get_auction(&id).expect("auction");
    assert_eq!(a.highest_bidder.as_deref(), Some(second.user_id.as_str()));
    assert_eq!(a.bids.len(), 2);
}

#[test]
fn raising_your_own_lead_holds_only_the_new_amount() {
    let game = Game::build_test().expect("game");
    let seller = player(&game, "Seller", "Retail Shop");
    let buyer = player(&game, "Buyer", "Dairy Farming");
    let id = game.list_item(&seller, listing(10_000)).expect("listing");

    game.place_bid(&buyer, &id, 7_100).expect("bid");
    game.place_bid(&buyer, &id, 7_300).expect("raise");
    assert_eq!(capital(&game, &buyer), 50_000 - 7_300);

    let history = game.bid_history(&buyer);
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|h| h.winning));
    assert_eq!(history[1].amount, 7_300);
}

#[test]
fn closed_auctions_reject_bids() {
    let game = Game::build_test().expect("game");
    let seller = player(&game, "Seller", "Retail Shop");
    let buyer = player(&game, "Buyer", "Dairy Farming");
    let id = game.list_item(&seller, listing(10_000)).expect("listing");

    let admin = game.admin("admin123").expect("admin");
    admin.close_auction(&id).expect("close");
    assert!(admin.close_auction(&id).is_err());

    let err = game.place_bid(&buyer, &id, 8_000).unwrap_err();
    assert!(matches!(err.as_validation(), Some(ValidationError::AuctionClosed(_))));
    assert_eq!(capital(&game, &buyer), 50_000);
    assert!(game.bid_history(&buyer).is_empty());
}

#[test]
fn expired_listings_close_on_sweep() {
    let game = Game::build_test().expect("game");
    let seller = player(&game, "Seller", "Retail Shop");
    let id = game.list_item(&seller, listing(10_000)).expect("listing");

    let at = now();
    let closed = game
        .store()
        .transact(|doc| Ok(auction::close_expired(doc, at)))
        .expect("sweep");
    assert!(closed.is_empty());

    let later = at + Duration::seconds(301);
    let closed = game
        .store()
        .transact(|doc| Ok(auction::close_expired(doc, later)))
        .expect("sweep");
    assert_eq!(closed, vec![id.clone()]);
    let a = game.store().get_auction(&id).expect("auction");
    assert_eq!(a.status, AuctionStatus::Closed);
    assert_eq!(a.closed_at, Some(later));
    assert!(game.active_auctions().is_empty());
}

#[test]
fn refresh_seeds_samples_only_when_the_market_is_thin() {
    let mut game = Game::build_test().expect("game");
    let seeded = game.refresh_auctions().expect("refresh");
    assert_eq!(seeded.len(), 3);

    let active = game.active_auctions();
    assert_eq!(active.len(), 3);
    for a in &active {
        assert!(a.seller_id.is_none());
        assert_eq!(a.current_bid, auction::starting_price(a.market_value, 0.7));
        assert_eq!((a.ends_at - a.created_at).num_seconds(), 60);
        assert!(["livestock", "equipment", "inventory"].contains(&a.category.as_str()));
    }

    assert!(game.refresh_auctions().expect("refresh").is_empty());
}

#[test]
fn listing_rules_are_enforced() {
    let game = Game::build_test().expect("game");
    let seller = player(&game, "Seller", "Retail Shop");

    let mut req = listing(10_000);
    req.starting_price = Some(12_000);
    let err = game.list_item(&seller, req).unwrap_err();
    assert!(matches!(
        err.as_validation(),
        Some(ValidationError::StartingPriceAboveMarket { .. })
    ));

    let mut req = listing(10_000);
    req.starting_price = Some(6_000);
    let id = game.list_item(&seller, req).expect("listing");
    assert_eq!(game.store().get_auction(&id).expect("auction").current_bid, 6_000);
}
