//! Auction rules: listing, bidding with capital escrow, closing and
//! sample-listing seeding.
//!
//! Bids are held: an accepted bid is deducted from the bidder's business
//! capital at once. When a later bid takes the lead, the displaced
//! holder's amount goes back to their business (see
//! `AuctionSettings::refund_outbid`).

use crate::{
    config::{AuctionItem, AuctionSettings},
    error::{GameResult, ValidationError},
    rng::GameRng,
    store::{Auction, AuctionStatus, Bid, GameDocument},
    types::{AuctionId, BusinessId, Money, Timestamp, UserId},
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `round(market_value * factor)`, half away from zero.
pub fn starting_price(market_value: Money, factor: f64) -> Money {
    (market_value as f64 * factor).round() as Money
}

/// A player's request to sell an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRequest {
    pub category:       String,
    pub item_name:      String,
    pub description:    String,
    pub market_value:   Money,
    /// Defaults to the factor-derived price.
    #[serde(default)]
    pub starting_price: Option<Money>,
    pub duration_secs:  u64,
}

pub fn new_listing(
    settings: &AuctionSettings,
    seller_id: Option<UserId>,
    req: ListingRequest,
    at: Timestamp,
) -> GameResult<Auction> {
    if !settings.categories.contains(&req.category) {
        return Err(ValidationError::UnknownCategory(req.category).into());
    }
    if req.item_name.trim().is_empty() {
        return Err(ValidationError::MissingField { field: "item_name" }.into());
    }
    if req.description.trim().is_empty() {
        return Err(ValidationError::MissingField { field: "description" }.into());
    }
    if !(settings.min_market_value..=settings.max_market_value).contains(&req.market_value) {
        return Err(ValidationError::OutOfRange {
            field: "market_value",
            min:   settings.min_market_value,
            max:   settings.max_market_value,
            value: req.market_value,
        }
        .into());
    }
    if !settings.listing_durations_secs.contains(&req.duration_secs) {
        return Err(ValidationError::UnsupportedDuration(req.duration_secs).into());
    }
    let start = match req.starting_price {
        Some(p) if p > req.market_value => {
            return Err(ValidationError::StartingPriceAboveMarket {
                starting_price: p,
                market_value:   req.market_value,
            }
            .into())
        }
        Some(p) if p < settings.min_starting_price => {
            return Err(ValidationError::OutOfRange {
                field: "starting_price",
                min:   settings.min_starting_price,
                max:   req.market_value,
                value: p,
            }
            .into())
        }
        Some(p) => p,
        None => starting_price(req.market_value, settings.starting_price_factor),
    };

    Ok(Auction {
        auction_id:     AuctionId::new(),
        item_name:      req.item_name.trim().to_string(),
        description:    req.description.trim().to_string(),
        category:       req.category,
        market_value:   req.market_value,
        starting_price: start,
        current_bid:    start,
        highest_bidder: None,
        seller_id,
        status:         AuctionStatus::Active,
        ends_at:        at + Duration::seconds(req.duration_secs as i64),
        created_at:     at,
        closed_at:      None,
        bids:           Vec::new(),
    })
}

/// Result of an accepted bid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidReceipt {
    pub auction_id:        AuctionId,
    pub amount:            Money,
    pub remaining_capital: Money,
    /// The business whose earlier hold was returned, and how much.
    pub refunded:          Option<(BusinessId, Money)>,
}

/// Place a bid for `business_id`. Accepted only if the auction is active,
/// `amount >= current_bid + min_bid_increment`, and the business can
/// cover it. A rejected bid changes nothing.
pub fn place_bid(
    doc: &mut GameDocument,
    settings: &AuctionSettings,
    auction_id: &str,
    business_id: &str,
    amount: Money,
    at: Timestamp,
) -> GameResult<BidReceipt> {
    let auction = doc.auction(auction_id)?;
    if !auction.is_active() {
        return Err(ValidationError::AuctionClosed(auction_id.to_string()).into());
    }
    let minimum = auction.current_bid + settings.min_bid_increment;
    if amount < minimum {
        return Err(ValidationError::BidTooLow { minimum, offered: amount }.into());
    }
    let previous = auction.leading_bid().cloned();

    let business = doc.business(business_id)?;
    let user_id = business.user_id.clone();
    // A business raising its own lead only needs to cover the difference.
    let own_hold = match &previous {
        Some(p) if settings.refund_outbid && p.business_id == business_id => p.amount,
        _ => 0,
    };
    if amount > business.capital + own_hold {
        return Err(ValidationError::InsufficientCapital {
            available: business.capital + own_hold,
            required:  amount,
        }
        .into());
    }

    let mut refunded = None;
    if settings.refund_outbid {
        if let Some(prev) = previous {
            match doc.business_mut(&prev.business_id) {
                Ok(prev_business) => {
                    prev_business.capital += prev.amount;
                    refunded = Some((prev.business_id.clone(), prev.amount));
                }
                Err(_) => log::warn!(
                    "auction={auction_id} outbid business {} no longer exists; hold of {} dropped",
                    prev.business_id,
                    prev.amount
                ),
            }
        }
    }

    let business = doc.business_mut(business_id)?;
    business.capital -= amount;
    let remaining_capital = business.capital;

    let auction = doc.auction_mut(auction_id)?;
    auction.bids.push(Bid {
        user_id:     user_id.clone(),
        business_id: business_id.to_string(),
        amount,
        timestamp:   at,
    });
    auction.current_bid = amount;
    auction.highest_bidder = Some(user_id);

    log::info!("auction={auction_id} bid={amount} business={business_id} accepted");
    Ok(BidReceipt {
        auction_id: auction_id.to_string(),
        amount,
        remaining_capital,
        refunded,
    })
}

/// Close every active auction whose end time is at or before `now`.
pub fn close_expired(doc: &mut GameDocument, now: Timestamp) -> Vec<AuctionId> {
    let expired: Vec<AuctionId> = doc
        .auctions
        .values()
        .filter(|a| a.is_active() && a.ends_at <= now)
        .map(|a| a.auction_id.clone())
        .collect();
    for id in &expired {
        if let Ok(auction) = doc.auction_mut(id) {
            auction.status = AuctionStatus::Closed;
            auction.closed_at = Some(now);
        }
    }
    if !expired.is_empty() {
        log::info!("auction: closed {} expired listing(s)", expired.len());
    }
    expired
}

/// While fewer than `min_active_listings` auctions are active, list one
/// catalog item from each sample category.
pub fn seed_samples(
    doc: &mut GameDocument,
    settings: &AuctionSettings,
    catalog: &BTreeMap<String, Vec<AuctionItem>>,
    rng: &mut GameRng,
    at: Timestamp,
) -> Vec<AuctionId> {
    if doc.active_auction_count() >= settings.min_active_listings {
        return Vec::new();
    }
    let mut seeded = Vec::new();
    for category in &settings.sample_categories {
        let Some(item) = catalog.get(category).and_then(|items| rng.pick(items)) else {
            continue;
        };
        let start = starting_price(item.base_price, settings.starting_price_factor);
        let id = doc.insert_auction(Auction {
            auction_id:     AuctionId::new(),
            item_name:      item.name.clone(),
            description:    item.description.clone(),
            category:       category.clone(),
            market_value:   item.base_price,
            starting_price: start,
            current_bid:    start,
            highest_bidder: None,
            seller_id:      None,
            status:         AuctionStatus::Active,
            ends_at:        at + Duration::seconds(settings.auction_duration_secs as i64),
            created_at:     at,
            closed_at:      None,
            bids:           Vec::new(),
        });
        seeded.push(id);
    }
    log::info!("auction: seeded {} sample listing(s)", seeded.len());
    seeded
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidHistoryEntry {
    pub auction_id: AuctionId,
    pub item_name:  String,
    pub amount:     Money,
    pub timestamp:  Timestamp,
    pub winning:    bool,
}

/// The user's bids on active auctions, oldest first. A bid is winning
/// when its auction's highest bidder is the user.
pub fn bid_history(doc: &GameDocument, user_id: &str) -> Vec<BidHistoryEntry> {
    let mut history: Vec<BidHistoryEntry> = doc
        .auctions
        .values()
        .filter(|a| a.is_active())
        .flat_map(|a| {
            let winning = a.highest_bidder.as_deref() == Some(user_id);
            a.bids
                .iter()
                .filter(move |b| b.user_id == user_id)
                .map(move |b| BidHistoryEntry {
                    auction_id: a.auction_id.clone(),
                    item_name:  a.item_name.clone(),
                    amount:     b.amount,
                    timestamp:  b.timestamp,
                    winning,
                })
        })
        .collect();
    history.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    history
}
