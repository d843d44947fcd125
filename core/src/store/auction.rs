use super::{GameDocument, GameStore};
use crate::{
    error::{GameError, GameResult, ValidationError},
    types::{new_id, now, AuctionId, BusinessId, Money, Timestamp, UserId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuctionStatus {
    Active,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub user_id:     UserId,
    #[serde(default)]
    pub business_id: BusinessId,
    #[serde(deserialize_with = "crate::types::de_money")]
    pub amount:      Money,
    #[serde(deserialize_with = "crate::types::de_timestamp")]
    pub timestamp:   Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Auction {
    #[serde(default)]
    pub auction_id:     AuctionId,
    pub item_name:      String,
    pub description:    String,
    pub category:       String,
    #[serde(deserialize_with = "crate::types::de_money")]
    pub market_value:   Money,
    #[serde(deserialize_with = "crate::types::de_money")]
    pub starting_price: Money,
    #[serde(deserialize_with = "crate::types::de_money")]
    pub current_bid:    Money,
    pub highest_bidder: Option<UserId>,
    #[serde(default)]
    pub seller_id:      Option<UserId>,
    pub status:         AuctionStatus,
    #[serde(deserialize_with = "crate::types::de_timestamp")]
    pub ends_at:        Timestamp,
    #[serde(deserialize_with = "crate::types::de_timestamp")]
    pub created_at:     Timestamp,
    #[serde(default, deserialize_with = "crate::types::de_opt_timestamp")]
    pub closed_at:      Option<Timestamp>,
    #[serde(default)]
    pub bids:           Vec<Bid>,
}

impl Auction {
    pub fn is_active(&self) -> bool {
        self.status == AuctionStatus::Active
    }

    /// The bid currently holding the lead, if any.
    pub fn leading_bid(&self) -> Option<&Bid> {
        self.bids.last()
    }
}

impl GameDocument {
    pub fn insert_auction(&mut self, mut auction: Auction) -> AuctionId {
        let auction_id = new_id("auct", auction.created_at);
        auction.auction_id = auction_id.clone();
        self.auctions.insert(auction_id.clone(), auction);
        auction_id
    }

    pub fn auction(&self, auction_id: &str) -> GameResult<&Auction> {
        self.auctions
            .get(auction_id)
            .ok_or_else(|| GameError::not_found("auction", auction_id))
    }

    pub fn auction_mut(&mut self, auction_id: &str) -> GameResult<&mut Auction> {
        self.auctions
            .get_mut(auction_id)
            .ok_or_else(|| GameError::not_found("auction", auction_id))
    }

    pub fn active_auction_count(&self) -> usize {
        self.auctions.values().filter(|a| a.is_active()).count()
    }

    /// Mark an auction closed. Closing twice is rejected.
    pub fn close_auction(&mut self, auction_id: &str, at: Timestamp) -> GameResult<()> {
        let auction = self.auction_mut(auction_id)?;
        if !auction.is_active() {
            return Err(ValidationError::AuctionClosed(auction_id.to_string()).into());
        }
        auction.status = AuctionStatus::Closed;
        auction.closed_at = Some(at);
        Ok(())
    }
}

impl GameStore {
    pub fn create_auction(&self, auction: Auction) -> GameResult<AuctionId> {
        let item = auction.item_name.clone();
        let auction_id = self.transact(|doc| Ok(doc.insert_auction(auction)))?;
        log::info!("auction: listed {auction_id} ({item})");
        Ok(auction_id)
    }

    pub fn get_auction(&self, auction_id: &str) -> Option<Auction> {
        self.view(|doc| doc.auctions.get(auction_id).cloned())
    }

    /// Active auctions ending soonest first.
    pub fn active_auctions(&self) -> Vec<Auction> {
        self.view(|doc| {
            let mut active: Vec<Auction> =
                doc.auctions.values().filter(|a| a.is_active()).cloned().collect();
            active.sort_by(|a, b| a.ends_at.cmp(&b.ends_at));
            active
        })
    }

    pub fn close_auction(&self, auction_id: &str) -> GameResult<()> {
        self.transact(|doc| doc.close_auction(auction_id, now()))?;
        log::info!("auction: closed {auction_id}");
        Ok(())
    }
}
