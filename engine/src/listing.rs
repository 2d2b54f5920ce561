//! # Listing & Bidding Records
//!
//! The two persisted row types of the engine. A [`Listing`] is a sale
//! offer for exactly one unit of an asset — a multi-copy listing of N
//! units is fanned out into N independent rows sharing a collection tag,
//! so each unit can be bought, claimed, or cancelled on its own. A
//! [`Bidding`] is the single live offer against an Auction-mode listing;
//! superseded bids are refunded and deleted the moment they are displaced.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::asset::AssetId;
use crate::Address;

/// Opaque, strictly increasing listing identifier. Never reused.
pub type ListingId = u64;

/// Opaque bidding identifier (uuid).
pub type BiddingId = String;

/// How a listing is priced and resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleMode {
    /// Sold immediately at the stored price.
    FixedPrice,
    /// Competitive bidding; the highest bidder claims after expiry.
    Auction,
    /// Asking price decays stepwise over time until bought or expired.
    DutchAuction,
}

impl std::fmt::Display for SaleMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaleMode::FixedPrice => write!(f, "FixedPrice"),
            SaleMode::Auction => write!(f, "Auction"),
            SaleMode::DutchAuction => write!(f, "DutchAuction"),
        }
    }
}

/// A sale offer for one unit of an asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    /// Unique, increasing id.
    pub id: ListingId,
    /// The listing creator; the only party who may cancel.
    pub seller: Address,
    /// The asset registry holding the listed unit.
    pub registry: Address,
    /// Asset id within the registry.
    pub asset_id: AssetId,
    /// Tag shared by all rows fanned out from one multi-copy listing call.
    pub collection_tag: String,
    /// Pricing mode.
    pub mode: SaleMode,
    /// Base price (FixedPrice), starting price (Auction), or initial
    /// asking price (DutchAuction), in the smallest payment unit.
    pub price: u64,
    /// When the sale window opens. A start at or before "now" means the
    /// listing is immediately active.
    pub start_time: DateTime<Utc>,
    /// Sale window length. Zero means no expiry (FixedPrice only).
    pub duration_secs: u64,
    /// Seconds between Dutch-auction price drops. Zero outside that mode.
    pub discount_interval_secs: u64,
    /// Price reduction per Dutch-auction interval. Zero outside that mode.
    pub discount_step: u64,
    /// The current highest (and only live) bid, Auction mode only.
    pub top_bid: Option<BiddingId>,
    /// Timestamp when the listing was created.
    pub created_at: DateTime<Utc>,
}

impl Listing {
    /// When the sale window closes, if it ever does.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        if self.duration_secs == 0 {
            return None;
        }
        Some(self.start_time + Duration::seconds(self.duration_secs as i64))
    }

    /// Whether the sale window has opened.
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        now >= self.start_time
    }

    /// Whether the sale window has closed.
    pub fn has_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at() {
            Some(expiry) => now >= expiry,
            None => false,
        }
    }
}

/// A pending offer against an Auction-mode listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bidding {
    /// Unique id.
    pub id: BiddingId,
    /// The listing this bid targets.
    pub listing_id: ListingId,
    /// The bidding account.
    pub bidder: Address,
    /// The offered amount, already held in engine custody.
    pub amount: u64,
    /// Timestamp when the bid was placed.
    pub placed_at: DateTime<Utc>,
}
