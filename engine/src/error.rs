//! # Engine Error Taxonomy
//!
//! Every public operation reports failure through [`MarketError`], grouped
//! in four tiers:
//!
//! 1. **Authorization** — wrong caller (not seller, not bidder, banned).
//! 2. **Validation** — malformed request (bad duration, zero price, tie bid).
//! 3. **State** — the request is well-formed but the listing/bid is not in
//!    a state that allows it (not expired yet, already resolved, outbid).
//! 4. **Invariant** — conditions the state machine makes unreachable; if
//!    one surfaces, the engine itself is broken, not the caller.
//!
//! Each condition carries a stable, human-readable reason string used for
//! both programmatic dispatch and display. Operations are atomic: an error
//! means no state was mutated.

use thiserror::Error;

use crate::access::AccessError;
use crate::asset::AssetError;
use crate::burn::BurnError;
use crate::config::ConfigError;
use crate::escrow::EscrowError;
use crate::listing::{BiddingId, ListingId};
use crate::payment::PaymentError;
use crate::Address;

/// Errors reported by the marketplace engine's public operations.
#[derive(Debug, Error)]
pub enum MarketError {
    // -- authorization ------------------------------------------------------
    /// The participant is banned.
    #[error("account {0} is blacklisted")]
    Blacklisted(Address),

    /// Only the listing's seller may cancel it.
    #[error("only seller can remove")]
    NotSeller,

    /// Only the winning bidder may claim.
    #[error("only the bidder can claim")]
    NotBidder,

    // -- validation ---------------------------------------------------------
    /// The asset registry has not been approved for listing.
    #[error("asset registry {0} is not whitelisted")]
    RegistryNotWhitelisted(Address),

    /// No registry is registered under this address.
    #[error("unknown asset registry {0}")]
    UnknownRegistry(Address),

    /// Listings must carry a non-zero price.
    #[error("price must be greater than zero")]
    ZeroPrice,

    /// Listings must cover at least one unit.
    #[error("copies must be greater than zero")]
    ZeroCopies,

    /// A single-copy registry cannot list more than one unit per call.
    #[error("a single-copy registry allows exactly one copy per listing")]
    TooManyCopies,

    /// Duration outside the configured strict-exclusive window.
    #[error("invalid duration: {duration_secs}s is outside ({min_secs}s, {max_secs}s)")]
    InvalidDuration {
        /// The rejected duration.
        duration_secs: u64,
        /// Configured lower bound (exclusive).
        min_secs: u64,
        /// Configured upper bound (exclusive).
        max_secs: u64,
    },

    /// Dutch auctions need a positive interval and a step below the price.
    #[error("invalid dutch auction parameters: interval {interval_secs}s, step {step}")]
    InvalidDutchParams {
        /// The rejected discount interval.
        interval_secs: u64,
        /// The rejected discount step.
        step: u64,
    },

    /// The restricted collection may only settle in its mandated unit.
    #[error("restricted collection can only sell for {unit}")]
    RestrictedCollection {
        /// The mandated payment unit.
        unit: String,
    },

    /// Bids must strictly exceed the current floor; ties are rejected.
    #[error("bid price too low: offered {offered}, must exceed {floor}")]
    BidTooLow {
        /// The rejected bid amount.
        offered: u64,
        /// The current highest bid or starting price.
        floor: u64,
    },

    // -- state --------------------------------------------------------------
    /// The listing does not exist (or was already resolved and retired).
    #[error("listing {0} not found")]
    ListingNotFound(ListingId),

    /// The bidding does not exist (or was displaced and refunded).
    #[error("bidding {0} not found")]
    BiddingNotFound(BiddingId),

    /// Bids only apply to Auction-mode listings.
    #[error("can only bid for listing on auction")]
    NotAnAuction,

    /// Buy-now only applies to FixedPrice and DutchAuction listings.
    #[error("can only buy a fixed price or dutch auction listing")]
    NotBuyable,

    /// Sellers cannot bid on their own listings.
    #[error("bidder cannot be seller")]
    BidderIsSeller,

    /// Sellers cannot buy their own listings.
    #[error("buyer cannot be seller")]
    BuyerIsSeller,

    /// The sale window has not opened yet.
    #[error("the sale has not started")]
    NotStarted,

    /// The sale window has closed.
    #[error("the listing has expired")]
    ListingExpired,

    /// Claiming before the auction window has elapsed.
    #[error("the bidding period hasn't completed")]
    BiddingInProgress,

    /// The referenced bid is not the listing's current highest.
    #[error("the bidding is not the highest price")]
    NotHighestBid,

    /// Cancelling a time-boxed listing before its window has elapsed.
    #[error("the listing hasn't expired")]
    NotExpired,

    /// Cancelling a listing that has a live bid.
    #[error("cannot remove a listing with an active bid")]
    ActiveBid,

    // -- wrapped collaborator failures ---------------------------------------
    /// Buyer/bidder funds could not be pulled.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Asset custody could not be established at listing time.
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Escrow crediting failed.
    #[error(transparent)]
    Escrow(#[from] EscrowError),

    /// Burn accumulator interaction failed.
    #[error(transparent)]
    Burn(#[from] BurnError),

    /// Configuration mutation failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Access registry mutation failed.
    #[error(transparent)]
    Access(#[from] AccessError),

    // -- invariant ----------------------------------------------------------
    /// A condition the state machine is supposed to make unreachable.
    ///
    /// Surfacing this means the engine's own bookkeeping is broken (an
    /// escrowed unit vanished, a ledger underflowed). Callers cannot
    /// recover from it and should treat it as fatal.
    #[error("invariant violation: {0}")]
    Invariant(String),
}
