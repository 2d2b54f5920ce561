//! # SAM — Settlement & Auction Marketplace Engine
//!
//! The settlement core of a marketplace for unique and semi-fungible
//! assets. Sellers list escrowed units for fixed-price sale, English
//! auction, or stepwise Dutch decay; buyers and bidders pay in a single
//! fungible unit, and every successful sale is split between seller,
//! platform revenue, a burn sink, and the asset's royalty receiver.
//!
//! - **Marketplace** — the aggregate: listing lifecycle, bidding, buy-now,
//!   auction claims, and escrow withdrawal, all against a caller-supplied
//!   clock.
//! - **Settlement** — the pure fee/royalty/burn split of one sale; splits
//!   always re-sum to exactly `price + fee`.
//! - **Asset registries** — single-copy and multi-copy custody behind one
//!   trait, with per-asset royalty answers.
//! - **Ledgers** — an allowance-based token ledger and a pull-payment
//!   escrow ledger backing every claimable balance.
//!
//! ## Design Principles
//!
//! 1. All monetary operations check for overflow — we use `checked_add` and
//!    `checked_sub` everywhere, because wrapping arithmetic and money do not
//!    mix.
//! 2. Operations validate first and mutate second: an error means nothing
//!    changed.
//! 3. Funds enter custody only through allowance-based pulls and leave only
//!    through explicit withdrawal.
//! 4. Every persisted row type is serializable (serde) for wire transport
//!    and persistent storage.

pub mod access;
pub mod asset;
pub mod burn;
pub mod config;
pub mod error;
pub mod escrow;
pub mod listing;
pub mod market;
pub mod payment;
pub mod pricing;
pub mod settlement;

/// Participant account identifier.
pub type Address = String;

pub use access::AccessRegistry;
pub use asset::{AssetId, AssetRegistry, MultiCopyRegistry, RegistryKind, SingleCopyRegistry};
pub use burn::BurnVault;
pub use config::{MarketConfig, RestrictedCollection};
pub use error::MarketError;
pub use escrow::EscrowLedger;
pub use listing::{Bidding, BiddingId, Listing, ListingId, SaleMode};
pub use market::{Marketplace, BURN_VAULT_ACCOUNT, CUSTODY_ACCOUNT};
pub use payment::TokenLedger;
pub use settlement::Distribution;
