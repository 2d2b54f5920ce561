//! # Asset Registry Capability
//!
//! The engine is generic over the registries that actually own the assets
//! being sold. A registry exposes exactly four capabilities: report its
//! kind, escrow units for a listing, release an escrowed unit (to a buyer
//! on sale, or back to the seller on cancellation), and answer royalty
//! lookups. The engine never branches on a concrete registry type except
//! to decide the one-listing-row-per-unit fan-out for multi-copy assets.
//!
//! Two conforming variants ship with the crate:
//!
//! - [`SingleCopyRegistry`] — non-fungible, one owner per asset id. Listing
//!   moves the unit into engine custody.
//! - [`MultiCopyRegistry`] — semi-fungible, per-address unit balances.
//!   Listing places an approval-based hold: the units stay with the seller
//!   but cannot be transferred or re-listed until released.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Address;

/// Asset identifier within a registry.
pub type AssetId = u64;

/// Upper bound for a creator royalty: 20% of the sale price.
pub const MAX_ROYALTY_BPS: u16 = 2_000;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during asset registry operations.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The referenced asset does not exist.
    #[error("asset {asset_id} not found")]
    AssetNotFound {
        /// The missing asset id.
        asset_id: AssetId,
    },

    /// The caller does not own the asset.
    #[error("{owner} does not own asset {asset_id}")]
    NotOwner {
        /// The address that claimed ownership.
        owner: Address,
        /// The asset in question.
        asset_id: AssetId,
    },

    /// Not enough unheld units to escrow.
    #[error("{owner} has {free} free unit(s), requested {requested}")]
    InsufficientUnits {
        /// The address whose units were requested.
        owner: Address,
        /// Units not currently under a hold.
        free: u64,
        /// Units the caller tried to escrow.
        requested: u64,
    },

    /// The asset is already escrowed.
    #[error("asset {asset_id} is already escrowed")]
    AlreadyEscrowed {
        /// The asset in question.
        asset_id: AssetId,
    },

    /// No escrowed unit exists for this seller and asset.
    #[error("asset {asset_id} is not escrowed for {seller}")]
    NotEscrowed {
        /// The seller the release was attempted for.
        seller: Address,
        /// The asset in question.
        asset_id: AssetId,
    },

    /// Royalty rate above [`MAX_ROYALTY_BPS`].
    #[error("royalty rate {bps} bps exceeds the {MAX_ROYALTY_BPS} bps cap")]
    RoyaltyTooHigh {
        /// The rejected rate.
        bps: u16,
    },

    /// Minting an asset id that already exists in a single-copy registry.
    #[error("asset {asset_id} already exists")]
    AlreadyExists {
        /// The duplicate asset id.
        asset_id: AssetId,
    },
}

// ---------------------------------------------------------------------------
// Capability interface
// ---------------------------------------------------------------------------

/// Whether a registry issues unique assets or per-address unit balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryKind {
    /// Non-fungible: exactly one unit per asset id.
    SingleCopy,
    /// Semi-fungible: many units per asset id, balance per address.
    MultiCopy,
}

impl std::fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryKind::SingleCopy => write!(f, "SingleCopy"),
            RegistryKind::MultiCopy => write!(f, "MultiCopy"),
        }
    }
}

/// The capability interface the engine consumes.
pub trait AssetRegistry: std::fmt::Debug {
    /// The registry's kind.
    fn kind(&self) -> RegistryKind;

    /// Escrows `count` units of `asset_id` from `seller` for sale.
    ///
    /// Atomic: either all `count` units are escrowed or none are. A
    /// single-copy registry only ever accepts `count == 1`.
    fn escrow_units(&mut self, seller: &str, asset_id: AssetId, count: u64)
        -> Result<(), AssetError>;

    /// Releases one escrowed unit of `asset_id`.
    ///
    /// `to == seller` returns the unit (cancellation); any other `to`
    /// transfers it (sale resolution).
    fn release_unit(&mut self, seller: &str, to: &str, asset_id: AssetId)
        -> Result<(), AssetError>;

    /// Royalty receiver and amount for a sale of `asset_id` at `sale_price`.
    ///
    /// `None` when no royalty is configured (or it rounds to zero).
    fn royalty_info(&self, asset_id: AssetId, sale_price: u64) -> Option<(Address, u64)>;

    /// Units of `asset_id` attributed to `owner` (escrowed units included
    /// for multi-copy holds, excluded once custody has moved).
    fn units_of(&self, owner: &str, asset_id: AssetId) -> u64;
}

/// A creator royalty configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Royalty {
    receiver: Address,
    bps: u16,
}

fn royalty_amount(royalty: Option<&Royalty>, sale_price: u64) -> Option<(Address, u64)> {
    let royalty = royalty?;
    if royalty.bps == 0 {
        return None;
    }
    let amount = (sale_price as u128 * royalty.bps as u128 / 10_000) as u64;
    if amount == 0 {
        return None;
    }
    Some((royalty.receiver.clone(), amount))
}

// ---------------------------------------------------------------------------
// Single-copy registry
// ---------------------------------------------------------------------------

/// Non-fungible registry: one owner per asset id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SingleCopyRegistry {
    /// Current owner per asset.
    owners: HashMap<AssetId, Address>,
    /// Assets in engine custody, mapped to the seller they came from.
    custody: HashMap<AssetId, Address>,
    /// Royalty configuration per asset.
    royalties: HashMap<AssetId, Royalty>,
}

impl SingleCopyRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints a new asset to `owner`.
    pub fn mint(&mut self, owner: impl Into<Address>, asset_id: AssetId) -> Result<(), AssetError> {
        if self.owners.contains_key(&asset_id) {
            return Err(AssetError::AlreadyExists { asset_id });
        }
        self.owners.insert(asset_id, owner.into());
        Ok(())
    }

    /// Configures a creator royalty for an asset.
    pub fn set_royalty(
        &mut self,
        asset_id: AssetId,
        receiver: impl Into<Address>,
        bps: u16,
    ) -> Result<(), AssetError> {
        if !self.owners.contains_key(&asset_id) {
            return Err(AssetError::AssetNotFound { asset_id });
        }
        if bps > MAX_ROYALTY_BPS {
            return Err(AssetError::RoyaltyTooHigh { bps });
        }
        self.royalties.insert(asset_id, Royalty { receiver: receiver.into(), bps });
        Ok(())
    }

    /// Current owner of an asset.
    pub fn owner_of(&self, asset_id: AssetId) -> Option<&str> {
        self.owners.get(&asset_id).map(String::as_str)
    }
}

impl AssetRegistry for SingleCopyRegistry {
    fn kind(&self) -> RegistryKind {
        RegistryKind::SingleCopy
    }

    fn escrow_units(
        &mut self,
        seller: &str,
        asset_id: AssetId,
        count: u64,
    ) -> Result<(), AssetError> {
        if count != 1 {
            return Err(AssetError::InsufficientUnits {
                owner: seller.to_string(),
                free: 1,
                requested: count,
            });
        }
        if self.custody.contains_key(&asset_id) {
            return Err(AssetError::AlreadyEscrowed { asset_id });
        }
        let owner = self
            .owners
            .get(&asset_id)
            .ok_or(AssetError::AssetNotFound { asset_id })?;
        if owner != seller {
            return Err(AssetError::NotOwner {
                owner: seller.to_string(),
                asset_id,
            });
        }
        self.custody.insert(asset_id, seller.to_string());
        Ok(())
    }

    fn release_unit(&mut self, seller: &str, to: &str, asset_id: AssetId)
        -> Result<(), AssetError>
    {
        match self.custody.get(&asset_id) {
            Some(from) if from == seller => {}
            _ => {
                return Err(AssetError::NotEscrowed {
                    seller: seller.to_string(),
                    asset_id,
                });
            }
        }
        self.custody.remove(&asset_id);
        self.owners.insert(asset_id, to.to_string());
        Ok(())
    }

    fn royalty_info(&self, asset_id: AssetId, sale_price: u64) -> Option<(Address, u64)> {
        royalty_amount(self.royalties.get(&asset_id), sale_price)
    }

    fn units_of(&self, owner: &str, asset_id: AssetId) -> u64 {
        if self.custody.contains_key(&asset_id) {
            return 0;
        }
        match self.owners.get(&asset_id) {
            Some(current) if current == owner => 1,
            _ => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Multi-copy registry
// ---------------------------------------------------------------------------

/// Semi-fungible registry: per-address unit balances with listing holds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MultiCopyRegistry {
    /// `asset -> (address -> units)`.
    balances: HashMap<AssetId, HashMap<Address, u64>>,
    /// `asset -> (address -> units under a listing hold)`.
    holds: HashMap<AssetId, HashMap<Address, u64>>,
    /// Royalty configuration per asset.
    royalties: HashMap<AssetId, Royalty>,
}

impl MultiCopyRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints `count` units of an asset to `owner`.
    pub fn mint(&mut self, owner: impl Into<Address>, asset_id: AssetId, count: u64) {
        *self
            .balances
            .entry(asset_id)
            .or_default()
            .entry(owner.into())
            .or_insert(0) += count;
    }

    /// Configures a creator royalty for an asset.
    pub fn set_royalty(
        &mut self,
        asset_id: AssetId,
        receiver: impl Into<Address>,
        bps: u16,
    ) -> Result<(), AssetError> {
        if bps > MAX_ROYALTY_BPS {
            return Err(AssetError::RoyaltyTooHigh { bps });
        }
        self.royalties.insert(asset_id, Royalty { receiver: receiver.into(), bps });
        Ok(())
    }

    /// Units of an asset currently under a listing hold for `owner`.
    pub fn held_units(&self, owner: &str, asset_id: AssetId) -> u64 {
        self.holds
            .get(&asset_id)
            .and_then(|held| held.get(owner))
            .copied()
            .unwrap_or(0)
    }

    fn balance(&self, owner: &str, asset_id: AssetId) -> u64 {
        self.balances
            .get(&asset_id)
            .and_then(|owners| owners.get(owner))
            .copied()
            .unwrap_or(0)
    }
}

impl AssetRegistry for MultiCopyRegistry {
    fn kind(&self) -> RegistryKind {
        RegistryKind::MultiCopy
    }

    fn escrow_units(
        &mut self,
        seller: &str,
        asset_id: AssetId,
        count: u64,
    ) -> Result<(), AssetError> {
        let free = self
            .balance(seller, asset_id)
            .saturating_sub(self.held_units(seller, asset_id));
        if free < count {
            return Err(AssetError::InsufficientUnits {
                owner: seller.to_string(),
                free,
                requested: count,
            });
        }
        *self
            .holds
            .entry(asset_id)
            .or_default()
            .entry(seller.to_string())
            .or_insert(0) += count;
        Ok(())
    }

    fn release_unit(&mut self, seller: &str, to: &str, asset_id: AssetId)
        -> Result<(), AssetError>
    {
        let held = self.held_units(seller, asset_id);
        if held == 0 {
            return Err(AssetError::NotEscrowed {
                seller: seller.to_string(),
                asset_id,
            });
        }
        // Consume the hold; on a sale, move the unit to the buyer.
        self.holds
            .get_mut(&asset_id)
            .and_then(|held| held.get_mut(seller))
            .map(|units| *units -= 1);
        if to != seller {
            let owners = self.balances.entry(asset_id).or_default();
            // A hold always sits on a real unit, so the debit cannot fail.
            *owners.entry(seller.to_string()).or_insert(0) -= 1;
            *owners.entry(to.to_string()).or_insert(0) += 1;
        }
        Ok(())
    }

    fn royalty_info(&self, asset_id: AssetId, sale_price: u64) -> Option<(Address, u64)> {
        royalty_amount(self.royalties.get(&asset_id), sale_price)
    }

    fn units_of(&self, owner: &str, asset_id: AssetId) -> u64 {
        self.balance(owner, asset_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
