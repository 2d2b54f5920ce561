//! # Marketplace Configuration
//!
//! Every tunable rate and bound of the settlement engine lives here: the
//! buyer-side fee rate, the burn/revenue split of that fee, the protocol
//! cut of creator royalties, the destination addresses, and the listing
//! duration window. Engine operations read a snapshot of this store at the
//! start of every call — there is no ambient global state to mutate out
//! from under an in-flight sale.
//!
//! All setters are gated on the configured owner and validate their bounds
//! before touching anything.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Address;

// ---------------------------------------------------------------------------
// Bounds & defaults
// ---------------------------------------------------------------------------

/// Upper bound for the buyer-side fee rate: 50%.
pub const MAX_FEE_RATE_BPS: u16 = 5_000;

/// Upper bound for the protocol's cut of creator royalties: 50%.
pub const MAX_ROYALTY_CUT_BPS: u16 = 5_000;

/// Upper bound for the burn split of the fee: 100%.
pub const MAX_FEE_BURN_RATE_BPS: u16 = 10_000;

/// Default buyer-side fee: 2.5%.
pub const DEFAULT_FEE_RATE_BPS: u16 = 250;

/// Default minimum listing duration: one day.
pub const DEFAULT_MIN_DURATION_SECS: u64 = 86_400;

/// Default maximum listing duration: seven days.
pub const DEFAULT_MAX_DURATION_SECS: u64 = 604_800;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur when mutating the configuration store.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The caller is not the configuration owner.
    #[error("unauthorized: only the owner can update configuration")]
    NotOwner,

    /// Fee rate above [`MAX_FEE_RATE_BPS`].
    #[error("invalid fee rate: {0} bps")]
    InvalidFeeRate(u16),

    /// Royalty protocol cut above [`MAX_ROYALTY_CUT_BPS`].
    #[error("invalid royalties fee rate: {0} bps")]
    InvalidRoyaltyCutRate(u16),

    /// Fee burn split above [`MAX_FEE_BURN_RATE_BPS`].
    #[error("invalid fee burn rate: {0} bps")]
    InvalidFeeBurnRate(u16),

    /// Empty revenue address.
    #[error("invalid revenue address")]
    InvalidRevenueAddress,

    /// Empty burn address.
    #[error("invalid burn address")]
    InvalidBurnAddress,

    /// Minimum duration of zero or at/above the current maximum.
    #[error("invalid minimum duration: {requested}s (maximum is {max}s)")]
    InvalidMinDuration {
        /// The rejected value.
        requested: u64,
        /// The current maximum duration.
        max: u64,
    },

    /// Maximum duration at/below the current minimum.
    #[error("invalid maximum duration: {requested}s (minimum is {min}s)")]
    InvalidMaxDuration {
        /// The rejected value.
        requested: u64,
        /// The current minimum duration.
        min: u64,
    },
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A collection that may only be sold in one designated payment unit, with
/// its burn-designated fees forwarded into the burn accumulator instead of
/// pushed straight to the burn address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictedCollection {
    /// The asset registry the restriction applies to.
    pub registry: Address,
    /// Ticker of the mandated payment unit.
    pub unit: String,
}

/// The configuration store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Address allowed to mutate this store.
    owner: Address,
    /// Buyer-side fee surcharge in basis points of the sale price.
    fee_rate_bps: u16,
    /// Fraction of the fee routed to the burn sink, in basis points.
    fee_burn_rate_bps: u16,
    /// Protocol cut of creator royalties, in basis points.
    royalty_cut_bps: u16,
    /// Account credited with protocol revenue.
    revenue_address: Address,
    /// Account that burned funds are pushed to.
    burn_address: Address,
    /// Lower duration bound (exclusive) for listings with an expiry.
    min_duration_secs: u64,
    /// Upper duration bound (exclusive) for listings with an expiry.
    max_duration_secs: u64,
    /// Optional restricted collection designation.
    restricted: Option<RestrictedCollection>,
}

impl MarketConfig {
    /// Creates a store with default rates and the given addresses.
    pub fn new(
        owner: impl Into<Address>,
        revenue_address: impl Into<Address>,
        burn_address: impl Into<Address>,
    ) -> Self {
        Self {
            owner: owner.into(),
            fee_rate_bps: DEFAULT_FEE_RATE_BPS,
            fee_burn_rate_bps: 0,
            royalty_cut_bps: 0,
            revenue_address: revenue_address.into(),
            burn_address: burn_address.into(),
            min_duration_secs: DEFAULT_MIN_DURATION_SECS,
            max_duration_secs: DEFAULT_MAX_DURATION_SECS,
            restricted: None,
        }
    }

    // -- reads --------------------------------------------------------------

    /// Buyer-side fee rate in basis points.
    pub fn fee_rate_bps(&self) -> u16 {
        self.fee_rate_bps
    }

    /// Burn split of the fee in basis points.
    pub fn fee_burn_rate_bps(&self) -> u16 {
        self.fee_burn_rate_bps
    }

    /// Protocol cut of royalties in basis points.
    pub fn royalty_cut_bps(&self) -> u16 {
        self.royalty_cut_bps
    }

    /// Protocol revenue account.
    pub fn revenue_address(&self) -> &str {
        &self.revenue_address
    }

    /// Burn destination account.
    pub fn burn_address(&self) -> &str {
        &self.burn_address
    }

    /// Lower duration bound (exclusive).
    pub fn min_duration_secs(&self) -> u64 {
        self.min_duration_secs
    }

    /// Upper duration bound (exclusive).
    pub fn max_duration_secs(&self) -> u64 {
        self.max_duration_secs
    }

    /// The restricted collection designation, if any.
    pub fn restricted(&self) -> Option<&RestrictedCollection> {
        self.restricted.as_ref()
    }

    /// Whether a duration is acceptable for an expiring listing.
    ///
    /// Bounds are strict-exclusive: `min < duration < max`.
    pub fn is_valid_duration(&self, duration_secs: u64) -> bool {
        duration_secs > self.min_duration_secs && duration_secs < self.max_duration_secs
    }

    // -- owner-gated writes -------------------------------------------------

    /// Sets the buyer-side fee rate.
    pub fn set_fee_rate(&mut self, caller: &str, bps: u16) -> Result<(), ConfigError> {
        self.authorize(caller)?;
        if bps > MAX_FEE_RATE_BPS {
            return Err(ConfigError::InvalidFeeRate(bps));
        }
        self.fee_rate_bps = bps;
        Ok(())
    }

    /// Sets the burn split of the fee.
    pub fn set_fee_burn_rate(&mut self, caller: &str, bps: u16) -> Result<(), ConfigError> {
        self.authorize(caller)?;
        if bps > MAX_FEE_BURN_RATE_BPS {
            return Err(ConfigError::InvalidFeeBurnRate(bps));
        }
        self.fee_burn_rate_bps = bps;
        Ok(())
    }

    /// Sets the protocol cut of creator royalties.
    pub fn set_royalty_cut_rate(&mut self, caller: &str, bps: u16) -> Result<(), ConfigError> {
        self.authorize(caller)?;
        if bps > MAX_ROYALTY_CUT_BPS {
            return Err(ConfigError::InvalidRoyaltyCutRate(bps));
        }
        self.royalty_cut_bps = bps;
        Ok(())
    }

    /// Sets the revenue account.
    pub fn set_revenue_address(
        &mut self,
        caller: &str,
        address: impl Into<Address>,
    ) -> Result<(), ConfigError> {
        self.authorize(caller)?;
        let address = address.into();
        if address.is_empty() {
            return Err(ConfigError::InvalidRevenueAddress);
        }
        self.revenue_address = address;
        Ok(())
    }

    /// Sets the burn destination account.
    pub fn set_burn_address(
        &mut self,
        caller: &str,
        address: impl Into<Address>,
    ) -> Result<(), ConfigError> {
        self.authorize(caller)?;
        let address = address.into();
        if address.is_empty() {
            return Err(ConfigError::InvalidBurnAddress);
        }
        self.burn_address = address;
        Ok(())
    }

    /// Sets the minimum listing duration. Must stay below the maximum.
    pub fn set_min_duration(&mut self, caller: &str, secs: u64) -> Result<(), ConfigError> {
        self.authorize(caller)?;
        if secs == 0 || secs >= self.max_duration_secs {
            return Err(ConfigError::InvalidMinDuration {
                requested: secs,
                max: self.max_duration_secs,
            });
        }
        self.min_duration_secs = secs;
        Ok(())
    }

    /// Sets the maximum listing duration. Must stay above the minimum.
    pub fn set_max_duration(&mut self, caller: &str, secs: u64) -> Result<(), ConfigError> {
        self.authorize(caller)?;
        if secs <= self.min_duration_secs {
            return Err(ConfigError::InvalidMaxDuration {
                requested: secs,
                min: self.min_duration_secs,
            });
        }
        self.max_duration_secs = secs;
        Ok(())
    }

    /// Designates (or clears) the restricted collection.
    pub fn set_restricted_collection(
        &mut self,
        caller: &str,
        restricted: Option<RestrictedCollection>,
    ) -> Result<(), ConfigError> {
        self.authorize(caller)?;
        self.restricted = restricted;
        Ok(())
    }

    fn authorize(&self, caller: &str) -> Result<(), ConfigError> {
        if caller != self.owner {
            return Err(ConfigError::NotOwner);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
