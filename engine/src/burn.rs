//! # Burn Accumulator
//!
//! A rate-limited sink for burn-designated proceeds. Funds forwarded here
//! accumulate in the vault's ledger account; each burn call destroys a
//! configured fraction of the vault's **total held balance** — not of the
//! amount just forwarded — by pushing it to the burn address, and advances
//! a running total-burned counter. The balance-relative policy means the
//! vault drains geometrically rather than linearly.
//!
//! Manual burns are operator-gated; rate and operator management is
//! owner-gated.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::payment::{PaymentError, TokenLedger};
use crate::Address;

/// Default burn fraction per call: 5% of the held balance.
pub const DEFAULT_BURN_RATE_BPS: u16 = 500;

/// Upper bound for the burn fraction: 100%.
pub const MAX_BURN_RATE_BPS: u16 = 10_000;

/// Errors that can occur during burn vault operations.
#[derive(Debug, Error)]
pub enum BurnError {
    /// The caller is not the vault owner.
    #[error("unauthorized: only the owner can configure the vault")]
    NotOwner,

    /// The caller is not a designated operator.
    #[error("invalid operator")]
    InvalidOperator,

    /// Burn rate above [`MAX_BURN_RATE_BPS`].
    #[error("invalid burn rate: {0} bps")]
    InvalidBurnRate(u16),

    /// The underlying ledger transfer failed.
    #[error(transparent)]
    Payment(#[from] PaymentError),
}

/// The burn accumulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurnVault {
    /// Address allowed to configure the vault.
    owner: Address,
    /// The vault's own account on the token ledger.
    account: Address,
    /// Where burned funds are pushed.
    burn_address: Address,
    /// Fraction of the held balance destroyed per call, in basis points.
    burn_rate_bps: u16,
    /// Lifetime total burned.
    total_burned: u64,
    /// Addresses allowed to trigger manual burns.
    operators: HashSet<Address>,
}

impl BurnVault {
    /// Creates a vault with the default burn rate.
    pub fn new(
        owner: impl Into<Address>,
        account: impl Into<Address>,
        burn_address: impl Into<Address>,
    ) -> Self {
        Self {
            owner: owner.into(),
            account: account.into(),
            burn_address: burn_address.into(),
            burn_rate_bps: DEFAULT_BURN_RATE_BPS,
            total_burned: 0,
            operators: HashSet::new(),
        }
    }

    /// The vault's ledger account.
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Current burn fraction in basis points.
    pub fn burn_rate_bps(&self) -> u16 {
        self.burn_rate_bps
    }

    /// Lifetime total burned.
    pub fn total_burned(&self) -> u64 {
        self.total_burned
    }

    /// Grants or revokes operator status. Owner only.
    pub fn set_operator(
        &mut self,
        caller: &str,
        operator: impl Into<Address>,
        enabled: bool,
    ) -> Result<(), BurnError> {
        if caller != self.owner {
            return Err(BurnError::NotOwner);
        }
        let operator = operator.into();
        if enabled {
            self.operators.insert(operator);
        } else {
            self.operators.remove(&operator);
        }
        Ok(())
    }

    /// Sets the burn fraction. Owner only.
    pub fn set_burn_rate(&mut self, caller: &str, bps: u16) -> Result<(), BurnError> {
        if caller != self.owner {
            return Err(BurnError::NotOwner);
        }
        if bps > MAX_BURN_RATE_BPS {
            return Err(BurnError::InvalidBurnRate(bps));
        }
        self.burn_rate_bps = bps;
        Ok(())
    }

    /// Receives forwarded funds, then burns the configured fraction of the
    /// vault's total held balance. Returns the amount burned.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`PaymentError`] if `from` cannot cover the
    /// forwarded amount; the vault is unchanged in that case.
    pub fn deposit_and_burn(
        &mut self,
        ledger: &mut TokenLedger,
        from: &str,
        amount: u64,
    ) -> Result<u64, BurnError> {
        ledger.transfer(from, &self.account, amount)?;
        self.burn_held(ledger)
    }

    /// Manually triggers a balance-relative burn. Operator only.
    pub fn burn(&mut self, ledger: &mut TokenLedger, caller: &str) -> Result<u64, BurnError> {
        if !self.operators.contains(caller) {
            return Err(BurnError::InvalidOperator);
        }
        self.burn_held(ledger)
    }

    fn burn_held(&mut self, ledger: &mut TokenLedger) -> Result<u64, BurnError> {
        let held = ledger.balance_of(&self.account);
        let burn = (held as u128 * self.burn_rate_bps as u128 / 10_000) as u64;
        if burn == 0 {
            return Ok(0);
        }
        ledger.transfer(&self.account, &self.burn_address, burn)?;
        self.total_burned += burn;
        debug!(burned = burn, held = held - burn, total = self.total_burned, "vault burn");
        Ok(burn)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (TokenLedger, BurnVault) {
        let mut ledger = TokenLedger::new("LFG");
        ledger.mint("market", 1_000_000).unwrap();
        let vault = BurnVault::new("owner", "vault", "burnpile");
        (ledger, vault)
    }

    #[test]
    fn deposit_burns_a_fraction_of_the_held_balance() {
        let (mut ledger, mut vault) = setup();

        // First forward: 10_000 held, 5% burned.
        let burned = vault.deposit_and_burn(&mut ledger, "market", 10_000).unwrap();
        assert_eq!(burned, 500);
        assert_eq!(vault.total_burned(), 500);
        assert_eq!(ledger.balance_of("vault"), 9_500);
        assert_eq!(ledger.balance_of("burnpile"), 500);

        // Second forward: the burn applies to the whole held balance
        // (9_500 + 10_000), not to the forwarded amount.
        let burned = vault.deposit_and_burn(&mut ledger, "market", 10_000).unwrap();
        assert_eq!(burned, 975);
        assert_eq!(vault.total_burned(), 1_475);
    }

    #[test]
    fn manual_burn_requires_operator() {
        let (mut ledger, mut vault) = setup();
        vault.deposit_and_burn(&mut ledger, "market", 10_000).unwrap();

        assert!(matches!(
            vault.burn(&mut ledger, "op"),
            Err(BurnError::InvalidOperator)
        ));

        vault.set_operator("owner", "op", true).unwrap();
        let burned = vault.burn(&mut ledger, "op").unwrap();
        assert_eq!(burned, 475); // 5% of the remaining 9_500
        assert_eq!(vault.total_burned(), 975);
    }

    #[test]
    fn burn_rate_is_bounded_and_owner_gated() {
        let (_, mut vault) = setup();
        assert!(matches!(
            vault.set_burn_rate("mallory", 1_000),
            Err(BurnError::NotOwner)
        ));
        assert!(matches!(
            vault.set_burn_rate("owner", 10_001),
            Err(BurnError::InvalidBurnRate(10_001))
        ));

        vault.set_burn_rate("owner", 1_000).unwrap();
        assert_eq!(vault.burn_rate_bps(), 1_000);
    }

    #[test]
    fn empty_vault_burn_is_a_noop() {
        let (mut ledger, mut vault) = setup();
        vault.set_operator("owner", "op", true).unwrap();
        assert_eq!(vault.burn(&mut ledger, "op").unwrap(), 0);
        assert_eq!(vault.total_burned(), 0);
    }
}
