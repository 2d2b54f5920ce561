//! # Escrow Ledger
//!
//! Per-address claimable balances under the pull-payment model: every
//! party a sale owes money to (seller, displaced bidder, royalty receiver,
//! revenue account) is *credited* here, and value only leaves the engine
//! when that party explicitly withdraws. Pushing on settlement would let a
//! single hostile recipient block unrelated listings; crediting cannot
//! fail, so settlement always completes.
//!
//! The ledger maintains running totals so the conservation invariant can
//! be checked from outside at any operation boundary: the engine custody
//! account must hold exactly `total claimable + live bids in custody`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Address;

/// Errors that can occur during escrow ledger operations.
#[derive(Debug, Error)]
pub enum EscrowError {
    /// Crediting the amount would overflow the claimable balance.
    #[error("escrow overflow: crediting {credit} to {holder} would exceed u64::MAX")]
    Overflow {
        /// The account being credited.
        holder: Address,
        /// The amount that caused the overflow.
        credit: u64,
    },
}

/// The claimable-balance table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EscrowLedger {
    /// Claimable amount per address.
    claimable: HashMap<Address, u64>,
    /// Sum of all claimable balances.
    total_claimable: u64,
    /// Lifetime total ever credited.
    total_credited: u64,
    /// Lifetime total ever withdrawn.
    total_withdrawn: u64,
}

impl EscrowLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claimable balance of an address. Unknown addresses hold zero.
    pub fn balance_of(&self, holder: &str) -> u64 {
        self.claimable.get(holder).copied().unwrap_or(0)
    }

    /// Sum of all claimable balances.
    pub fn total_claimable(&self) -> u64 {
        self.total_claimable
    }

    /// Lifetime total ever credited.
    pub fn total_credited(&self) -> u64 {
        self.total_credited
    }

    /// Lifetime total ever withdrawn.
    pub fn total_withdrawn(&self) -> u64 {
        self.total_withdrawn
    }

    /// Credits `amount` to `holder`'s claimable balance.
    ///
    /// A zero credit is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`EscrowError::Overflow`] if the balance or a running total
    /// would overflow. The ledger is unchanged on error.
    pub fn credit(&mut self, holder: &str, amount: u64) -> Result<(), EscrowError> {
        if amount == 0 {
            return Ok(());
        }
        let current = self.balance_of(holder);
        let overflow = || EscrowError::Overflow {
            holder: holder.to_string(),
            credit: amount,
        };
        let credited = current.checked_add(amount).ok_or_else(overflow)?;
        let total = self.total_claimable.checked_add(amount).ok_or_else(overflow)?;
        let lifetime = self.total_credited.checked_add(amount).ok_or_else(overflow)?;

        self.claimable.insert(holder.to_string(), credited);
        self.total_claimable = total;
        self.total_credited = lifetime;
        Ok(())
    }

    /// Zeroes and returns `holder`'s entire claimable balance.
    ///
    /// Returns 0 for an empty balance — withdrawing nothing is a no-op,
    /// not an error.
    pub fn take_all(&mut self, holder: &str) -> u64 {
        let amount = match self.claimable.remove(holder) {
            Some(amount) if amount > 0 => amount,
            _ => return 0,
        };
        // Cannot underflow: the amount was part of the running total.
        self.total_claimable -= amount;
        self.total_withdrawn += amount;
        amount
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_accumulates() {
        let mut escrow = EscrowLedger::new();
        escrow.credit("seller", 100).unwrap();
        escrow.credit("seller", 50).unwrap();
        assert_eq!(escrow.balance_of("seller"), 150);
        assert_eq!(escrow.total_claimable(), 150);
    }

    #[test]
    fn take_all_zeroes_the_balance() {
        let mut escrow = EscrowLedger::new();
        escrow.credit("seller", 100).unwrap();

        assert_eq!(escrow.take_all("seller"), 100);
        assert_eq!(escrow.balance_of("seller"), 0);
        assert_eq!(escrow.total_claimable(), 0);
        assert_eq!(escrow.total_withdrawn(), 100);
    }

    #[test]
    fn take_all_on_empty_balance_is_a_noop() {
        let mut escrow = EscrowLedger::new();
        assert_eq!(escrow.take_all("nobody"), 0);
        assert_eq!(escrow.total_withdrawn(), 0);
    }

    #[test]
    fn totals_track_every_movement() {
        let mut escrow = EscrowLedger::new();
        escrow.credit("a", 70).unwrap();
        escrow.credit("b", 30).unwrap();
        escrow.take_all("a");

        assert_eq!(escrow.total_credited(), 100);
        assert_eq!(escrow.total_withdrawn(), 70);
        assert_eq!(escrow.total_claimable(), 30);
    }

    #[test]
    fn zero_credit_is_a_noop() {
        let mut escrow = EscrowLedger::new();
        escrow.credit("a", 0).unwrap();
        assert_eq!(escrow.total_credited(), 0);
    }
}
