//! # Payment Facility
//!
//! An in-memory fungible token ledger with the classic
//! transfer/approve/transferFrom triad. The marketplace engine never
//! touches balances directly: buyers grant the engine an allowance, and
//! every pull into custody goes through [`TokenLedger::transfer_from`] so
//! that a failed pull aborts the operation before any engine state has
//! changed.
//!
//! All arithmetic is checked — wrapping arithmetic and money do not mix.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Address;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during token ledger operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The debited account does not hold enough funds.
    #[error("insufficient balance: {holder} has {available}, requested {requested}")]
    InsufficientBalance {
        /// The account being debited.
        holder: Address,
        /// Its current balance.
        available: u64,
        /// The amount that was requested.
        requested: u64,
    },

    /// The spender's allowance does not cover the requested amount.
    #[error(
        "insufficient allowance: {spender} may spend {allowed} of {owner}'s funds, requested {requested}"
    )]
    InsufficientAllowance {
        /// The account whose funds are being spent.
        owner: Address,
        /// The account doing the spending.
        spender: Address,
        /// The current approved amount.
        allowed: u64,
        /// The amount that was requested.
        requested: u64,
    },

    /// Crediting the amount would overflow the recipient's balance.
    #[error("balance overflow: crediting {credit} to {holder} would exceed u64::MAX")]
    Overflow {
        /// The account being credited.
        holder: Address,
        /// The amount that caused the overflow.
        credit: u64,
    },
}

// ---------------------------------------------------------------------------
// Token Ledger
// ---------------------------------------------------------------------------

/// The fungible payment facility backing every sale.
///
/// One ledger tracks one payment unit (e.g. the platform token). Balances
/// and allowances are plain maps; `mint` is open issuance used to bootstrap
/// balances — production deployments gate issuance upstream of the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenLedger {
    /// Ticker of the payment unit this ledger settles in.
    unit: String,
    /// Per-address balances in the smallest denomination.
    balances: HashMap<Address, u64>,
    /// Allowances: `owner -> (spender -> approved amount)`.
    allowances: HashMap<Address, HashMap<Address, u64>>,
}

impl TokenLedger {
    /// Creates an empty ledger for the given payment unit.
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            balances: HashMap::new(),
            allowances: HashMap::new(),
        }
    }

    /// The ticker of the payment unit.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Current balance of an address. Unknown addresses hold zero.
    pub fn balance_of(&self, holder: &str) -> u64 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    /// Current allowance granted by `owner` to `spender`.
    pub fn allowance(&self, owner: &str, spender: &str) -> u64 {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Issues new units to an address.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::Overflow`] if the credit would overflow.
    pub fn mint(&mut self, to: &str, amount: u64) -> Result<(), PaymentError> {
        self.credit(to, amount)
    }

    /// Sets the allowance granted by `owner` to `spender`.
    ///
    /// Overwrites any previous approval — the ERC20 increase/decrease dance
    /// is not needed inside a serialized execution model.
    pub fn approve(&mut self, owner: &str, spender: &str, amount: u64) {
        self.allowances
            .entry(owner.to_string())
            .or_default()
            .insert(spender.to_string(), amount);
    }

    /// Moves `amount` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::InsufficientBalance`] if `from` cannot cover
    /// the amount, or [`PaymentError::Overflow`] on recipient overflow. The
    /// ledger is unchanged on error.
    pub fn transfer(&mut self, from: &str, to: &str, amount: u64) -> Result<(), PaymentError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(PaymentError::InsufficientBalance {
                holder: from.to_string(),
                available,
                requested: amount,
            });
        }
        // Check the credit side before debiting so a failure leaves no trace.
        let recipient = self.balance_of(to);
        let credited = recipient
            .checked_add(amount)
            .ok_or_else(|| PaymentError::Overflow {
                holder: to.to_string(),
                credit: amount,
            })?;

        self.balances.insert(from.to_string(), available - amount);
        self.balances.insert(to.to_string(), credited);
        Ok(())
    }

    /// Moves `amount` from `owner` to `to`, spending `spender`'s allowance.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::InsufficientAllowance`] if the approval does
    /// not cover the amount, plus the [`transfer`](Self::transfer) errors.
    pub fn transfer_from(
        &mut self,
        spender: &str,
        owner: &str,
        to: &str,
        amount: u64,
    ) -> Result<(), PaymentError> {
        let allowed = self.allowance(owner, spender);
        if allowed < amount {
            return Err(PaymentError::InsufficientAllowance {
                owner: owner.to_string(),
                spender: spender.to_string(),
                allowed,
                requested: amount,
            });
        }

        self.transfer(owner, to, amount)?;

        self.allowances
            .entry(owner.to_string())
            .or_default()
            .insert(spender.to_string(), allowed - amount);
        Ok(())
    }

    fn credit(&mut self, to: &str, amount: u64) -> Result<(), PaymentError> {
        let current = self.balance_of(to);
        let credited = current
            .checked_add(amount)
            .ok_or_else(|| PaymentError::Overflow {
                holder: to.to_string(),
                credit: amount,
            })?;
        self.balances.insert(to.to_string(), credited);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_and_transfer() {
        let mut ledger = TokenLedger::new("LFG");
        ledger.mint("alice", 1_000).unwrap();
        ledger.transfer("alice", "bob", 400).unwrap();
        assert_eq!(ledger.balance_of("alice"), 600);
        assert_eq!(ledger.balance_of("bob"), 400);
    }

    #[test]
    fn transfer_more_than_balance_fails() {
        let mut ledger = TokenLedger::new("LFG");
        ledger.mint("alice", 100).unwrap();
        let result = ledger.transfer("alice", "bob", 101);
        assert!(matches!(
            result,
            Err(PaymentError::InsufficientBalance { available: 100, requested: 101, .. })
        ));
        // No partial effect.
        assert_eq!(ledger.balance_of("alice"), 100);
        assert_eq!(ledger.balance_of("bob"), 0);
    }

    #[test]
    fn transfer_from_spends_allowance() {
        let mut ledger = TokenLedger::new("LFG");
        ledger.mint("alice", 1_000).unwrap();
        ledger.approve("alice", "market", 500);

        ledger.transfer_from("market", "alice", "escrow", 300).unwrap();
        assert_eq!(ledger.balance_of("escrow"), 300);
        assert_eq!(ledger.allowance("alice", "market"), 200);
    }

    #[test]
    fn transfer_from_without_allowance_fails() {
        let mut ledger = TokenLedger::new("LFG");
        ledger.mint("alice", 1_000).unwrap();

        let result = ledger.transfer_from("market", "alice", "escrow", 1);
        assert!(matches!(result, Err(PaymentError::InsufficientAllowance { .. })));
        assert_eq!(ledger.balance_of("alice"), 1_000);
    }

    #[test]
    fn failed_transfer_from_keeps_allowance() {
        let mut ledger = TokenLedger::new("LFG");
        ledger.mint("alice", 100).unwrap();
        ledger.approve("alice", "market", 500);

        // Allowance covers it, balance does not.
        let result = ledger.transfer_from("market", "alice", "escrow", 200);
        assert!(matches!(result, Err(PaymentError::InsufficientBalance { .. })));
        assert_eq!(ledger.allowance("alice", "market"), 500);
    }
}
