//! # Access Registries
//!
//! Two participation gates consulted by the engine:
//!
//! - a **user blacklist** — banned addresses can neither list nor buy;
//! - an **asset-registry whitelist** — a registry must be approved before
//!   any of its assets can be listed.
//!
//! Mutation is gated on the owner or a designated operator; reads are open.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Address;

/// Errors that can occur when mutating the access registries.
#[derive(Debug, Error)]
pub enum AccessError {
    /// The caller is neither the owner nor a designated operator.
    #[error("invalid operator or owner")]
    NotAuthorized,

    /// The caller is not the owner (operator management is owner-only).
    #[error("unauthorized: only the owner can manage operators")]
    NotOwner,

    /// Batch update with mismatched input lengths.
    #[error("length mismatch: {users} users, {flags} flags")]
    LengthMismatch {
        /// Number of user entries supplied.
        users: usize,
        /// Number of flag entries supplied.
        flags: usize,
    },
}

/// Blacklist and whitelist flags with their operator set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessRegistry {
    /// Address allowed to manage operators and flags.
    owner: Address,
    /// Addresses allowed to mutate the flags on the owner's behalf.
    operators: HashSet<Address>,
    /// Banned participants.
    blacklist: HashSet<Address>,
    /// Approved asset registries.
    whitelisted_registries: HashSet<Address>,
}

impl AccessRegistry {
    /// Creates an empty registry owned by `owner`.
    pub fn new(owner: impl Into<Address>) -> Self {
        Self {
            owner: owner.into(),
            operators: HashSet::new(),
            blacklist: HashSet::new(),
            whitelisted_registries: HashSet::new(),
        }
    }

    /// Whether an address is banned from participating.
    pub fn is_blacklisted(&self, address: &str) -> bool {
        self.blacklist.contains(address)
    }

    /// Whether an asset registry is approved for listing.
    pub fn is_whitelisted_registry(&self, registry: &str) -> bool {
        self.whitelisted_registries.contains(registry)
    }

    /// Whether an address is a designated operator.
    pub fn is_operator(&self, address: &str) -> bool {
        self.operators.contains(address)
    }

    /// Grants or revokes operator status. Owner only.
    pub fn set_operator(
        &mut self,
        caller: &str,
        operator: impl Into<Address>,
        enabled: bool,
    ) -> Result<(), AccessError> {
        if caller != self.owner {
            return Err(AccessError::NotOwner);
        }
        let operator = operator.into();
        if enabled {
            self.operators.insert(operator);
        } else {
            self.operators.remove(&operator);
        }
        Ok(())
    }

    /// Batch-updates blacklist flags. Operator or owner only.
    pub fn set_user_blacklist(
        &mut self,
        caller: &str,
        users: &[Address],
        flags: &[bool],
    ) -> Result<(), AccessError> {
        self.authorize(caller)?;
        if users.len() != flags.len() {
            return Err(AccessError::LengthMismatch {
                users: users.len(),
                flags: flags.len(),
            });
        }
        for (user, &banned) in users.iter().zip(flags) {
            if banned {
                self.blacklist.insert(user.clone());
            } else {
                self.blacklist.remove(user);
            }
        }
        Ok(())
    }

    /// Approves or revokes an asset registry. Operator or owner only.
    pub fn set_registry_whitelist(
        &mut self,
        caller: &str,
        registry: impl Into<Address>,
        approved: bool,
    ) -> Result<(), AccessError> {
        self.authorize(caller)?;
        let registry = registry.into();
        if approved {
            self.whitelisted_registries.insert(registry);
        } else {
            self.whitelisted_registries.remove(&registry);
        }
        Ok(())
    }

    fn authorize(&self, caller: &str) -> Result<(), AccessError> {
        if caller != self.owner && !self.operators.contains(caller) {
            return Err(AccessError::NotAuthorized);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
