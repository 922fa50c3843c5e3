//! Inventory ledger decision logic for a single room type.
//!
//! `Capacity` is the `(inventory, reserved)` pair carried by every room type.
//! Storage adapters hold the counter; this type decides whether a reserve or
//! release is allowed so every adapter applies the same rules.

use serde::{Deserialize, Serialize};

use innkeep_core::{DomainError, DomainResult};

/// Inventory/reserved counter pair. Always satisfies `0 <= reserved <= inventory`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CapacityFields")]
pub struct Capacity {
    inventory: i64,
    reserved: i64,
}

/// Wire shape of `Capacity`; decoding goes through `Capacity::new`.
#[derive(Deserialize)]
struct CapacityFields {
    inventory: i64,
    reserved: i64,
}

impl TryFrom<CapacityFields> for Capacity {
    type Error = DomainError;

    fn try_from(fields: CapacityFields) -> DomainResult<Self> {
        Capacity::new(fields.inventory, fields.reserved)
    }
}

/// Why a reserve attempt was refused.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    AtCapacity,
}

/// Outcome of `TryReserve`. `Reserved` carries the post-increment snapshot;
/// `Denied` leaves the counter untouched.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReserveOutcome {
    Reserved(Capacity),
    Denied { reason: DenyReason, capacity: Capacity },
}

impl ReserveOutcome {
    pub fn is_reserved(&self) -> bool {
        matches!(self, ReserveOutcome::Reserved(_))
    }

    pub fn capacity(&self) -> Capacity {
        match self {
            ReserveOutcome::Reserved(c) => *c,
            ReserveOutcome::Denied { capacity, .. } => *capacity,
        }
    }

    /// Convert a denial into the domain rejection.
    pub fn into_result(self) -> DomainResult<Capacity> {
        match self {
            ReserveOutcome::Reserved(c) => Ok(c),
            ReserveOutcome::Denied { capacity, .. } => Err(DomainError::CapacityExceeded {
                inventory: capacity.inventory,
                reserved: capacity.reserved,
            }),
        }
    }
}

impl Capacity {
    /// Build a counter pair, rejecting anything outside `0 <= reserved <= inventory`.
    pub fn new(inventory: i64, reserved: i64) -> DomainResult<Self> {
        if inventory < 0 {
            return Err(DomainError::validation("inventory cannot be negative"));
        }
        if reserved < 0 {
            return Err(DomainError::validation("reserved cannot be negative"));
        }
        if reserved > inventory {
            return Err(DomainError::validation(format!(
                "reserved ({reserved}) cannot exceed inventory ({inventory})"
            )));
        }
        Ok(Self {
            inventory,
            reserved,
        })
    }

    pub fn inventory(&self) -> i64 {
        self.inventory
    }

    pub fn reserved(&self) -> i64 {
        self.reserved
    }

    /// Units still sellable.
    pub fn available(&self) -> i64 {
        self.inventory - self.reserved
    }

    pub fn is_full(&self) -> bool {
        self.reserved >= self.inventory
    }

    /// Take one unit if `reserved < inventory`; otherwise leave state untouched.
    pub fn try_reserve(&mut self) -> ReserveOutcome {
        if self.is_full() {
            return ReserveOutcome::Denied {
                reason: DenyReason::AtCapacity,
                capacity: *self,
            };
        }
        self.reserved += 1;
        ReserveOutcome::Reserved(*self)
    }

    /// Give one unit back, floored at zero. Returns whether the counter moved.
    pub fn release(&mut self) -> bool {
        if self.reserved == 0 {
            return false;
        }
        self.reserved -= 1;
        true
    }
}
