//! Package aggregate.
//!
//! A package is one entry in the membership catalog: what it costs, how long
//! it lasts and how many members it may hold at once.
//!
//! # Capacity
//!
//! `current_members` is shared state. It is only changed by
//! [`Package::claim_slot`] (successful payment reconciled) and
//! [`Package::release_slot`] (chargeback, grace period ended, or a renewal
//! moving the member to another package), always inside the same storage
//! transaction as the matching membership change.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, Money, PackageId, Timestamp};

use super::PlanCategory;

/// Outcome of claiming a slot on a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotClaim {
    /// Slot claimed within capacity.
    Claimed,
    /// Slot claimed although the package was already full. Happens when a
    /// settled payment arrives after the last slot was taken; settled money
    /// is never refused, so the overflow is reported instead.
    Overbooked,
}

/// Membership package in the catalog.
///
/// # Invariants
///
/// - `discount_percent` is within 0..=100
/// - `duration_months` is at least 1
/// - `current_members` never goes below zero
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub id: PackageId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub duration_months: u32,
    pub discount_percent: Option<u8>,
    /// Maximum concurrent members; `None` means unlimited.
    pub max_members: Option<u32>,
    pub current_members: u32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Package {
    /// Creates a new active package with no members.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty name, a zero duration or a
    /// discount above 100%.
    pub fn new(
        name: impl Into<String>,
        price: Money,
        duration_months: u32,
        discount_percent: Option<u8>,
        max_members: Option<u32>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name", "Package name cannot be empty"));
        }
        if duration_months == 0 {
            return Err(DomainError::validation(
                "duration_months",
                "Package must last at least one month",
            ));
        }
        if let Some(discount) = discount_percent {
            if discount > 100 {
                return Err(DomainError::validation(
                    "discount_percent",
                    format!("Discount must be between 0 and 100, got {}", discount),
                ));
            }
        }

        let now = Timestamp::now();
        Ok(Self {
            id: PackageId::new(),
            name,
            description: None,
            price,
            duration_months,
            discount_percent,
            max_members,
            current_members: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Price after the package discount.
    pub fn discounted_amount(&self) -> Money {
        match self.discount_percent {
            Some(percent) => self.price.less_percent(percent),
            None => self.price,
        }
    }

    /// Remaining slots, or `None` for unlimited packages.
    pub fn remaining_slots(&self) -> Option<u32> {
        self.max_members
            .map(|max| max.saturating_sub(self.current_members))
    }

    /// True if a new member can still join.
    pub fn has_capacity(&self) -> bool {
        self.remaining_slots().map_or(true, |slots| slots > 0)
    }

    pub fn plan_category(&self) -> PlanCategory {
        PlanCategory::from_duration_months(self.duration_months)
    }

    /// Counts one more member on this package.
    pub fn claim_slot(&mut self) -> SlotClaim {
        let claim = if self.has_capacity() {
            SlotClaim::Claimed
        } else {
            SlotClaim::Overbooked
        };
        self.current_members = self.current_members.saturating_add(1);
        self.updated_at = Timestamp::now();
        claim
    }

    /// Counts one member fewer, flooring at zero.
    pub fn release_slot(&mut self) {
        self.current_members = self.current_members.saturating_sub(1);
        self.updated_at = Timestamp::now();
    }
}
