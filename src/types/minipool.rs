//! Minipool Types
//!
//! A minipool pools depositor value with node-operator collateral to run a
//! validator. The core never advances a minipool's status itself; it observes
//! externally driven transitions and gates deposits and withdrawals on them:
//! prelaunch → staking → exited → withdrawn, with closed as the terminal
//! timeout/cancellation state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::ids::{Address, Amount, DurationId, GroupId};

/// Status of a minipool through its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinipoolStatus {
    /// Accepting assigned deposits; validator not yet launched
    PreLaunch,
    /// Validator active; partial or full user withdrawals permitted
    Staking,
    /// Validator exited; one full withdrawal of the remaining entry
    Exited,
    /// Withdrawal confirmed on the consensus layer
    Withdrawn,
    /// Timed out or cancelled; held value is refundable
    Closed,
}

impl MinipoolStatus {
    /// Position along the forward lifecycle, used to reject backwards
    /// status observations. `Closed` is reachable from everything.
    pub(crate) fn rank(&self) -> u8 {
        match self {
            Self::PreLaunch => 0,
            Self::Staking => 1,
            Self::Exited => 2,
            Self::Withdrawn => 3,
            Self::Closed => 4,
        }
    }

    /// Whether user withdrawals are permitted in this status
    pub fn allows_withdrawal(&self) -> bool {
        matches!(self, Self::Staking | Self::Exited | Self::Withdrawn)
    }

    /// Whether a withdrawal must take the entire remaining entry
    pub fn requires_full_withdrawal(&self) -> bool {
        matches!(self, Self::Exited | Self::Withdrawn)
    }
}

impl Default for MinipoolStatus {
    fn default() -> Self {
        Self::PreLaunch
    }
}

impl std::fmt::Display for MinipoolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PreLaunch => "prelaunch",
            Self::Staking => "staking",
            Self::Exited => "exited",
            Self::Withdrawn => "withdrawn",
            Self::Closed => "closed",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for MinipoolStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prelaunch" => Ok(Self::PreLaunch),
            "staking" => Ok(Self::Staking),
            "exited" => Ok(Self::Exited),
            "withdrawn" => Ok(Self::Withdrawn),
            "closed" => Ok(Self::Closed),
            _ => Err(format!("unknown status: {}", s)),
        }
    }
}

/// A minipool's deposit ledger and status, keyed by its contract address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Minipool {
    /// Contract address (opaque handle)
    pub address: Address,
    /// Node operator backing this pool
    pub node_operator: Address,
    /// Duration class this pool serves
    pub duration: DurationId,
    /// Current lifecycle status
    pub status: MinipoolStatus,
    /// Maximum user value this pool accepts
    pub capacity: Amount,
    /// Cumulative user value deposited (never decremented)
    pub total_deposited: Amount,
    /// Remaining claim per (user, group)
    pub ledger: HashMap<(Address, GroupId), Amount>,
}

impl Minipool {
    /// Create a new minipool in PreLaunch
    pub fn new(
        address: Address,
        node_operator: Address,
        duration: DurationId,
        capacity: Amount,
    ) -> Self {
        Self {
            address,
            node_operator,
            duration,
            status: MinipoolStatus::PreLaunch,
            capacity,
            total_deposited: 0,
            ledger: HashMap::new(),
        }
    }

    /// User capacity still unfilled
    pub fn capacity_remaining(&self) -> Amount {
        self.capacity.saturating_sub(self.total_deposited)
    }

    /// Remaining claim of one (user, group)
    pub fn ledger_entry(&self, user: &Address, group: &GroupId) -> Amount {
        self.ledger.get(&(*user, *group)).copied().unwrap_or(0)
    }

    /// Sum of all remaining claims
    pub fn ledger_total(&self) -> Amount {
        self.ledger.values().sum()
    }

    /// Credit an assigned chunk to a (user, group) claim.
    ///
    /// Caller must have checked PreLaunch status and bounded `amount` by
    /// `capacity_remaining()`; this only maintains the ledger.
    pub(crate) fn credit(&mut self, user: Address, group: GroupId, amount: Amount) {
        debug_assert_eq!(self.status, MinipoolStatus::PreLaunch);
        debug_assert!(amount <= self.capacity_remaining());
        self.total_deposited += amount;
        *self.ledger.entry((user, group)).or_insert(0) += amount;
    }

    /// Remove withdrawn or refunded value from a (user, group) claim.
    ///
    /// Caller must have bounded `amount` by `ledger_entry()`; entries are
    /// dropped once they reach zero.
    pub(crate) fn debit(&mut self, user: &Address, group: &GroupId, amount: Amount) {
        let key = (*user, *group);
        let entry = self.ledger.get_mut(&key);
        debug_assert!(matches!(&entry, Some(held) if **held >= amount));
        if let Some(held) = entry {
            *held -= amount;
            if *held == 0 {
                self.ledger.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_gating() {
        assert!(!MinipoolStatus::PreLaunch.allows_withdrawal());
        assert!(MinipoolStatus::Staking.allows_withdrawal());
        assert!(MinipoolStatus::Exited.allows_withdrawal());
        assert!(MinipoolStatus::Withdrawn.allows_withdrawal());
        assert!(!MinipoolStatus::Closed.allows_withdrawal());

        assert!(!MinipoolStatus::Staking.requires_full_withdrawal());
        assert!(MinipoolStatus::Exited.requires_full_withdrawal());
    }

    #[test]
    fn test_status_round_trip() {
        for s in [
            MinipoolStatus::PreLaunch,
            MinipoolStatus::Staking,
            MinipoolStatus::Exited,
            MinipoolStatus::Withdrawn,
            MinipoolStatus::Closed,
        ] {
            assert_eq!(s.to_string().parse::<MinipoolStatus>(), Ok(s));
        }
    }

    #[test]
    fn test_ledger_credit_debit() {
        let user = Address::from_tag(1);
        let group = Address::from_tag(2);
        let mut pool = Minipool::new(
            Address::from_tag(10),
            Address::from_tag(99),
            DurationId::from("3m"),
            100,
        );

        pool.credit(user, group, 60);
        assert_eq!(pool.ledger_entry(&user, &group), 60);
        assert_eq!(pool.capacity_remaining(), 40);
        assert_eq!(pool.ledger_total(), 60);

        pool.debit(&user, &group, 60);
        assert_eq!(pool.ledger_entry(&user, &group), 0);
        assert!(pool.ledger.is_empty());
        // Cumulative total is not given back; capacity stays consumed
        assert_eq!(pool.capacity_remaining(), 40);
        assert!(pool.ledger_total() <= pool.total_deposited);
    }
}
