//! Deposit Fragment Types
//!
//! A fragment is one discrete user deposit, tracked through its lifecycle:
//! queued → assigned (held by one or more minipools) → withdrawn/refunded.
//! The fragment is destroyed (removed from tracking) once nothing remains
//! queued or held.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::ids::{Address, Amount, DepositId, DurationId, GroupId};

/// Status of a deposit fragment through its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentStatus {
    /// Entire remaining amount is still waiting in the queue
    Queued,
    /// Some value has been assigned to at least one minipool
    Assigned,
    /// Fully paid out through withdrawal
    Withdrawn,
    /// Fully returned to the user
    Refunded,
}

impl Default for FragmentStatus {
    fn default() -> Self {
        Self::Queued
    }
}

impl std::fmt::Display for FragmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Queued => "queued",
            Self::Assigned => "assigned",
            Self::Withdrawn => "withdrawn",
            Self::Refunded => "refunded",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for FragmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "assigned" => Ok(Self::Assigned),
            "withdrawn" => Ok(Self::Withdrawn),
            "refunded" => Ok(Self::Refunded),
            _ => Err(format!("unknown status: {}", s)),
        }
    }
}

/// One user deposit tracked from enqueue to destruction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositFragment {
    /// Derived 32-byte identifier
    pub id: DepositId,
    /// Owning user
    pub user: Address,
    /// Owning group
    pub group: GroupId,
    /// Duration class
    pub duration: DurationId,
    /// Original deposited value
    pub total: Amount,
    /// Value still waiting in the queue
    pub queued: Amount,
    /// Value held per minipool (custody; the user keeps the claim)
    pub held: HashMap<Address, Amount>,
    /// Value paid out gross through withdrawal
    pub withdrawn: Amount,
    /// Value returned through refunds
    pub refunded: Amount,
    /// Current status
    pub status: FragmentStatus,
    /// Timestamp when the deposit was enqueued
    pub created_at: u64,
    /// Timestamp of last mutation
    pub updated_at: u64,
}

impl DepositFragment {
    /// Create a freshly queued fragment
    pub fn new(
        id: DepositId,
        user: Address,
        group: GroupId,
        duration: DurationId,
        amount: Amount,
    ) -> Self {
        let now = now_secs();
        Self {
            id,
            user,
            group,
            duration,
            total: amount,
            queued: amount,
            held: HashMap::new(),
            withdrawn: 0,
            refunded: 0,
            status: FragmentStatus::Queued,
            created_at: now,
            updated_at: now,
        }
    }

    /// Value currently held across all minipools
    pub fn assigned(&self) -> Amount {
        self.held.values().sum()
    }

    /// Value still owned by the user: queued plus held
    pub fn remaining(&self) -> Amount {
        self.queued + self.assigned()
    }

    /// Value held at one specific minipool
    pub fn held_at(&self, minipool: &Address) -> Amount {
        self.held.get(minipool).copied().unwrap_or(0)
    }

    /// Move queued value into a minipool's custody.
    ///
    /// Caller must have bounded `amount` by `self.queued`.
    pub fn assign_to(&mut self, minipool: Address, amount: Amount) {
        debug_assert!(amount <= self.queued);
        self.queued -= amount;
        *self.held.entry(minipool).or_insert(0) += amount;
        self.status = FragmentStatus::Assigned;
        self.touch();
    }

    /// Remove withdrawn value from a minipool's custody.
    ///
    /// Caller must have bounded `amount` by `held_at(minipool)`.
    pub fn withdraw_from(&mut self, minipool: &Address, amount: Amount) {
        self.debit_held(minipool, amount);
        self.withdrawn += amount;
        if self.remaining() == 0 {
            self.status = FragmentStatus::Withdrawn;
        }
        self.touch();
    }

    /// Return still-queued value to the user
    pub fn refund_queued(&mut self) -> Amount {
        let amount = self.queued;
        self.queued = 0;
        self.refunded += amount;
        if self.remaining() == 0 {
            self.status = FragmentStatus::Refunded;
        }
        self.touch();
        amount
    }

    /// Return value held by a stalled minipool to the user
    pub fn refund_from(&mut self, minipool: &Address, amount: Amount) {
        self.debit_held(minipool, amount);
        self.refunded += amount;
        if self.remaining() == 0 {
            self.status = FragmentStatus::Refunded;
        }
        self.touch();
    }

    /// True once nothing remains queued or held; the queue drops it
    pub fn is_drained(&self) -> bool {
        self.remaining() == 0
    }

    fn debit_held(&mut self, minipool: &Address, amount: Amount) {
        let entry = self.held.get_mut(minipool);
        debug_assert!(matches!(&entry, Some(held) if **held >= amount));
        if let Some(held) = entry {
            *held -= amount;
            if *held == 0 {
                self.held.remove(minipool);
            }
        }
    }

    fn touch(&mut self) {
        self.updated_at = now_secs();
    }
}

/// Current Unix timestamp in seconds
pub(crate) fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
