//! Emitted Records
//!
//! Every committed state change appends one record to an owned, append-only
//! log. Callers observe the log as a stream; nothing in the core reads it
//! back. Records are mirrored to `tracing` for operators.

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::types::ids::{Address, Amount, DepositId, DurationId, GroupId};

/// One emitted record of a committed state change
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PoolEvent {
    /// A validated deposit entered the queue
    Deposit {
        from: Address,
        user: Address,
        group: GroupId,
        duration: DurationId,
        value: Amount,
        timestamp: u64,
    },
    /// Queued or stalled value was returned to the user
    DepositRefund {
        to: Address,
        user: Address,
        group: GroupId,
        deposit_id: DepositId,
        value: Amount,
        timestamp: u64,
    },
    /// A ledger entry was withdrawn into the derivative token
    DepositWithdraw {
        to: Address,
        user: Address,
        group: GroupId,
        deposit_id: DepositId,
        minipool: Address,
        value: Amount,
        timestamp: u64,
    },
}

/// Append-only event log
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<PoolEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn emit(&mut self, event: PoolEvent) {
        match &event {
            PoolEvent::Deposit { user, group, value, duration, .. } => {
                info!(
                    target: "pool::events",
                    user = %user, group = %group, duration = %duration, value = %value,
                    "deposit"
                );
            }
            PoolEvent::DepositRefund { to, deposit_id, value, .. } => {
                info!(
                    target: "pool::events",
                    to = %to, deposit_id = %deposit_id, value = %value,
                    "deposit refund"
                );
            }
            PoolEvent::DepositWithdraw { to, deposit_id, minipool, value, .. } => {
                info!(
                    target: "pool::events",
                    to = %to, deposit_id = %deposit_id, minipool = %minipool, value = %value,
                    "deposit withdraw"
                );
            }
        }
        self.events.push(event);
    }

    pub fn iter(&self) -> impl Iterator<Item = &PoolEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Current Unix timestamp for event records
pub(crate) fn event_timestamp() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_is_append_only() {
        let mut log = EventLog::new();
        assert!(log.is_empty());

        log.emit(PoolEvent::Deposit {
            from: Address::from_tag(1),
            user: Address::from_tag(1),
            group: Address::from_tag(2),
            duration: DurationId::from("3m"),
            value: 100,
            timestamp: event_timestamp(),
        });

        assert_eq!(log.len(), 1);
        assert!(matches!(
            log.iter().next(),
            Some(PoolEvent::Deposit { value: 100, .. })
        ));
    }

    #[test]
    fn test_events_serialize() {
        let event = PoolEvent::DepositRefund {
            to: Address::from_tag(1),
            user: Address::from_tag(1),
            group: Address::from_tag(2),
            deposit_id: DepositId([7u8; 32]),
            value: 42,
            timestamp: 1_700_000_000,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"deposit_refund\""));
        assert!(json.contains("\"value\":42"));
    }
}
