//! Settings Collaborator
//!
//! The settings registry is external to this core; it is consumed through the
//! [`Settings`] trait injected at construction. [`StaticSettings`] is the
//! bundled implementation: fixed amounts with runtime enable toggles.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::types::ids::{Amount, DurationId};

/// Read surface of the external settings registry
#[cfg_attr(test, mockall::automock)]
pub trait Settings: Send + Sync {
    /// Whether deposits are globally enabled
    fn deposits_allowed(&self) -> bool;

    /// Whether withdrawals are globally enabled
    fn withdrawals_allowed(&self) -> bool;

    /// Whether refunds are globally enabled
    fn refunds_allowed(&self) -> bool;

    /// Minimum accepted deposit value
    fn min_deposit(&self) -> Amount;

    /// Maximum accepted deposit value for a duration class, or `None`
    /// when the duration is not recognised
    fn max_deposit(&self, duration: &DurationId) -> Option<Amount>;

    /// Size of the chunks the matching engine moves into minipools
    fn chunk_size(&self) -> Amount;
}

/// Fixed settings with runtime enable toggles
pub struct StaticSettings {
    min_deposit: Amount,
    max_by_duration: HashMap<DurationId, Amount>,
    chunk_size: Amount,
    deposits_enabled: AtomicBool,
    withdrawals_enabled: AtomicBool,
    refunds_enabled: AtomicBool,
}

impl StaticSettings {
    /// Create settings with everything enabled. Durations are recognised
    /// only after [`with_duration`](Self::with_duration).
    pub fn new(min_deposit: Amount, chunk_size: Amount) -> Self {
        Self {
            min_deposit,
            max_by_duration: HashMap::new(),
            chunk_size,
            deposits_enabled: AtomicBool::new(true),
            withdrawals_enabled: AtomicBool::new(true),
            refunds_enabled: AtomicBool::new(true),
        }
    }

    /// Register a recognised duration class with its deposit cap
    pub fn with_duration(mut self, duration: impl Into<DurationId>, max_deposit: Amount) -> Self {
        self.max_by_duration.insert(duration.into(), max_deposit);
        self
    }

    pub fn set_deposits_enabled(&self, enabled: bool) {
        self.deposits_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn set_withdrawals_enabled(&self, enabled: bool) {
        self.withdrawals_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn set_refunds_enabled(&self, enabled: bool) {
        self.refunds_enabled.store(enabled, Ordering::SeqCst);
    }
}

impl Settings for StaticSettings {
    fn deposits_allowed(&self) -> bool {
        self.deposits_enabled.load(Ordering::SeqCst)
    }

    fn withdrawals_allowed(&self) -> bool {
        self.withdrawals_enabled.load(Ordering::SeqCst)
    }

    fn refunds_allowed(&self) -> bool {
        self.refunds_enabled.load(Ordering::SeqCst)
    }

    fn min_deposit(&self) -> Amount {
        self.min_deposit
    }

    fn max_deposit(&self, duration: &DurationId) -> Option<Amount> {
        self.max_by_duration.get(duration).copied()
    }

    fn chunk_size(&self) -> Amount {
        self.chunk_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_settings_toggles() {
        let settings = StaticSettings::new(10, 4).with_duration("3m", 100);

        assert!(settings.deposits_allowed());
        assert!(settings.withdrawals_allowed());
        assert!(settings.refunds_allowed());

        settings.set_withdrawals_enabled(false);
        assert!(!settings.withdrawals_allowed());
        settings.set_withdrawals_enabled(true);
        assert!(settings.withdrawals_allowed());
    }

    #[test]
    fn test_duration_recognition() {
        let settings = StaticSettings::new(10, 4).with_duration("3m", 100);

        assert_eq!(settings.max_deposit(&DurationId::from("3m")), Some(100));
        assert_eq!(settings.max_deposit(&DurationId::from("9m")), None);
        assert_eq!(settings.min_deposit(), 10);
        assert_eq!(settings.chunk_size(), 4);
    }
}
