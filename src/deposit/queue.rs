//! Deposit Queue
//!
//! Pending deposit fragments ordered FIFO per (user, group, duration), plus
//! the fragment table keyed by derived deposit id. Fragments stay in the
//! table after assignment (their held value is still tracked) and are
//! destroyed once drained.

use std::collections::{HashMap, VecDeque};

use crate::common::error::{PoolError, Result};
use crate::settings::Settings;
use crate::types::fragment::DepositFragment;
use crate::types::ids::{Address, Amount, DepositId, DurationId, GroupId};

type QueueKey = (Address, GroupId, DurationId);

/// FIFO deposit queue and fragment table
#[derive(Debug, Default)]
pub struct DepositQueue {
    /// Queued fragment ids per (user, group, duration), insertion order
    queues: HashMap<QueueKey, VecDeque<DepositId>>,
    /// Every live fragment, queued or assigned
    fragments: HashMap<DepositId, DepositFragment>,
    /// Queue-global sequence for deposit id derivation
    sequence: u64,
}

impl DepositQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment for a validated deposit.
    ///
    /// Rejects when deposits are globally disabled, the duration is not
    /// recognised, or the amount falls outside the duration's bounds.
    pub fn enqueue(
        &mut self,
        settings: &dyn Settings,
        user: Address,
        group: GroupId,
        duration: DurationId,
        amount: Amount,
    ) -> Result<DepositId> {
        if !settings.deposits_allowed() {
            return Err(PoolError::DepositsDisabled);
        }
        let max = settings
            .max_deposit(&duration)
            .ok_or_else(|| PoolError::InvalidDuration(duration.to_string()))?;
        if amount < settings.min_deposit() || amount > max {
            return Err(PoolError::InvalidDeposit(format!(
                "amount {} outside [{}, {}] for duration {}",
                amount,
                settings.min_deposit(),
                max,
                duration
            )));
        }

        let id = DepositId::derive(&user, &group, &duration, self.sequence);
        self.sequence += 1;

        let fragment = DepositFragment::new(id, user, group, duration.clone(), amount);
        self.fragments.insert(id, fragment);
        self.queues
            .entry((user, group, duration))
            .or_default()
            .push_back(id);

        Ok(id)
    }

    /// Number of queued fragments for a (user, group, duration)
    pub fn count(&self, user: &Address, group: &GroupId, duration: &DurationId) -> usize {
        self.queues
            .get(&(*user, *group, duration.clone()))
            .map(|q| q.len())
            .unwrap_or(0)
    }

    /// Inspect the queued fragment at a position without removing it
    pub fn fragment_at(
        &self,
        user: &Address,
        group: &GroupId,
        duration: &DurationId,
        index: usize,
    ) -> Option<&DepositFragment> {
        let id = self
            .queues
            .get(&(*user, *group, duration.clone()))?
            .get(index)?;
        self.fragments.get(id)
    }

    /// Look up a live fragment by id
    pub fn fragment(&self, id: &DepositId) -> Option<&DepositFragment> {
        self.fragments.get(id)
    }

    pub(crate) fn fragment_mut(&mut self, id: &DepositId) -> Option<&mut DepositFragment> {
        self.fragments.get_mut(id)
    }

    /// Queued fragment ids of a triple, FIFO
    pub(crate) fn queued_ids(
        &self,
        user: &Address,
        group: &GroupId,
        duration: &DurationId,
    ) -> Vec<DepositId> {
        self.queues
            .get(&(*user, *group, duration.clone()))
            .map(|q| q.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Total queued value of a triple
    pub fn total_queued(&self, user: &Address, group: &GroupId, duration: &DurationId) -> Amount {
        self.queued_ids(user, group, duration)
            .iter()
            .filter_map(|id| self.fragments.get(id))
            .map(|f| f.queued)
            .sum()
    }

    /// Total queued value across every triple
    pub fn total_queued_all(&self) -> Amount {
        self.fragments.values().map(|f| f.queued).sum()
    }

    /// Total value held in minipools across every live fragment
    pub fn total_assigned_all(&self) -> Amount {
        self.fragments.values().map(|f| f.assigned()).sum()
    }

    /// Drop a fragment from its queue once nothing is queued, and destroy
    /// it entirely once drained. Call after any fragment mutation.
    pub(crate) fn purge(&mut self, id: &DepositId) {
        let Some(fragment) = self.fragments.get(id) else {
            return;
        };
        if fragment.queued > 0 {
            return;
        }
        let key = (fragment.user, fragment.group, fragment.duration.clone());
        let drained = fragment.is_drained();
        if let Some(queue) = self.queues.get_mut(&key) {
            queue.retain(|queued| queued != id);
            if queue.is_empty() {
                self.queues.remove(&key);
            }
        }
        if drained {
            self.fragments.remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::StaticSettings;

    fn settings() -> StaticSettings {
        StaticSettings::new(10, 4).with_duration("3m", 100)
    }

    fn triple() -> (Address, GroupId, DurationId) {
        (Address::from_tag(1), Address::from_tag(2), DurationId::from("3m"))
    }

    #[test]
    fn test_enqueue_fifo_order() {
        let settings = settings();
        let (user, group, duration) = triple();
        let mut queue = DepositQueue::new();

        let a = queue
            .enqueue(&settings, user, group, duration.clone(), 30)
            .unwrap();
        let b = queue
            .enqueue(&settings, user, group, duration.clone(), 40)
            .unwrap();
        assert_ne!(a, b);

        assert_eq!(queue.count(&user, &group, &duration), 2);
        assert_eq!(queue.fragment_at(&user, &group, &duration, 0).unwrap().id, a);
        assert_eq!(queue.fragment_at(&user, &group, &duration, 1).unwrap().id, b);
        assert!(queue.fragment_at(&user, &group, &duration, 2).is_none());
        assert_eq!(queue.total_queued(&user, &group, &duration), 70);
    }

    #[test]
    fn test_enqueue_bounds() {
        let settings = settings();
        let (user, group, duration) = triple();
        let mut queue = DepositQueue::new();

        let too_small = queue.enqueue(&settings, user, group, duration.clone(), 9);
        assert!(matches!(too_small, Err(PoolError::InvalidDeposit(_))));

        let too_large = queue.enqueue(&settings, user, group, duration.clone(), 101);
        assert!(matches!(too_large, Err(PoolError::InvalidDeposit(_))));

        let unknown = queue.enqueue(&settings, user, group, DurationId::from("9m"), 50);
        assert!(matches!(unknown, Err(PoolError::InvalidDuration(_))));
    }

    #[test]
    fn test_enqueue_disabled() {
        let settings = settings();
        settings.set_deposits_enabled(false);
        let (user, group, duration) = triple();
        let mut queue = DepositQueue::new();

        let result = queue.enqueue(&settings, user, group, duration, 50);
        assert!(matches!(result, Err(PoolError::DepositsDisabled)));
    }

    #[test]
    fn test_purge_removes_drained_fragments() {
        let settings = settings();
        let (user, group, duration) = triple();
        let mut queue = DepositQueue::new();
        let pool = Address::from_tag(10);

        let id = queue
            .enqueue(&settings, user, group, duration.clone(), 50)
            .unwrap();

        // Partially assigned: no longer queued but still live
        queue.fragment_mut(&id).unwrap().assign_to(pool, 50);
        queue.purge(&id);
        assert_eq!(queue.count(&user, &group, &duration), 0);
        assert!(queue.fragment(&id).is_some());

        // Fully withdrawn: destroyed
        queue.fragment_mut(&id).unwrap().withdraw_from(&pool, 50);
        queue.purge(&id);
        assert!(queue.fragment(&id).is_none());
    }
}
