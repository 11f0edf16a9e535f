//! Minipool Registry and Lifecycle Observation
//!
//! Holds every minipool's ledger in creation order. Status transitions are
//! driven by external calls (staking start, validator exit, withdrawal
//! confirmation, timeout); the registry records them through `set_status`
//! and rejects observations that would move a pool backwards.

use std::collections::HashMap;

use tracing::info;

use crate::common::error::{PoolError, Result};
use crate::types::ids::{Address, Amount, DurationId, GroupId};
use crate::types::minipool::{Minipool, MinipoolStatus};

/// Registry of minipools, iterated FIFO by creation order
#[derive(Debug, Default)]
pub struct MinipoolRegistry {
    pools: HashMap<Address, Minipool>,
    /// Creation order; the matching engine's tie-break
    order: Vec<Address>,
}

impl MinipoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly created minipool
    pub fn register(&mut self, minipool: Minipool) -> Result<()> {
        if self.pools.contains_key(&minipool.address) {
            return Err(PoolError::DuplicateMinipool(minipool.address));
        }
        info!(
            target: "pool::minipool",
            minipool = %minipool.address,
            duration = %minipool.duration,
            capacity = minipool.capacity,
            "minipool registered"
        );
        self.order.push(minipool.address);
        self.pools.insert(minipool.address, minipool);
        Ok(())
    }

    pub fn get(&self, address: &Address) -> Option<&Minipool> {
        self.pools.get(address)
    }

    pub(crate) fn get_mut(&mut self, address: &Address) -> Result<&mut Minipool> {
        self.pools
            .get_mut(address)
            .ok_or(PoolError::UnknownMinipool(*address))
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Current status of a minipool
    pub fn status(&self, address: &Address) -> Result<MinipoolStatus> {
        self.pools
            .get(address)
            .map(|p| p.status)
            .ok_or(PoolError::UnknownMinipool(*address))
    }

    /// Record an externally driven status transition.
    ///
    /// The core never advances status itself. Observations must move the
    /// pool forward along prelaunch → staking → exited → withdrawn, or to
    /// closed; anything backwards is rejected.
    pub fn set_status(&mut self, address: &Address, status: MinipoolStatus) -> Result<()> {
        let pool = self.get_mut(address)?;
        if status.rank() < pool.status.rank() {
            return Err(PoolError::InvalidStatusChange {
                minipool: *address,
                from: pool.status,
                to: status,
            });
        }
        if pool.status != status {
            info!(
                target: "pool::minipool",
                minipool = %address,
                from = %pool.status,
                to = %status,
                "minipool status observed"
            );
            pool.status = status;
        }
        Ok(())
    }

    /// Remaining claim of a (user, group) at a minipool
    pub fn ledger_entry(&self, address: &Address, user: &Address, group: &GroupId) -> Result<Amount> {
        self.pools
            .get(address)
            .map(|p| p.ledger_entry(user, group))
            .ok_or(PoolError::UnknownMinipool(*address))
    }

    /// Unfilled user capacity of a minipool
    pub fn capacity_remaining(&self, address: &Address) -> Result<Amount> {
        self.pools
            .get(address)
            .map(|p| p.capacity_remaining())
            .ok_or(PoolError::UnknownMinipool(*address))
    }

    /// Addresses of PreLaunch pools for a duration, in creation order
    pub fn prelaunch_pools(&self, duration: &DurationId) -> Vec<Address> {
        self.order
            .iter()
            .filter(|addr| {
                self.pools
                    .get(addr)
                    .map(|p| p.status == MinipoolStatus::PreLaunch && &p.duration == duration)
                    .unwrap_or(false)
            })
            .copied()
            .collect()
    }

    /// Sum of all remaining ledger claims across every pool
    pub fn total_ledger(&self) -> Amount {
        self.pools.values().map(|p| p.ledger_total()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(tag: u8, duration: &str, capacity: Amount) -> Minipool {
        Minipool::new(
            Address::from_tag(tag),
            Address::from_tag(90),
            DurationId::from(duration),
            capacity,
        )
    }

    #[test]
    fn test_register_and_duplicate() {
        let mut registry = MinipoolRegistry::new();
        registry.register(pool(10, "3m", 100)).unwrap();

        let result = registry.register(pool(10, "3m", 100));
        assert!(matches!(result, Err(PoolError::DuplicateMinipool(_))));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_status_moves_forward_only() {
        let mut registry = MinipoolRegistry::new();
        let addr = Address::from_tag(10);
        registry.register(pool(10, "3m", 100)).unwrap();

        registry.set_status(&addr, MinipoolStatus::Staking).unwrap();
        registry.set_status(&addr, MinipoolStatus::Exited).unwrap();
        // Re-observing the same status is a no-op
        registry.set_status(&addr, MinipoolStatus::Exited).unwrap();

        let result = registry.set_status(&addr, MinipoolStatus::PreLaunch);
        assert!(matches!(result, Err(PoolError::InvalidStatusChange { .. })));
        assert_eq!(registry.status(&addr).unwrap(), MinipoolStatus::Exited);

        // Closed is reachable from anywhere forward
        registry.set_status(&addr, MinipoolStatus::Closed).unwrap();
    }

    #[test]
    fn test_prelaunch_pools_creation_order() {
        let mut registry = MinipoolRegistry::new();
        registry.register(pool(10, "3m", 100)).unwrap();
        registry.register(pool(11, "6m", 100)).unwrap();
        registry.register(pool(12, "3m", 100)).unwrap();

        let three_month = registry.prelaunch_pools(&DurationId::from("3m"));
        assert_eq!(three_month, vec![Address::from_tag(10), Address::from_tag(12)]);

        // A staking pool drops out of the prelaunch set
        registry
            .set_status(&Address::from_tag(10), MinipoolStatus::Staking)
            .unwrap();
        let three_month = registry.prelaunch_pools(&DurationId::from("3m"));
        assert_eq!(three_month, vec![Address::from_tag(12)]);
    }

    #[test]
    fn test_unknown_minipool() {
        let registry = MinipoolRegistry::new();
        let addr = Address::from_tag(44);
        assert!(matches!(
            registry.status(&addr),
            Err(PoolError::UnknownMinipool(_))
        ));
        assert!(matches!(
            registry.capacity_remaining(&addr),
            Err(PoolError::UnknownMinipool(_))
        ));
    }
}
