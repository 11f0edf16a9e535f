//! Pool Service
//!
//! Owns the queue, the minipool registry, the derivative-token ledger and
//! the event log, and holds the injected collaborator handles. Every
//! mutating operation runs to completion against `&mut self`; the shared
//! wrapper in [`crate::deposit::api`] serializes callers, so no operation
//! ever observes another half-applied.

use std::sync::Arc;

use tracing::info;

use crate::common::error::Result;
use crate::deposit::matching;
use crate::deposit::queue::DepositQueue;
use crate::events::{event_timestamp, EventLog, PoolEvent};
use crate::group::GroupAccess;
use crate::minipool::MinipoolRegistry;
use crate::node::NodeSupply;
use crate::settings::Settings;
use crate::token::TokenLedger;
use crate::types::ids::{Address, Amount, DepositId, DurationId, GroupId};

/// Running totals across the service lifetime
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolStats {
    /// Count of accepted deposits
    pub deposits: u64,
    /// Count of completed withdrawals
    pub withdrawals: u64,
    /// Count of completed refunds
    pub refunds: u64,
    /// Total value accepted through the facade
    pub total_deposited: Amount,
    /// Total value moved into minipools
    pub total_assigned: Amount,
    /// Total gross value withdrawn (fees included)
    pub total_withdrawn: Amount,
    /// Total fee value carved out of withdrawals
    pub total_fees: Amount,
    /// Total value returned through refunds
    pub total_refunded: Amount,
}

impl std::fmt::Display for PoolStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Pool: {} deposits ({} wei) | {} withdrawals ({} wei gross, {} wei fees) | {} refunds ({} wei)",
            self.deposits,
            self.total_deposited,
            self.withdrawals,
            self.total_withdrawn,
            self.total_fees,
            self.refunds,
            self.total_refunded
        )
    }
}

/// The deposit/minipool/withdrawal accounting core
pub struct PoolService {
    pub(crate) settings: Arc<dyn Settings>,
    pub(crate) groups: Arc<dyn GroupAccess>,
    pub(crate) node_supply: Box<dyn NodeSupply>,
    /// The only address allowed into withdrawal accounting
    pub(crate) facade: Address,
    /// Destination of the protocol's fee share
    pub(crate) protocol_fee_address: Address,
    pub(crate) queue: DepositQueue,
    pub(crate) minipools: MinipoolRegistry,
    pub(crate) token: TokenLedger,
    pub(crate) events: EventLog,
    pub(crate) stats: PoolStats,
}

impl PoolService {
    /// Wire the core to its collaborators.
    ///
    /// `facade` is the address of the deposit API this core will accept
    /// withdrawal calls from; everything else is rejected.
    pub fn new(
        settings: Arc<dyn Settings>,
        groups: Arc<dyn GroupAccess>,
        node_supply: Box<dyn NodeSupply>,
        facade: Address,
        protocol_fee_address: Address,
    ) -> Self {
        Self {
            settings,
            groups,
            node_supply,
            facade,
            protocol_fee_address,
            queue: DepositQueue::new(),
            minipools: MinipoolRegistry::new(),
            token: TokenLedger::new(),
            events: EventLog::new(),
            stats: PoolStats::default(),
        }
    }

    pub fn queue(&self) -> &DepositQueue {
        &self.queue
    }

    pub fn minipools(&self) -> &MinipoolRegistry {
        &self.minipools
    }

    /// Mutable registry access for externally driven lifecycle observation
    /// (status changes come from the node layer, not from this core)
    pub fn minipools_mut(&mut self) -> &mut MinipoolRegistry {
        &mut self.minipools
    }

    pub fn token(&self) -> &TokenLedger {
        &self.token
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    /// Enqueue a validated deposit and run the matching engine.
    ///
    /// Called by the facade after its precondition checks; the queue
    /// re-checks bounds so a direct path cannot sidestep them.
    pub(crate) fn deposit_value(
        &mut self,
        from: Address,
        user: Address,
        group: GroupId,
        duration: DurationId,
        value: Amount,
    ) -> Result<DepositId> {
        let id = self
            .queue
            .enqueue(self.settings.as_ref(), user, group, duration.clone(), value)?;

        let assigned = matching::assign_queued(
            self.settings.as_ref(),
            &mut self.queue,
            &mut self.minipools,
            self.node_supply.as_mut(),
            &user,
            &group,
            &duration,
        )?;

        self.stats.deposits += 1;
        self.stats.total_deposited += value;
        self.stats.total_assigned += assigned;

        info!(
            target: "pool::deposit",
            deposit_id = %id,
            user = %user,
            value = %value,
            assigned = %assigned,
            "deposit accepted"
        );

        self.events.emit(PoolEvent::Deposit {
            from,
            user,
            group,
            duration,
            value,
            timestamp: event_timestamp(),
        });

        Ok(id)
    }

    /// Re-run the matching engine for a triple whose value stayed queued,
    /// typically once fresh minipool capacity has come online. Returns the
    /// newly assigned amount.
    pub fn rematch_queued(
        &mut self,
        user: Address,
        group: GroupId,
        duration: DurationId,
    ) -> Result<Amount> {
        let assigned = matching::assign_queued(
            self.settings.as_ref(),
            &mut self.queue,
            &mut self.minipools,
            self.node_supply.as_mut(),
            &user,
            &group,
            &duration,
        )?;
        self.stats.total_assigned += assigned;

        if assigned > 0 {
            info!(
                target: "pool::deposit",
                user = %user,
                assigned = %assigned,
                "queued value re-matched"
            );
        }
        Ok(assigned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::{Group, GroupRegistry};
    use crate::node::StagedNodeSupply;
    use crate::settings::StaticSettings;
    use crate::types::minipool::Minipool;

    fn service() -> (PoolService, Address, GroupId, DurationId) {
        let user = Address::from_tag(1);
        let group_id = Address::from_tag(2);
        let duration = DurationId::from("3m");

        let settings = StaticSettings::new(1, 4).with_duration("3m", 100);
        let mut groups = GroupRegistry::new();
        groups
            .register_group(Group::new(group_id, 0, 0, Address::from_tag(3)))
            .unwrap();

        let mut supply = StagedNodeSupply::new();
        supply.stage(Minipool::new(
            Address::from_tag(10),
            Address::from_tag(90),
            duration.clone(),
            16,
        ));

        let service = PoolService::new(
            Arc::new(settings),
            Arc::new(groups),
            Box::new(supply),
            Address::from_tag(100),
            Address::from_tag(101),
        );
        (service, user, group_id, duration)
    }

    #[test]
    fn test_deposit_value_enqueues_and_matches() {
        let (mut service, user, group, duration) = service();

        let id = service
            .deposit_value(user, user, group, duration.clone(), 10)
            .unwrap();

        // Fully assigned into the freshly requested pool
        assert_eq!(service.queue().total_queued(&user, &group, &duration), 0);
        assert_eq!(service.queue().fragment(&id).unwrap().assigned(), 10);
        assert_eq!(service.minipools().len(), 1);
        assert_eq!(service.stats().total_deposited, 10);
        assert_eq!(service.stats().total_assigned, 10);
        assert_eq!(service.events().len(), 1);
    }

    #[test]
    fn test_deposit_commits_when_supply_pool_is_unusable() {
        use crate::node::NodeSupply;

        // Supply hands back an address the registry already holds
        struct RecycledSupply;
        impl NodeSupply for RecycledSupply {
            fn request_minipool(&mut self, duration: &DurationId) -> Option<Minipool> {
                Some(Minipool::new(
                    Address::from_tag(10),
                    Address::from_tag(90),
                    duration.clone(),
                    8,
                ))
            }
        }

        let user = Address::from_tag(1);
        let group = Address::from_tag(2);
        let duration = DurationId::from("3m");

        let settings = StaticSettings::new(1, 4).with_duration("3m", 1000);
        let mut groups = GroupRegistry::new();
        groups
            .register_group(Group::new(group, 0, 0, Address::from_tag(3)))
            .unwrap();

        let mut service = PoolService::new(
            Arc::new(settings),
            Arc::new(groups),
            Box::new(RecycledSupply),
            Address::from_tag(100),
            Address::from_tag(101),
        );
        service
            .minipools_mut()
            .register(Minipool::new(
                Address::from_tag(10),
                Address::from_tag(90),
                duration.clone(),
                0,
            ))
            .unwrap();

        // The deposit commits; the unassignable value stays queued and the
        // accounting stays consistent
        let id = service
            .deposit_value(user, user, group, duration.clone(), 500)
            .unwrap();
        assert_eq!(service.queue().fragment(&id).unwrap().queued, 500);
        assert_eq!(service.stats().total_deposited, 500);
        assert_eq!(service.stats().total_assigned, 0);
        assert_eq!(service.events().len(), 1);
        assert_eq!(
            service.queue().total_queued_all() + service.minipools().total_ledger(),
            service.stats().total_deposited
        );
    }

    #[test]
    fn test_rematch_assigns_after_new_capacity() {
        let (mut service, user, group, duration) = service();
        service
            .deposit_value(user, user, group, duration.clone(), 10)
            .unwrap();
        // Second deposit overflows the 16-wei pool: one chunk fits, the
        // 2-wei gap is below chunk size, 6 wei stay queued
        let id2 = service
            .deposit_value(user, user, group, duration.clone(), 10)
            .unwrap();
        assert_eq!(service.queue().total_queued(&user, &group, &duration), 6);

        service
            .minipools_mut()
            .register(Minipool::new(
                Address::from_tag(11),
                Address::from_tag(90),
                duration.clone(),
                16,
            ))
            .unwrap();

        let assigned = service.rematch_queued(user, group, duration.clone()).unwrap();
        assert_eq!(assigned, 6);
        assert_eq!(service.queue().total_queued(&user, &group, &duration), 0);
        assert_eq!(service.queue().fragment(&id2).unwrap().assigned(), 10);
        assert_eq!(service.stats().total_assigned, 20);
    }

    #[test]
    fn test_stats_display() {
        let (service, ..) = service();
        let s = service.stats().to_string();
        assert!(s.contains("0 deposits"));
    }
}
