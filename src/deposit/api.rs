//! Deposit API Facade
//!
//! The single validated entry point external callers use. Every operation
//! checks its preconditions against the Settings and Group collaborators
//! before any state changes, then dispatches into the pool service. The
//! withdrawal path always presents the facade's own address as caller;
//! withdrawal accounting rejects everything else.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::warn;

use crate::common::error::{PoolError, Result};
use crate::deposit::service::PoolService;
use crate::group::GroupAccess;
use crate::node::NodeSupply;
use crate::settings::Settings;
use crate::types::ids::{Address, Amount, DepositId, DurationId, GroupId};

/// Validated entry point in front of the pool service
pub struct DepositApi {
    /// This facade's own address, registered with the service as the only
    /// caller withdrawal accounting accepts
    address: Address,
    service: PoolService,
}

impl DepositApi {
    /// Wire a facade and its pool service to the collaborators
    pub fn new(
        address: Address,
        settings: Arc<dyn Settings>,
        groups: Arc<dyn GroupAccess>,
        node_supply: Box<dyn NodeSupply>,
        protocol_fee_address: Address,
    ) -> Self {
        let service = PoolService::new(settings, groups, node_supply, address, protocol_fee_address);
        Self { address, service }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn service(&self) -> &PoolService {
        &self.service
    }

    /// Mutable service access for externally driven lifecycle observation
    pub fn service_mut(&mut self) -> &mut PoolService {
        &mut self.service
    }

    /// Accept a deposit on behalf of `user`, queue it and run matching.
    ///
    /// All checks run before the first state change; any failure aborts
    /// with nothing mutated.
    pub fn deposit(
        &mut self,
        caller: Address,
        user: Address,
        group: GroupId,
        duration: DurationId,
        value: Amount,
    ) -> Result<DepositId> {
        let max = self
            .service
            .settings
            .max_deposit(&duration)
            .ok_or_else(|| PoolError::InvalidDuration(duration.to_string()))?;
        if !self.service.settings.deposits_allowed() {
            return Err(PoolError::DepositsDisabled);
        }
        if value < self.service.settings.min_deposit() || value > max {
            return Err(PoolError::InvalidDeposit(format!(
                "value {} outside [{}, {}] for duration {}",
                value,
                self.service.settings.min_deposit(),
                max,
                duration
            )));
        }
        if user.is_zero() {
            return Err(PoolError::InvalidUser);
        }
        if !self.service.groups.group_exists(&group) {
            return Err(PoolError::UnknownGroup(group));
        }
        if !self.service.groups.is_authorized_depositor(&group, &caller) {
            warn!(
                target: "pool::api",
                caller = %caller, group = %group,
                "deposit by unauthorized depositor rejected"
            );
            return Err(PoolError::UnauthorizedDepositor(caller));
        }

        self.service.deposit_value(caller, user, group, duration, value)
    }

    /// Re-run matching for a triple's queued value once fresh minipool
    /// capacity is available; returns the newly assigned amount
    pub fn rematch(
        &mut self,
        user: Address,
        group: GroupId,
        duration: DurationId,
    ) -> Result<Amount> {
        self.service.rematch_queued(user, group, duration)
    }

    /// Refund a deposit's still-queued value to the user
    pub fn refund_queued(
        &mut self,
        caller: Address,
        user: Address,
        group: GroupId,
        duration: DurationId,
        deposit_id: DepositId,
    ) -> Result<Amount> {
        self.check_refund_access(caller, &group)?;
        self.service
            .refund_queued_value(user, user, group, &duration, deposit_id)
    }

    /// Refund a deposit's value held by a stalled (closed) minipool
    pub fn refund_stalled(
        &mut self,
        caller: Address,
        user: Address,
        group: GroupId,
        deposit_id: DepositId,
        minipool: Address,
    ) -> Result<Amount> {
        self.check_refund_access(caller, &group)?;
        self.service
            .refund_stalled_value(user, user, group, deposit_id, minipool)
    }

    /// Withdraw part or all of a deposit's minipool claim into the
    /// derivative token, on behalf of a group-authorized withdrawer
    pub fn withdraw(
        &mut self,
        caller: Address,
        user: Address,
        group: GroupId,
        deposit_id: DepositId,
        minipool: Address,
        amount: Amount,
    ) -> Result<Amount> {
        self.service
            .withdraw(self.address, caller, user, group, deposit_id, minipool, amount)
    }

    fn check_refund_access(&self, caller: Address, group: &GroupId) -> Result<()> {
        if !self.service.settings.refunds_allowed() {
            return Err(PoolError::RefundsDisabled);
        }
        if !self.service.groups.group_exists(group) {
            return Err(PoolError::UnknownGroup(*group));
        }
        if !self.service.groups.is_authorized_depositor(group, &caller) {
            return Err(PoolError::UnauthorizedDepositor(caller));
        }
        Ok(())
    }
}

/// Shared facade for callers that need the serialized transaction order
pub type SharedDepositApi = Arc<RwLock<DepositApi>>;

/// Create a shared facade; the write lock is the global transaction order
pub fn create_shared_api(
    address: Address,
    settings: Arc<dyn Settings>,
    groups: Arc<dyn GroupAccess>,
    node_supply: Box<dyn NodeSupply>,
    protocol_fee_address: Address,
) -> SharedDepositApi {
    Arc::new(RwLock::new(DepositApi::new(
        address,
        settings,
        groups,
        node_supply,
        protocol_fee_address,
    )))
}
