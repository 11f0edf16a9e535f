//! Withdrawal Accounting
//!
//! Converts a user's minipool ledger entry into a derivative-token balance,
//! net of the group and protocol fee shares, and handles the two refund
//! paths (still-queued value and value held by a stalled pool).
//!
//! Preconditions are evaluated as a guard chain, in a fixed order, before
//! the first mutation; any failure leaves all state untouched.

use tracing::{info, warn};

use crate::common::error::{PoolError, Result};
use crate::deposit::service::PoolService;
use crate::events::{event_timestamp, PoolEvent};
use crate::types::ids::{Address, Amount, DepositId, DurationId, GroupId};
use crate::units::fee_of;

impl PoolService {
    /// Withdraw `amount` of a deposit's claim at `minipool` into the
    /// derivative token, returning the gross amount withdrawn.
    ///
    /// Only the registered facade address may call this; it does so on
    /// behalf of `withdrawer`, who must be authorized for the group.
    pub fn withdraw(
        &mut self,
        caller: Address,
        withdrawer: Address,
        user: Address,
        group: GroupId,
        deposit_id: DepositId,
        minipool: Address,
        amount: Amount,
    ) -> Result<Amount> {
        // Primary authorization boundary: facade only
        if caller != self.facade {
            warn!(
                target: "pool::withdrawal",
                caller = %caller,
                "withdrawal attempt bypassing the deposit API"
            );
            return Err(PoolError::UnauthorizedCaller(caller));
        }

        // 1. Globally enabled
        if !self.settings.withdrawals_allowed() {
            return Err(PoolError::WithdrawalsDisabled);
        }

        // 2. Deposit id resolves to a non-zero claim for (user, group)
        //    held at this minipool
        let held = self
            .queue
            .fragment(&deposit_id)
            .filter(|f| f.user == user && f.group == group)
            .map(|f| f.held_at(&minipool))
            .unwrap_or(0);
        if held == 0 {
            return Err(PoolError::InvalidDepositId(deposit_id));
        }

        // 3. Amount is positive and covered by the remaining entry
        if amount == 0 {
            return Err(PoolError::InvalidAmount("zero withdrawal".to_string()));
        }
        if amount > held {
            return Err(PoolError::InsufficientFunds {
                requested: amount,
                remaining: held,
            });
        }

        // 4. Minipool status permits the requested withdrawal kind
        let status = self.minipools.status(&minipool)?;
        if !status.allows_withdrawal() {
            return Err(PoolError::InvalidMinipoolStatus { minipool, status });
        }
        if status.requires_full_withdrawal() && amount != held {
            return Err(PoolError::InvalidAmount(format!(
                "minipool in status {} requires the full remaining entry ({})",
                status, held
            )));
        }

        // 5. Withdrawer is authorized for the group
        if !self.groups.is_authorized_withdrawer(&group, &withdrawer) {
            return Err(PoolError::UnauthorizedWithdrawer(withdrawer));
        }

        // Commit: debit the pool ledger and the fragment record
        self.minipools.get_mut(&minipool)?.debit(&user, &group, amount);
        if let Some(fragment) = self.queue.fragment_mut(&deposit_id) {
            fragment.withdraw_from(&minipool, amount);
        }
        self.queue.purge(&deposit_id);

        // Fees come out of principal, truncating division
        let group_fee = fee_of(amount, self.groups.fee_perc(&group));
        let protocol_fee = fee_of(amount, self.groups.protocol_fee_perc(&group));
        let net = amount - group_fee - protocol_fee;

        self.token.credit(withdrawer, net);
        self.token.credit(self.groups.fee_address(&group), group_fee);
        self.token.credit(self.protocol_fee_address, protocol_fee);

        self.stats.withdrawals += 1;
        self.stats.total_withdrawn += amount;
        self.stats.total_fees += group_fee + protocol_fee;

        info!(
            target: "pool::withdrawal",
            deposit_id = %deposit_id,
            minipool = %minipool,
            gross = %amount,
            net = %net,
            "withdrawal settled"
        );

        self.events.emit(PoolEvent::DepositWithdraw {
            to: withdrawer,
            user,
            group,
            deposit_id,
            minipool,
            value: amount,
            timestamp: event_timestamp(),
        });

        Ok(amount)
    }

    /// Return a deposit's still-queued value to the user.
    ///
    /// Gating (refunds enabled, depositor authorization) happens in the
    /// facade before this runs.
    pub(crate) fn refund_queued_value(
        &mut self,
        to: Address,
        user: Address,
        group: GroupId,
        duration: &DurationId,
        deposit_id: DepositId,
    ) -> Result<Amount> {
        let queued = self
            .queue
            .fragment(&deposit_id)
            .filter(|f| f.user == user && f.group == group && &f.duration == duration)
            .map(|f| f.queued)
            .unwrap_or(0);
        if queued == 0 {
            return Err(PoolError::InvalidDepositId(deposit_id));
        }

        if let Some(fragment) = self.queue.fragment_mut(&deposit_id) {
            fragment.refund_queued();
        }
        self.queue.purge(&deposit_id);

        self.stats.refunds += 1;
        self.stats.total_refunded += queued;

        info!(
            target: "pool::withdrawal",
            deposit_id = %deposit_id,
            value = %queued,
            "queued deposit refunded"
        );

        self.events.emit(PoolEvent::DepositRefund {
            to,
            user,
            group,
            deposit_id,
            value: queued,
            timestamp: event_timestamp(),
        });

        Ok(queued)
    }

    /// Return a deposit's claim held by a stalled (closed) minipool.
    pub(crate) fn refund_stalled_value(
        &mut self,
        to: Address,
        user: Address,
        group: GroupId,
        deposit_id: DepositId,
        minipool: Address,
    ) -> Result<Amount> {
        let status = self.minipools.status(&minipool)?;
        if status != crate::types::minipool::MinipoolStatus::Closed {
            return Err(PoolError::InvalidMinipoolStatus { minipool, status });
        }

        let held = self
            .queue
            .fragment(&deposit_id)
            .filter(|f| f.user == user && f.group == group)
            .map(|f| f.held_at(&minipool))
            .unwrap_or(0);
        if held == 0 {
            return Err(PoolError::InvalidDepositId(deposit_id));
        }

        self.minipools.get_mut(&minipool)?.debit(&user, &group, held);
        if let Some(fragment) = self.queue.fragment_mut(&deposit_id) {
            fragment.refund_from(&minipool, held);
        }
        self.queue.purge(&deposit_id);

        self.stats.refunds += 1;
        self.stats.total_refunded += held;

        info!(
            target: "pool::withdrawal",
            deposit_id = %deposit_id,
            minipool = %minipool,
            value = %held,
            "stalled deposit refunded"
        );

        self.events.emit(PoolEvent::DepositRefund {
            to,
            user,
            group,
            deposit_id,
            value: held,
            timestamp: event_timestamp(),
        });

        Ok(held)
    }
}
