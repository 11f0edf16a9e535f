//! Minipool Matching Engine
//!
//! Moves queued deposit value into PreLaunch minipools of the matching
//! duration, one chunk at a time, pools visited FIFO by creation order.
//! A chunk is never split below the configured chunk size across pools:
//! while at least one full chunk remains queued, pools with less than a
//! chunk of remaining capacity are skipped. When nothing has room, a fresh
//! minipool is requested from node capacity; if none exists (or the registry
//! refuses the returned pool) the remainder simply stays queued, to be
//! retried on the triple's next deposit or an explicit re-match.

use tracing::{debug, warn};

use crate::common::error::Result;
use crate::deposit::queue::DepositQueue;
use crate::minipool::MinipoolRegistry;
use crate::node::NodeSupply;
use crate::settings::Settings;
use crate::types::ids::{Address, Amount, DurationId, GroupId};

/// Assign as much of a triple's queued value as capacity allows.
///
/// Returns the total value moved into minipools.
pub(crate) fn assign_queued(
    settings: &dyn Settings,
    queue: &mut DepositQueue,
    minipools: &mut MinipoolRegistry,
    node_supply: &mut dyn NodeSupply,
    user: &Address,
    group: &GroupId,
    duration: &DurationId,
) -> Result<Amount> {
    let chunk_size = settings.chunk_size();
    let mut total_assigned: Amount = 0;
    // One fruitless supply request per stall; progress resets it
    let mut requested = false;

    loop {
        let queued = queue.total_queued(user, group, duration);
        if queued == 0 {
            break;
        }

        let target = select_pool(minipools, duration, queued, chunk_size);
        let (pool, capacity) = match target {
            Some(t) => t,
            None => {
                if requested {
                    break;
                }
                match node_supply.request_minipool(duration) {
                    Some(fresh) => {
                        let address = fresh.address;
                        // A pool the registry refuses (duplicate address)
                        // counts as no capacity; the value waits
                        if minipools.register(fresh).is_err() {
                            warn!(
                                target: "pool::matching",
                                minipool = %address,
                                "node supply returned an unusable minipool"
                            );
                            break;
                        }
                        requested = true;
                        continue;
                    }
                    // No capacity anywhere: not an error, value waits
                    None => break,
                }
            }
        };

        let chunk = chunk_size.min(queued).min(capacity);
        transfer_chunk(queue, minipools, &pool, user, group, duration, chunk)?;
        total_assigned += chunk;
        requested = false;

        debug!(
            target: "pool::matching",
            minipool = %pool,
            user = %user,
            chunk = chunk,
            "chunk assigned"
        );
    }

    Ok(total_assigned)
}

/// First PreLaunch pool able to take a chunk, in creation order
fn select_pool(
    minipools: &MinipoolRegistry,
    duration: &DurationId,
    queued: Amount,
    chunk_size: Amount,
) -> Option<(Address, Amount)> {
    for addr in minipools.prelaunch_pools(duration) {
        let capacity = minipools
            .capacity_remaining(&addr)
            .unwrap_or(0);
        if capacity == 0 {
            continue;
        }
        // Never split a full chunk across pools
        if queued >= chunk_size && capacity < chunk_size {
            continue;
        }
        return Some((addr, capacity));
    }
    None
}

/// Move one chunk from the triple's fragments (FIFO) into a pool's ledger
fn transfer_chunk(
    queue: &mut DepositQueue,
    minipools: &mut MinipoolRegistry,
    pool: &Address,
    user: &Address,
    group: &GroupId,
    duration: &DurationId,
    chunk: Amount,
) -> Result<()> {
    let mut left = chunk;
    for id in queue.queued_ids(user, group, duration) {
        if left == 0 {
            break;
        }
        let Some(fragment) = queue.fragment_mut(&id) else {
            continue;
        };
        let take = fragment.queued.min(left);
        if take == 0 {
            continue;
        }
        fragment.assign_to(*pool, take);
        queue.purge(&id);
        minipools.get_mut(pool)?.credit(*user, *group, take);
        left -= take;
    }
    debug_assert_eq!(left, 0);
    Ok(())
}
