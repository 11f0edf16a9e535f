//! Group Access Collaborator
//!
//! Groups are third-party integrators whose users deposit and withdraw
//! through delegated depositor/withdrawer addresses. The core consumes the
//! access layer through the [`GroupAccess`] trait; [`GroupRegistry`] is the
//! bundled implementation holding fees and authorization sets.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::common::error::{PoolError, Result};
use crate::types::ids::{Address, FeePerc, GroupId};
use crate::units::FEE_BASE;

/// Read surface of the external group/access layer
#[cfg_attr(test, mockall::automock)]
pub trait GroupAccess: Send + Sync {
    /// Whether the group id resolves to a registered group
    fn group_exists(&self, group: &GroupId) -> bool;

    /// Whether `caller` may deposit on behalf of the group's users
    fn is_authorized_depositor(&self, group: &GroupId, caller: &Address) -> bool;

    /// Whether `caller` may withdraw on behalf of the group's users
    fn is_authorized_withdrawer(&self, group: &GroupId, caller: &Address) -> bool;

    /// Fee the group charges its users, scaled to `FEE_BASE`
    fn fee_perc(&self, group: &GroupId) -> FeePerc;

    /// Fee the protocol charges the group's users, scaled to `FEE_BASE`
    fn protocol_fee_perc(&self, group: &GroupId) -> FeePerc;

    /// Address the group's fee share is credited to
    fn fee_address(&self, group: &GroupId) -> Address;
}

/// One registered group: fees plus delegated authorization sets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    /// Fee charged to the group's users, scaled to `FEE_BASE`
    pub fee_perc: FeePerc,
    /// Fee charged by the protocol, scaled to `FEE_BASE`
    pub protocol_fee_perc: FeePerc,
    /// Destination of the group's fee share
    pub fee_address: Address,
    pub depositors: HashSet<Address>,
    pub withdrawers: HashSet<Address>,
}

impl Group {
    pub fn new(
        id: GroupId,
        fee_perc: FeePerc,
        protocol_fee_perc: FeePerc,
        fee_address: Address,
    ) -> Self {
        Self {
            id,
            fee_perc,
            protocol_fee_perc,
            fee_address,
            depositors: HashSet::new(),
            withdrawers: HashSet::new(),
        }
    }
}

/// Registry of groups and their delegated access sets
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: HashMap<GroupId, Group>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group. Combined fees may not exceed 100%.
    pub fn register_group(&mut self, group: Group) -> Result<()> {
        if group.fee_perc as u128 + group.protocol_fee_perc as u128 > FEE_BASE as u128 {
            return Err(PoolError::InvalidFee(format!(
                "combined fees {} + {} exceed base {}",
                group.fee_perc, group.protocol_fee_perc, FEE_BASE
            )));
        }
        if self.groups.contains_key(&group.id) {
            return Err(PoolError::DuplicateGroup(group.id));
        }
        self.groups.insert(group.id, group);
        Ok(())
    }

    pub fn get(&self, id: &GroupId) -> Option<&Group> {
        self.groups.get(id)
    }

    pub fn add_depositor(&mut self, id: &GroupId, depositor: Address) -> Result<()> {
        let group = self.group_mut(id)?;
        group.depositors.insert(depositor);
        Ok(())
    }

    pub fn remove_depositor(&mut self, id: &GroupId, depositor: &Address) -> Result<()> {
        let group = self.group_mut(id)?;
        group.depositors.remove(depositor);
        Ok(())
    }

    pub fn add_withdrawer(&mut self, id: &GroupId, withdrawer: Address) -> Result<()> {
        let group = self.group_mut(id)?;
        group.withdrawers.insert(withdrawer);
        Ok(())
    }

    /// Remove a withdrawer. Fails with `LastWithdrawer` when the group has
    /// exactly one; at least one withdrawer must always remain.
    pub fn remove_withdrawer(&mut self, id: &GroupId, withdrawer: &Address) -> Result<()> {
        let group = self.group_mut(id)?;
        if group.withdrawers.contains(withdrawer) && group.withdrawers.len() == 1 {
            return Err(PoolError::LastWithdrawer);
        }
        group.withdrawers.remove(withdrawer);
        Ok(())
    }

    fn group_mut(&mut self, id: &GroupId) -> Result<&mut Group> {
        self.groups.get_mut(id).ok_or(PoolError::UnknownGroup(*id))
    }
}

impl GroupAccess for GroupRegistry {
    fn group_exists(&self, group: &GroupId) -> bool {
        self.groups.contains_key(group)
    }

    fn is_authorized_depositor(&self, group: &GroupId, caller: &Address) -> bool {
        self.groups
            .get(group)
            .map(|g| g.depositors.contains(caller))
            .unwrap_or(false)
    }

    fn is_authorized_withdrawer(&self, group: &GroupId, caller: &Address) -> bool {
        self.groups
            .get(group)
            .map(|g| g.withdrawers.contains(caller))
            .unwrap_or(false)
    }

    fn fee_perc(&self, group: &GroupId) -> FeePerc {
        self.groups.get(group).map(|g| g.fee_perc).unwrap_or(0)
    }

    fn protocol_fee_perc(&self, group: &GroupId) -> FeePerc {
        self.groups
            .get(group)
            .map(|g| g.protocol_fee_perc)
            .unwrap_or(0)
    }

    fn fee_address(&self, group: &GroupId) -> Address {
        self.groups
            .get(group)
            .map(|g| g.fee_address)
            .unwrap_or(Address::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with_group() -> (GroupRegistry, GroupId) {
        let id = Address::from_tag(2);
        let mut registry = GroupRegistry::new();
        registry
            .register_group(Group::new(id, FEE_BASE / 20, FEE_BASE / 100, Address::from_tag(3)))
            .unwrap();
        (registry, id)
    }

    #[test]
    fn test_register_and_authorize() {
        let (mut registry, id) = registry_with_group();
        let depositor = Address::from_tag(4);
        let withdrawer = Address::from_tag(5);

        assert!(registry.group_exists(&id));
        assert!(!registry.is_authorized_depositor(&id, &depositor));

        registry.add_depositor(&id, depositor).unwrap();
        registry.add_withdrawer(&id, withdrawer).unwrap();

        assert!(registry.is_authorized_depositor(&id, &depositor));
        assert!(registry.is_authorized_withdrawer(&id, &withdrawer));
        assert_eq!(registry.fee_perc(&id), FEE_BASE / 20);
        assert_eq!(registry.protocol_fee_perc(&id), FEE_BASE / 100);
    }

    #[test]
    fn test_last_withdrawer_is_kept() {
        let (mut registry, id) = registry_with_group();
        let w1 = Address::from_tag(5);
        let w2 = Address::from_tag(6);

        registry.add_withdrawer(&id, w1).unwrap();
        registry.add_withdrawer(&id, w2).unwrap();
        registry.remove_withdrawer(&id, &w1).unwrap();

        // Exactly one left: removal must fail
        let result = registry.remove_withdrawer(&id, &w2);
        assert!(matches!(result, Err(PoolError::LastWithdrawer)));
        assert!(registry.is_authorized_withdrawer(&id, &w2));
    }

    #[test]
    fn test_fee_cap() {
        let mut registry = GroupRegistry::new();
        let group = Group::new(
            Address::from_tag(7),
            FEE_BASE,
            1,
            Address::from_tag(3),
        );
        let result = registry.register_group(group);
        assert!(matches!(result, Err(PoolError::InvalidFee(_))));
    }

    #[test]
    fn test_duplicate_group() {
        let (mut registry, id) = registry_with_group();
        let result =
            registry.register_group(Group::new(id, 0, 0, Address::from_tag(3)));
        assert!(matches!(result, Err(PoolError::DuplicateGroup(_))));
    }

    #[test]
    fn test_unknown_group_defaults() {
        let registry = GroupRegistry::new();
        let id = Address::from_tag(9);
        assert!(!registry.group_exists(&id));
        assert_eq!(registry.fee_perc(&id), 0);
        assert!(!registry.is_authorized_withdrawer(&id, &Address::from_tag(1)));
    }
}
