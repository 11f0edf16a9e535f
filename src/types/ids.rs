//! Identifier and Amount Types
//!
//! Opaque handles the core is keyed by: 20-byte addresses for users, groups
//! and minipools, 32-byte derived deposit identifiers, and string duration
//! classes. Amounts are integers in the smallest unit (wei).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Value in the smallest unit (wei)
pub type Amount = u128;

/// Fixed-point fee percentage scaled to `units::FEE_BASE`
pub type FeePerc = u64;

/// Opaque 20-byte address handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

/// Groups are identified by their registered contract address
pub type GroupId = Address;

impl Address {
    /// The zero address, never a valid user
    pub const ZERO: Address = Address([0u8; 20]);

    /// Build an address from raw bytes
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    /// Deterministic address for fixtures and tests: the low byte tag
    pub fn from_tag(tag: u8) -> Self {
        let mut bytes = [0u8; 20];
        bytes[19] = tag;
        Address(bytes)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// 32-byte deposit identifier derived from (user, group, duration, sequence)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DepositId(pub [u8; 32]);

impl DepositId {
    /// Derive the identifier for a new deposit fragment.
    ///
    /// `seq` is a queue-global sequence number, so two deposits by the same
    /// (user, group, duration) triple never collide.
    pub fn derive(user: &Address, group: &GroupId, duration: &DurationId, seq: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(user.0);
        hasher.update(group.0);
        hasher.update(duration.as_str().as_bytes());
        hasher.update(seq.to_be_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        DepositId(bytes)
    }
}

impl std::fmt::Display for DepositId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Staking-term category, e.g. "3m", "6m", "12m"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DurationId(String);

impl DurationId {
    pub fn new(id: impl Into<String>) -> Self {
        DurationId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DurationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DurationId {
    fn from(s: &str) -> Self {
        DurationId(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_display() {
        let addr = Address::from_tag(0xab);
        assert_eq!(
            addr.to_string(),
            "0x00000000000000000000000000000000000000ab"
        );
        assert!(Address::ZERO.is_zero());
        assert!(!addr.is_zero());
    }

    #[test]
    fn test_deposit_id_derivation_is_stable() {
        let user = Address::from_tag(1);
        let group = Address::from_tag(2);
        let duration = DurationId::from("3m");

        let a = DepositId::derive(&user, &group, &duration, 0);
        let b = DepositId::derive(&user, &group, &duration, 0);
        assert_eq!(a, b);

        // Different sequence, different id
        let c = DepositId::derive(&user, &group, &duration, 1);
        assert_ne!(a, c);

        // Different user, different id
        let d = DepositId::derive(&Address::from_tag(9), &group, &duration, 0);
        assert_ne!(a, d);
    }

    #[test]
    fn test_deposit_id_display_is_hex() {
        let id = DepositId::derive(
            &Address::from_tag(1),
            &Address::from_tag(2),
            &DurationId::from("3m"),
            7,
        );
        let s = id.to_string();
        assert_eq!(s.len(), 64);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
