//! Derivation of namespaced storage slots.
//!
//! Proxy metadata lives at `keccak256(label) - 1` so that it can never coincide
//! with a slot handed out by the sequential storage layout of the implementation.

use alloy_primitives::{keccak256, B256, U256};
use serde::{Deserialize, Serialize};

use crate::constants::{ADMIN_SLOT_LABEL, BEACON_SLOT_LABEL, IMPLEMENTATION_SLOT_LABEL};

/// Computes the storage slot for the given label, `keccak256(utf8(label)) - 1`
pub fn derive_slot(label: &str) -> B256 {
    let hash = U256::from_be_bytes(keccak256(label.as_bytes()).0);
    B256::from(hash.wrapping_sub(U256::from(1)).to_be_bytes::<32>())
}

/// A labelled storage slot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSlot {
    /// The human-readable namespace the slot was derived from
    pub label: String,
    /// The derived slot
    pub slot: B256,
}

impl StorageSlot {
    /// Derive the slot for the given label
    pub fn new(label: &str) -> Self {
        Self { label: label.to_string(), slot: derive_slot(label) }
    }

    /// The EIP-1967 implementation slot
    pub fn implementation() -> Self {
        Self::new(IMPLEMENTATION_SLOT_LABEL)
    }

    /// The EIP-1967 admin slot
    pub fn admin() -> Self {
        Self::new(ADMIN_SLOT_LABEL)
    }

    /// The EIP-1967 beacon slot
    pub fn beacon() -> Self {
        Self::new(BEACON_SLOT_LABEL)
    }

    /// A plain sequential slot, as assigned by the Solidity storage layout
    pub fn sequential(index: u64) -> Self {
        Self {
            label: format!("slot[{index}]"),
            slot: B256::from(U256::from(index).to_be_bytes::<32>()),
        }
    }
}
