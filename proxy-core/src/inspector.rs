//! Resolution of proxy metadata from raw storage.
//!
//! Every read here goes through [`Ledger::storage_at`], never through a getter on
//! the inspected contract, so an implementation cannot misreport which code a proxy
//! delegates to.

use alloy_primitives::{Address, B256};
use proxy_common::{
    constants::BEACON_IMPLEMENTATION_SLOT,
    slots::StorageSlot,
    storage::{decode_address, DecodeMode},
    types::{ProxyHandle, ProxyPattern},
};
use tracing::debug;

use crate::{errors::LedgerError, ledger::Ledger};

/// Reads and decodes storage words of deployed contracts
pub struct StorageInspector<'a, L> {
    /// The ledger to read from
    ledger: &'a L,
    /// How the padding above an address is treated
    mode: DecodeMode,
}

impl<'a, L: Ledger> StorageInspector<'a, L> {
    /// Create an inspector over the given ledger
    pub fn new(ledger: &'a L, mode: DecodeMode) -> Self {
        Self { ledger, mode }
    }

    /// Read the raw word stored at `slot` in `contract`
    pub async fn read_slot(
        &self,
        contract: Address,
        slot: &StorageSlot,
    ) -> Result<B256, LedgerError> {
        let word = self.ledger.storage_at(contract, slot.slot).await?;
        debug!("{contract:#x}[{}] = {word}", slot.label);

        Ok(word)
    }

    /// Read the word stored at `slot` in `contract` and decode it as an address
    pub async fn read_slot_as_address(
        &self,
        contract: Address,
        slot: &StorageSlot,
    ) -> Result<Address, LedgerError> {
        let word = self.read_slot(contract, slot).await?;
        Ok(decode_address(word, self.mode)?)
    }

    /// The implementation the proxy currently delegates to
    pub async fn implementation_of(&self, proxy: &ProxyHandle) -> Result<Address, LedgerError> {
        match proxy.pattern {
            ProxyPattern::Beacon => {
                let beacon = self.beacon_of(proxy.address).await?;
                self.beacon_implementation(beacon).await
            }
            ProxyPattern::Transparent | ProxyPattern::Uups => {
                self.read_slot_as_address(proxy.address, &StorageSlot::implementation()).await
            }
        }
    }

    /// The admin recorded in the proxy's admin slot
    pub async fn admin_of(&self, proxy: Address) -> Result<Address, LedgerError> {
        self.read_slot_as_address(proxy, &StorageSlot::admin()).await
    }

    /// The beacon recorded in the proxy's beacon slot
    pub async fn beacon_of(&self, proxy: Address) -> Result<Address, LedgerError> {
        self.read_slot_as_address(proxy, &StorageSlot::beacon()).await
    }

    /// The implementation a beacon points its proxies at
    pub async fn beacon_implementation(&self, beacon: Address) -> Result<Address, LedgerError> {
        self.read_slot_as_address(beacon, &StorageSlot::sequential(BEACON_IMPLEMENTATION_SLOT))
            .await
    }
}
