//! Upgrades through the proxy's own implementation

use std::time::Duration;

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolCall;
use proxy_common::{slots::StorageSlot, solidity::IUUPSUpgradeable, types::ProxyHandle};
use tracing::{debug, warn};

use crate::{
    errors::{LedgerError, UpgradeError},
    ledger::{read_call, Ledger, TxReceipt},
};

use super::{submit_upgrade, UpgradeAuthority};

/// Upgrades a UUPS proxy by calling `upgradeToAndCall` on the proxy itself, where
/// the current implementation decides whether the sender is authorized
#[derive(Clone, Copy, Debug, Default)]
pub struct UupsAuthority;

impl UpgradeAuthority for UupsAuthority {
    type Target = ProxyHandle;

    async fn upgrade<L: Ledger>(
        &self,
        ledger: &L,
        target: &ProxyHandle,
        new_implementation: Address,
        reinit: Option<Bytes>,
        timeout: Duration,
    ) -> Result<TxReceipt, UpgradeError> {
        check_proxiable(ledger, new_implementation).await?;

        debug!("Calling upgradeToAndCall on proxy {:#x}", target.address);
        let calldata = IUUPSUpgradeable::upgradeToAndCallCall {
            newImplementation: new_implementation,
            data: reinit.unwrap_or_default(),
        }
        .abi_encode();

        submit_upgrade(ledger, target.address, calldata.into(), timeout).await
    }
}

/// Check that `implementation` can itself perform UUPS upgrades.
///
/// An implementation without the upgrade entry point would leave the proxy stuck on
/// it forever, so such an upgrade is refused before anything is sent.
async fn check_proxiable<L: Ledger>(
    ledger: &L,
    implementation: Address,
) -> Result<(), UpgradeError> {
    let call = IUUPSUpgradeable::proxiableUUIDCall {};
    let uuid = match read_call(ledger, implementation, &call).await {
        Ok(ret) => ret._0,
        Err(LedgerError::Reverted(reason)) | Err(LedgerError::Decoding(reason)) => {
            warn!("{implementation:#x} does not answer proxiableUUID: {reason}");
            return Err(UpgradeError::NotProxiable(format!(
                "{implementation:#x} does not implement proxiableUUID"
            )));
        }
        Err(e) => return Err(e.into()),
    };

    let expected = StorageSlot::implementation().slot;
    if uuid != expected {
        return Err(UpgradeError::NotProxiable(format!(
            "{implementation:#x} reports proxiableUUID {uuid}, expected {expected}"
        )));
    }

    Ok(())
}
