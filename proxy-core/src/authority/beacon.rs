//! Upgrades through an `UpgradeableBeacon`

use std::time::Duration;

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolCall;
use proxy_common::{solidity::IUpgradeableBeacon, types::BeaconHandle};
use tracing::debug;

use crate::{
    errors::UpgradeError,
    ledger::{Ledger, TxReceipt},
};

use super::{submit_upgrade, UpgradeAuthority};

/// Retargets a beacon, and with it every proxy that references the beacon.
///
/// The beacon only stores an address, so there is no hook to run reinitialization
/// calldata against the individual proxies.
#[derive(Clone, Copy, Debug, Default)]
pub struct BeaconAuthority;

impl UpgradeAuthority for BeaconAuthority {
    type Target = BeaconHandle;

    async fn upgrade<L: Ledger>(
        &self,
        ledger: &L,
        target: &BeaconHandle,
        new_implementation: Address,
        reinit: Option<Bytes>,
        timeout: Duration,
    ) -> Result<TxReceipt, UpgradeError> {
        if reinit.is_some() {
            return Err(UpgradeError::ReinitUnsupported);
        }

        debug!("Calling upgradeTo on beacon {:#x} as {:#x}", target.address, ledger.sender());
        let call = IUpgradeableBeacon::upgradeToCall { newImplementation: new_implementation };
        submit_upgrade(ledger, target.address, call.abi_encode().into(), timeout).await
    }
}
