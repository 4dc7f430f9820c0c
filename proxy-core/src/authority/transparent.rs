//! Upgrades through a `ProxyAdmin`

use std::time::Duration;

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolCall;
use proxy_common::{
    solidity::IProxyAdmin,
    types::{ProxyAdminHandle, ProxyHandle},
};
use tracing::debug;

use crate::{
    errors::UpgradeError,
    ledger::{Ledger, TxReceipt},
};

use super::{submit_upgrade, UpgradeAuthority};

/// Upgrades a transparent proxy by routing `upgradeAndCall` through its admin.
///
/// The proxy only accepts its upgrade selector from the admin, so the call must go
/// to the `ProxyAdmin` and the sender must own that `ProxyAdmin`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransparentAuthority;

impl UpgradeAuthority for TransparentAuthority {
    type Target = (ProxyHandle, ProxyAdminHandle);

    async fn upgrade<L: Ledger>(
        &self,
        ledger: &L,
        target: &(ProxyHandle, ProxyAdminHandle),
        new_implementation: Address,
        reinit: Option<Bytes>,
        timeout: Duration,
    ) -> Result<TxReceipt, UpgradeError> {
        let (proxy, admin) = target;
        debug!(
            "Calling upgradeAndCall on ProxyAdmin {:#x} for proxy {:#x}",
            admin.address, proxy.address
        );

        let calldata = IProxyAdmin::upgradeAndCallCall {
            proxy: proxy.address,
            implementation: new_implementation,
            data: reinit.unwrap_or_default(),
        }
        .abi_encode();

        submit_upgrade(ledger, admin.address, calldata.into(), timeout).await
    }
}
