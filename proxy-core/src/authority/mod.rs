//! Upgrade authorities: the account or contract allowed to swap a proxy's implementation.
//!
//! The three patterns authorize upgrades in unrelated ways (owner of the beacon,
//! admin of the proxy, owner as judged by the current implementation), so each has
//! its own stateless strategy and [`UpgradeTarget`] dispatches between them.

mod beacon;
mod transparent;
mod uups;

use std::time::Duration;

use alloy_primitives::{Address, Bytes};
use proxy_common::types::{BeaconHandle, ProxyAdminHandle, ProxyHandle, ProxyPattern};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    errors::UpgradeError,
    ledger::{with_timeout, Ledger, TxReceipt},
};

pub use beacon::BeaconAuthority;
pub use transparent::TransparentAuthority;
pub use uups::UupsAuthority;

/// A strategy for swapping the implementation behind some upgrade target
#[allow(async_fn_in_trait)]
pub trait UpgradeAuthority {
    /// The handle the strategy upgrades through
    type Target;

    /// Point the target at `new_implementation`, optionally running `reinit` against
    /// the upgraded proxy in the same transaction. Resolves once the upgrade confirms.
    async fn upgrade<L: Ledger>(
        &self,
        ledger: &L,
        target: &Self::Target,
        new_implementation: Address,
        reinit: Option<Bytes>,
        timeout: Duration,
    ) -> Result<TxReceipt, UpgradeError>;
}

/// The handle an upgrade is routed through, tagged by pattern
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpgradeTarget {
    /// A beacon, whose owner retargets every proxy referencing it
    Beacon(BeaconHandle),
    /// A transparent proxy, upgraded through its `ProxyAdmin`
    Transparent {
        /// The proxy being upgraded
        proxy: ProxyHandle,
        /// The admin registered in the proxy's admin slot
        admin: ProxyAdminHandle,
    },
    /// A UUPS proxy, upgraded through its current implementation
    Uups(ProxyHandle),
}

impl UpgradeTarget {
    /// The pattern of the target
    pub fn pattern(&self) -> ProxyPattern {
        match self {
            UpgradeTarget::Beacon(_) => ProxyPattern::Beacon,
            UpgradeTarget::Transparent { .. } => ProxyPattern::Transparent,
            UpgradeTarget::Uups(_) => ProxyPattern::Uups,
        }
    }

    /// Upgrade the target with the strategy matching its pattern
    pub async fn upgrade<L: Ledger>(
        &self,
        ledger: &L,
        new_implementation: Address,
        reinit: Option<Bytes>,
        timeout: Duration,
    ) -> Result<TxReceipt, UpgradeError> {
        info!("Upgrading {} target to {new_implementation:#x}", self.pattern());
        match self {
            UpgradeTarget::Beacon(beacon) => {
                BeaconAuthority.upgrade(ledger, beacon, new_implementation, reinit, timeout).await
            }
            UpgradeTarget::Transparent { proxy, admin } => {
                TransparentAuthority
                    .upgrade(ledger, &(*proxy, *admin), new_implementation, reinit, timeout)
                    .await
            }
            UpgradeTarget::Uups(proxy) => {
                UupsAuthority.upgrade(ledger, proxy, new_implementation, reinit, timeout).await
            }
        }
    }
}

/// Submit an upgrade transaction and classify its outcome
async fn submit_upgrade<L: Ledger>(
    ledger: &L,
    to: Address,
    calldata: Bytes,
    timeout: Duration,
) -> Result<TxReceipt, UpgradeError> {
    let receipt = with_timeout(timeout, ledger.send(to, calldata)).await?;
    if !receipt.success {
        warn!("Upgrade transaction {} was included but reverted", receipt.tx_hash);
        return Err(UpgradeError::Failed(receipt.tx_hash));
    }

    info!("Upgrade confirmed in transaction {}", receipt.tx_hash);
    Ok(receipt)
}
