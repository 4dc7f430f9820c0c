//! Behavioural probes run through the proxies before and after the upgrade.
//!
//! These only read what the implementation says about itself and are purely
//! diagnostic. Whether the upgrade happened is decided from storage in the Verify stage.

use std::time::Duration;

use alloy_primitives::{Address, U256};
use proxy_common::{
    solidity::{ICounterV1, ICounterV2},
    types::{CounterOp, ProxyPattern},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    errors::LedgerError,
    ledger::{read_call, send_call, Ledger},
};

/// What a proxy reported about its state at one point in the run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxySnapshot {
    /// The proxy probed
    pub proxy: Address,
    /// The reported version string
    pub version: String,
    /// The reported count
    pub count: U256,
    /// The reported multiplier, version 2 only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<U256>,
    /// The count after calling `multiply`, version 2 only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplied_count: Option<U256>,
    /// The sender's user count after calling `incrementUserCount`, version 2 only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_count: Option<U256>,
}

/// The counter mutations applied to each proxy before the upgrade.
///
/// Transparent proxies are incremented three times, UUPS proxies twice and then
/// decremented once. The first beacon proxy is incremented twice and every other
/// beacon proxy once, so that the proxies behind one beacon end up with distinct state.
pub fn default_exercise_plan(pattern: ProxyPattern, num_proxies: usize) -> Vec<Vec<CounterOp>> {
    use CounterOp::*;
    match pattern {
        ProxyPattern::Transparent => vec![vec![Increment; 3]; num_proxies],
        ProxyPattern::Uups => vec![vec![Increment, Increment, Decrement]; num_proxies],
        ProxyPattern::Beacon => (0..num_proxies)
            .map(|i| if i == 0 { vec![Increment; 2] } else { vec![Increment] })
            .collect(),
    }
}

/// Apply `ops` to the counter behind `proxy`, one confirmed transaction at a time
pub async fn exercise(
    ledger: &impl Ledger,
    proxy: Address,
    ops: &[CounterOp],
    timeout: Duration,
) -> Result<(), LedgerError> {
    for op in ops {
        debug!("{op:?} on {proxy:#x}");
        match op {
            CounterOp::Increment => {
                send_call(ledger, proxy, &ICounterV1::incrementCall {}, timeout).await?
            }
            CounterOp::Decrement => {
                send_call(ledger, proxy, &ICounterV1::decrementCall {}, timeout).await?
            }
        };
    }

    Ok(())
}

/// Read the version 1 surface of the counter behind `proxy`
pub async fn snapshot_v1(
    ledger: &impl Ledger,
    proxy: Address,
) -> Result<ProxySnapshot, LedgerError> {
    let version = read_call(ledger, proxy, &ICounterV1::getVersionCall {}).await?._0;
    let count = read_call(ledger, proxy, &ICounterV1::getCountCall {}).await?._0;
    info!("Proxy {proxy:#x}: version {version}, count {count}");

    Ok(ProxySnapshot {
        proxy,
        version,
        count,
        multiplier: None,
        multiplied_count: None,
        user_count: None,
    })
}

/// Read the version 2 surface of the counter behind `proxy`, then exercise the
/// capabilities version 2 adds
pub async fn probe_v2(
    ledger: &impl Ledger,
    proxy: Address,
    timeout: Duration,
) -> Result<ProxySnapshot, LedgerError> {
    let version = read_call(ledger, proxy, &ICounterV2::getVersionCall {}).await?._0;
    let count = read_call(ledger, proxy, &ICounterV2::getCountCall {}).await?._0;
    let multiplier = read_call(ledger, proxy, &ICounterV2::getMultiplierCall {}).await?._0;

    send_call(ledger, proxy, &ICounterV2::multiplyCall {}, timeout).await?;
    let multiplied_count = read_call(ledger, proxy, &ICounterV2::getCountCall {}).await?._0;

    send_call(ledger, proxy, &ICounterV2::incrementUserCountCall {}, timeout).await?;
    let user = ledger.sender();
    let user_count = read_call(ledger, proxy, &ICounterV2::getUserCountCall { user }).await?._0;

    info!(
        "Proxy {proxy:#x}: version {version}, count {count}, multiplier {multiplier}, \
         count after multiply {multiplied_count}, user count {user_count}"
    );

    Ok(ProxySnapshot {
        proxy,
        version,
        count,
        multiplier: Some(multiplier),
        multiplied_count: Some(multiplied_count),
        user_count: Some(user_count),
    })
}

/// Log how the state reported before and after the upgrade compares
pub fn compare_snapshots(pre: &[ProxySnapshot], post: &[ProxySnapshot]) {
    for after in post {
        let Some(before) = pre.iter().find(|s| s.proxy == after.proxy) else {
            continue;
        };

        if before.count == after.count {
            info!("Proxy {:#x} preserved its count across the upgrade", after.proxy);
        } else {
            warn!(
                "Proxy {:#x} reported count {} before the upgrade and {} after",
                after.proxy, before.count, after.count
            );
        }

        if before.version == after.version {
            warn!("Proxy {:#x} still reports version {}", after.proxy, after.version);
        }
    }
}
