//! Type definitions for proxies, implementations, and upgrade authorities

use std::fmt::{self, Display};

use alloy_primitives::{Address, FixedBytes};
use alloy_sol_types::SolCall;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        BEACON_RECORD_KEY, COUNTER_BEACON_V1, COUNTER_BEACON_V2, COUNTER_TRANSPARENT_V1,
        COUNTER_TRANSPARENT_V2, COUNTER_UUPS_V1, COUNTER_UUPS_V2, TRANSPARENT_RECORD_KEY,
        UUPS_RECORD_KEY,
    },
    solidity::{ICounterV1, ICounterV2, IUUPSUpgradeable},
};

/// A 4-byte function selector
pub type Selector = FixedBytes<4>;

/// The proxy indirection patterns the orchestrator knows how to upgrade
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProxyPattern {
    /// Proxies resolve their implementation through a shared beacon
    Beacon,
    /// Upgrades go through a dedicated `ProxyAdmin`
    Transparent,
    /// The implementation carries its own upgrade entry point
    #[serde(rename = "UUPS")]
    Uups,
}

impl ProxyPattern {
    /// The key under which a run of this pattern is recorded
    pub fn record_key(&self) -> &'static str {
        match self {
            ProxyPattern::Beacon => BEACON_RECORD_KEY,
            ProxyPattern::Transparent => TRANSPARENT_RECORD_KEY,
            ProxyPattern::Uups => UUPS_RECORD_KEY,
        }
    }

    /// The name of the counter artifact deployed for the given version
    pub fn counter_artifact(&self, version: CounterVersion) -> &'static str {
        match (self, version) {
            (ProxyPattern::Beacon, CounterVersion::V1) => COUNTER_BEACON_V1,
            (ProxyPattern::Beacon, CounterVersion::V2) => COUNTER_BEACON_V2,
            (ProxyPattern::Transparent, CounterVersion::V1) => COUNTER_TRANSPARENT_V1,
            (ProxyPattern::Transparent, CounterVersion::V2) => COUNTER_TRANSPARENT_V2,
            (ProxyPattern::Uups, CounterVersion::V1) => COUNTER_UUPS_V1,
            (ProxyPattern::Uups, CounterVersion::V2) => COUNTER_UUPS_V2,
        }
    }
}

impl Display for ProxyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyPattern::Beacon => write!(f, "Beacon"),
            ProxyPattern::Transparent => write!(f, "Transparent"),
            ProxyPattern::Uups => write!(f, "UUPS"),
        }
    }
}

/// The versions of the counter implementation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CounterVersion {
    /// The initial implementation
    V1,
    /// The upgrade target, adding `multiply` and per-user counts
    V2,
}

impl Display for CounterVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CounterVersion::V1 => write!(f, "V1"),
            CounterVersion::V2 => write!(f, "V2"),
        }
    }
}

/// A mutation applied to a counter during a behavioural probe
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CounterOp {
    /// `increment()`
    Increment,
    /// `decrement()`
    Decrement,
}

/// A deployed implementation contract
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementationDescriptor {
    /// The artifact name the implementation was deployed from
    pub name: String,
    /// The deployed address
    pub address: Address,
    /// The counter version this implementation provides
    pub version: CounterVersion,
    /// The function selectors exposed by the implementation
    pub selectors: Vec<Selector>,
}

impl ImplementationDescriptor {
    /// Describe an implementation of the given pattern and version deployed at `address`
    pub fn new(
        name: &str,
        address: Address,
        pattern: ProxyPattern,
        version: CounterVersion,
    ) -> Self {
        Self { name: name.to_string(), address, version, selectors: selectors(pattern, version) }
    }

    /// Whether the implementation exposes the given function
    pub fn supports(&self, selector: [u8; 4]) -> bool {
        self.selectors.contains(&Selector::from(selector))
    }
}

/// The selector table of a counter implementation
fn selectors(pattern: ProxyPattern, version: CounterVersion) -> Vec<Selector> {
    let mut table = vec![
        ICounterV1::incrementCall::SELECTOR,
        ICounterV1::decrementCall::SELECTOR,
        ICounterV1::getCountCall::SELECTOR,
        ICounterV1::getVersionCall::SELECTOR,
    ];

    if version == CounterVersion::V2 {
        table.extend([
            ICounterV2::reinitializeCall::SELECTOR,
            ICounterV2::multiplyCall::SELECTOR,
            ICounterV2::getMultiplierCall::SELECTOR,
            ICounterV2::incrementUserCountCall::SELECTOR,
            ICounterV2::getUserCountCall::SELECTOR,
        ]);
    }

    if pattern == ProxyPattern::Uups {
        table.extend([
            IUUPSUpgradeable::upgradeToAndCallCall::SELECTOR,
            IUUPSUpgradeable::proxiableUUIDCall::SELECTOR,
        ]);
    }

    table.into_iter().map(Selector::from).collect()
}

/// A proxy deployed by the orchestrator.
///
/// The implementation a proxy resolves to is deliberately not stored here: it can
/// change underneath the handle and must always be read back from the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyHandle {
    /// The address of the proxy, fixed for its lifetime
    pub address: Address,
    /// The indirection pattern of the proxy
    pub pattern: ProxyPattern,
}

/// A beacon shared by one or more beacon proxies
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconHandle {
    /// The address of the beacon
    pub address: Address,
    /// The account allowed to upgrade the beacon
    pub owner: Address,
}

/// The `ProxyAdmin` of a transparent proxy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyAdminHandle {
    /// The address of the `ProxyAdmin` contract
    pub address: Address,
    /// The account allowed to call the `ProxyAdmin`
    pub owner: Address,
}
