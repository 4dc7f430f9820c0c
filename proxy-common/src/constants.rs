//! Constants used across the orchestrator: storage layout facts, slot labels,
//! artifact names, and deployment record keys

/// The number of bytes stored in a single storage slot
pub const NUM_BYTES_STORAGE_SLOT: usize = 32;

/// The number of bytes in an Ethereum address
pub const NUM_BYTES_ADDRESS: usize = 20;

/// The number of zero-padding bytes above an address in a storage word
pub const NUM_BYTES_ADDRESS_PADDING: usize = NUM_BYTES_STORAGE_SLOT - NUM_BYTES_ADDRESS;

// ---------------
// | Slot labels |
// ---------------

/// The label hashed into the EIP-1967 implementation slot
pub const IMPLEMENTATION_SLOT_LABEL: &str = "eip1967.proxy.implementation";

/// The label hashed into the EIP-1967 admin slot
pub const ADMIN_SLOT_LABEL: &str = "eip1967.proxy.admin";

/// The label hashed into the EIP-1967 beacon slot
pub const BEACON_SLOT_LABEL: &str = "eip1967.proxy.beacon";

/// The storage slot containing the implementation address in an ERC-1967 proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#logic-contract-address
pub const IMPLEMENTATION_STORAGE_SLOT: &str =
    "0x360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc";

/// The storage slot containing the proxy admin contract address in the upgradeable proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#admin-address
pub const PROXY_ADMIN_STORAGE_SLOT: &str =
    "0xb53127684a568b3173ae13b9f8a6016e243e63b6e8ee1178d6a717850b5d6103";

/// The storage slot containing the beacon address in a beacon proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#beacon-contract-address
pub const BEACON_STORAGE_SLOT: &str =
    "0xa3f0ad74e5423aebfd80d3ef4346578335a9a72aeaee59ff6cb3582b35133d50";

/// The sequential storage slot holding `_implementation` in an `UpgradeableBeacon`.
///
/// Slot 0 is taken by `Ownable._owner`, the beacon's only other state variable.
pub const BEACON_IMPLEMENTATION_SLOT: u64 = 1;

// ------------------
// | Artifact names |
// ------------------

/// The Transparent pattern counter, version 1
pub const COUNTER_TRANSPARENT_V1: &str = "CounterTransparentV1";
/// The Transparent pattern counter, version 2
pub const COUNTER_TRANSPARENT_V2: &str = "CounterTransparentV2";
/// The Beacon pattern counter, version 1
pub const COUNTER_BEACON_V1: &str = "CounterBeaconV1";
/// The Beacon pattern counter, version 2
pub const COUNTER_BEACON_V2: &str = "CounterBeaconV2";
/// The UUPS pattern counter, version 1
pub const COUNTER_UUPS_V1: &str = "CounterUUPSV1";
/// The UUPS pattern counter, version 2
pub const COUNTER_UUPS_V2: &str = "CounterUUPSV2";

/// The OpenZeppelin `ProxyAdmin` contract
pub const PROXY_ADMIN_ARTIFACT: &str = "ProxyAdmin";
/// The OpenZeppelin `TransparentUpgradeableProxy` contract
pub const TRANSPARENT_PROXY_ARTIFACT: &str = "TransparentUpgradeableProxy";
/// The OpenZeppelin `UpgradeableBeacon` contract
pub const BEACON_ARTIFACT: &str = "UpgradeableBeacon";
/// The OpenZeppelin `BeaconProxy` contract
pub const BEACON_PROXY_ARTIFACT: &str = "BeaconProxy";
/// The OpenZeppelin `ERC1967Proxy` contract, used as the UUPS proxy
pub const ERC1967_PROXY_ARTIFACT: &str = "ERC1967Proxy";

// ---------------
// | Record keys |
// ---------------

/// The deployment record key for a Beacon upgrade run
pub const BEACON_RECORD_KEY: &str = "beacon-upgrade";
/// The deployment record key for a Transparent upgrade run
pub const TRANSPARENT_RECORD_KEY: &str = "transparent-upgrade";
/// The deployment record key for a UUPS upgrade run
pub const UUPS_RECORD_KEY: &str = "uups-upgrade";

/// The version string reported by version 1 counters
pub const V1_VERSION_STRING: &str = "V1";
/// The version string reported by version 2 counters
pub const V2_VERSION_STRING: &str = "V2";
