//! Solidity interfaces of the contracts deployed and driven by the orchestrator

#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::{sol, SolValue};

// The counter implementations. Every version of every pattern shares the V1 surface,
// V2 adds `reinitialize`, `multiply` and per-user counts.
sol! {
    interface ICounterV1 {
        function initialize() external;
        function increment() external;
        function decrement() external;
        function getCount() external view returns (uint256);
        function getVersion() external view returns (string memory);
    }

    interface ICounterV2 {
        function reinitialize() external;
        function increment() external;
        function decrement() external;
        function multiply() external;
        function incrementUserCount() external;
        function getCount() external view returns (uint256);
        function getVersion() external view returns (string memory);
        function getMultiplier() external view returns (uint256);
        function getUserCount(address user) external view returns (uint256);
    }

    /// The initializer of owner-gated (UUPS) counters
    interface IOwnedInitializer {
        function initialize(address initialOwner) external;
    }
}

// OpenZeppelin proxy infrastructure, taken from https://github.com/OpenZeppelin/openzeppelin-contracts/tree/v5.0.0/contracts/proxy
sol! {
    interface IProxyAdmin {
        function upgradeAndCall(address proxy, address implementation, bytes memory data) external payable;
    }

    /// The admin-only entry point of a transparent proxy, reachable solely by its admin
    interface ITransparentUpgradeableProxy {
        function upgradeToAndCall(address newImplementation, bytes calldata data) external payable;
    }

    interface IUpgradeableBeacon {
        function upgradeTo(address newImplementation) external;
        function implementation() external view returns (address);
    }

    interface IUUPSUpgradeable {
        function upgradeToAndCall(address newImplementation, bytes memory data) external payable;
        function proxiableUUID() external view returns (bytes32);
    }

    interface IOwnable {
        function owner() external view returns (address);
        function transferOwnership(address newOwner) external;
    }

    interface IOwnable2Step {
        function pendingOwner() external view returns (address);
        function acceptOwnership() external;
    }
}

// The guard surface of a lockable, pausable ERC721
sol! {
    interface ILockableToken {
        function ownerOf(uint256 tokenId) external view returns (address);
        function isTokenLocked(uint256 tokenId) external view returns (bool);
        function setTokenLock(uint256 tokenId, bool locked) external;
        function transferFrom(address from, address to, uint256 tokenId) external;
        function mint(address to) external;
        function paused() external view returns (bool);
        function pause() external;
        function unpause() external;
    }
}

// -------------------------
// | Constructor Arguments |
// -------------------------

/// `ProxyAdmin(address initialOwner)`
pub fn proxy_admin_constructor_args(owner: Address) -> Bytes {
    (owner,).abi_encode_params().into()
}

/// `TransparentUpgradeableProxy(address _logic, address admin, bytes _data)`
pub fn transparent_proxy_constructor_args(logic: Address, admin: Address, data: Bytes) -> Bytes {
    (logic, admin, data).abi_encode_params().into()
}

/// `UpgradeableBeacon(address implementation, address initialOwner)`
pub fn beacon_constructor_args(implementation: Address, owner: Address) -> Bytes {
    (implementation, owner).abi_encode_params().into()
}

/// `BeaconProxy(address beacon, bytes data)`
pub fn beacon_proxy_constructor_args(beacon: Address, data: Bytes) -> Bytes {
    (beacon, data).abi_encode_params().into()
}

/// `ERC1967Proxy(address implementation, bytes _data)`
pub fn erc1967_proxy_constructor_args(implementation: Address, data: Bytes) -> Bytes {
    (implementation, data).abi_encode_params().into()
}
