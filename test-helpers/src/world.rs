//! A minimal model of contract execution on an EVM ledger.
//!
//! Only what the orchestrator can observe is modelled: per-account storage, delegation
//! into implementation code against the proxy's storage, reverts, and the externally
//! visible behaviour of each contract. Calldata and return data are real ABI
//! encodings, so the orchestrator talks to this model exactly as it would to a node.

use std::collections::HashMap;

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolValue};
use proxy_common::{
    constants::{
        BEACON_ARTIFACT, BEACON_IMPLEMENTATION_SLOT, BEACON_PROXY_ARTIFACT, COUNTER_BEACON_V1,
        COUNTER_BEACON_V2, COUNTER_TRANSPARENT_V1, COUNTER_TRANSPARENT_V2, COUNTER_UUPS_V1,
        COUNTER_UUPS_V2, ERC1967_PROXY_ARTIFACT, PROXY_ADMIN_ARTIFACT, TRANSPARENT_PROXY_ARTIFACT,
        V1_VERSION_STRING, V2_VERSION_STRING,
    },
    slots::StorageSlot,
    solidity::{
        ICounterV1, ICounterV2, ILockableToken, IOwnable, IOwnable2Step, IOwnedInitializer,
        IProxyAdmin, ITransparentUpgradeableProxy, IUUPSUpgradeable, IUpgradeableBeacon,
    },
    storage::{address_to_word, word_to_address},
    types::{CounterVersion, ProxyPattern, Selector},
};

/// A UUPS version 2 counter built without the upgrade entry point
pub const NON_UPGRADEABLE_UUPS_V2: &str = "CounterUUPSV2NonUpgradeable";
/// An ERC721 with per-token locks, a pause switch, and two-step ownership
pub const LOCKABLE_TOKEN: &str = "LockableToken";

/// The multiplier a version 2 counter uses before `reinitialize` sets one
pub const DEFAULT_MULTIPLIER: u64 = 2;

// Counter storage layout
/// `uint256 count`
const COUNT_SLOT: u64 = 0;
/// `uint256 multiplier`
const MULTIPLIER_SLOT: u64 = 1;
/// The initializer version consumed so far
const INITIALIZED_SLOT: u64 = 2;
/// `address owner`, UUPS counters only
const COUNTER_OWNER_SLOT: u64 = 3;
/// `mapping(address => uint256) userCounts`
const USER_COUNTS_SLOT: u64 = 4;

// Ownable storage layout, shared by the beacon, the admin, and the token
/// `address _owner`
const OWNER_SLOT: u64 = 0;

// Token storage layout
/// `address _pendingOwner`
const PENDING_OWNER_SLOT: u64 = 1;
/// `bool _paused`
const PAUSED_SLOT: u64 = 2;
/// `mapping(uint256 => address) _owners`
const TOKEN_OWNERS_SLOT: u64 = 3;
/// `mapping(uint256 => bool) _locked`
const TOKEN_LOCKS_SLOT: u64 = 4;
/// `uint256 _nextTokenId`
const NEXT_TOKEN_SLOT: u64 = 5;

/// The result of executing a call: return data, or a revert reason
pub type ExecResult = Result<Bytes, String>;

/// The code deployed at an address
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MockContract {
    /// A counter implementation
    Counter {
        /// The proxy pattern the counter is written for
        pattern: ProxyPattern,
        /// The counter version
        version: CounterVersion,
        /// Whether a UUPS counter carries `upgradeToAndCall` and `proxiableUUID`
        self_upgrade: bool,
    },
    /// An OpenZeppelin `ProxyAdmin`
    ProxyAdmin,
    /// An OpenZeppelin `TransparentUpgradeableProxy`
    TransparentProxy,
    /// An OpenZeppelin `UpgradeableBeacon`
    Beacon,
    /// An OpenZeppelin `BeaconProxy`
    BeaconProxy,
    /// An OpenZeppelin `ERC1967Proxy`
    Erc1967Proxy,
    /// A lockable, pausable ERC721
    LockableToken,
}

impl MockContract {
    /// The contract deployed by the named artifact
    pub fn from_artifact(name: &str) -> Option<Self> {
        use CounterVersion::*;
        use ProxyPattern::*;

        let counter =
            |pattern, version| MockContract::Counter { pattern, version, self_upgrade: true };
        Some(match name {
            COUNTER_BEACON_V1 => counter(Beacon, V1),
            COUNTER_BEACON_V2 => counter(Beacon, V2),
            COUNTER_TRANSPARENT_V1 => counter(Transparent, V1),
            COUNTER_TRANSPARENT_V2 => counter(Transparent, V2),
            COUNTER_UUPS_V1 => counter(Uups, V1),
            COUNTER_UUPS_V2 => counter(Uups, V2),
            NON_UPGRADEABLE_UUPS_V2 => {
                MockContract::Counter { pattern: Uups, version: V2, self_upgrade: false }
            }
            PROXY_ADMIN_ARTIFACT => MockContract::ProxyAdmin,
            TRANSPARENT_PROXY_ARTIFACT => MockContract::TransparentProxy,
            BEACON_ARTIFACT => MockContract::Beacon,
            BEACON_PROXY_ARTIFACT => MockContract::BeaconProxy,
            ERC1967_PROXY_ARTIFACT => MockContract::Erc1967Proxy,
            LOCKABLE_TOKEN => MockContract::LockableToken,
            _ => return None,
        })
    }
}

/// An account: optional code and its storage
#[derive(Clone, Debug, Default)]
struct Account {
    /// The deployed code, `None` for externally owned accounts
    code: Option<MockContract>,
    /// The account's storage
    storage: HashMap<B256, B256>,
}

/// The state of every account on the ledger
#[derive(Clone, Debug, Default)]
pub struct World {
    /// The accounts, by address
    accounts: HashMap<Address, Account>,
}

impl World {
    /// The code deployed at `at`
    pub fn code(&self, at: Address) -> Option<MockContract> {
        self.accounts.get(&at).and_then(|account| account.code)
    }

    /// Read a storage word, zero if never written
    pub fn sload(&self, at: Address, slot: B256) -> B256 {
        self.accounts
            .get(&at)
            .and_then(|account| account.storage.get(&slot).copied())
            .unwrap_or_default()
    }

    /// Write a storage word
    pub fn sstore(&mut self, at: Address, slot: B256, word: B256) {
        self.accounts.entry(at).or_default().storage.insert(slot, word);
    }

    /// Deploy `contract` at `address` and run its constructor
    pub fn create(
        &mut self,
        address: Address,
        contract: MockContract,
        deployer: Address,
        args: &[u8],
    ) -> Result<(), String> {
        self.accounts.insert(address, Account { code: Some(contract), storage: HashMap::new() });

        match contract {
            MockContract::Counter { .. } => {}
            MockContract::ProxyAdmin => {
                let (owner,) = <(Address,)>::abi_decode_params(args, true).map_err(err)?;
                self.store_address(address, seq(OWNER_SLOT), owner);
            }
            MockContract::TransparentProxy => {
                let (logic, admin_or_owner, data) =
                    <(Address, Address, Bytes)>::abi_decode_params(args, true).map_err(err)?;

                // 4.x proxies take an existing admin, 5.x proxies deploy their own
                // `ProxyAdmin` owned by the constructor argument
                let admin = if self.code(admin_or_owner) == Some(MockContract::ProxyAdmin) {
                    admin_or_owner
                } else {
                    let admin = address.create(1);
                    let admin_args = (admin_or_owner,).abi_encode_params();
                    self.create(admin, MockContract::ProxyAdmin, address, &admin_args)?;
                    admin
                };

                self.store_address(address, StorageSlot::admin().slot, admin);
                self.upgrade_to_and_call(address, logic, deployer, &data, false)?;
            }
            MockContract::Beacon => {
                let (implementation, owner) =
                    <(Address, Address)>::abi_decode_params(args, true).map_err(err)?;
                if self.code(implementation).is_none() {
                    return Err(format!("BeaconInvalidImplementation({implementation:#x})"));
                }

                self.store_address(address, seq(OWNER_SLOT), owner);
                self.store_address(address, seq(BEACON_IMPLEMENTATION_SLOT), implementation);
            }
            MockContract::BeaconProxy => {
                let (beacon, data) =
                    <(Address, Bytes)>::abi_decode_params(args, true).map_err(err)?;
                if self.code(beacon) != Some(MockContract::Beacon) {
                    return Err(format!("ERC1967InvalidBeacon({beacon:#x})"));
                }

                self.store_address(address, StorageSlot::beacon().slot, beacon);
                if !data.is_empty() {
                    self.beacon_proxy(address, deployer, &data)?;
                }
            }
            MockContract::Erc1967Proxy => {
                let (implementation, data) =
                    <(Address, Bytes)>::abi_decode_params(args, true).map_err(err)?;
                self.upgrade_to_and_call(address, implementation, deployer, &data, false)?;
            }
            MockContract::LockableToken => {
                self.store_address(address, seq(OWNER_SLOT), deployer);
                self.store_address(address, token_slot(U256::ZERO, TOKEN_OWNERS_SLOT), deployer);
                self.store_u256(address, seq(NEXT_TOKEN_SLOT), U256::from(1));
            }
        }

        Ok(())
    }

    /// Call `to` from `sender`
    pub fn call(&mut self, to: Address, sender: Address, data: &[u8]) -> ExecResult {
        self.execute(to, to, sender, data)
    }

    /// Run the code at `code` against the storage of `ctx`. The two differ when a
    /// proxy delegates into its implementation.
    fn execute(&mut self, code: Address, ctx: Address, sender: Address, data: &[u8]) -> ExecResult {
        let Some(contract) = self.code(code) else {
            // Calls to accounts without code succeed and return nothing
            return Ok(Bytes::new());
        };

        match contract {
            MockContract::Counter { pattern, version, self_upgrade } => {
                let counter = CounterCode { pattern, version, self_upgrade, code };
                self.counter(counter, ctx, sender, data)
            }
            MockContract::ProxyAdmin => self.proxy_admin(ctx, sender, data),
            MockContract::TransparentProxy => self.transparent_proxy(ctx, sender, data),
            MockContract::Beacon => self.beacon(ctx, sender, data),
            MockContract::BeaconProxy => self.beacon_proxy(ctx, sender, data),
            MockContract::Erc1967Proxy => {
                let implementation = self.load_address(ctx, StorageSlot::implementation().slot);
                self.execute(implementation, ctx, sender, data)
            }
            MockContract::LockableToken => self.lockable_token(ctx, sender, data),
        }
    }

    // -----------
    // | Proxies |
    // -----------

    /// Point the proxy's implementation slot at `implementation` and run `data` against it
    fn upgrade_to_and_call(
        &mut self,
        proxy: Address,
        implementation: Address,
        sender: Address,
        data: &[u8],
        check_uuid: bool,
    ) -> ExecResult {
        if self.code(implementation).is_none() {
            return Err(format!("ERC1967InvalidImplementation({implementation:#x})"));
        }

        if check_uuid {
            let uuid_call = IUUPSUpgradeable::proxiableUUIDCall {}.abi_encode();
            let uuid = self
                .execute(implementation, implementation, proxy, &uuid_call)
                .and_then(|ret| B256::abi_decode(&ret, true).map_err(err))
                .map_err(|_| format!("ERC1967InvalidImplementation({implementation:#x})"))?;
            if uuid != StorageSlot::implementation().slot {
                return Err(format!("UUPSUnsupportedProxiableUUID({uuid})"));
            }
        }

        self.store_address(proxy, StorageSlot::implementation().slot, implementation);
        if !data.is_empty() {
            self.execute(implementation, proxy, sender, data)?;
        }

        Ok(Bytes::new())
    }

    /// A transparent proxy: the admin may only upgrade, everyone else is forwarded
    fn transparent_proxy(&mut self, ctx: Address, sender: Address, data: &[u8]) -> ExecResult {
        let admin = self.load_address(ctx, StorageSlot::admin().slot);
        if sender == admin {
            let call = ITransparentUpgradeableProxy::upgradeToAndCallCall::abi_decode(data, true)
                .map_err(|_| "ProxyDeniedAdminAccess".to_string())?;
            return self.upgrade_to_and_call(ctx, call.newImplementation, sender, &call.data, false);
        }

        let implementation = self.load_address(ctx, StorageSlot::implementation().slot);
        self.execute(implementation, ctx, sender, data)
    }

    /// A beacon proxy: forwards to whatever its beacon currently points at
    fn beacon_proxy(&mut self, ctx: Address, sender: Address, data: &[u8]) -> ExecResult {
        let beacon = self.load_address(ctx, StorageSlot::beacon().slot);
        let implementation = self.load_address(beacon, seq(BEACON_IMPLEMENTATION_SLOT));
        self.execute(implementation, ctx, sender, data)
    }

    /// A `ProxyAdmin`
    fn proxy_admin(&mut self, ctx: Address, sender: Address, data: &[u8]) -> ExecResult {
        let sel = selector(data)?;
        match sel {
            s if s == IOwnable::ownerCall::SELECTOR => ret(self.load_address(ctx, seq(OWNER_SLOT))),
            s if s == IOwnable::transferOwnershipCall::SELECTOR => {
                self.transfer_ownership(ctx, sender, data)
            }
            s if s == IProxyAdmin::upgradeAndCallCall::SELECTOR => {
                self.only_owner(ctx, sender)?;
                let call = IProxyAdmin::upgradeAndCallCall::abi_decode(data, true).map_err(err)?;
                let upgrade = ITransparentUpgradeableProxy::upgradeToAndCallCall {
                    newImplementation: call.implementation,
                    data: call.data,
                };

                // The admin itself is the sender the proxy sees
                self.execute(call.proxy, call.proxy, ctx, &upgrade.abi_encode())
            }
            _ => Err(unknown_selector(sel)),
        }
    }

    /// An `UpgradeableBeacon`
    fn beacon(&mut self, ctx: Address, sender: Address, data: &[u8]) -> ExecResult {
        let sel = selector(data)?;
        match sel {
            s if s == IOwnable::ownerCall::SELECTOR => ret(self.load_address(ctx, seq(OWNER_SLOT))),
            s if s == IOwnable::transferOwnershipCall::SELECTOR => {
                self.transfer_ownership(ctx, sender, data)
            }
            s if s == IUpgradeableBeacon::implementationCall::SELECTOR => {
                ret(self.load_address(ctx, seq(BEACON_IMPLEMENTATION_SLOT)))
            }
            s if s == IUpgradeableBeacon::upgradeToCall::SELECTOR => {
                self.only_owner(ctx, sender)?;
                let call = IUpgradeableBeacon::upgradeToCall::abi_decode(data, true).map_err(err)?;
                if self.code(call.newImplementation).is_none() {
                    return Err(format!(
                        "BeaconInvalidImplementation({:#x})",
                        call.newImplementation
                    ));
                }

                self.store_address(ctx, seq(BEACON_IMPLEMENTATION_SLOT), call.newImplementation);
                Ok(Bytes::new())
            }
            _ => Err(unknown_selector(sel)),
        }
    }

    // ------------
    // | Counters |
    // ------------

    /// A counter implementation, running against the storage of `ctx`
    fn counter(
        &mut self,
        counter: CounterCode,
        ctx: Address,
        sender: Address,
        data: &[u8],
    ) -> ExecResult {
        let sel = selector(data)?;
        let uups = counter.pattern == ProxyPattern::Uups;
        let v2 = counter.version == CounterVersion::V2;
        let upgradeable = uups && counter.self_upgrade;

        match sel {
            s if s == ICounterV1::initializeCall::SELECTOR && !uups => {
                self.initialize(ctx, 1)?;
                Ok(Bytes::new())
            }
            s if s == IOwnedInitializer::initializeCall::SELECTOR && uups => {
                let call = IOwnedInitializer::initializeCall::abi_decode(data, true).map_err(err)?;
                self.initialize(ctx, 1)?;
                self.store_address(ctx, seq(COUNTER_OWNER_SLOT), call.initialOwner);
                Ok(Bytes::new())
            }
            s if s == ICounterV1::incrementCall::SELECTOR => {
                let count = self.load_u256(ctx, seq(COUNT_SLOT));
                self.store_u256(ctx, seq(COUNT_SLOT), count + U256::from(1));
                Ok(Bytes::new())
            }
            s if s == ICounterV1::decrementCall::SELECTOR => {
                let count = self.load_u256(ctx, seq(COUNT_SLOT));
                let count = count.checked_sub(U256::from(1)).ok_or("arithmetic underflow")?;
                self.store_u256(ctx, seq(COUNT_SLOT), count);
                Ok(Bytes::new())
            }
            s if s == ICounterV1::getCountCall::SELECTOR => {
                ret(self.load_u256(ctx, seq(COUNT_SLOT)))
            }
            s if s == ICounterV1::getVersionCall::SELECTOR => {
                let version = if v2 { V2_VERSION_STRING } else { V1_VERSION_STRING };
                ret(version.to_string())
            }
            s if s == ICounterV2::reinitializeCall::SELECTOR && v2 => {
                self.initialize(ctx, 2)?;
                self.store_u256(ctx, seq(MULTIPLIER_SLOT), U256::from(DEFAULT_MULTIPLIER));
                Ok(Bytes::new())
            }
            s if s == ICounterV2::getMultiplierCall::SELECTOR && v2 => ret(self.multiplier(ctx)),
            s if s == ICounterV2::multiplyCall::SELECTOR && v2 => {
                let count = self.load_u256(ctx, seq(COUNT_SLOT));
                let multiplied = count * self.multiplier(ctx);
                self.store_u256(ctx, seq(COUNT_SLOT), multiplied);
                Ok(Bytes::new())
            }
            s if s == ICounterV2::incrementUserCountCall::SELECTOR && v2 => {
                let slot = mapping_slot(address_to_word(sender), USER_COUNTS_SLOT);
                let count = self.load_u256(ctx, slot);
                self.store_u256(ctx, slot, count + U256::from(1));
                Ok(Bytes::new())
            }
            s if s == ICounterV2::getUserCountCall::SELECTOR && v2 => {
                let call = ICounterV2::getUserCountCall::abi_decode(data, true).map_err(err)?;
                ret(self.load_u256(ctx, mapping_slot(address_to_word(call.user), USER_COUNTS_SLOT)))
            }
            s if s == IUUPSUpgradeable::upgradeToAndCallCall::SELECTOR && upgradeable => {
                if ctx == counter.code {
                    return Err("UUPSUnauthorizedCallContext".to_string());
                }

                let owner = self.load_address(ctx, seq(COUNTER_OWNER_SLOT));
                if sender != owner {
                    return Err(format!("OwnableUnauthorizedAccount({sender:#x})"));
                }

                let call =
                    IUUPSUpgradeable::upgradeToAndCallCall::abi_decode(data, true).map_err(err)?;
                self.upgrade_to_and_call(ctx, call.newImplementation, sender, &call.data, true)
            }
            s if s == IUUPSUpgradeable::proxiableUUIDCall::SELECTOR && upgradeable => {
                // Only answerable on the implementation itself, never through a proxy
                if ctx != counter.code {
                    return Err("UUPSUnauthorizedCallContext".to_string());
                }

                ret(StorageSlot::implementation().slot)
            }
            _ => Err(unknown_selector(sel)),
        }
    }

    /// Consume the initializer up to `version`
    fn initialize(&mut self, ctx: Address, version: u64) -> Result<(), String> {
        let initialized = self.load_u256(ctx, seq(INITIALIZED_SLOT));
        if initialized >= U256::from(version) {
            return Err("InvalidInitialization".to_string());
        }

        self.store_u256(ctx, seq(INITIALIZED_SLOT), U256::from(version));
        Ok(())
    }

    /// The multiplier of a version 2 counter
    fn multiplier(&self, ctx: Address) -> U256 {
        let stored = self.load_u256(ctx, seq(MULTIPLIER_SLOT));
        if stored.is_zero() {
            U256::from(DEFAULT_MULTIPLIER)
        } else {
            stored
        }
    }

    // ---------
    // | Token |
    // ---------

    /// A lockable, pausable ERC721 with two-step ownership
    fn lockable_token(&mut self, ctx: Address, sender: Address, data: &[u8]) -> ExecResult {
        let sel = selector(data)?;
        match sel {
            s if s == IOwnable::ownerCall::SELECTOR => ret(self.load_address(ctx, seq(OWNER_SLOT))),
            s if s == IOwnable2Step::pendingOwnerCall::SELECTOR => {
                ret(self.load_address(ctx, seq(PENDING_OWNER_SLOT)))
            }
            s if s == IOwnable::transferOwnershipCall::SELECTOR => {
                self.only_owner(ctx, sender)?;
                let call = IOwnable::transferOwnershipCall::abi_decode(data, true).map_err(err)?;
                self.store_address(ctx, seq(PENDING_OWNER_SLOT), call.newOwner);
                Ok(Bytes::new())
            }
            s if s == IOwnable2Step::acceptOwnershipCall::SELECTOR => {
                if sender != self.load_address(ctx, seq(PENDING_OWNER_SLOT)) {
                    return Err(format!("OwnableUnauthorizedAccount({sender:#x})"));
                }

                self.store_address(ctx, seq(OWNER_SLOT), sender);
                self.store_address(ctx, seq(PENDING_OWNER_SLOT), Address::ZERO);
                Ok(Bytes::new())
            }
            s if s == ILockableToken::ownerOfCall::SELECTOR => {
                let call = ILockableToken::ownerOfCall::abi_decode(data, true).map_err(err)?;
                ret(self.token_owner(ctx, call.tokenId)?)
            }
            s if s == ILockableToken::isTokenLockedCall::SELECTOR => {
                let call = ILockableToken::isTokenLockedCall::abi_decode(data, true).map_err(err)?;
                ret(self.token_locked(ctx, call.tokenId))
            }
            s if s == ILockableToken::setTokenLockCall::SELECTOR => {
                let call = ILockableToken::setTokenLockCall::abi_decode(data, true).map_err(err)?;
                let holder = self.token_owner(ctx, call.tokenId)?;
                if sender != holder {
                    self.only_owner(ctx, sender)?;
                }

                let slot = token_slot(call.tokenId, TOKEN_LOCKS_SLOT);
                self.store_u256(ctx, slot, U256::from(call.locked as u8));
                Ok(Bytes::new())
            }
            s if s == ILockableToken::transferFromCall::SELECTOR => {
                self.when_not_paused(ctx)?;
                let call = ILockableToken::transferFromCall::abi_decode(data, true).map_err(err)?;
                if self.token_locked(ctx, call.tokenId) {
                    return Err(format!("TokenLocked({})", call.tokenId));
                }

                let holder = self.token_owner(ctx, call.tokenId)?;
                if holder != call.from {
                    return Err(format!("ERC721IncorrectOwner({:#x})", call.from));
                }
                if sender != holder {
                    return Err(format!("ERC721InsufficientApproval({sender:#x})"));
                }

                self.store_address(ctx, token_slot(call.tokenId, TOKEN_OWNERS_SLOT), call.to);
                Ok(Bytes::new())
            }
            s if s == ILockableToken::mintCall::SELECTOR => {
                self.when_not_paused(ctx)?;
                self.only_owner(ctx, sender)?;
                let call = ILockableToken::mintCall::abi_decode(data, true).map_err(err)?;

                let id = self.load_u256(ctx, seq(NEXT_TOKEN_SLOT));
                self.store_address(ctx, token_slot(id, TOKEN_OWNERS_SLOT), call.to);
                self.store_u256(ctx, seq(NEXT_TOKEN_SLOT), id + U256::from(1));
                Ok(Bytes::new())
            }
            s if s == ILockableToken::pausedCall::SELECTOR => ret(self.paused(ctx)),
            s if s == ILockableToken::pauseCall::SELECTOR => {
                self.only_owner(ctx, sender)?;
                self.when_not_paused(ctx)?;
                self.store_u256(ctx, seq(PAUSED_SLOT), U256::from(1));
                Ok(Bytes::new())
            }
            s if s == ILockableToken::unpauseCall::SELECTOR => {
                self.only_owner(ctx, sender)?;
                if !self.paused(ctx) {
                    return Err("ExpectedPause".to_string());
                }

                self.store_u256(ctx, seq(PAUSED_SLOT), U256::ZERO);
                Ok(Bytes::new())
            }
            _ => Err(unknown_selector(sel)),
        }
    }

    /// The holder of a minted token
    fn token_owner(&self, ctx: Address, token_id: U256) -> Result<Address, String> {
        let holder = self.load_address(ctx, token_slot(token_id, TOKEN_OWNERS_SLOT));
        if holder == Address::ZERO {
            return Err(format!("ERC721NonexistentToken({token_id})"));
        }

        Ok(holder)
    }

    /// Whether a token is locked
    fn token_locked(&self, ctx: Address, token_id: U256) -> bool {
        !self.load_u256(ctx, token_slot(token_id, TOKEN_LOCKS_SLOT)).is_zero()
    }

    /// Whether the token contract is paused
    fn paused(&self, ctx: Address) -> bool {
        !self.load_u256(ctx, seq(PAUSED_SLOT)).is_zero()
    }

    /// Revert if the token contract is paused
    fn when_not_paused(&self, ctx: Address) -> Result<(), String> {
        if self.paused(ctx) {
            return Err("EnforcedPause".to_string());
        }

        Ok(())
    }

    // -----------
    // | Ownable |
    // -----------

    /// Revert unless `sender` is the owner recorded in `ctx`
    fn only_owner(&self, ctx: Address, sender: Address) -> Result<(), String> {
        if self.load_address(ctx, seq(OWNER_SLOT)) != sender {
            return Err(format!("OwnableUnauthorizedAccount({sender:#x})"));
        }

        Ok(())
    }

    /// Single-step `transferOwnership`
    fn transfer_ownership(&mut self, ctx: Address, sender: Address, data: &[u8]) -> ExecResult {
        self.only_owner(ctx, sender)?;
        let call = IOwnable::transferOwnershipCall::abi_decode(data, true).map_err(err)?;
        if call.newOwner == Address::ZERO {
            return Err("OwnableInvalidOwner(0x0)".to_string());
        }

        self.store_address(ctx, seq(OWNER_SLOT), call.newOwner);
        Ok(Bytes::new())
    }

    // -----------
    // | Storage |
    // -----------

    /// Read a word as an integer
    fn load_u256(&self, at: Address, slot: B256) -> U256 {
        U256::from_be_bytes(self.sload(at, slot).0)
    }

    /// Write an integer word
    fn store_u256(&mut self, at: Address, slot: B256, value: U256) {
        self.sstore(at, slot, B256::from(value.to_be_bytes::<32>()));
    }

    /// Read a word as an address
    fn load_address(&self, at: Address, slot: B256) -> Address {
        word_to_address(self.sload(at, slot))
    }

    /// Write an address word
    fn store_address(&mut self, at: Address, slot: B256, address: Address) {
        self.sstore(at, slot, address_to_word(address));
    }
}

/// The code of a counter being executed
#[derive(Clone, Copy)]
struct CounterCode {
    /// The pattern the counter is written for
    pattern: ProxyPattern,
    /// The counter version
    version: CounterVersion,
    /// Whether the counter carries the UUPS upgrade entry point
    self_upgrade: bool,
    /// The address the code is deployed at
    code: Address,
}

/// A sequential storage slot
fn seq(index: u64) -> B256 {
    StorageSlot::sequential(index).slot
}

/// The slot of `key` in the mapping at slot `base`
fn mapping_slot(key: B256, base: u64) -> B256 {
    let mut preimage = [0u8; 64];
    preimage[..32].copy_from_slice(key.as_slice());
    preimage[32..].copy_from_slice(seq(base).as_slice());
    keccak256(preimage)
}

/// The slot of a token ID in the mapping at slot `base`
fn token_slot(token_id: U256, base: u64) -> B256 {
    mapping_slot(B256::from(token_id.to_be_bytes::<32>()), base)
}

/// The 4-byte selector of some calldata
fn selector(data: &[u8]) -> Result<[u8; 4], String> {
    data.get(..4)
        .and_then(|sel| sel.try_into().ok())
        .ok_or_else(|| "calldata has no selector".to_string())
}

/// ABI-encode a single return value
fn ret<T: SolValue>(value: T) -> ExecResult {
    Ok((value,).abi_encode_params().into())
}

/// The revert of an unknown function
fn unknown_selector(sel: [u8; 4]) -> String {
    format!("no function with selector {}", Selector::from(sel))
}

/// Stringify a decoding error into a revert reason
fn err(e: alloy_sol_types::Error) -> String {
    e.to_string()
}
