//! Definitions of CLI arguments and commands for the scripts

use std::{path::PathBuf, time::Duration};

use alloy_primitives::{Address, Bytes, U256};
use clap::{Args, Parser, Subcommand, ValueEnum};
use proxy_common::{storage::DecodeMode, types::ProxyPattern};
use proxy_core::{
    ledger::DEFAULT_CONFIRMATION_TIMEOUT,
    orchestrator::{AdminLayout, DEFAULT_BEACON_PROXIES},
};
use tracing::Level;

use crate::{
    commands::{guard_probe, print_slot, run_upgrade, transfer_ownership, verify},
    constants::{
        DEFAULT_ARTIFACTS_DIR, DEFAULT_DEPLOYMENTS_DIR, DEFAULT_RPC_URL, INTRUDER_PKEY_ENV_VAR,
        PKEY_ENV_VAR, RPC_URL_ENV_VAR,
    },
    errors::ScriptError,
    ledger::AlloyLedger,
};

/// Deploy, upgrade, and inspect proxied contracts
#[derive(Parser)]
pub struct Cli {
    /// Private key of the deployer
    #[arg(short, long, env = PKEY_ENV_VAR, hide_env_values = true)]
    pub priv_key: Option<String>,

    /// Network RPC URL
    #[arg(short, long, env = RPC_URL_ENV_VAR, default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// Directory of compiled contract artifacts, one `<name>.json` per contract
    #[arg(long, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts_dir: PathBuf,

    /// Directory deployment records and run checkpoints are written to
    #[arg(long, default_value = DEFAULT_DEPLOYMENTS_DIR)]
    pub deployments_dir: PathBuf,

    /// Seconds to wait for a transaction to confirm
    #[arg(long, default_value_t = DEFAULT_CONFIRMATION_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// The most verbose level logged
    #[arg(short, long, value_enum, default_value_t = Verbosity::Info)]
    pub verbosity: Verbosity,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// The settings shared by every command
    pub fn config(&self) -> ScriptConfig {
        ScriptConfig {
            priv_key: self.priv_key.clone(),
            rpc_url: self.rpc_url.clone(),
            artifacts_dir: self.artifacts_dir.clone(),
            deployments_dir: self.deployments_dir.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// The settings shared by every command
#[derive(Clone)]
pub struct ScriptConfig {
    /// Private key of the deployer, if given
    pub priv_key: Option<String>,
    /// Network RPC URL
    pub rpc_url: String,
    /// Directory of compiled contract artifacts
    pub artifacts_dir: PathBuf,
    /// Directory of deployment records
    pub deployments_dir: PathBuf,
    /// How long to wait for a transaction to confirm
    pub timeout: Duration,
}

impl ScriptConfig {
    /// A ledger signing as the deployer
    pub fn ledger(&self) -> Result<AlloyLedger, ScriptError> {
        let priv_key = self.priv_key.as_deref().ok_or_else(|| {
            ScriptError::InvalidArguments(format!(
                "a private key is required, pass --priv-key or set {PKEY_ENV_VAR}"
            ))
        })?;

        self.ledger_for(priv_key)
    }

    /// A ledger signing with the given key
    pub fn ledger_for(&self, priv_key: &str) -> Result<AlloyLedger, ScriptError> {
        AlloyLedger::new(priv_key, &self.rpc_url, &self.artifacts_dir)
    }

    /// A ledger that only reads, needing no private key
    pub fn read_only_ledger(&self) -> Result<AlloyLedger, ScriptError> {
        AlloyLedger::read_only(&self.rpc_url, &self.artifacts_dir)
    }
}

/// The commands the scripts binary can run
#[derive(Subcommand)]
pub enum Command {
    /// Deploy, upgrade, and verify a proxied counter
    Run(RunArgs),
    /// Verify an existing deployment through storage
    Verify(VerifyArgs),
    /// Print a derived storage slot
    Slot(SlotArgs),
    /// Transfer ownership of a contract
    TransferOwnership(TransferOwnershipArgs),
    /// Run an expected-failure probe against a contract
    GuardProbe(GuardProbeArgs),
}

impl Command {
    /// Run the command
    pub async fn run(self, config: &ScriptConfig) -> Result<(), ScriptError> {
        match self {
            Command::Run(args) => run_upgrade(args, config).await,
            Command::Verify(args) => verify(args, config).await,
            Command::Slot(args) => {
                print_slot(args);
                Ok(())
            }
            Command::TransferOwnership(args) => transfer_ownership(args, config).await,
            Command::GuardProbe(args) => guard_probe(args, config).await,
        }
    }
}

/// Deploy two implementations of a counter behind the given proxy pattern, upgrade
/// from the first to the second, and verify the upgrade through storage.
///
/// A checkpoint is written to the deployments directory after every stage. With
/// `--resume`, a run continues from the last checkpoint of its pattern.
#[derive(Args)]
pub struct RunArgs {
    /// The proxy pattern to deploy and upgrade
    #[arg(long, value_enum)]
    pub pattern: PatternArg,

    /// How many proxies to deploy behind the beacon of a Beacon run
    #[arg(long, default_value_t = DEFAULT_BEACON_PROXIES)]
    pub beacon_proxies: usize,

    /// Where the `ProxyAdmin` of a Transparent run comes from
    #[arg(long, value_enum, default_value_t = AdminLayoutArg::External)]
    pub admin_layout: AdminLayoutArg,

    /// Private key of an account with no authority over the deployment. If given,
    /// the upgrade is first attempted from this account and must be refused.
    #[arg(long, env = INTRUDER_PKEY_ENV_VAR, hide_env_values = true)]
    pub intruder_pkey: Option<String>,

    /// Reject address words with non-zero padding
    #[arg(long)]
    pub strict_decoding: bool,

    /// Continue from the last checkpoint of this pattern
    #[arg(long)]
    pub resume: bool,
}

/// Check, from storage alone, that a deployed proxy resolves to an implementation
#[derive(Args)]
pub struct VerifyArgs {
    /// The proxy pattern of the deployment
    #[arg(long, value_enum)]
    pub pattern: PatternArg,

    /// Address of the proxy contract
    #[arg(long)]
    pub proxy: Address,

    /// Address of the implementation the proxy should resolve to
    #[arg(long)]
    pub expected: Address,

    /// Reject address words with non-zero padding
    #[arg(long)]
    pub strict_decoding: bool,
}

/// Print the namespaced storage slot derived from a label
#[derive(Args)]
pub struct SlotArgs {
    /// The label, e.g. `eip1967.proxy.implementation`
    #[arg(short, long)]
    pub label: String,
}

/// Transfer ownership of an `Ownable` or `Ownable2Step` contract
#[derive(Args)]
pub struct TransferOwnershipArgs {
    /// Address of the owned contract
    #[arg(short, long)]
    pub contract: Address,

    /// Address of the new owner. Derived from `--new-owner-pkey` in a two-step transfer.
    #[arg(long)]
    pub new_owner: Option<Address>,

    /// Run an `Ownable2Step` transfer, accepting it as the new owner
    #[arg(long, requires = "new_owner_pkey")]
    pub two_step: bool,

    /// Private key of the new owner, used to accept a two-step transfer
    #[arg(long)]
    pub new_owner_pkey: Option<String>,
}

/// Confirm a contract's guards refuse what they should
#[derive(Args)]
pub struct GuardProbeArgs {
    /// The probe to run
    #[command(subcommand)]
    pub probe: GuardProbe,
}

/// The available guard probes
#[derive(Subcommand)]
pub enum GuardProbe {
    /// Lock a token, check it cannot be transferred, then unlock and transfer it
    Lock {
        /// Address of the token contract
        #[arg(long)]
        token: Address,
        /// The token to lock, which the deployer must own
        #[arg(long)]
        token_id: U256,
        /// The account the token is transferred to
        #[arg(long)]
        recipient: Address,
    },
    /// Pause a contract, check a call is refused, then unpause it
    Pause {
        /// Address of the pausable contract
        #[arg(long)]
        target: Address,
        /// Hex calldata of the call that must be refused while paused
        #[arg(long)]
        calldata: Bytes,
    },
}

/// A proxy pattern, as named on the command line
#[derive(ValueEnum, Copy, Clone)]
pub enum PatternArg {
    /// Beacon proxies behind an `UpgradeableBeacon`
    Beacon,
    /// A `TransparentUpgradeableProxy` administered by a `ProxyAdmin`
    Transparent,
    /// An `ERC1967Proxy` in front of a self-upgrading implementation
    Uups,
}

impl From<PatternArg> for ProxyPattern {
    fn from(arg: PatternArg) -> Self {
        match arg {
            PatternArg::Beacon => ProxyPattern::Beacon,
            PatternArg::Transparent => ProxyPattern::Transparent,
            PatternArg::Uups => ProxyPattern::Uups,
        }
    }
}

/// An admin layout, as named on the command line
#[derive(ValueEnum, Copy, Clone)]
pub enum AdminLayoutArg {
    /// Deploy a `ProxyAdmin` and hand it to the proxy
    External,
    /// Let the proxy deploy its own `ProxyAdmin`
    ProxyOwned,
}

impl From<AdminLayoutArg> for AdminLayout {
    fn from(arg: AdminLayoutArg) -> Self {
        match arg {
            AdminLayoutArg::External => AdminLayout::External,
            AdminLayoutArg::ProxyOwned => AdminLayout::ProxyOwned,
        }
    }
}

/// Log verbosity
#[derive(ValueEnum, Copy, Clone)]
pub enum Verbosity {
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Stage progress
    Info,
    /// Every ledger interaction
    Debug,
    /// Everything
    Trace,
}

impl From<Verbosity> for Level {
    fn from(verbosity: Verbosity) -> Self {
        match verbosity {
            Verbosity::Error => Level::ERROR,
            Verbosity::Warn => Level::WARN,
            Verbosity::Info => Level::INFO,
            Verbosity::Debug => Level::DEBUG,
            Verbosity::Trace => Level::TRACE,
        }
    }
}

/// The decode mode selected by a `--strict-decoding` flag
pub fn decode_mode(strict: bool) -> DecodeMode {
    if strict {
        DecodeMode::Strict
    } else {
        DecodeMode::Lenient
    }
}
