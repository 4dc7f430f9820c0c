//! Definitions of errors that can occur while deploying, upgrading, and verifying proxies

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    time::Duration,
};

use alloy_primitives::{Address, B256};
use proxy_common::storage::DirtyPaddingError;

use crate::orchestrator::stage::Stage;

/// Errors surfaced by a ledger backend
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerError {
    /// The ledger refused to execute the transaction or call
    Reverted(String),
    /// The transaction was not confirmed within the bounded wait
    Timeout(Duration),
    /// Error reaching the ledger
    Transport(String),
    /// Error resolving a deployment artifact
    Artifact(String),
    /// Error decoding data returned by the ledger
    Decoding(String),
    /// A storage word does not hold a well-formed address
    MalformedWord(String),
}

impl Display for LedgerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::Reverted(s) => write!(f, "execution reverted: {}", s),
            LedgerError::Timeout(d) => write!(f, "no confirmation after {:?}", d),
            LedgerError::Transport(s) => write!(f, "transport error: {}", s),
            LedgerError::Artifact(s) => write!(f, "error resolving artifact: {}", s),
            LedgerError::Decoding(s) => write!(f, "error decoding ledger data: {}", s),
            LedgerError::MalformedWord(s) => write!(f, "malformed storage word: {}", s),
        }
    }
}

impl Error for LedgerError {}

impl From<alloy_sol_types::Error> for LedgerError {
    fn from(e: alloy_sol_types::Error) -> Self {
        LedgerError::Decoding(e.to_string())
    }
}

impl From<DirtyPaddingError> for LedgerError {
    fn from(e: DirtyPaddingError) -> Self {
        LedgerError::MalformedWord(e.to_string())
    }
}

/// Errors that can occur while triggering an implementation swap
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpgradeError {
    /// The upgrade call reverted: unauthorized caller, paused state, or a consumed
    /// reinitialization guard
    Rejected(String),
    /// The upgrade transaction was included but reverted
    Failed(B256),
    /// The upgrade transaction was not confirmed within the bounded wait
    Timeout(Duration),
    /// The new implementation cannot upgrade itself, so the proxy would be stuck on it
    NotProxiable(String),
    /// The pattern has no way to run reinitialization calldata
    ReinitUnsupported,
    /// Error reaching the ledger
    Network(String),
}

impl Display for UpgradeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            UpgradeError::Rejected(s) => write!(f, "upgrade rejected: {}", s),
            UpgradeError::Failed(tx) => write!(f, "upgrade transaction {} reverted", tx),
            UpgradeError::Timeout(d) => write!(f, "upgrade not confirmed after {:?}", d),
            UpgradeError::NotProxiable(s) => {
                write!(f, "new implementation is not upgradeable: {}", s)
            }
            UpgradeError::ReinitUnsupported => {
                write!(f, "reinitialization calldata is not supported by this pattern")
            }
            UpgradeError::Network(s) => write!(f, "network error during upgrade: {}", s),
        }
    }
}

impl Error for UpgradeError {}

impl From<LedgerError> for UpgradeError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Reverted(s) => UpgradeError::Rejected(s),
            LedgerError::Timeout(d) => UpgradeError::Timeout(d),
            other => UpgradeError::Network(other.to_string()),
        }
    }
}

/// Errors raised by expected-failure probes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardError {
    /// An operation that should have reverted went through
    NotEnforced(String),
    /// An operation that should have succeeded reverted
    Unexpected(String),
    /// Error talking to the ledger
    Ledger(LedgerError),
}

impl Display for GuardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            GuardError::NotEnforced(s) => write!(f, "guard not enforced: {}", s),
            GuardError::Unexpected(s) => write!(f, "unexpected revert: {}", s),
            GuardError::Ledger(e) => write!(f, "{}", e),
        }
    }
}

impl Error for GuardError {}

impl From<LedgerError> for GuardError {
    fn from(e: LedgerError) -> Self {
        GuardError::Ledger(e)
    }
}

/// Errors transferring ownership of a contract
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OwnershipError {
    /// The transfer confirmed but `owner()` reports someone else
    NotTransferred {
        /// The account that should own the contract
        expected: Address,
        /// The account `owner()` reports
        actual: Address,
    },
    /// A two-step transfer was started but the pending owner is not the new owner
    NotPending(Address),
    /// Error talking to the ledger
    Ledger(LedgerError),
}

impl Display for OwnershipError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            OwnershipError::NotTransferred { expected, actual } => {
                write!(f, "owner is {:#x}, expected {:#x}", actual, expected)
            }
            OwnershipError::NotPending(a) => write!(f, "pending owner is {:#x}", a),
            OwnershipError::Ledger(e) => write!(f, "{}", e),
        }
    }
}

impl Error for OwnershipError {}

impl From<LedgerError> for OwnershipError {
    fn from(e: LedgerError) -> Self {
        OwnershipError::Ledger(e)
    }
}

/// Errors reading or writing deployment records
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordError {
    /// Error reading a record
    Read(String),
    /// Error writing a record
    Write(String),
    /// Error de/serializing a record
    Serde(String),
}

impl Display for RecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::Read(s) => write!(f, "error reading deployment record: {}", s),
            RecordError::Write(s) => write!(f, "error writing deployment record: {}", s),
            RecordError::Serde(s) => write!(f, "error de/serializing deployment record: {}", s),
        }
    }
}

impl Error for RecordError {}

/// The classes of run failure, ordered roughly by how much they say about the ledger state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureClass {
    /// A constructor reverted or the deployment never landed
    Deployment,
    /// Post-deployment setup failed
    Initialization,
    /// The upgrade call was refused
    UpgradeRejected,
    /// The upgrade transaction was included but reverted
    UpgradeFailed,
    /// The upgrade transaction never confirmed
    UpgradeTimeout,
    /// Storage does not show the new implementation, or does not decode
    Unverified,
    /// A guard that should have refused an operation did not
    GuardBypassed,
    /// A diagnostic probe could not run
    Probe,
    /// A read-only ledger query failed
    Network,
    /// The deployment record could not be written
    Persistence,
}

/// The cause of an aborted run
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunFailure {
    /// Error deploying a contract
    Deployment(LedgerError),
    /// Error initializing a proxy
    Initialization(String),
    /// Error upgrading the implementation
    Upgrade(UpgradeError),
    /// The resolved implementation does not match the expected one
    Unverified {
        /// The proxy whose storage was inspected
        proxy: Address,
        /// The address the storage should hold
        expected: Address,
        /// The address the storage holds
        actual: Address,
    },
    /// A proxy's storage does not decode to an address
    Undecodable {
        /// The proxy whose storage was inspected
        proxy: Address,
        /// Why the word was rejected
        reason: String,
    },
    /// An unauthorized or out-of-band operation was not refused
    GuardBypassed(String),
    /// Error running a diagnostic probe
    Probe(LedgerError),
    /// Error querying the ledger
    Network(LedgerError),
    /// Error persisting the run
    Persistence(RecordError),
}

impl RunFailure {
    /// The class of this failure
    pub fn class(&self) -> FailureClass {
        match self {
            RunFailure::Deployment(_) => FailureClass::Deployment,
            RunFailure::Initialization(_) => FailureClass::Initialization,
            RunFailure::Upgrade(UpgradeError::Failed(_)) => FailureClass::UpgradeFailed,
            RunFailure::Upgrade(UpgradeError::Timeout(_)) => FailureClass::UpgradeTimeout,
            RunFailure::Upgrade(UpgradeError::Network(_)) => FailureClass::Network,
            RunFailure::Upgrade(_) => FailureClass::UpgradeRejected,
            RunFailure::Unverified { .. } | RunFailure::Undecodable { .. } => {
                FailureClass::Unverified
            }
            RunFailure::GuardBypassed(_) => FailureClass::GuardBypassed,
            RunFailure::Probe(_) => FailureClass::Probe,
            RunFailure::Network(_) => FailureClass::Network,
            RunFailure::Persistence(_) => FailureClass::Persistence,
        }
    }
}

impl Display for RunFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RunFailure::Deployment(e) => write!(f, "deployment failed: {}", e),
            RunFailure::Initialization(s) => write!(f, "initialization failed: {}", s),
            RunFailure::Upgrade(e) => write!(f, "{}", e),
            RunFailure::Unverified { proxy, expected, actual } => write!(
                f,
                "proxy {:#x} resolves to {:#x}, expected {:#x}",
                proxy, actual, expected
            ),
            RunFailure::Undecodable { proxy, reason } => {
                write!(f, "storage of proxy {:#x} does not decode: {}", proxy, reason)
            }
            RunFailure::GuardBypassed(s) => write!(f, "guard bypassed: {}", s),
            RunFailure::Probe(e) => write!(f, "probe failed: {}", e),
            RunFailure::Network(e) => write!(f, "{}", e),
            RunFailure::Persistence(e) => write!(f, "{}", e),
        }
    }
}

impl Error for RunFailure {}

/// A run aborted at a given stage
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunError {
    /// The stage that failed
    pub stage: Stage,
    /// What went wrong
    pub failure: RunFailure,
}

impl RunError {
    /// The class of the underlying failure
    pub fn class(&self) -> FailureClass {
        self.failure.class()
    }
}

impl Display for RunError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "stage {} failed: {}", self.stage, self.failure)
    }
}

impl Error for RunError {}
