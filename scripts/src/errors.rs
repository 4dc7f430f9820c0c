//! Definitions of errors that can occur during the execution of the scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use proxy_core::errors::{GuardError, LedgerError, OwnershipError, RecordError, RunError};

/// Errors that can occur during the execution of the scripts
#[derive(Debug)]
pub enum ScriptError {
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// A command was given arguments it cannot act on
    InvalidArguments(String),
    /// Error talking to the ledger
    Ledger(LedgerError),
    /// An upgrade run failed
    Run(RunError),
    /// A deployment did not resolve as expected
    Verification(String),
    /// Error reading or writing deployment records
    Records(RecordError),
    /// A guard probe did not hold
    Guard(GuardError),
    /// An ownership transfer did not take effect
    Ownership(OwnershipError),
    /// Error de/serializing a record
    Serde(String),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::InvalidArguments(s) => write!(f, "invalid arguments: {}", s),
            ScriptError::Ledger(e) => write!(f, "ledger error: {}", e),
            ScriptError::Run(e) => write!(f, "upgrade run failed: {}", e),
            ScriptError::Verification(s) => write!(f, "verification failed: {}", s),
            ScriptError::Records(e) => write!(f, "record store error: {}", e),
            ScriptError::Guard(e) => write!(f, "guard probe failed: {}", e),
            ScriptError::Ownership(e) => write!(f, "ownership transfer failed: {}", e),
            ScriptError::Serde(s) => write!(f, "error de/serializing record: {}", s),
        }
    }
}

impl Error for ScriptError {}

impl From<LedgerError> for ScriptError {
    fn from(e: LedgerError) -> Self {
        ScriptError::Ledger(e)
    }
}

impl From<RunError> for ScriptError {
    fn from(e: RunError) -> Self {
        ScriptError::Run(e)
    }
}

impl From<RecordError> for ScriptError {
    fn from(e: RecordError) -> Self {
        ScriptError::Records(e)
    }
}

impl From<GuardError> for ScriptError {
    fn from(e: GuardError) -> Self {
        ScriptError::Guard(e)
    }
}

impl From<OwnershipError> for ScriptError {
    fn from(e: OwnershipError) -> Self {
        ScriptError::Ownership(e)
    }
}
