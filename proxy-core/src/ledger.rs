//! The ledger interface the orchestrator drives, and helpers for submitting
//! transactions and simulating calls through it

use std::{future::Future, time::Duration};

use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::SolCall;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::LedgerError;

/// The default bound on how long a submitted transaction may take to confirm
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(120);

/// The receipt of a confirmed transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// The transaction hash
    pub tx_hash: B256,
    /// The block the transaction was included in
    pub block_number: Option<u64>,
    /// Whether the transaction executed successfully
    pub success: bool,
}

/// An EVM ledger reachable through a single sending account.
///
/// Every mutating method resolves only once the transaction is confirmed.
#[allow(async_fn_in_trait)]
pub trait Ledger {
    /// The account transactions are sent from
    fn sender(&self) -> Address;

    /// The chain ID of the ledger
    async fn chain_id(&self) -> Result<u64, LedgerError>;

    /// Deploy the named artifact with the given ABI-encoded constructor arguments
    async fn deploy(&self, artifact: &str, constructor_args: Bytes)
        -> Result<Address, LedgerError>;

    /// Send a transaction and wait for its receipt
    async fn send(&self, to: Address, calldata: Bytes) -> Result<TxReceipt, LedgerError>;

    /// Simulate a call against the latest state without submitting it
    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, LedgerError>;

    /// Read a raw storage word
    async fn storage_at(&self, contract: Address, slot: B256) -> Result<B256, LedgerError>;
}

/// Bound the wait on a ledger future, mapping an elapsed wait to [`LedgerError::Timeout`]
pub async fn with_timeout<T, F>(timeout: Duration, fut: F) -> Result<T, LedgerError>
where
    F: Future<Output = Result<T, LedgerError>>,
{
    tokio::time::timeout(timeout, fut).await.map_err(|_| LedgerError::Timeout(timeout))?
}

/// Treat a receipt with a failed status as a revert
pub fn ensure_success(receipt: TxReceipt) -> Result<TxReceipt, LedgerError> {
    if receipt.success {
        Ok(receipt)
    } else {
        Err(LedgerError::Reverted(format!("transaction {} failed", receipt.tx_hash)))
    }
}

/// Deploy an artifact, waiting at most `timeout` for confirmation
pub async fn deploy_contract(
    ledger: &impl Ledger,
    artifact: &str,
    constructor_args: Bytes,
    timeout: Duration,
) -> Result<Address, LedgerError> {
    let address = with_timeout(timeout, ledger.deploy(artifact, constructor_args)).await?;
    debug!("Deployed {artifact} at {address:#x}");

    Ok(address)
}

/// Send a typed call and require it to succeed
pub async fn send_call<C: SolCall>(
    ledger: &impl Ledger,
    to: Address,
    call: &C,
    timeout: Duration,
) -> Result<TxReceipt, LedgerError> {
    let receipt = with_timeout(timeout, ledger.send(to, call.abi_encode().into())).await?;
    ensure_success(receipt)
}

/// Simulate a typed call and decode its return value
pub async fn read_call<C: SolCall>(
    ledger: &impl Ledger,
    to: Address,
    call: &C,
) -> Result<C::Return, LedgerError> {
    let data = ledger.call(to, call.abi_encode().into()).await?;
    Ok(C::abi_decode_returns(&data, true /* validate */)?)
}
