//! A [`Ledger`] over a JSON-RPC node, signing with a local private key

use std::path::PathBuf;

use alloy::{
    network::{Ethereum, TransactionBuilder},
    providers::{DynProvider, Provider},
    rpc::types::{TransactionReceipt, TransactionRequest},
    transports::TransportError,
};
use alloy_primitives::{Address, Bytes, B256, U256};
use proxy_core::{
    errors::LedgerError,
    ledger::{Ledger, TxReceipt},
};
use tracing::debug;

use crate::{
    errors::ScriptError,
    utils::{load_bytecode, setup_client, setup_read_only_client},
};

/// A ledger reached over JSON-RPC
pub struct AlloyLedger {
    /// The signing provider
    provider: DynProvider<Ethereum>,
    /// The address the provider signs for
    sender: Address,
    /// The directory compiled artifacts are read from
    artifacts_dir: PathBuf,
}

impl AlloyLedger {
    /// Connect to `rpc_url`, signing with `priv_key`
    pub fn new(
        priv_key: &str,
        rpc_url: &str,
        artifacts_dir: impl Into<PathBuf>,
    ) -> Result<Self, ScriptError> {
        let (provider, sender) = setup_client(priv_key, rpc_url)?;
        Ok(Self { provider, sender, artifacts_dir: artifacts_dir.into() })
    }

    /// Connect to `rpc_url` without a signer. Reads and calls work, anything that
    /// sends a transaction is refused by the node.
    pub fn read_only(
        rpc_url: &str,
        artifacts_dir: impl Into<PathBuf>,
    ) -> Result<Self, ScriptError> {
        let provider = setup_read_only_client(rpc_url)?;
        Ok(Self { provider, sender: Address::ZERO, artifacts_dir: artifacts_dir.into() })
    }

    /// Send a transaction and wait for its receipt
    async fn submit(&self, tx: TransactionRequest) -> Result<TransactionReceipt, LedgerError> {
        let pending = self.provider.send_transaction(tx).await.map_err(rpc_error)?;
        debug!("Submitted transaction {}", pending.tx_hash());

        pending.get_receipt().await.map_err(|e| LedgerError::Transport(e.to_string()))
    }
}

impl Ledger for AlloyLedger {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn chain_id(&self) -> Result<u64, LedgerError> {
        self.provider.get_chain_id().await.map_err(rpc_error)
    }

    async fn deploy(
        &self,
        artifact: &str,
        constructor_args: Bytes,
    ) -> Result<Address, LedgerError> {
        let mut code = load_bytecode(&self.artifacts_dir, artifact)?.to_vec();
        code.extend_from_slice(&constructor_args);

        let tx = TransactionRequest::default().with_deploy_code(code);
        let receipt = self.submit(tx).await?;
        if !receipt.status() {
            return Err(LedgerError::Reverted(format!(
                "deployment of {artifact} failed in {}",
                receipt.transaction_hash
            )));
        }

        receipt.contract_address.ok_or_else(|| {
            LedgerError::Transport(format!(
                "receipt {} carries no contract address",
                receipt.transaction_hash
            ))
        })
    }

    async fn send(&self, to: Address, calldata: Bytes) -> Result<TxReceipt, LedgerError> {
        let tx = TransactionRequest::default().with_to(to).with_input(calldata);
        let receipt = self.submit(tx).await?;

        Ok(TxReceipt {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            success: receipt.status(),
        })
    }

    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, LedgerError> {
        let tx =
            TransactionRequest::default().with_from(self.sender).with_to(to).with_input(calldata);
        self.provider.call(&tx).await.map_err(rpc_error)
    }

    async fn storage_at(&self, contract: Address, slot: B256) -> Result<B256, LedgerError> {
        let key = U256::from_be_bytes(slot.0);
        let word = self.provider.get_storage_at(contract, key).await.map_err(rpc_error)?;

        Ok(B256::from(word.to_be_bytes::<32>()))
    }
}

/// Classify an RPC error. The node answering with an error payload means it
/// refused the request, typically because execution reverted.
fn rpc_error(e: TransportError) -> LedgerError {
    match e.as_error_resp() {
        Some(payload) => LedgerError::Reverted(payload.message.to_string()),
        None => LedgerError::Transport(e.to_string()),
    }
}
