//! An in-memory [`Ledger`] backed by a [`World`], with switches for the ledger
//! faults the orchestrator has to survive

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use alloy_primitives::{address, keccak256, Address, Bytes, B256};
use proxy_core::{
    errors::LedgerError,
    ledger::{Ledger, TxReceipt},
};

use crate::world::{MockContract, World};

/// The default sending account, the first well-known development key
pub const DEPLOYER: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");
/// An account with no role in any deployment
pub const INTRUDER: Address = address!("70997970c51812dc3a010c7d01b50e0d17dc79c8");
/// A third account, used as a transfer recipient or new owner
pub const RECIPIENT: Address = address!("3c44cdddb6a900fa2b585dd299e03d12fa4293bc");

/// The chain ID reported by the mock ledger
pub const MOCK_CHAIN_ID: u64 = 31337;

/// A transaction included by the mock ledger
#[derive(Clone, Debug)]
pub struct SentTransaction {
    /// The sending account
    pub from: Address,
    /// The recipient
    pub to: Address,
    /// The calldata
    pub calldata: Bytes,
    /// The receipt handed back to the sender
    pub receipt: TxReceipt,
}

/// The shared chain state
#[derive(Default)]
struct Chain {
    /// Account code and storage
    world: World,
    /// The next nonce of each sender
    nonces: HashMap<Address, u64>,
    /// The number of the last block
    block_number: u64,
    /// Transactions included so far
    sent: Vec<SentTransaction>,
    /// Selectors whose transactions never confirm
    hang_on: HashSet<[u8; 4]>,
    /// Selectors whose transactions are included but fail
    fail_after_inclusion: HashSet<[u8; 4]>,
    /// Selectors whose transactions are confirmed without executing
    swallow: HashSet<[u8; 4]>,
    /// Artifacts whose deployments revert
    failing_artifacts: HashSet<String>,
    /// Whether every request fails at the transport
    transport_down: bool,
}

impl Chain {
    /// The next nonce of `sender`
    fn nonce(&self, sender: Address) -> u64 {
        self.nonces.get(&sender).copied().unwrap_or_default()
    }

    /// Include a transaction from `sender` in a new block
    fn include(&mut self, sender: Address, success: bool) -> TxReceipt {
        let nonce = self.nonce(sender);
        self.nonces.insert(sender, nonce + 1);
        self.block_number += 1;

        let mut preimage = sender.to_vec();
        preimage.extend_from_slice(&nonce.to_be_bytes());
        TxReceipt { tx_hash: keccak256(preimage), block_number: Some(self.block_number), success }
    }

    /// Fail if the transport has been switched off
    fn check_transport(&self) -> Result<(), LedgerError> {
        if self.transport_down {
            return Err(LedgerError::Transport("connection refused".to_string()));
        }

        Ok(())
    }
}

/// A handle on the mock chain that sends from a single account.
///
/// Clones and [`MockLedger::as_account`] handles share the same chain.
#[derive(Clone)]
pub struct MockLedger {
    /// The chain state
    chain: Arc<Mutex<Chain>>,
    /// The account this handle sends from
    sender: Address,
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLedger {
    /// An empty chain, sending from [`DEPLOYER`]
    pub fn new() -> Self {
        Self { chain: Arc::new(Mutex::new(Chain::default())), sender: DEPLOYER }
    }

    /// A handle on the same chain sending from `account`
    pub fn as_account(&self, account: Address) -> Self {
        Self { chain: self.chain.clone(), sender: account }
    }

    /// Transactions calling `selector` will never confirm
    pub fn hang_on(&self, selector: [u8; 4]) {
        self.chain().hang_on.insert(selector);
    }

    /// Transactions calling `selector` are included with a failed status and no effect
    pub fn fail_after_inclusion(&self, selector: [u8; 4]) {
        self.chain().fail_after_inclusion.insert(selector);
    }

    /// Transactions calling `selector` confirm successfully without executing
    pub fn swallow(&self, selector: [u8; 4]) {
        self.chain().swallow.insert(selector);
    }

    /// Deployments of `artifact` revert
    pub fn fail_deployment(&self, artifact: &str) {
        self.chain().failing_artifacts.insert(artifact.to_string());
    }

    /// Remove every injected fault
    pub fn clear_faults(&self) {
        let mut chain = self.chain();
        chain.hang_on.clear();
        chain.fail_after_inclusion.clear();
        chain.swallow.clear();
        chain.failing_artifacts.clear();
        chain.transport_down = false;
    }

    /// Make every request fail, or restore the transport
    pub fn set_transport_down(&self, down: bool) {
        self.chain().transport_down = down;
    }

    /// Overwrite a storage word
    pub fn set_storage(&self, contract: Address, slot: B256, word: B256) {
        self.chain().world.sstore(contract, slot, word);
    }

    /// The code deployed at `address`
    pub fn code_at(&self, address: Address) -> Option<MockContract> {
        self.chain().world.code(address)
    }

    /// Every transaction included so far
    pub fn sent_transactions(&self) -> Vec<SentTransaction> {
        self.chain().sent.clone()
    }

    /// Lock the chain state
    fn chain(&self) -> MutexGuard<'_, Chain> {
        self.chain.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Ledger for MockLedger {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn chain_id(&self) -> Result<u64, LedgerError> {
        self.chain().check_transport()?;
        Ok(MOCK_CHAIN_ID)
    }

    async fn deploy(
        &self,
        artifact: &str,
        constructor_args: Bytes,
    ) -> Result<Address, LedgerError> {
        let mut chain = self.chain();
        chain.check_transport()?;
        if chain.failing_artifacts.contains(artifact) {
            return Err(LedgerError::Reverted(format!("deployment of {artifact} reverted")));
        }

        let contract = MockContract::from_artifact(artifact)
            .ok_or_else(|| LedgerError::Artifact(format!("no artifact named {artifact}")))?;
        let address = self.sender.create(chain.nonce(self.sender));

        let snapshot = chain.world.clone();
        if let Err(reason) = chain.world.create(address, contract, self.sender, &constructor_args) {
            chain.world = snapshot;
            return Err(LedgerError::Reverted(reason));
        }

        chain.include(self.sender, true /* success */);
        Ok(address)
    }

    async fn send(&self, to: Address, calldata: Bytes) -> Result<TxReceipt, LedgerError> {
        let selector: Option<[u8; 4]> = calldata.get(..4).and_then(|s| s.try_into().ok());
        let has_fault =
            |faults: &HashSet<[u8; 4]>| selector.is_some_and(|sel| faults.contains(&sel));

        let hangs = {
            let chain = self.chain();
            chain.check_transport()?;
            has_fault(&chain.hang_on)
        };
        if hangs {
            return std::future::pending().await;
        }

        let mut chain = self.chain();
        let snapshot = chain.world.clone();
        let outcome = if has_fault(&chain.swallow) {
            Ok(Bytes::new())
        } else {
            chain.world.call(to, self.sender, &calldata)
        };

        // Reverting transactions fail estimation and are never included
        if let Err(reason) = outcome {
            chain.world = snapshot;
            return Err(LedgerError::Reverted(reason));
        }

        let success = !has_fault(&chain.fail_after_inclusion);
        if !success {
            chain.world = snapshot;
        }

        let receipt = chain.include(self.sender, success);
        chain.sent.push(SentTransaction { from: self.sender, to, calldata, receipt });
        Ok(receipt)
    }

    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, LedgerError> {
        let chain = self.chain();
        chain.check_transport()?;

        let mut scratch = chain.world.clone();
        scratch.call(to, self.sender, &calldata).map_err(LedgerError::Reverted)
    }

    async fn storage_at(&self, contract: Address, slot: B256) -> Result<B256, LedgerError> {
        let chain = self.chain();
        chain.check_transport()?;
        Ok(chain.world.sload(contract, slot))
    }
}
