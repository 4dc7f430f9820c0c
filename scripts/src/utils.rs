//! Utilities for the scripts

use std::{fs, path::Path, str::FromStr};

use alloy::{
    network::{Ethereum, EthereumWallet},
    providers::{DynProvider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use alloy_primitives::{Address, Bytes};
use proxy_core::errors::LedgerError;
use serde_json::Value;

use crate::{
    constants::{ARTIFACT_EXTENSION, BYTECODE_KEY, BYTECODE_OBJECT_KEY},
    errors::ScriptError,
};

/// Sets up a signing provider for the given private key and RPC URL, returning it
/// along with the address it signs for
pub fn setup_client(
    priv_key: &str,
    rpc_url: &str,
) -> Result<(DynProvider<Ethereum>, Address), ScriptError> {
    let signer = PrivateKeySigner::from_str(priv_key)
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let sender = signer.address();
    let url = Url::parse(rpc_url).map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;

    let provider = ProviderBuilder::new().wallet(EthereumWallet::from(signer)).on_http(url);
    Ok((DynProvider::new(provider), sender))
}

/// Sets up a provider with no signer, for commands that only read the chain
pub fn setup_read_only_client(rpc_url: &str) -> Result<DynProvider<Ethereum>, ScriptError> {
    let url = Url::parse(rpc_url).map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let provider = ProviderBuilder::new().on_http(url);

    Ok(DynProvider::new(provider))
}

/// Reads the creation bytecode of the named artifact from `artifacts_dir`.
///
/// Both the Hardhat layout (`"bytecode": "0x..."`) and the Foundry layout
/// (`"bytecode": { "object": "0x..." }`) are accepted.
pub fn load_bytecode(artifacts_dir: &Path, name: &str) -> Result<Bytes, LedgerError> {
    let path = artifacts_dir.join(name).with_extension(ARTIFACT_EXTENSION);
    let contents = fs::read_to_string(&path)
        .map_err(|e| LedgerError::Artifact(format!("{}: {e}", path.display())))?;
    let artifact: Value = serde_json::from_str(&contents)
        .map_err(|e| LedgerError::Artifact(format!("{}: {e}", path.display())))?;

    let code = match &artifact[BYTECODE_KEY] {
        Value::String(code) => code.as_str(),
        Value::Object(nested) => {
            nested.get(BYTECODE_OBJECT_KEY).and_then(Value::as_str).ok_or_else(|| {
                LedgerError::Artifact(format!("{} has no bytecode object", path.display()))
            })?
        }
        _ => {
            return Err(LedgerError::Artifact(format!("{} has no bytecode", path.display())));
        }
    };

    Bytes::from_str(code).map_err(|e| LedgerError::Artifact(format!("{}: {e}", path.display())))
}
