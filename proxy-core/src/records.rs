//! Persistence of upgrade runs: the final deployment record of a run and the
//! checkpoints written as each stage completes

use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy_primitives::{Address, B256};
use chrono::{DateTime, Utc};
use proxy_common::types::ProxyPattern;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::{errors::RecordError, orchestrator::stage::Stage};

/// The suffix appended to a record key to name its checkpoint file
const CHECKPOINT_SUFFIX: &str = "checkpoint";

// -----------
// | Records |
// -----------

/// The implementation addresses deployed by a run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementationAddresses {
    /// The initial implementation
    pub v1: Address,
    /// The upgrade target
    pub v2: Address,
}

/// The network a run was performed against
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkIdentity {
    /// A human-readable network name
    pub name: String,
    /// The chain ID
    pub chain_id: u64,
}

impl NetworkIdentity {
    /// Name a network by its chain ID
    pub fn from_chain_id(chain_id: u64) -> Self {
        let name = match chain_id {
            1 => "mainnet",
            17000 => "holesky",
            11155111 => "sepolia",
            31337 => "localhost",
            _ => "unknown",
        };

        Self { name: name.to_string(), chain_id }
    }
}

/// The record of a completed upgrade run, written once at the end of the run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeRecord {
    /// The proxy pattern exercised
    #[serde(rename = "type")]
    pub pattern: ProxyPattern,
    /// The implementation addresses
    pub implementations: ImplementationAddresses,
    /// The proxies deployed
    pub proxies: Vec<Address>,
    /// The `ProxyAdmin` of a Transparent run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_admin: Option<Address>,
    /// The beacon of a Beacon run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beacon: Option<Address>,
    /// The network the run was performed against
    pub network: NetworkIdentity,
    /// When the record was written
    pub timestamp: DateTime<Utc>,
}

/// The progress of a run, written after each completed stage so that a run aborted
/// midway can be inspected and resumed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCheckpoint {
    /// The pattern of the run
    pub pattern: ProxyPattern,
    /// The last stage that completed
    #[serde(default)]
    pub completed: Option<Stage>,
    /// The initial implementation, once deployed
    #[serde(default)]
    pub implementation_v1: Option<Address>,
    /// The upgrade target, once deployed
    #[serde(default)]
    pub implementation_v2: Option<Address>,
    /// The proxies, once deployed
    #[serde(default)]
    pub proxies: Vec<Address>,
    /// The `ProxyAdmin` of a Transparent run, once deployed
    #[serde(default)]
    pub proxy_admin: Option<Address>,
    /// The beacon of a Beacon run, once deployed
    #[serde(default)]
    pub beacon: Option<Address>,
    /// The hash of the upgrade transaction, once confirmed
    #[serde(default)]
    pub upgrade_tx: Option<B256>,
    /// When the checkpoint was written
    pub updated_at: DateTime<Utc>,
}

impl RunCheckpoint {
    /// An empty checkpoint for a run that has not completed any stage
    pub fn new(pattern: ProxyPattern) -> Self {
        Self {
            pattern,
            completed: None,
            implementation_v1: None,
            implementation_v2: None,
            proxies: Vec::new(),
            proxy_admin: None,
            beacon: None,
            upgrade_tx: None,
            updated_at: Utc::now(),
        }
    }
}

// ---------
// | Store |
// ---------

/// A directory of JSON deployment records, one file per record key
#[derive(Clone, Debug)]
pub struct DeploymentStore {
    /// The directory records are written to
    dir: PathBuf,
}

impl DeploymentStore {
    /// A store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory records are written to
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The path of the record stored under `key`
    pub fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// The path of the checkpoint of runs of the given pattern
    pub fn checkpoint_path(&self, pattern: ProxyPattern) -> PathBuf {
        self.dir.join(format!("{}.{CHECKPOINT_SUFFIX}.json", pattern.record_key()))
    }

    /// Write a record under `key`, replacing any previous record
    pub fn write_record(&self, key: &str, record: &UpgradeRecord) -> Result<PathBuf, RecordError> {
        let path = self.record_path(key);
        self.write_json(&path, record)?;

        Ok(path)
    }

    /// Read the record stored under `key`
    pub fn read_record(&self, key: &str) -> Result<UpgradeRecord, RecordError> {
        read_json(&self.record_path(key))
    }

    /// Write the checkpoint of a run
    pub fn write_checkpoint(&self, checkpoint: &RunCheckpoint) -> Result<PathBuf, RecordError> {
        let path = self.checkpoint_path(checkpoint.pattern);
        self.write_json(&path, checkpoint)?;

        Ok(path)
    }

    /// Read the checkpoint of the last run of the given pattern, if there is one
    pub fn read_checkpoint(
        &self,
        pattern: ProxyPattern,
    ) -> Result<Option<RunCheckpoint>, RecordError> {
        let path = self.checkpoint_path(pattern);
        if !path.exists() {
            return Ok(None);
        }

        read_json(&path).map(Some)
    }

    /// Serialize `value` as indented JSON to `path`, creating the store directory if absent
    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), RecordError> {
        fs::create_dir_all(&self.dir).map_err(|e| RecordError::Write(e.to_string()))?;

        let json =
            serde_json::to_string_pretty(value).map_err(|e| RecordError::Serde(e.to_string()))?;
        fs::write(path, json).map_err(|e| RecordError::Write(e.to_string()))?;
        debug!("Wrote {}", path.display());

        Ok(())
    }
}

/// Deserialize the JSON file at `path`
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, RecordError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| RecordError::Read(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&contents).map_err(|e| RecordError::Serde(e.to_string()))
}
