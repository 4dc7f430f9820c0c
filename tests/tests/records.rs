use alloy_primitives::Address;
use eyre::Result;
use proxy_common::types::ProxyPattern;
use proxy_core::{
    orchestrator::stage::Stage,
    records::{DeploymentStore, RunCheckpoint},
};
use serde_json::Value;
use test_helpers::mock_ledger::MOCK_CHAIN_ID;
use tests::{
    orchestrator::utils::{setup_run_test, test_config},
    utils::global_setup,
};

#[tokio::test]
async fn test_record_shape() -> Result<()> {
    let fixture = setup_run_test()?;
    let report = fixture.orchestrator(test_config(ProxyPattern::Uups)).run().await?;

    let path = fixture.store.record_path(ProxyPattern::Uups.record_key());
    let json: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;

    assert_eq!(json["type"], "UUPS");
    assert_eq!(json["network"]["name"], "localhost");
    assert_eq!(json["network"]["chainId"], MOCK_CHAIN_ID);
    assert!(json["timestamp"].is_string());

    let v2: Address = json["implementations"]["v2"].as_str().unwrap_or_default().parse()?;
    assert_eq!(v2, report.record.implementations.v2);
    assert_eq!(json["proxies"].as_array().map(Vec::len), Some(1));

    // Pattern-specific addresses are omitted when the pattern has none
    assert!(json.get("proxyAdmin").is_none());
    assert!(json.get("beacon").is_none());

    Ok(())
}

#[tokio::test]
async fn test_transparent_record_names_admin() -> Result<()> {
    let fixture = setup_run_test()?;
    let report = fixture.orchestrator(test_config(ProxyPattern::Transparent)).run().await?;

    let record = fixture.store.read_record(ProxyPattern::Transparent.record_key())?;
    assert_eq!(record, report.record);
    assert!(record.proxy_admin.is_some());

    let path = fixture.store.record_path(ProxyPattern::Transparent.record_key());
    let json: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    assert_eq!(json["type"], "Transparent");
    assert!(json["proxyAdmin"].is_string());

    Ok(())
}

#[tokio::test]
async fn test_checkpoint_written_per_stage() -> Result<()> {
    let fixture = setup_run_test()?;
    let checkpoint = fixture.stop_before_upgrade(ProxyPattern::Beacon).await?;

    assert_eq!(checkpoint.pattern, ProxyPattern::Beacon);
    assert_eq!(checkpoint.proxies.len(), 2);
    assert!(checkpoint.beacon.is_some());
    assert_eq!(checkpoint.upgrade_tx, None);

    let path = fixture.store.checkpoint_path(ProxyPattern::Beacon);
    let json: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    assert_eq!(json["completed"], "ProbePreUpgrade");
    assert!(json["implementationV1"].is_string());

    Ok(())
}

#[test]
fn test_checkpoint_roundtrip() -> Result<()> {
    global_setup();
    let dir = tempfile::tempdir()?;
    let store = DeploymentStore::new(dir.path().join("deployments"));

    let mut checkpoint = RunCheckpoint::new(ProxyPattern::Transparent);
    checkpoint.completed = Some(Stage::DeployIndirection);
    checkpoint.implementation_v1 = Some(Address::repeat_byte(0x11));
    checkpoint.implementation_v2 = Some(Address::repeat_byte(0x22));
    checkpoint.proxies = vec![Address::repeat_byte(0x33)];
    checkpoint.proxy_admin = Some(Address::repeat_byte(0x44));

    store.write_checkpoint(&checkpoint)?;
    assert_eq!(store.read_checkpoint(ProxyPattern::Transparent)?, Some(checkpoint));

    // Each pattern has its own checkpoint
    assert_eq!(store.read_checkpoint(ProxyPattern::Uups)?, None);
    Ok(())
}

#[test]
fn test_missing_record() -> Result<()> {
    global_setup();
    let dir = tempfile::tempdir()?;
    let store = DeploymentStore::new(dir.path());

    assert!(store.read_record(ProxyPattern::Beacon.record_key()).is_err());
    assert_eq!(store.read_checkpoint(ProxyPattern::Beacon)?, None);
    Ok(())
}
