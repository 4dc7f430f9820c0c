use alloy_sol_types::SolCall;
use eyre::Result;
use proxy_common::{
    constants::{BEACON_PROXY_ARTIFACT, V1_VERSION_STRING, V2_VERSION_STRING},
    solidity::ICounterV1,
    types::ProxyPattern,
};
use proxy_core::{
    errors::{FailureClass, RunFailure},
    ledger::{send_call, Ledger},
    orchestrator::stage::Stage,
    records::RunCheckpoint,
};
use tests::{
    orchestrator::utils::{reinit, setup_run_test, target_of, test_config, upgrade_selector},
    utils::TEST_TIMEOUT,
};

/// Run `pattern` with an upgrade that confirms without changing anything. Storage
/// still shows the old implementation, so the run fails verification.
async fn assert_swallowed_upgrade_unverified(pattern: ProxyPattern) -> Result<()> {
    let fixture = setup_run_test()?;
    fixture.ledger.swallow(upgrade_selector(pattern));
    let err = fixture.orchestrator(test_config(pattern)).run().await.unwrap_err();

    assert_eq!(err.stage, Stage::Verify);
    assert_eq!(err.class(), FailureClass::Unverified);

    let checkpoint = fixture.checkpoint(pattern)?;
    assert_eq!(checkpoint.completed, Some(Stage::ProbePostUpgrade));
    assert!(checkpoint.upgrade_tx.is_some());

    let RunFailure::Unverified { proxy, expected, actual } = err.failure else {
        panic!("expected an unverified failure")
    };
    assert_eq!(proxy, checkpoint.proxies[0]);
    assert_eq!(Some(expected), checkpoint.implementation_v2);
    assert_eq!(Some(actual), checkpoint.implementation_v1);

    // No record is written for an unverified run
    let record_path = fixture.store.record_path(pattern.record_key());
    assert!(!record_path.exists());

    Ok(())
}

#[tokio::test]
async fn test_transparent_swallowed_upgrade_unverified() -> Result<()> {
    assert_swallowed_upgrade_unverified(ProxyPattern::Transparent).await
}

#[tokio::test]
async fn test_beacon_swallowed_upgrade_unverified() -> Result<()> {
    assert_swallowed_upgrade_unverified(ProxyPattern::Beacon).await
}

#[tokio::test]
async fn test_uups_swallowed_upgrade_unverified() -> Result<()> {
    assert_swallowed_upgrade_unverified(ProxyPattern::Uups).await
}

#[tokio::test]
async fn test_intruder_upgrade_bypass_detected() -> Result<()> {
    let fixture = setup_run_test()?;
    let pattern = ProxyPattern::Beacon;

    // Every upgrade, including the intruder's, appears to confirm
    fixture.ledger.swallow(upgrade_selector(pattern));
    let err = fixture.guarded_orchestrator(test_config(pattern)).run().await.unwrap_err();

    assert_eq!(err.stage, Stage::Upgrade);
    assert_eq!(err.class(), FailureClass::GuardBypassed);
    Ok(())
}

#[tokio::test]
async fn test_resume_after_deployment_failure() -> Result<()> {
    let fixture = setup_run_test()?;
    let pattern = ProxyPattern::Beacon;

    fixture.ledger.fail_deployment(BEACON_PROXY_ARTIFACT);
    let err = fixture.orchestrator(test_config(pattern)).run().await.unwrap_err();
    assert_eq!(err.stage, Stage::DeployIndirection);
    assert_eq!(err.class(), FailureClass::Deployment);

    // The implementations and the beacon deployed before the failure are kept
    let checkpoint = fixture.checkpoint(pattern)?;
    assert_eq!(checkpoint.completed, Some(Stage::DeployImpl2));
    assert!(checkpoint.implementation_v1.is_some());
    assert!(checkpoint.implementation_v2.is_some());
    assert!(checkpoint.beacon.is_some());
    assert!(checkpoint.proxies.is_empty());

    fixture.ledger.clear_faults();
    let report = fixture.orchestrator(test_config(pattern)).resume(checkpoint.clone()).await?;

    assert_eq!(Some(report.record.implementations.v1), checkpoint.implementation_v1);
    assert_eq!(Some(report.record.implementations.v2), checkpoint.implementation_v2);
    assert_eq!(report.record.beacon, checkpoint.beacon);
    assert_eq!(report.record.proxies.len(), 2);
    assert!(report.pre_upgrade.iter().all(|s| s.version == V1_VERSION_STRING));

    Ok(())
}

#[tokio::test]
async fn test_resume_completed_run() -> Result<()> {
    let fixture = setup_run_test()?;
    let pattern = ProxyPattern::Uups;
    let report = fixture.orchestrator(test_config(pattern)).run().await?;
    let sent = fixture.ledger.sent_transactions().len();

    // Nothing is left to do, the persisted record is handed back
    let checkpoint = fixture.checkpoint(pattern)?;
    assert_eq!(checkpoint.completed, Some(Stage::Done));
    let resumed = fixture.orchestrator(test_config(pattern)).resume(checkpoint).await?;

    assert_eq!(resumed.record, report.record);
    assert_eq!(fixture.ledger.sent_transactions().len(), sent);
    Ok(())
}

#[tokio::test]
async fn test_resume_pattern_mismatch() -> Result<()> {
    let fixture = setup_run_test()?;
    let checkpoint = RunCheckpoint::new(ProxyPattern::Beacon);

    let err = fixture
        .orchestrator(test_config(ProxyPattern::Transparent))
        .resume(checkpoint)
        .await
        .unwrap_err();

    assert_eq!(err.stage, Stage::DeployImpl1);
    assert_eq!(err.class(), FailureClass::Persistence);
    assert!(fixture.ledger.sent_transactions().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_resume_after_late_upgrade() -> Result<()> {
    let fixture = setup_run_test()?;
    let pattern = ProxyPattern::Transparent;
    let checkpoint = fixture.stop_before_upgrade(pattern).await?;
    let v2 = checkpoint.implementation_v2.expect("V2 deployed");

    // The stalled upgrade is mined after the run gave up on it
    let target = target_of(&checkpoint, fixture.ledger.sender());
    target.upgrade(&fixture.ledger, v2, reinit(), TEST_TIMEOUT).await?;
    let sent = fixture.ledger.sent_transactions().len();

    let orchestrator = fixture.guarded_orchestrator(test_config(pattern));
    let report = orchestrator.resume(checkpoint.clone()).await?;

    assert_eq!(report.record.implementations.v2, v2);
    assert_eq!(report.record.proxies, checkpoint.proxies);
    assert_eq!(report.upgrade_tx, None);
    assert!(report.failed_probes.is_empty());
    assert!(report.post_upgrade.iter().all(|s| s.version == V2_VERSION_STRING));

    // Nothing attempted the upgrade a second time
    let selector = upgrade_selector(pattern);
    let resent = fixture.ledger.sent_transactions()[sent..]
        .iter()
        .any(|tx| tx.calldata.starts_with(&selector));
    assert!(!resent);

    Ok(())
}

#[tokio::test]
async fn test_resume_partial_beacon_initialization() -> Result<()> {
    let fixture = setup_run_test()?;
    let pattern = ProxyPattern::Beacon;
    let init = ICounterV1::initializeCall::SELECTOR;

    fixture.ledger.hang_on(init);
    let err = fixture.orchestrator(test_config(pattern)).run().await.unwrap_err();
    assert_eq!(err.stage, Stage::Initialize);
    assert_eq!(err.class(), FailureClass::Initialization);
    fixture.ledger.clear_faults();

    // The first proxy's initialization lands late, the second never does
    let checkpoint = fixture.checkpoint(pattern)?;
    assert_eq!(checkpoint.completed, Some(Stage::DeployIndirection));
    let first = checkpoint.proxies[0];
    send_call(&fixture.ledger, first, &ICounterV1::initializeCall {}, TEST_TIMEOUT).await?;

    let report = fixture.orchestrator(test_config(pattern)).resume(checkpoint.clone()).await?;
    assert_eq!(report.record.proxies, checkpoint.proxies);
    assert!(report.pre_upgrade.iter().all(|s| s.version == V1_VERSION_STRING));

    // Each proxy was initialized exactly once
    let initializations = fixture
        .ledger
        .sent_transactions()
        .iter()
        .filter(|tx| tx.calldata.starts_with(&init))
        .count();
    assert_eq!(initializations, checkpoint.proxies.len());

    Ok(())
}
