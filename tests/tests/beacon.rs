use alloy_primitives::U256;
use alloy_sol_types::SolCall;
use eyre::Result;
use proxy_common::{
    constants::V2_VERSION_STRING,
    solidity::IUpgradeableBeacon,
    types::ProxyPattern,
};
use proxy_core::{inspector::StorageInspector, ownership::owner_of};
use test_helpers::{
    mock_ledger::DEPLOYER,
    world::{MockContract, DEFAULT_MULTIPLIER},
};
use tests::orchestrator::utils::{setup_run_test, test_config, upgrade_selector};

#[tokio::test]
async fn test_beacon_upgrade() -> Result<()> {
    let fixture = setup_run_test()?;
    let config = test_config(ProxyPattern::Beacon);
    let report = fixture.guarded_orchestrator(config).run().await?;

    // The two proxies carry distinct state through the single upgrade
    let counts: Vec<U256> = report.pre_upgrade.iter().map(|s| s.count).collect();
    assert_eq!(counts, vec![U256::from(2), U256::from(1)]);

    for (pre, post) in report.pre_upgrade.iter().zip(report.post_upgrade.iter()) {
        assert_eq!(pre.proxy, post.proxy);
        assert_eq!(post.version, V2_VERSION_STRING);
        assert_eq!(post.count, pre.count);
        assert_eq!(post.multiplied_count, Some(pre.count * U256::from(DEFAULT_MULTIPLIER)));
    }

    let record = &report.record;
    assert_eq!(record.proxies.len(), 2);
    assert_eq!(record.proxy_admin, None);
    let beacon = record.beacon.expect("beacon record carries its beacon");
    assert_eq!(fixture.ledger.code_at(beacon), Some(MockContract::Beacon));
    assert_eq!(owner_of(&fixture.ledger, beacon).await?, DEPLOYER);

    for proxy in &record.proxies {
        let resolved = fixture.resolved_implementation(*proxy, ProxyPattern::Beacon).await?;
        assert_eq!(resolved, record.implementations.v2);
    }
    assert_eq!(report.resolved.len(), 2);
    assert_eq!(report.guards.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_beacon_single_upgrade_transaction() -> Result<()> {
    let fixture = setup_run_test()?;
    let report = fixture.orchestrator(test_config(ProxyPattern::Beacon)).run().await?;
    let beacon = report.record.beacon.expect("beacon record carries its beacon");

    // One `upgradeTo` on the beacon moves every proxy, none is upgraded on its own
    let upgrades: Vec<_> = fixture
        .ledger
        .sent_transactions()
        .into_iter()
        .filter(|tx| tx.calldata.starts_with(&upgrade_selector(ProxyPattern::Beacon)))
        .collect();
    assert_eq!(upgrades.len(), 1);
    assert_eq!(upgrades[0].to, beacon);
    assert_eq!(Some(upgrades[0].receipt.tx_hash), report.upgrade_tx);

    let sent_to_proxies = fixture.ledger.sent_transactions().into_iter().filter(|tx| {
        report.record.proxies.contains(&tx.to)
            && tx.calldata.starts_with(&IUpgradeableBeacon::upgradeToCall::SELECTOR)
    });
    assert_eq!(sent_to_proxies.count(), 0);

    // The beacon's own getter agrees with its storage
    let inspector = StorageInspector::new(&fixture.ledger, Default::default());
    let stored = inspector.beacon_implementation(beacon).await?;
    assert_eq!(stored, report.record.implementations.v2);

    Ok(())
}

#[tokio::test]
async fn test_beacon_proxy_count() -> Result<()> {
    let fixture = setup_run_test()?;
    let mut config = test_config(ProxyPattern::Beacon);
    config.beacon_proxies = 3;

    let report = fixture.orchestrator(config).run().await?;

    assert_eq!(report.record.proxies.len(), 3);
    let counts: Vec<U256> = report.post_upgrade.iter().map(|s| s.count).collect();
    assert_eq!(counts, vec![U256::from(2), U256::from(1), U256::from(1)]);

    Ok(())
}

#[tokio::test]
async fn test_beacon_addresses_stable() -> Result<()> {
    let fixture = setup_run_test()?;
    let checkpoint = fixture.stop_before_upgrade(ProxyPattern::Beacon).await?;

    let config = test_config(ProxyPattern::Beacon);
    let report = fixture.orchestrator(config).resume(checkpoint.clone()).await?;

    assert_eq!(report.record.proxies, checkpoint.proxies);
    assert_eq!(report.record.beacon, checkpoint.beacon);
    for proxy in &checkpoint.proxies {
        let resolved = fixture.resolved_implementation(*proxy, ProxyPattern::Beacon).await?;
        assert_eq!(Some(resolved), checkpoint.implementation_v2);
    }

    Ok(())
}
