use alloy_primitives::U256;
use alloy_sol_types::SolCall;
use eyre::Result;
use proxy_common::{
    constants::{V1_VERSION_STRING, V2_VERSION_STRING},
    solidity::IUUPSUpgradeable,
    types::ProxyPattern,
};
use test_helpers::{mock_ledger::DEPLOYER, world::DEFAULT_MULTIPLIER};
use tests::orchestrator::utils::{setup_run_test, test_config};

#[tokio::test]
async fn test_uups_upgrade() -> Result<()> {
    let fixture = setup_run_test()?;
    let config = test_config(ProxyPattern::Uups);
    let report = fixture.guarded_orchestrator(config).run().await?;

    let (pre, post) = (&report.pre_upgrade[0], &report.post_upgrade[0]);
    assert_eq!(pre.version, V1_VERSION_STRING);
    assert_eq!(pre.count, U256::from(1));
    assert_eq!(post.version, V2_VERSION_STRING);
    assert_eq!(post.count, U256::from(1));
    assert_eq!(post.multiplied_count, Some(U256::from(DEFAULT_MULTIPLIER)));

    let record = &report.record;
    assert_eq!(record.proxy_admin, None);
    assert_eq!(record.beacon, None);
    assert_eq!(
        fixture.resolved_implementation(record.proxies[0], ProxyPattern::Uups).await?,
        record.implementations.v2
    );
    assert_eq!(report.guards.len(), 1);

    // The upgrade is sent to the proxy itself
    let upgrade_tx = report.upgrade_tx.expect("upgrade transaction recorded");
    let sent = fixture.ledger.sent_transactions();
    let upgrade = sent.iter().find(|tx| tx.receipt.tx_hash == upgrade_tx).expect("upgrade sent");
    assert_eq!(upgrade.to, record.proxies[0]);
    assert_eq!(upgrade.from, DEPLOYER);
    assert!(upgrade.calldata.starts_with(&IUUPSUpgradeable::upgradeToAndCallCall::SELECTOR));

    Ok(())
}

#[tokio::test]
async fn test_uups_addresses_stable() -> Result<()> {
    let fixture = setup_run_test()?;
    let checkpoint = fixture.stop_before_upgrade(ProxyPattern::Uups).await?;
    let proxy = checkpoint.proxies[0];

    let config = test_config(ProxyPattern::Uups);
    let report = fixture.orchestrator(config).resume(checkpoint.clone()).await?;

    assert_eq!(report.record.proxies, vec![proxy]);
    assert_eq!(Some(report.record.implementations.v2), checkpoint.implementation_v2);
    assert_eq!(
        Some(fixture.resolved_implementation(proxy, ProxyPattern::Uups).await?),
        checkpoint.implementation_v2
    );

    Ok(())
}
