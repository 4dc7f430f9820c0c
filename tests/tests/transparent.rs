use alloy_primitives::U256;
use alloy_sol_types::SolCall;
use eyre::Result;
use proxy_common::{
    constants::{V1_VERSION_STRING, V2_VERSION_STRING},
    solidity::{ICounterV2, IProxyAdmin},
    types::{CounterVersion, ProxyPattern},
};
use proxy_core::{
    orchestrator::{stage::Stage, AdminLayout},
    ownership::owner_of,
};
use test_helpers::{
    mock_ledger::DEPLOYER,
    world::{MockContract, DEFAULT_MULTIPLIER},
};
use tests::orchestrator::utils::{setup_run_test, test_config};

#[tokio::test]
async fn test_transparent_upgrade() -> Result<()> {
    let fixture = setup_run_test()?;
    let config = test_config(ProxyPattern::Transparent);
    let report = fixture.guarded_orchestrator(config).run().await?;

    let [pre] = report.pre_upgrade.as_slice() else { panic!("expected one pre-upgrade snapshot") };
    let [post] = report.post_upgrade.as_slice() else {
        panic!("expected one post-upgrade snapshot")
    };

    // State survives the swap, and only the new implementation answers the V2 surface
    assert_eq!(pre.version, V1_VERSION_STRING);
    assert_eq!(pre.count, U256::from(3));
    assert_eq!(post.version, V2_VERSION_STRING);
    assert_eq!(post.count, U256::from(3));
    assert_eq!(post.multiplier, Some(U256::from(DEFAULT_MULTIPLIER)));
    assert_eq!(post.multiplied_count, Some(U256::from(3 * DEFAULT_MULTIPLIER)));
    assert_eq!(post.user_count, Some(U256::from(1)));

    let record = &report.record;
    assert_eq!(record.pattern, ProxyPattern::Transparent);
    assert_eq!(record.proxies, vec![pre.proxy]);
    assert_eq!(record.beacon, None);
    let resolved = fixture.resolved_implementation(pre.proxy, ProxyPattern::Transparent).await?;
    assert_eq!(resolved, record.implementations.v2);
    assert_eq!(report.resolved[0].implementation, record.implementations.v2);

    let [v1, v2] = report.implementations.as_slice() else {
        panic!("expected two implementation descriptors")
    };
    assert_eq!(v1.version, CounterVersion::V1);
    assert!(!v1.supports(ICounterV2::multiplyCall::SELECTOR));
    assert_eq!(v2.address, record.implementations.v2);
    assert!(v2.supports(ICounterV2::multiplyCall::SELECTOR));

    Ok(())
}

#[tokio::test]
async fn test_transparent_admin() -> Result<()> {
    let fixture = setup_run_test()?;
    let config = test_config(ProxyPattern::Transparent);
    let report = fixture.guarded_orchestrator(config).run().await?;

    let admin = report.record.proxy_admin.expect("transparent record carries its admin");
    assert_eq!(fixture.ledger.code_at(admin), Some(MockContract::ProxyAdmin));
    assert_eq!(owner_of(&fixture.ledger, admin).await?, DEPLOYER);

    // The intruder's upgrade and the owner's direct call on the proxy were both refused
    assert_eq!(report.guards.len(), 2);

    // The one upgrade went through the admin
    let upgrade_tx = report.upgrade_tx.expect("upgrade transaction recorded");
    let sent = fixture.ledger.sent_transactions();
    let upgrade = sent.iter().find(|tx| tx.receipt.tx_hash == upgrade_tx).expect("upgrade sent");
    assert_eq!(upgrade.to, admin);
    assert_eq!(upgrade.from, DEPLOYER);
    assert!(upgrade.calldata.starts_with(&IProxyAdmin::upgradeAndCallCall::SELECTOR));

    Ok(())
}

#[tokio::test]
async fn test_transparent_proxy_owned_admin() -> Result<()> {
    let fixture = setup_run_test()?;
    let mut config = test_config(ProxyPattern::Transparent);
    config.admin_layout = AdminLayout::ProxyOwned;

    let report = fixture.guarded_orchestrator(config).run().await?;

    // The proxy deploys its admin as its first creation
    let proxy = report.record.proxies[0];
    let admin = report.record.proxy_admin.expect("transparent record carries its admin");
    assert_eq!(admin, proxy.create(1));
    assert_eq!(owner_of(&fixture.ledger, admin).await?, DEPLOYER);
    assert_eq!(
        fixture.resolved_implementation(proxy, ProxyPattern::Transparent).await?,
        report.record.implementations.v2
    );

    Ok(())
}

#[tokio::test]
async fn test_transparent_addresses_stable() -> Result<()> {
    let fixture = setup_run_test()?;
    let checkpoint = fixture.stop_before_upgrade(ProxyPattern::Transparent).await?;
    let proxy = checkpoint.proxies[0];
    assert_eq!(
        fixture.resolved_implementation(proxy, ProxyPattern::Transparent).await?,
        checkpoint.implementation_v1.expect("V1 deployed")
    );

    let config = test_config(ProxyPattern::Transparent);
    let report = fixture.orchestrator(config).resume(checkpoint.clone()).await?;

    assert_eq!(report.record.proxies, checkpoint.proxies);
    assert_eq!(report.record.proxy_admin, checkpoint.proxy_admin);
    assert_eq!(Some(report.record.implementations.v1), checkpoint.implementation_v1);
    assert_eq!(Some(report.record.implementations.v2), checkpoint.implementation_v2);

    // Only the stages after the checkpoint ran
    assert!(report.pre_upgrade.is_empty());
    assert_eq!(report.post_upgrade[0].count, U256::from(3));
    assert_eq!(fixture.checkpoint(ProxyPattern::Transparent)?.completed, Some(Stage::Done));

    Ok(())
}
