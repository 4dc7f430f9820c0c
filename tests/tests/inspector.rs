use alloy_primitives::{Address, B256};
use eyre::Result;
use proxy_common::{
    constants::BEACON_IMPLEMENTATION_SLOT,
    slots::StorageSlot,
    storage::{address_to_word, DecodeMode},
    types::{ProxyHandle, ProxyPattern},
};
use proxy_core::{
    errors::{FailureClass, LedgerError, RunFailure},
    inspector::StorageInspector,
    orchestrator::verify_upgrade,
};
use tests::orchestrator::utils::{setup_run_test, test_config};

/// `address` with a non-zero byte written into the padding above it
fn dirty_word(address: Address) -> B256 {
    let mut word = address_to_word(address);
    word.0[0] = 0xff;
    word
}

#[tokio::test]
async fn test_strict_decoding_rejects_dirty_padding() -> Result<()> {
    let fixture = setup_run_test()?;
    let report = fixture.orchestrator(test_config(ProxyPattern::Uups)).run().await?;
    let proxy = ProxyHandle { address: report.record.proxies[0], pattern: ProxyPattern::Uups };
    let v2 = report.record.implementations.v2;

    let slot = StorageSlot::implementation().slot;
    fixture.ledger.set_storage(proxy.address, slot, dirty_word(v2));

    let lenient = StorageInspector::new(&fixture.ledger, DecodeMode::Lenient);
    assert_eq!(lenient.implementation_of(&proxy).await?, v2);

    let strict = StorageInspector::new(&fixture.ledger, DecodeMode::Strict);
    let err = strict.implementation_of(&proxy).await;
    assert!(matches!(err, Err(LedgerError::MalformedWord(_))));

    // A word that does not decode leaves the proxy unverified
    let err = verify_upgrade(&fixture.ledger, &proxy, v2, DecodeMode::Strict).await.unwrap_err();
    assert_eq!(err.class(), FailureClass::Unverified);
    assert!(matches!(err, RunFailure::Undecodable { proxy: p, .. } if p == proxy.address));
    let resolved = verify_upgrade(&fixture.ledger, &proxy, v2, DecodeMode::Lenient).await?;
    assert_eq!(resolved.implementation, v2);

    Ok(())
}

#[tokio::test]
async fn test_beacon_implementation_slot() -> Result<()> {
    let fixture = setup_run_test()?;
    let report = fixture.orchestrator(test_config(ProxyPattern::Beacon)).run().await?;
    let beacon = report.record.beacon.expect("beacon record carries its beacon");
    let inspector = StorageInspector::new(&fixture.ledger, DecodeMode::Strict);

    // The beacon keeps its implementation in its own sequential layout, not an
    // EIP-1967 slot
    let slot = StorageSlot::sequential(BEACON_IMPLEMENTATION_SLOT);
    let stored = inspector.read_slot_as_address(beacon, &slot).await?;
    assert_eq!(stored, report.record.implementations.v2);
    assert_eq!(inspector.read_slot(beacon, &StorageSlot::implementation()).await?, B256::ZERO);

    for proxy in &report.record.proxies {
        assert_eq!(inspector.beacon_of(*proxy).await?, beacon);
    }

    Ok(())
}

#[tokio::test]
async fn test_unverified_after_tampering() -> Result<()> {
    let fixture = setup_run_test()?;
    let pattern = ProxyPattern::Transparent;
    let checkpoint = fixture.stop_before_upgrade(pattern).await?;
    let proxy = checkpoint.proxies[0];

    // Point the proxy at some other contract behind the orchestrator's back
    let v1 = checkpoint.implementation_v1.expect("V1 deployed");
    let v2 = checkpoint.implementation_v2.expect("V2 deployed");
    fixture.ledger.set_storage(proxy, StorageSlot::implementation().slot, address_to_word(v2));

    let handle = ProxyHandle { address: proxy, pattern };
    let err = verify_upgrade(&fixture.ledger, &handle, v1, DecodeMode::Strict).await.unwrap_err();
    assert_eq!(err.class(), FailureClass::Unverified);

    Ok(())
}
