use alloy_primitives::{Address, Bytes};
use eyre::Result;
use proxy_common::{
    constants::{BEACON_ARTIFACT, COUNTER_BEACON_V1, PROXY_ADMIN_ARTIFACT},
    solidity::{beacon_constructor_args, proxy_admin_constructor_args},
};
use proxy_core::{
    errors::{LedgerError, OwnershipError},
    ledger::deploy_contract,
    ownership::{
        accept_ownership, owner_of, pending_owner_of, transfer_and_verify, transfer_ownership,
        two_step_transfer,
    },
};
use test_helpers::mock_ledger::{MockLedger, DEPLOYER, INTRUDER, RECIPIENT};
use tests::utils::{deploy_lockable_token, global_setup, TEST_TIMEOUT};

/// Deploy a `ProxyAdmin` owned by the deployer
async fn deploy_admin(ledger: &MockLedger) -> Result<Address> {
    let args = proxy_admin_constructor_args(DEPLOYER);
    Ok(deploy_contract(ledger, PROXY_ADMIN_ARTIFACT, args, TEST_TIMEOUT).await?)
}

#[tokio::test]
async fn test_single_step_transfer() -> Result<()> {
    global_setup();
    let ledger = MockLedger::new();
    let admin = deploy_admin(&ledger).await?;

    transfer_and_verify(&ledger, admin, RECIPIENT, TEST_TIMEOUT).await?;
    assert_eq!(owner_of(&ledger, admin).await?, RECIPIENT);

    // The previous owner has lost the right to transfer it again
    let err = transfer_ownership(&ledger, admin, DEPLOYER, TEST_TIMEOUT).await;
    assert!(matches!(err, Err(LedgerError::Reverted(_))));

    Ok(())
}

#[tokio::test]
async fn test_beacon_transfer() -> Result<()> {
    global_setup();
    let ledger = MockLedger::new();
    let implementation =
        deploy_contract(&ledger, COUNTER_BEACON_V1, Bytes::new(), TEST_TIMEOUT).await?;
    let args = beacon_constructor_args(implementation, DEPLOYER);
    let beacon = deploy_contract(&ledger, BEACON_ARTIFACT, args, TEST_TIMEOUT).await?;

    transfer_and_verify(&ledger, beacon, RECIPIENT, TEST_TIMEOUT).await?;
    assert_eq!(owner_of(&ledger, beacon).await?, RECIPIENT);

    Ok(())
}

#[tokio::test]
async fn test_unauthorized_transfer() -> Result<()> {
    global_setup();
    let ledger = MockLedger::new();
    let admin = deploy_admin(&ledger).await?;

    let intruder = ledger.as_account(INTRUDER);
    let err = transfer_and_verify(&intruder, admin, INTRUDER, TEST_TIMEOUT).await;

    assert!(matches!(err, Err(OwnershipError::Ledger(LedgerError::Reverted(_)))));
    assert_eq!(owner_of(&ledger, admin).await?, DEPLOYER);
    Ok(())
}

#[tokio::test]
async fn test_two_step_transfer() -> Result<()> {
    global_setup();
    let ledger = MockLedger::new();
    let token = deploy_lockable_token(&ledger).await?;
    let new_owner = ledger.as_account(RECIPIENT);

    two_step_transfer(&ledger, &new_owner, token, TEST_TIMEOUT).await?;

    assert_eq!(owner_of(&ledger, token).await?, RECIPIENT);
    assert_eq!(pending_owner_of(&ledger, token).await?, Address::ZERO);
    Ok(())
}

#[tokio::test]
async fn test_two_step_wrong_acceptor() -> Result<()> {
    global_setup();
    let ledger = MockLedger::new();
    let token = deploy_lockable_token(&ledger).await?;

    transfer_ownership(&ledger, token, RECIPIENT, TEST_TIMEOUT).await?;
    assert_eq!(pending_owner_of(&ledger, token).await?, RECIPIENT);
    // Ownership has not moved yet
    assert_eq!(owner_of(&ledger, token).await?, DEPLOYER);

    let intruder = ledger.as_account(INTRUDER);
    let err = accept_ownership(&intruder, token, TEST_TIMEOUT).await;
    assert!(matches!(err, Err(LedgerError::Reverted(_))));
    assert_eq!(owner_of(&ledger, token).await?, DEPLOYER);

    Ok(())
}
