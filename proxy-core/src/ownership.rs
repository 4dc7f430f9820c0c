//! Ownership transfers of `Ownable` and `Ownable2Step` contracts

use std::time::Duration;

use alloy_primitives::Address;
use proxy_common::solidity::{IOwnable, IOwnable2Step};
use tracing::info;

use crate::{
    errors::{LedgerError, OwnershipError},
    ledger::{read_call, send_call, Ledger, TxReceipt},
};

/// The current owner of `contract`
pub async fn owner_of(ledger: &impl Ledger, contract: Address) -> Result<Address, LedgerError> {
    Ok(read_call(ledger, contract, &IOwnable::ownerCall {}).await?._0)
}

/// The account a two-step transfer of `contract` is waiting on
pub async fn pending_owner_of(
    ledger: &impl Ledger,
    contract: Address,
) -> Result<Address, LedgerError> {
    Ok(read_call(ledger, contract, &IOwnable2Step::pendingOwnerCall {}).await?._0)
}

/// Call `transferOwnership(new_owner)` on `contract`
pub async fn transfer_ownership(
    ledger: &impl Ledger,
    contract: Address,
    new_owner: Address,
    timeout: Duration,
) -> Result<TxReceipt, LedgerError> {
    info!("Transferring ownership of {contract:#x} to {new_owner:#x}");
    let call = IOwnable::transferOwnershipCall { newOwner: new_owner };
    send_call(ledger, contract, &call, timeout).await
}

/// Call `acceptOwnership()` on `contract` as the pending owner
pub async fn accept_ownership(
    ledger: &impl Ledger,
    contract: Address,
    timeout: Duration,
) -> Result<TxReceipt, LedgerError> {
    info!("{:#x} accepting ownership of {contract:#x}", ledger.sender());
    send_call(ledger, contract, &IOwnable2Step::acceptOwnershipCall {}, timeout).await
}

/// Transfer ownership of an `Ownable` contract and check it took effect
pub async fn transfer_and_verify(
    owner: &impl Ledger,
    contract: Address,
    new_owner: Address,
    timeout: Duration,
) -> Result<(), OwnershipError> {
    transfer_ownership(owner, contract, new_owner, timeout).await?;
    expect_owner(owner, contract, new_owner).await
}

/// Run both steps of an `Ownable2Step` transfer, from the current owner's ledger and
/// then from the new owner's, checking the contract's view after each step
pub async fn two_step_transfer(
    owner: &impl Ledger,
    new_owner: &impl Ledger,
    contract: Address,
    timeout: Duration,
) -> Result<(), OwnershipError> {
    let previous = owner.sender();
    let next = new_owner.sender();

    transfer_ownership(owner, contract, next, timeout).await?;
    let pending = pending_owner_of(owner, contract).await?;
    if pending != next {
        return Err(OwnershipError::NotPending(pending));
    }
    // Ownership only moves once accepted
    expect_owner(owner, contract, previous).await?;

    accept_ownership(new_owner, contract, timeout).await?;
    expect_owner(new_owner, contract, next).await
}

/// Check `owner()` of `contract` reports `expected`
async fn expect_owner(
    ledger: &impl Ledger,
    contract: Address,
    expected: Address,
) -> Result<(), OwnershipError> {
    let actual = owner_of(ledger, contract).await?;
    if actual != expected {
        return Err(OwnershipError::NotTransferred { expected, actual });
    }

    info!("{contract:#x} is owned by {actual:#x}");
    Ok(())
}
