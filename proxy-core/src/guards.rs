//! Expected-failure probes: operations that a contract's guards must refuse.
//!
//! A refusal here is the successful outcome and is logged as a confirmation. Only a
//! guard that lets the operation through is an error.

use std::time::Duration;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use proxy_common::solidity::ILockableToken;
use tracing::{info, warn};

use crate::{
    errors::{GuardError, LedgerError},
    ledger::{read_call, send_call, with_timeout, Ledger},
};

/// The outcome of a lock probe
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockProbeReport {
    /// Why the transfer of the locked token was refused
    pub locked_reason: String,
    /// The owner of the token once it was unlocked and transferred
    pub new_owner: Address,
}

/// Send a transaction that must revert, returning the revert reason
pub async fn expect_revert(
    ledger: &impl Ledger,
    to: Address,
    calldata: Bytes,
    description: &str,
    timeout: Duration,
) -> Result<String, GuardError> {
    let reason = match with_timeout(timeout, ledger.send(to, calldata)).await {
        Ok(receipt) if receipt.success => {
            return Err(GuardError::NotEnforced(format!(
                "{description} confirmed in {}",
                receipt.tx_hash
            )))
        }
        Ok(receipt) => format!("transaction {} failed", receipt.tx_hash),
        Err(LedgerError::Reverted(reason)) => reason,
        Err(e) => return Err(e.into()),
    };

    info!("Confirmed refusal: {description} ({reason})");
    Ok(reason)
}

/// Lock `token_id`, check that transferring it to `recipient` is refused, then unlock
/// it and check that the identical transfer goes through.
///
/// The ledger's account must own the token.
pub async fn lock_probe(
    ledger: &impl Ledger,
    token: Address,
    token_id: U256,
    recipient: Address,
    timeout: Duration,
) -> Result<LockProbeReport, GuardError> {
    let owner_of = ILockableToken::ownerOfCall { tokenId: token_id };
    let owner = read_call(ledger, token, &owner_of).await?._0;
    if owner != ledger.sender() {
        return Err(GuardError::Unexpected(format!(
            "token {token_id} is owned by {owner:#x}, not {:#x}",
            ledger.sender()
        )));
    }

    let lock = ILockableToken::setTokenLockCall { tokenId: token_id, locked: true };
    send_call(ledger, token, &lock, timeout).await?;
    let is_locked = ILockableToken::isTokenLockedCall { tokenId: token_id };
    let locked = read_call(ledger, token, &is_locked).await?._0;
    if !locked {
        return Err(GuardError::NotEnforced(format!("token {token_id} did not lock")));
    }

    let transfer =
        ILockableToken::transferFromCall { from: owner, to: recipient, tokenId: token_id };
    let description = format!("transfer of locked token {token_id}");
    let refused =
        expect_revert(ledger, token, transfer.abi_encode().into(), &description, timeout).await;

    let unlock = ILockableToken::setTokenLockCall { tokenId: token_id, locked: false };
    let unlocked = send_call(ledger, token, &unlock, timeout).await;
    let locked_reason = restored(refused, unlocked, &format!("unlock token {token_id}"))?;
    send_call(ledger, token, &transfer, timeout).await.map_err(|e| {
        GuardError::Unexpected(format!("transfer of unlocked token {token_id}: {e}"))
    })?;

    let new_owner = read_call(ledger, token, &owner_of).await?._0;
    if new_owner != recipient {
        return Err(GuardError::Unexpected(format!(
            "token {token_id} is owned by {new_owner:#x} after the transfer"
        )));
    }

    info!("Token {token_id} moved to {recipient:#x} once unlocked");
    Ok(LockProbeReport { locked_reason, new_owner })
}

/// Pause `target`, check that `calldata` is refused, then unpause it
pub async fn pause_probe(
    ledger: &impl Ledger,
    target: Address,
    calldata: Bytes,
    timeout: Duration,
) -> Result<String, GuardError> {
    send_call(ledger, target, &ILockableToken::pauseCall {}, timeout).await?;
    if !read_call(ledger, target, &ILockableToken::pausedCall {}).await?._0 {
        return Err(GuardError::NotEnforced(format!("{target:#x} did not pause")));
    }

    let refused = expect_revert(ledger, target, calldata, "call while paused", timeout).await;

    let unpaused = send_call(ledger, target, &ILockableToken::unpauseCall {}, timeout).await;
    let reason = restored(refused, unpaused, &format!("unpause {target:#x}"))?;
    info!("{target:#x} unpaused");

    Ok(reason)
}

/// Combine the outcome of a refusal check with that of undoing its setup. A failed
/// check takes precedence, and a failed undo is then only logged.
fn restored<T>(
    refused: Result<String, GuardError>,
    undo: Result<T, LedgerError>,
    what: &str,
) -> Result<String, GuardError> {
    match (refused, undo) {
        (Ok(reason), Ok(_)) => Ok(reason),
        (Ok(_), Err(e)) => Err(e.into()),
        (Err(e), Ok(_)) => Err(e),
        (Err(e), Err(undo_err)) => {
            warn!("Could not {what} after a failed check: {undo_err}");
            Err(e)
        }
    }
}
