//! Implementations of the script commands

use proxy_common::{
    slots::StorageSlot,
    types::{ProxyHandle, ProxyPattern},
};
use proxy_core::{
    guards::{lock_probe, pause_probe},
    inspector::StorageInspector,
    ledger::Ledger,
    orchestrator::{verify_upgrade, Orchestrator, RunConfig},
    ownership::{transfer_and_verify, two_step_transfer},
    records::DeploymentStore,
};
use tracing::{info, warn};

use crate::{
    cli::{
        decode_mode, GuardProbe, GuardProbeArgs, RunArgs, ScriptConfig, SlotArgs,
        TransferOwnershipArgs, VerifyArgs,
    },
    errors::ScriptError,
};

/// Deploy, upgrade, and verify a proxied counter, or resume a run from its checkpoint
pub async fn run_upgrade(args: RunArgs, config: &ScriptConfig) -> Result<(), ScriptError> {
    let pattern = ProxyPattern::from(args.pattern);
    let ledger = config.ledger()?;
    let intruder = args.intruder_pkey.as_deref().map(|key| config.ledger_for(key)).transpose()?;

    let mut run_config = RunConfig::new(pattern);
    run_config.confirmation_timeout = config.timeout;
    run_config.beacon_proxies = args.beacon_proxies;
    run_config.admin_layout = args.admin_layout.into();
    run_config.decode_mode = decode_mode(args.strict_decoding);

    let store = DeploymentStore::new(&config.deployments_dir);
    let checkpoint = if args.resume { store.read_checkpoint(pattern)? } else { None };

    let mut orchestrator = Orchestrator::new(&ledger, store, run_config);
    if let Some(intruder) = intruder.as_ref() {
        orchestrator = orchestrator.with_intruder(intruder);
    }

    let report = match checkpoint {
        Some(checkpoint) => orchestrator.resume(checkpoint).await?,
        None => {
            if args.resume {
                let dir = config.deployments_dir.display();
                warn!("No {pattern} checkpoint in {dir}, starting over");
            }
            orchestrator.run().await?
        }
    };

    let record = serde_json::to_string_pretty(&report.record)
        .map_err(|e| ScriptError::Serde(e.to_string()))?;
    info!("{pattern} upgrade complete:\n{record}");

    Ok(())
}

/// Check that a deployed proxy resolves to the expected implementation
pub async fn verify(args: VerifyArgs, config: &ScriptConfig) -> Result<(), ScriptError> {
    let ledger = config.read_only_ledger()?;
    let mode = decode_mode(args.strict_decoding);
    let proxy = ProxyHandle { address: args.proxy, pattern: args.pattern.into() };

    let resolved = verify_upgrade(&ledger, &proxy, args.expected, mode)
        .await
        .map_err(|failure| ScriptError::Verification(failure.to_string()))?;
    info!("Proxy {:#x} resolves to {:#x}", resolved.proxy, resolved.implementation);

    let inspector = StorageInspector::new(&ledger, mode);
    match proxy.pattern {
        ProxyPattern::Beacon => {
            let beacon = inspector.beacon_of(proxy.address).await?;
            info!("Proxy {:#x} follows beacon {beacon:#x}", proxy.address);
        }
        ProxyPattern::Transparent => {
            let admin = inspector.admin_of(proxy.address).await?;
            info!("Proxy {:#x} is administered by {admin:#x}", proxy.address);
        }
        ProxyPattern::Uups => {}
    }

    Ok(())
}

/// Print the slot derived from a label
pub fn print_slot(args: SlotArgs) {
    let slot = StorageSlot::new(&args.label);
    info!("{} => {}", slot.label, slot.slot);
}

/// Transfer ownership of a contract, in one step or two
pub async fn transfer_ownership(
    args: TransferOwnershipArgs,
    config: &ScriptConfig,
) -> Result<(), ScriptError> {
    let ledger = config.ledger()?;

    if args.two_step {
        let key = args.new_owner_pkey.as_deref().ok_or_else(|| {
            ScriptError::InvalidArguments("--two-step requires --new-owner-pkey".to_string())
        })?;
        let new_owner = config.ledger_for(key)?;
        if let Some(expected) = args.new_owner {
            if expected != new_owner.sender() {
                return Err(ScriptError::InvalidArguments(format!(
                    "--new-owner {expected:#x} does not match the key of {:#x}",
                    new_owner.sender()
                )));
            }
        }

        two_step_transfer(&ledger, &new_owner, args.contract, config.timeout).await?;
    } else {
        let new_owner = args.new_owner.ok_or_else(|| {
            ScriptError::InvalidArguments("--new-owner is required".to_string())
        })?;

        transfer_and_verify(&ledger, args.contract, new_owner, config.timeout).await?;
    }

    Ok(())
}

/// Run a guard probe
pub async fn guard_probe(args: GuardProbeArgs, config: &ScriptConfig) -> Result<(), ScriptError> {
    let ledger = config.ledger()?;

    match args.probe {
        GuardProbe::Lock { token, token_id, recipient } => {
            let report = lock_probe(&ledger, token, token_id, recipient, config.timeout).await?;
            info!(
                "Locked transfer refused ({}), unlocked transfer moved token {token_id} to {:#x}",
                report.locked_reason, report.new_owner
            );
        }
        GuardProbe::Pause { target, calldata } => {
            let reason = pause_probe(&ledger, target, calldata, config.timeout).await?;
            info!("Call refused while paused ({reason})");
        }
    }

    Ok(())
}
