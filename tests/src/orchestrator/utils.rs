use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolCall;
use eyre::{eyre, Result};
use proxy_common::{
    solidity::{ICounterV2, IProxyAdmin, IUUPSUpgradeable, IUpgradeableBeacon},
    storage::DecodeMode,
    types::{BeaconHandle, ProxyAdminHandle, ProxyHandle, ProxyPattern},
};
use proxy_core::{
    authority::UpgradeTarget,
    errors::FailureClass,
    inspector::StorageInspector,
    orchestrator::{stage::Stage, Orchestrator, RunConfig},
    records::{DeploymentStore, RunCheckpoint},
};
use tempfile::TempDir;
use test_helpers::mock_ledger::{MockLedger, INTRUDER};
use tracing::debug;

use crate::utils::{global_setup, TEST_TIMEOUT};

// ---------------------
// | META TEST HELPERS |
// ---------------------

/// A mock chain, an unauthorized account on it, and a scratch deployments directory
pub struct RunFixture {
    /// The deployer's ledger
    pub ledger: MockLedger,
    /// A ledger sending from an account with no authority over the deployment
    pub intruder: MockLedger,
    /// The store records and checkpoints are written to
    pub store: DeploymentStore,
    /// Keeps the deployments directory alive for the duration of the test
    _dir: TempDir,
}

pub fn setup_run_test() -> Result<RunFixture> {
    global_setup();

    let dir = tempfile::tempdir()?;
    debug!("Writing deployments to {}", dir.path().display());

    let ledger = MockLedger::new();
    let intruder = ledger.as_account(INTRUDER);
    let store = DeploymentStore::new(dir.path());

    Ok(RunFixture { ledger, intruder, store, _dir: dir })
}

impl RunFixture {
    /// An orchestrator deploying from the deployer's account
    pub fn orchestrator(&self, config: RunConfig) -> Orchestrator<'_, MockLedger> {
        Orchestrator::new(&self.ledger, self.store.clone(), config)
    }

    /// An orchestrator that also attempts the upgrade from the intruder's account
    pub fn guarded_orchestrator(&self, config: RunConfig) -> Orchestrator<'_, MockLedger> {
        self.orchestrator(config).with_intruder(&self.intruder)
    }

    /// The last checkpoint written for `pattern`
    pub fn checkpoint(&self, pattern: ProxyPattern) -> Result<RunCheckpoint> {
        self.store
            .read_checkpoint(pattern)?
            .ok_or_else(|| eyre!("no checkpoint written for {pattern}"))
    }

    /// Run `pattern` until its upgrade transaction stalls, leaving a checkpoint
    /// covering every stage before the upgrade
    pub async fn stop_before_upgrade(&self, pattern: ProxyPattern) -> Result<RunCheckpoint> {
        self.ledger.hang_on(upgrade_selector(pattern));
        let err = self
            .orchestrator(test_config(pattern))
            .run()
            .await
            .err()
            .ok_or_else(|| eyre!("run completed despite a stalled upgrade"))?;
        self.ledger.clear_faults();

        assert_eq!(err.stage, Stage::Upgrade);
        assert_eq!(err.class(), FailureClass::UpgradeTimeout);

        let checkpoint = self.checkpoint(pattern)?;
        assert_eq!(checkpoint.completed, Some(Stage::ProbePreUpgrade));
        Ok(checkpoint)
    }

    /// The implementation `proxy` resolves to, read from storage
    pub async fn resolved_implementation(
        &self,
        proxy: Address,
        pattern: ProxyPattern,
    ) -> Result<Address> {
        let inspector = StorageInspector::new(&self.ledger, DecodeMode::Strict);
        Ok(inspector.implementation_of(&ProxyHandle { address: proxy, pattern }).await?)
    }
}

/// The default run configuration with a short confirmation timeout
pub fn test_config(pattern: ProxyPattern) -> RunConfig {
    let mut config = RunConfig::new(pattern);
    config.confirmation_timeout = TEST_TIMEOUT;
    config
}

/// The selector of the transaction that performs the upgrade of a pattern
pub fn upgrade_selector(pattern: ProxyPattern) -> [u8; 4] {
    match pattern {
        ProxyPattern::Beacon => IUpgradeableBeacon::upgradeToCall::SELECTOR,
        ProxyPattern::Transparent => IProxyAdmin::upgradeAndCallCall::SELECTOR,
        ProxyPattern::Uups => IUUPSUpgradeable::upgradeToAndCallCall::SELECTOR,
    }
}

/// The upgrade target recorded in a checkpoint
pub fn target_of(checkpoint: &RunCheckpoint, owner: Address) -> UpgradeTarget {
    let proxy = ProxyHandle { address: checkpoint.proxies[0], pattern: checkpoint.pattern };
    match checkpoint.pattern {
        ProxyPattern::Beacon => UpgradeTarget::Beacon(BeaconHandle {
            address: checkpoint.beacon.expect("beacon deployed"),
            owner,
        }),
        ProxyPattern::Transparent => UpgradeTarget::Transparent {
            proxy,
            admin: ProxyAdminHandle {
                address: checkpoint.proxy_admin.expect("admin deployed"),
                owner,
            },
        },
        ProxyPattern::Uups => UpgradeTarget::Uups(proxy),
    }
}

/// The reinitializer of the version 2 counter
pub fn reinit() -> Option<Bytes> {
    Some(ICounterV2::reinitializeCall {}.abi_encode().into())
}
