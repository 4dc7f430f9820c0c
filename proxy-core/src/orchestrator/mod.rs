//! The upgrade run state machine.
//!
//! A run walks the stages in [`Stage`] order, each stage consuming the addresses the
//! previous ones produced. The ledger has no rollback across transactions, so a
//! checkpoint is written after every completed stage: an aborted run leaves behind
//! exactly what it deployed, and [`Orchestrator::resume`] picks it up from there.

pub mod probes;
pub mod stage;

use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::SolCall;
use chrono::Utc;
use proxy_common::{
    constants::{
        BEACON_ARTIFACT, BEACON_PROXY_ARTIFACT, ERC1967_PROXY_ARTIFACT, PROXY_ADMIN_ARTIFACT,
        TRANSPARENT_PROXY_ARTIFACT,
    },
    solidity::{
        beacon_constructor_args, beacon_proxy_constructor_args, erc1967_proxy_constructor_args,
        proxy_admin_constructor_args, transparent_proxy_constructor_args, ICounterV1,
        ICounterV2, IOwnedInitializer, ITransparentUpgradeableProxy,
    },
    storage::DecodeMode,
    types::{
        BeaconHandle, CounterVersion, ImplementationDescriptor, ProxyAdminHandle, ProxyHandle,
        ProxyPattern,
    },
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::{
    authority::UpgradeTarget,
    errors::{LedgerError, RecordError, RunError, RunFailure, UpgradeError},
    inspector::StorageInspector,
    ledger::{deploy_contract, send_call, Ledger, DEFAULT_CONFIRMATION_TIMEOUT},
    records::{
        DeploymentStore, ImplementationAddresses, NetworkIdentity, RunCheckpoint, UpgradeRecord,
    },
};

use self::{
    probes::{
        compare_snapshots, default_exercise_plan, exercise, probe_v2, snapshot_v1, ProxySnapshot,
    },
    stage::Stage,
};

/// The number of proxies deployed behind a beacon by default
pub const DEFAULT_BEACON_PROXIES: usize = 2;

// -----------------
// | Configuration |
// -----------------

/// Where the `ProxyAdmin` of a transparent proxy comes from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminLayout {
    /// A `ProxyAdmin` is deployed first and handed to the proxy constructor as its admin
    #[default]
    External,
    /// The proxy constructor takes an owner and deploys its own `ProxyAdmin`
    ProxyOwned,
}

/// The settings of an upgrade run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    /// The proxy pattern to deploy and upgrade
    pub pattern: ProxyPattern,
    /// How long to wait for any single transaction to confirm
    pub confirmation_timeout: Duration,
    /// How many proxies to deploy behind the beacon of a Beacon run
    pub beacon_proxies: usize,
    /// Where the `ProxyAdmin` of a Transparent run comes from
    pub admin_layout: AdminLayout,
    /// How address words read from storage are decoded
    pub decode_mode: DecodeMode,
}

impl RunConfig {
    /// The default configuration for a run of the given pattern
    pub fn new(pattern: ProxyPattern) -> Self {
        Self {
            pattern,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            beacon_proxies: DEFAULT_BEACON_PROXIES,
            admin_layout: AdminLayout::default(),
            decode_mode: DecodeMode::default(),
        }
    }

    /// The number of proxies the run deploys
    pub fn num_proxies(&self) -> usize {
        match self.pattern {
            ProxyPattern::Beacon => self.beacon_proxies,
            ProxyPattern::Transparent | ProxyPattern::Uups => 1,
        }
    }
}

// -----------
// | Reports |
// -----------

/// The implementation a proxy resolved to when verified
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedImplementation {
    /// The proxy inspected
    pub proxy: Address,
    /// The implementation its storage points at
    pub implementation: Address,
}

/// An operation that was expected to be refused, and was
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardOutcome {
    /// What was attempted
    pub description: String,
    /// Why it was refused
    pub reason: String,
}

/// A diagnostic probe that could not run through a proxy
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedProbe {
    /// The proxy probed
    pub proxy: Address,
    /// Why the probe failed
    pub reason: String,
}

/// The outcome of a completed run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// The record written for the run
    pub record: UpgradeRecord,
    /// The two implementations the run moved between
    pub implementations: Vec<ImplementationDescriptor>,
    /// What the proxies reported before the upgrade
    pub pre_upgrade: Vec<ProxySnapshot>,
    /// What the proxies reported after the upgrade
    pub post_upgrade: Vec<ProxySnapshot>,
    /// Proxies whose version 2 surface could not be exercised
    pub failed_probes: Vec<FailedProbe>,
    /// What the proxies' storage resolved to in the Verify stage
    pub resolved: Vec<ResolvedImplementation>,
    /// The hash of the upgrade transaction
    pub upgrade_tx: Option<B256>,
    /// The refusals confirmed during the Upgrade stage
    pub guards: Vec<GuardOutcome>,
}

/// The in-flight state of a run
#[derive(Debug)]
struct Run {
    /// The addresses produced so far, persisted after every stage
    checkpoint: RunCheckpoint,
    /// Snapshots taken before the upgrade
    pre_upgrade: Vec<ProxySnapshot>,
    /// Snapshots taken after the upgrade
    post_upgrade: Vec<ProxySnapshot>,
    /// Post-upgrade probes that could not run
    failed_probes: Vec<FailedProbe>,
    /// Verified resolutions
    resolved: Vec<ResolvedImplementation>,
    /// Confirmed refusals
    guards: Vec<GuardOutcome>,
    /// The record, once persisted
    record: Option<UpgradeRecord>,
}

// ----------------
// | Orchestrator |
// ----------------

/// Drives upgrade runs against a ledger
pub struct Orchestrator<'a, L> {
    /// The ledger of the deployer, which owns everything the run deploys
    ledger: &'a L,
    /// A ledger handle for an account with no authority, used to confirm that
    /// unauthorized upgrades are refused
    intruder: Option<&'a L>,
    /// Where records and checkpoints are written
    store: DeploymentStore,
    /// The run settings
    config: RunConfig,
}

impl<'a, L: Ledger> Orchestrator<'a, L> {
    /// Create an orchestrator deploying from `ledger`'s account
    pub fn new(ledger: &'a L, store: DeploymentStore, config: RunConfig) -> Self {
        Self { ledger, intruder: None, store, config }
    }

    /// Attempt the upgrade from `intruder`'s account before the real one, requiring
    /// it to be refused
    pub fn with_intruder(mut self, intruder: &'a L) -> Self {
        self.intruder = Some(intruder);
        self
    }

    /// The run settings
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run every stage from the start
    pub async fn run(&self) -> Result<RunReport, RunError> {
        self.resume(RunCheckpoint::new(self.config.pattern)).await
    }

    /// Continue a run from the stage after the last one `checkpoint` records as
    /// completed, reusing the addresses it holds
    pub async fn resume(&self, checkpoint: RunCheckpoint) -> Result<RunReport, RunError> {
        let first = checkpoint.completed.map_or(Some(Stage::DeployImpl1), Stage::next);
        if checkpoint.pattern != self.config.pattern {
            return Err(RunError {
                stage: first.unwrap_or(Stage::Done),
                failure: RunFailure::Persistence(RecordError::Read(format!(
                    "checkpoint belongs to a {} run, not {}",
                    checkpoint.pattern, self.config.pattern
                ))),
            });
        }

        if let Some(completed) = checkpoint.completed {
            info!("Resuming {} run after stage {completed}", self.config.pattern);
        }

        let mut run = Run {
            checkpoint,
            pre_upgrade: Vec::new(),
            post_upgrade: Vec::new(),
            failed_probes: Vec::new(),
            resolved: Vec::new(),
            guards: Vec::new(),
            record: None,
        };

        let mut next = first;
        while let Some(stage) = next {
            info!("Stage {stage}");
            if let Err(failure) = self.execute(stage, &mut run).await {
                error!("Stage {stage} failed: {failure}");
                // Keep whatever the failed stage deployed before it aborted
                run.checkpoint.updated_at = Utc::now();
                if let Err(e) = self.store.write_checkpoint(&run.checkpoint) {
                    warn!("Could not write checkpoint after failure: {e}");
                }

                return Err(RunError { stage, failure });
            }

            run.checkpoint.completed = Some(stage);
            run.checkpoint.updated_at = Utc::now();
            self.store
                .write_checkpoint(&run.checkpoint)
                .map_err(|e| RunError { stage, failure: RunFailure::Persistence(e) })?;

            next = stage.next();
        }

        let record = match run.record {
            Some(record) => record,
            None => self.store.read_record(self.config.pattern.record_key()).map_err(|e| {
                RunError { stage: Stage::Done, failure: RunFailure::Persistence(e) }
            })?,
        };

        let pattern = self.config.pattern;
        let implementations = [
            (CounterVersion::V1, record.implementations.v1),
            (CounterVersion::V2, record.implementations.v2),
        ]
        .into_iter()
        .map(|(version, address)| {
            let artifact = pattern.counter_artifact(version);
            ImplementationDescriptor::new(artifact, address, pattern, version)
        })
        .collect();

        Ok(RunReport {
            record,
            implementations,
            pre_upgrade: run.pre_upgrade,
            post_upgrade: run.post_upgrade,
            failed_probes: run.failed_probes,
            resolved: run.resolved,
            upgrade_tx: run.checkpoint.upgrade_tx,
            guards: run.guards,
        })
    }

    /// Run a single stage
    async fn execute(&self, stage: Stage, run: &mut Run) -> Result<(), RunFailure> {
        match stage {
            Stage::DeployImpl1 => self.deploy_implementation(run, CounterVersion::V1).await,
            Stage::DeployImpl2 => self.deploy_implementation(run, CounterVersion::V2).await,
            Stage::DeployIndirection => self.deploy_indirection(run).await,
            Stage::Initialize => self.initialize(run).await,
            Stage::ProbePreUpgrade => self.probe_pre_upgrade(run).await,
            Stage::Upgrade => self.upgrade(run).await,
            Stage::ProbePostUpgrade => self.probe_post_upgrade(run).await,
            Stage::Verify => self.verify(run).await,
            Stage::Persist => self.persist(run).await,
            Stage::Done => {
                info!("{} upgrade run complete", self.config.pattern);
                Ok(())
            }
        }
    }

    // --------------
    // | Deployment |
    // --------------

    /// Deploy one version of the counter implementation
    async fn deploy_implementation(
        &self,
        run: &mut Run,
        version: CounterVersion,
    ) -> Result<(), RunFailure> {
        let artifact = self.config.pattern.counter_artifact(version);
        let address = self.deploy(artifact, Bytes::new()).await?;
        info!("{artifact} deployed at {address:#x}");

        match version {
            CounterVersion::V1 => run.checkpoint.implementation_v1 = Some(address),
            CounterVersion::V2 => run.checkpoint.implementation_v2 = Some(address),
        }

        Ok(())
    }

    /// Deploy the proxies, along with the beacon or `ProxyAdmin` of the pattern.
    ///
    /// Anything the checkpoint already holds from an earlier, aborted attempt at this
    /// stage is reused rather than deployed again.
    async fn deploy_indirection(&self, run: &mut Run) -> Result<(), RunFailure> {
        let v1 = required(run.checkpoint.implementation_v1, "V1 implementation")?;
        let owner = self.ledger.sender();

        match self.config.pattern {
            ProxyPattern::Beacon => {
                let beacon = match run.checkpoint.beacon {
                    Some(beacon) => beacon,
                    None => {
                        let args = beacon_constructor_args(v1, owner);
                        let beacon = self.deploy(BEACON_ARTIFACT, args).await?;
                        info!("UpgradeableBeacon deployed at {beacon:#x}");
                        run.checkpoint.beacon = Some(beacon);
                        beacon
                    }
                };

                while run.checkpoint.proxies.len() < self.config.beacon_proxies {
                    let args = beacon_proxy_constructor_args(beacon, Bytes::new());
                    let proxy = self.deploy(BEACON_PROXY_ARTIFACT, args).await?;
                    info!("BeaconProxy deployed at {proxy:#x}");
                    run.checkpoint.proxies.push(proxy);
                }
            }
            ProxyPattern::Transparent => {
                if run.checkpoint.proxies.is_empty() {
                    let admin_arg = match (self.config.admin_layout, run.checkpoint.proxy_admin) {
                        (AdminLayout::External, Some(admin)) => admin,
                        (AdminLayout::External, None) => {
                            let args = proxy_admin_constructor_args(owner);
                            let admin = self.deploy(PROXY_ADMIN_ARTIFACT, args).await?;
                            info!("ProxyAdmin deployed at {admin:#x}");
                            run.checkpoint.proxy_admin = Some(admin);
                            admin
                        }
                        (AdminLayout::ProxyOwned, _) => owner,
                    };

                    let init = ICounterV1::initializeCall {}.abi_encode();
                    let args = transparent_proxy_constructor_args(v1, admin_arg, init.into());
                    let proxy = self.deploy(TRANSPARENT_PROXY_ARTIFACT, args).await?;
                    info!("TransparentUpgradeableProxy deployed at {proxy:#x}");
                    run.checkpoint.proxies.push(proxy);
                }

                let proxy = self.first_proxy(&run.checkpoint)?.address;
                let admin = self
                    .inspector()
                    .admin_of(proxy)
                    .await
                    .map_err(|e| storage_failure(proxy, e))?;
                if let (AdminLayout::External, Some(expected)) =
                    (self.config.admin_layout, run.checkpoint.proxy_admin)
                {
                    if admin != expected {
                        return Err(RunFailure::Unverified { proxy, expected, actual: admin });
                    }
                }

                info!("Proxy {proxy:#x} is administered by {admin:#x}");
                run.checkpoint.proxy_admin = Some(admin);
            }
            ProxyPattern::Uups => {
                if run.checkpoint.proxies.is_empty() {
                    let init =
                        IOwnedInitializer::initializeCall { initialOwner: owner }.abi_encode();
                    let args = erc1967_proxy_constructor_args(v1, init.into());
                    let proxy = self.deploy(ERC1967_PROXY_ARTIFACT, args).await?;
                    info!("ERC1967Proxy deployed at {proxy:#x}");
                    run.checkpoint.proxies.push(proxy);
                }
            }
        }

        self.check_resolution(run, v1).await.map(|_| ())
    }

    /// Deploy an artifact, classifying any error as a deployment failure
    async fn deploy(&self, artifact: &str, args: Bytes) -> Result<Address, RunFailure> {
        deploy_contract(self.ledger, artifact, args, self.config.confirmation_timeout)
            .await
            .map_err(RunFailure::Deployment)
    }

    // ------------------
    // | Initialization |
    // ------------------

    /// Initialize beacon proxies, then check every proxy's initializer is consumed.
    ///
    /// A beacon proxy that already refuses `initialize()` was initialized by an earlier,
    /// aborted attempt at this stage and is not sent to again.
    async fn initialize(&self, run: &mut Run) -> Result<(), RunFailure> {
        let timeout = self.config.confirmation_timeout;
        let init = self.initializer_calldata();
        let sends_init = self.config.pattern == ProxyPattern::Beacon;

        for proxy in run.checkpoint.proxies.iter().copied() {
            let open = self.accepts_initialization(proxy, &init).await?;
            if !sends_init {
                if open {
                    return Err(second_initialization(proxy));
                }
                continue;
            }

            if !open {
                info!("Proxy {proxy:#x} is already initialized");
                continue;
            }

            send_call(self.ledger, proxy, &ICounterV1::initializeCall {}, timeout)
                .await
                .map_err(|e| RunFailure::Initialization(format!("{proxy:#x}: {e}")))?;
            info!("Initialized proxy {proxy:#x}");

            if self.accepts_initialization(proxy, &init).await? {
                return Err(second_initialization(proxy));
            }
        }

        Ok(())
    }

    /// Simulate `init` against `proxy`, returning whether it would go through
    async fn accepts_initialization(
        &self,
        proxy: Address,
        init: &Bytes,
    ) -> Result<bool, RunFailure> {
        match self.ledger.call(proxy, init.clone()).await {
            Ok(_) => Ok(true),
            Err(LedgerError::Reverted(reason)) => {
                debug!("Proxy {proxy:#x} refuses initialization: {reason}");
                Ok(false)
            }
            Err(e) => Err(RunFailure::Network(e)),
        }
    }

    /// The initializer calldata of the pattern's version 1 counter
    fn initializer_calldata(&self) -> Bytes {
        match self.config.pattern {
            ProxyPattern::Uups => {
                IOwnedInitializer::initializeCall { initialOwner: self.ledger.sender() }
                    .abi_encode()
                    .into()
            }
            ProxyPattern::Beacon | ProxyPattern::Transparent => {
                ICounterV1::initializeCall {}.abi_encode().into()
            }
        }
    }

    // ----------
    // | Probes |
    // ----------

    /// Exercise the version 1 counters and record what they report
    async fn probe_pre_upgrade(&self, run: &mut Run) -> Result<(), RunFailure> {
        let proxies = run.checkpoint.proxies.clone();
        let plan = default_exercise_plan(self.config.pattern, proxies.len());

        for (proxy, ops) in proxies.into_iter().zip(plan.iter()) {
            exercise(self.ledger, proxy, ops, self.config.confirmation_timeout)
                .await
                .map_err(RunFailure::Probe)?;

            let snapshot = snapshot_v1(self.ledger, proxy).await.map_err(RunFailure::Probe)?;
            run.pre_upgrade.push(snapshot);
        }

        Ok(())
    }

    /// Exercise the version 2 counters and record what they report.
    ///
    /// A proxy that does not answer as version 2 is only logged here, the Verify
    /// stage decides from storage whether the upgrade happened.
    async fn probe_post_upgrade(&self, run: &mut Run) -> Result<(), RunFailure> {
        for proxy in run.checkpoint.proxies.clone() {
            match probe_v2(self.ledger, proxy, self.config.confirmation_timeout).await {
                Ok(snapshot) => run.post_upgrade.push(snapshot),
                Err(e) => {
                    warn!("Proxy {proxy:#x} does not behave as version 2: {e}");
                    run.failed_probes.push(FailedProbe { proxy, reason: e.to_string() });
                }
            }
        }

        compare_snapshots(&run.pre_upgrade, &run.post_upgrade);
        Ok(())
    }

    // -----------
    // | Upgrade |
    // -----------

    /// Confirm unauthorized upgrade paths are refused, then upgrade to version 2
    async fn upgrade(&self, run: &mut Run) -> Result<(), RunFailure> {
        let v2 = required(run.checkpoint.implementation_v2, "V2 implementation")?;
        let target = self.upgrade_target(&run.checkpoint)?;
        let reinit = self.reinit_calldata();
        let timeout = self.config.confirmation_timeout;

        // An upgrade that timed out may still have been mined
        let proxy = self.first_proxy(&run.checkpoint)?;
        let current = self
            .inspector()
            .implementation_of(&proxy)
            .await
            .map_err(|e| storage_failure(proxy.address, e))?;
        if current == v2 {
            info!("Proxy {:#x} already resolves to {v2:#x}, not upgrading again", proxy.address);
            return Ok(());
        }

        if let Some(intruder) = self.intruder {
            self.probe_unauthorized_upgrade(run, intruder, &target, v2, reinit.clone()).await?;
        }

        if let UpgradeTarget::Transparent { proxy, .. } = target {
            self.probe_transparency(run, proxy.address, v2).await?;
        }

        let receipt =
            target.upgrade(self.ledger, v2, reinit, timeout).await.map_err(RunFailure::Upgrade)?;
        run.checkpoint.upgrade_tx = Some(receipt.tx_hash);

        Ok(())
    }

    /// Attempt the upgrade from an account with no authority; it must be rejected
    /// and leave the resolved implementation untouched
    async fn probe_unauthorized_upgrade(
        &self,
        run: &mut Run,
        intruder: &L,
        target: &UpgradeTarget,
        new_implementation: Address,
        reinit: Option<Bytes>,
    ) -> Result<(), RunFailure> {
        let proxy = self.first_proxy(&run.checkpoint)?;
        let inspector = self.inspector();
        let before = inspector
            .implementation_of(&proxy)
            .await
            .map_err(|e| storage_failure(proxy.address, e))?;

        let description = format!(
            "{} upgrade of {:#x} from unauthorized account {:#x}",
            target.pattern(),
            proxy.address,
            intruder.sender()
        );
        let timeout = self.config.confirmation_timeout;
        let reason = match target.upgrade(intruder, new_implementation, reinit, timeout).await {
            Ok(receipt) => {
                return Err(RunFailure::GuardBypassed(format!(
                    "{description} confirmed in {}",
                    receipt.tx_hash
                )))
            }
            Err(UpgradeError::Rejected(reason)) => reason,
            Err(e) => return Err(RunFailure::Upgrade(e)),
        };

        let after = inspector
            .implementation_of(&proxy)
            .await
            .map_err(|e| storage_failure(proxy.address, e))?;
        if after != before {
            return Err(RunFailure::GuardBypassed(format!(
                "{description} was rejected but the implementation moved from {before:#x} to \
                 {after:#x}"
            )));
        }

        info!("Confirmed refusal: {description} ({reason})");
        run.guards.push(GuardOutcome { description, reason });
        Ok(())
    }

    /// Simulate the proxy's own upgrade entry point called by the owner. The owner is
    /// not the proxy's admin, so the call falls through to the implementation and
    /// must revert.
    async fn probe_transparency(
        &self,
        run: &mut Run,
        proxy: Address,
        new_implementation: Address,
    ) -> Result<(), RunFailure> {
        let description = format!(
            "direct upgradeToAndCall on transparent proxy {proxy:#x} from {:#x}",
            self.ledger.sender()
        );
        let calldata = ITransparentUpgradeableProxy::upgradeToAndCallCall {
            newImplementation: new_implementation,
            data: Bytes::new(),
        }
        .abi_encode();

        match self.ledger.call(proxy, calldata.into()).await {
            Ok(_) => Err(RunFailure::GuardBypassed(format!("{description} succeeded"))),
            Err(LedgerError::Reverted(reason)) => {
                info!("Confirmed refusal: {description} ({reason})");
                run.guards.push(GuardOutcome { description, reason });
                Ok(())
            }
            Err(e) => Err(RunFailure::Network(e)),
        }
    }

    /// The handle the pattern upgrades through
    fn upgrade_target(&self, checkpoint: &RunCheckpoint) -> Result<UpgradeTarget, RunFailure> {
        let owner = self.ledger.sender();
        let proxy = self.first_proxy(checkpoint)?;

        Ok(match self.config.pattern {
            ProxyPattern::Beacon => {
                let address = required(checkpoint.beacon, "beacon")?;
                UpgradeTarget::Beacon(BeaconHandle { address, owner })
            }
            ProxyPattern::Transparent => {
                let address = required(checkpoint.proxy_admin, "ProxyAdmin")?;
                UpgradeTarget::Transparent { proxy, admin: ProxyAdminHandle { address, owner } }
            }
            ProxyPattern::Uups => UpgradeTarget::Uups(proxy),
        })
    }

    /// The reinitializer chained onto the upgrade. Beacons have no way to run one.
    fn reinit_calldata(&self) -> Option<Bytes> {
        match self.config.pattern {
            ProxyPattern::Beacon => None,
            ProxyPattern::Transparent | ProxyPattern::Uups => {
                Some(ICounterV2::reinitializeCall {}.abi_encode().into())
            }
        }
    }

    // ----------------
    // | Verification |
    // ----------------

    /// Check through storage that every proxy now resolves to version 2
    async fn verify(&self, run: &mut Run) -> Result<(), RunFailure> {
        let v2 = required(run.checkpoint.implementation_v2, "V2 implementation")?;
        run.resolved = self.check_resolution(run, v2).await?;

        let inspector = self.inspector();
        match self.config.pattern {
            ProxyPattern::Beacon => {
                let beacon = required(run.checkpoint.beacon, "beacon")?;
                for proxy in run.checkpoint.proxies.iter().copied() {
                    let actual =
                        inspector.beacon_of(proxy).await.map_err(|e| storage_failure(proxy, e))?;
                    if actual != beacon {
                        return Err(RunFailure::Unverified { proxy, expected: beacon, actual });
                    }
                }
            }
            ProxyPattern::Transparent => {
                let admin = required(run.checkpoint.proxy_admin, "ProxyAdmin")?;
                for proxy in run.checkpoint.proxies.iter().copied() {
                    let actual =
                        inspector.admin_of(proxy).await.map_err(|e| storage_failure(proxy, e))?;
                    if actual != admin {
                        return Err(RunFailure::Unverified { proxy, expected: admin, actual });
                    }
                }
            }
            ProxyPattern::Uups => {}
        }

        info!("Verified {} proxies resolve to {v2:#x}", run.resolved.len());
        Ok(())
    }

    /// Check every proxy resolves to `expected` through storage
    async fn check_resolution(
        &self,
        run: &Run,
        expected: Address,
    ) -> Result<Vec<ResolvedImplementation>, RunFailure> {
        let mut resolved = Vec::with_capacity(run.checkpoint.proxies.len());
        for proxy in self.proxy_handles(&run.checkpoint) {
            let resolution =
                verify_upgrade(self.ledger, &proxy, expected, self.config.decode_mode).await?;
            resolved.push(resolution);
        }

        Ok(resolved)
    }

    // ---------------
    // | Persistence |
    // ---------------

    /// Write the deployment record of the run
    async fn persist(&self, run: &mut Run) -> Result<(), RunFailure> {
        let chain_id = self.ledger.chain_id().await.map_err(RunFailure::Network)?;
        let checkpoint = &run.checkpoint;
        let record = UpgradeRecord {
            pattern: self.config.pattern,
            implementations: ImplementationAddresses {
                v1: required(checkpoint.implementation_v1, "V1 implementation")?,
                v2: required(checkpoint.implementation_v2, "V2 implementation")?,
            },
            proxies: checkpoint.proxies.clone(),
            proxy_admin: checkpoint.proxy_admin,
            beacon: checkpoint.beacon,
            network: NetworkIdentity::from_chain_id(chain_id),
            timestamp: Utc::now(),
        };

        let path = self
            .store
            .write_record(self.config.pattern.record_key(), &record)
            .map_err(RunFailure::Persistence)?;
        info!("Deployment record written to {}", path.display());

        run.record = Some(record);
        Ok(())
    }

    // -----------
    // | Helpers |
    // -----------

    /// A storage inspector over the deployer's ledger
    fn inspector(&self) -> StorageInspector<'_, L> {
        StorageInspector::new(self.ledger, self.config.decode_mode)
    }

    /// The handles of the proxies deployed so far
    fn proxy_handles(&self, checkpoint: &RunCheckpoint) -> Vec<ProxyHandle> {
        checkpoint
            .proxies
            .iter()
            .map(|address| ProxyHandle { address: *address, pattern: self.config.pattern })
            .collect()
    }

    /// The handle of the first proxy deployed, which upgrades are routed for
    fn first_proxy(&self, checkpoint: &RunCheckpoint) -> Result<ProxyHandle, RunFailure> {
        let address = required(checkpoint.proxies.first().copied(), "proxy")?;
        Ok(ProxyHandle { address, pattern: self.config.pattern })
    }
}

/// Check through storage alone that `proxy` resolves to `expected`
pub async fn verify_upgrade<L: Ledger>(
    ledger: &L,
    proxy: &ProxyHandle,
    expected: Address,
    mode: DecodeMode,
) -> Result<ResolvedImplementation, RunFailure> {
    let actual = StorageInspector::new(ledger, mode)
        .implementation_of(proxy)
        .await
        .map_err(|e| storage_failure(proxy.address, e))?;
    if actual != expected {
        return Err(RunFailure::Unverified { proxy: proxy.address, expected, actual });
    }

    debug!("Proxy {:#x} resolves to {actual:#x}", proxy.address);
    Ok(ResolvedImplementation { proxy: proxy.address, implementation: actual })
}

/// Classify an error reading `proxy`'s storage. A word that does not decode leaves
/// the proxy unverified, anything else is a failure to reach the ledger.
fn storage_failure(proxy: Address, e: LedgerError) -> RunFailure {
    match e {
        LedgerError::MalformedWord(reason) => RunFailure::Undecodable { proxy, reason },
        e => RunFailure::Network(e),
    }
}

/// The failure of a proxy that accepts initialization after it should have been consumed
fn second_initialization(proxy: Address) -> RunFailure {
    RunFailure::Initialization(format!("proxy {proxy:#x} accepts a second initialization"))
}

/// Unwrap an address an earlier stage should have produced
fn required(address: Option<Address>, what: &str) -> Result<Address, RunFailure> {
    address.ok_or_else(|| {
        RunFailure::Persistence(RecordError::Read(format!("run has no {what} address")))
    })
}
