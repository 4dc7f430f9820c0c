use std::{sync::Once, time::Duration};

use alloy_primitives::Address;
use eyre::{eyre, Result};
use proxy_core::ledger::{deploy_contract, Ledger};
use test_helpers::{mock_ledger::MockLedger, world::LOCKABLE_TOKEN};
use tracing_subscriber::{fmt, EnvFilter};

// ---------------------
// | META TEST HELPERS |
// ---------------------

/// How long tests wait on any single transaction
pub const TEST_TIMEOUT: Duration = Duration::from_millis(200);

static TRACING_INIT: Once = Once::new();

/// Set up logging once per test binary, filtered by `RUST_LOG`
pub fn global_setup() {
    TRACING_INIT.call_once(|| {
        fmt().with_env_filter(EnvFilter::from_default_env()).with_test_writer().init();
    });
}

/// Deploy a lockable token from the ledger's account, which owns it and token 0
pub async fn deploy_lockable_token(ledger: &MockLedger) -> Result<Address> {
    deploy_contract(ledger, LOCKABLE_TOKEN, Default::default(), TEST_TIMEOUT)
        .await
        .map_err(|e| eyre!("deploying {LOCKABLE_TOKEN} as {:#x}: {e}", ledger.sender()))
}
