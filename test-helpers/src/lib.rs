//! Common helpers used in unit and integration tests across the workspace crates:
//! an in-memory ledger that executes the proxy, beacon, admin, counter, and token
//! contracts the orchestrator drives

pub mod mock_ledger;
pub mod world;
