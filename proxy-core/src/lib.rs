//! The proxy upgrade orchestrator.
//!
//! Deploys versioned counter implementations behind Beacon, Transparent, or UUPS
//! proxies, upgrades them in place, and verifies the upgrade by reading the proxies'
//! raw storage rather than trusting anything the implementation reports about itself.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod authority;
pub mod errors;
pub mod guards;
pub mod inspector;
pub mod ledger;
pub mod orchestrator;
pub mod ownership;
pub mod records;
