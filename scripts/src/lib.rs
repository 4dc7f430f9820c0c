//! Scripts for deploying, upgrading, and inspecting proxied contracts on a live chain

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod cli;
mod commands;
pub mod constants;
pub mod errors;
pub mod ledger;
pub mod utils;
