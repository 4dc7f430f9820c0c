//! Common definitions shared by the upgrade orchestrator, the scripts, and the tests:
//! storage slot derivation, storage word decoding, proxy handle types, and the
//! Solidity bindings of the contracts the orchestrator talks to.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod constants;
pub mod slots;
pub mod solidity;
pub mod storage;
pub mod types;
