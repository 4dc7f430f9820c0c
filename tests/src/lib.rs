pub mod orchestrator;
pub mod utils;
