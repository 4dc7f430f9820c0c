//! Constants used in the scripts

/// The RPC URL of a local development node
pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";

/// The directory compiled contract artifacts are read from
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// The directory deployment records and checkpoints are written to
pub const DEFAULT_DEPLOYMENTS_DIR: &str = "deployments";

/// The environment variable holding the deployer's private key
pub const PKEY_ENV_VAR: &str = "PKEY";

/// The environment variable holding the RPC URL
pub const RPC_URL_ENV_VAR: &str = "RPC_URL";

/// The environment variable holding the private key of an account with no
/// authority over the deployment
pub const INTRUDER_PKEY_ENV_VAR: &str = "INTRUDER_PKEY";

/// The extension of a compiled contract artifact
pub const ARTIFACT_EXTENSION: &str = "json";

/// The key of the creation bytecode in a compiled contract artifact
pub const BYTECODE_KEY: &str = "bytecode";

/// The key of the hex bytecode when an artifact nests it in an object, as Foundry does
pub const BYTECODE_OBJECT_KEY: &str = "object";
