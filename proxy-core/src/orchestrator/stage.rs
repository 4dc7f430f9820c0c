//! The stages of an upgrade run

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// A stage of an upgrade run. Runs move through the stages strictly in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Deploy the initial implementation
    DeployImpl1,
    /// Deploy the upgrade target
    DeployImpl2,
    /// Deploy the proxies and whatever they route upgrades through
    DeployIndirection,
    /// Initialize the proxies, or confirm their constructors did
    Initialize,
    /// Exercise the initial implementation through the proxies
    ProbePreUpgrade,
    /// Swap the implementation
    Upgrade,
    /// Exercise the upgraded implementation through the proxies
    ProbePostUpgrade,
    /// Check the proxies' storage resolves to the upgrade target
    Verify,
    /// Write the deployment record
    Persist,
    /// The run completed
    Done,
}

impl Stage {
    /// Every stage, in order
    pub const ALL: [Stage; 10] = [
        Stage::DeployImpl1,
        Stage::DeployImpl2,
        Stage::DeployIndirection,
        Stage::Initialize,
        Stage::ProbePreUpgrade,
        Stage::Upgrade,
        Stage::ProbePostUpgrade,
        Stage::Verify,
        Stage::Persist,
        Stage::Done,
    ];

    /// The stage following this one, if any
    pub fn next(self) -> Option<Stage> {
        let idx = Self::ALL.iter().position(|s| *s == self)?;
        Self::ALL.get(idx + 1).copied()
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}
