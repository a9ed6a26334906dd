//! Gate identifiers and three-valued outcomes
//!
//! Gates are resolved at configuration-load time into an explicit ordered
//! plan per workflow state; there is no name-matched dynamic dispatch.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of admission gates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateName {
    /// Detection-confidence rate below the configured threshold
    RateThreshold,
    /// No blocked label attached to the candidate
    LabelExclusion,
    /// No fatal co-incident marker within the configured time window
    CoincidenceWindow,
    /// An eligible artifact newer than the last one sent exists
    ArtifactAvailability,
    /// Joint derived metric above the configured threshold
    JointMetric,
    /// Per-sensor operator sign-off
    OperatorSignoff,
    /// Advocate sign-off
    AdvocateSignoff,
}

impl GateName {
    /// Whether a `Passed`/`Failed` result is durable for the gate.
    ///
    /// Most gates read inputs that never change once the gate resolves, so
    /// their stored result is authoritative. Labels arrive late and artifact
    /// currency depends on the workflow state, so those two re-evaluate on
    /// every pass; their stored entry is advisory only.
    pub fn memoized(self) -> bool {
        !matches!(self, Self::LabelExclusion | Self::ArtifactAvailability)
    }
}

impl fmt::Display for GateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RateThreshold => "rate-threshold",
            Self::LabelExclusion => "label-exclusion",
            Self::CoincidenceWindow => "coincidence-window",
            Self::ArtifactAvailability => "artifact-availability",
            Self::JointMetric => "joint-metric",
            Self::OperatorSignoff => "operator-signoff",
            Self::AdvocateSignoff => "advocate-signoff",
        };
        f.write_str(name)
    }
}

/// Three-valued result of a gate evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateOutcome {
    /// Not enough evidence yet, re-evaluated on the next signal
    #[default]
    Unresolved,
    /// Condition met
    Passed,
    /// Condition conclusively not met
    Failed,
}

impl GateOutcome {
    /// `Passed` and `Failed` are final; `Unresolved` may be recomputed.
    pub fn is_resolved(self) -> bool {
        !matches!(self, Self::Unresolved)
    }

    pub fn is_passed(self) -> bool {
        matches!(self, Self::Passed)
    }

    pub fn is_failed(self) -> bool {
        matches!(self, Self::Failed)
    }
}

impl fmt::Display for GateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unresolved => "unresolved",
            Self::Passed => "passed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
