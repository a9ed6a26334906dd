//! Per-deployment configuration
//!
//! Every section has a documented default, so a missing file or a missing
//! key is never fatal: lookup falls back to the default value.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The label attached to hardware-injection events.
pub const INJECTION_LABEL: &str = "INJ";

/// Complete configuration for the approval core.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VigilConfig {
    pub thresholds: ThresholdConfig,
    pub labels: LabelPolicy,
    pub coincidence: CoincidencePolicy,
    pub joint_metric: JointMetricConfig,
    pub signoff: SignoffConfig,
    pub alerts: AlertPolicy,
}

/// Detection-rate thresholds, keyed by `pipeline.category` with a default.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub default_rate_threshold: f64,
    /// Overrides keyed by `"<pipeline>.<category>"`
    pub overrides: BTreeMap<String, f64>,
}

impl ThresholdConfig {
    /// Threshold for a pipeline/category pair, falling back to the default
    /// when no override is configured.
    pub fn rate_threshold(&self, pipeline: &str, category: &str) -> f64 {
        self.overrides
            .get(&format!("{pipeline}.{category}"))
            .copied()
            .unwrap_or(self.default_rate_threshold)
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            default_rate_threshold: 1.0e-6,
            overrides: BTreeMap::new(),
        }
    }
}

/// Which labels block a candidate.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelPolicy {
    pub blocked_labels: Vec<String>,
    /// Hardware-injection policy flag. When set, injection events are
    /// treated as real: the injection label stops blocking and a found
    /// co-incident marker is informational rather than fatal.
    pub treat_injections_as_real: bool,
}

impl LabelPolicy {
    /// The blocked-label set with the injection toggle applied.
    pub fn effective_blocked(&self) -> Vec<&str> {
        self.blocked_labels
            .iter()
            .map(String::as_str)
            .filter(|l| !(self.treat_injections_as_real && *l == INJECTION_LABEL))
            .collect()
    }
}

impl Default for LabelPolicy {
    fn default() -> Self {
        Self {
            blocked_labels: vec!["DQV".into(), INJECTION_LABEL.into()],
            treat_injections_as_real: false,
        }
    }
}

/// Cross-reference query policy.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CoincidencePolicy {
    /// Half-width of the search window around the detection timestamp
    pub window_secs: f64,
    /// Bound on the external query; a timeout is a transient failure
    pub query_timeout_secs: u64,
}

impl Default for CoincidencePolicy {
    fn default() -> Self {
        Self {
            window_secs: 2.0,
            query_timeout_secs: 10,
        }
    }
}

/// Joint derived-metric configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct JointMetricConfig {
    /// Evidence pipelines expected to report one fragment per sensor
    pub pipelines: Vec<String>,
    pub default_threshold: f64,
    /// Overrides keyed by `"<pipeline>.<category>"`
    pub overrides: BTreeMap<String, f64>,
    /// Candidate categories that skip this gate entirely
    pub bypass_categories: Vec<String>,
}

impl JointMetricConfig {
    pub fn threshold(&self, pipeline: &str, category: &str) -> f64 {
        self.overrides
            .get(&format!("{pipeline}.{category}"))
            .copied()
            .unwrap_or(self.default_threshold)
    }

    pub fn bypassed(&self, category: &str) -> bool {
        self.bypass_categories.iter().any(|c| c == category)
    }
}

impl Default for JointMetricConfig {
    fn default() -> Self {
        Self {
            pipelines: vec!["ovl".into()],
            default_threshold: 1.0e-3,
            overrides: BTreeMap::new(),
            bypass_categories: Vec::new(),
        }
    }
}

/// Which optional human sign-off gates are part of the deployment.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignoffConfig {
    pub require_operator: bool,
    pub require_advocate: bool,
}

/// Outbound notification policy.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertPolicy {
    /// Global override: every notification is internal-only
    pub force_internal: bool,
    /// Pipelines whose notifications are internal-only
    pub internal_pipelines: Vec<String>,
    /// Tag an inbound artifact must carry to be eligible for notification
    pub eligible_artifact_tag: String,
}

impl AlertPolicy {
    pub fn internal(&self, pipeline: &str) -> bool {
        self.force_internal || self.internal_pipelines.iter().any(|p| p == pipeline)
    }
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            force_internal: false,
            internal_pipelines: Vec::new(),
            eligible_artifact_tag: "shareable".into(),
        }
    }
}
