//! The admission gates
//!
//! Each gate reads the candidate record plus configuration and produces a
//! three-valued outcome. `Unresolved` means "not enough evidence yet" and
//! is always safe: the gate runs again on the next signal. A gate never
//! reads another gate's in-flight result.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use vigil_types::{Candidate, CandidateState, GateName, GateOutcome, VigilConfig};

use crate::evidence::{self, Completeness};

/// A marker found by the cross-reference query.
#[derive(Clone, Debug, PartialEq)]
pub struct CoincidentMarker {
    pub id: String,
    /// Marker timestamp in source time (seconds)
    pub at: f64,
}

/// The cross-reference query did not produce an answer. Transient: the
/// gate stays unresolved and the query reruns on the next signal.
#[derive(Debug, Error)]
#[error("coincidence query failed: {0}")]
pub struct CoincidenceError(pub String);

/// External source of co-incident markers around a timestamp.
#[async_trait]
pub trait CoincidenceSource: Send + Sync {
    async fn markers_within(
        &self,
        around: f64,
        window_secs: f64,
    ) -> Result<Vec<CoincidentMarker>, CoincidenceError>;
}

/// Evaluates individual gates against a candidate record.
pub struct GateEngine {
    cfg: VigilConfig,
    coincidence: Arc<dyn CoincidenceSource>,
}

impl GateEngine {
    pub fn new(cfg: VigilConfig, coincidence: Arc<dyn CoincidenceSource>) -> Self {
        Self { cfg, coincidence }
    }

    /// Evaluate one gate. Mutates the candidate only to cache the
    /// cross-reference query result and to deduplicate log lines; the
    /// memoization table itself is the caller's concern.
    pub async fn evaluate(&self, candidate: &mut Candidate, gate: GateName) -> GateOutcome {
        match gate {
            GateName::RateThreshold => self.rate_threshold(candidate),
            GateName::LabelExclusion => self.label_exclusion(candidate),
            GateName::CoincidenceWindow => self.coincidence_window(candidate).await,
            GateName::ArtifactAvailability => artifact_availability(candidate),
            GateName::JointMetric => self.joint_metric(candidate),
            GateName::OperatorSignoff => operator_signoff(candidate),
            GateName::AdvocateSignoff => advocate_signoff(candidate),
        }
    }

    fn rate_threshold(&self, candidate: &mut Candidate) -> GateOutcome {
        let threshold = self
            .cfg
            .thresholds
            .rate_threshold(&candidate.pipeline, &candidate.category);
        if candidate.rate < threshold {
            if candidate.note_once("rate-threshold", format!("{} < {threshold}", candidate.rate)) {
                info!(id = %candidate.id, rate = candidate.rate, threshold, "rate below threshold");
            }
            GateOutcome::Passed
        } else {
            GateOutcome::Failed
        }
    }

    fn label_exclusion(&self, candidate: &Candidate) -> GateOutcome {
        let blocked = self.cfg.labels.effective_blocked();
        match candidate.labels.iter().find(|l| blocked.contains(&l.as_str())) {
            Some(label) => {
                warn!(id = %candidate.id, %label, "blocked label attached");
                GateOutcome::Failed
            }
            None => GateOutcome::Passed,
        }
    }

    async fn coincidence_window(&self, candidate: &mut Candidate) -> GateOutcome {
        let count = match candidate.coincident_markers {
            Some(count) => count,
            None => {
                let timeout = Duration::from_secs(self.cfg.coincidence.query_timeout_secs);
                let query = self
                    .coincidence
                    .markers_within(candidate.detected_at, self.cfg.coincidence.window_secs);
                match tokio::time::timeout(timeout, query).await {
                    Ok(Ok(markers)) => {
                        candidate.coincident_markers = Some(markers.len());
                        candidate.touch();
                        markers.len()
                    }
                    Ok(Err(err)) => {
                        warn!(id = %candidate.id, error = %err, "coincidence query failed");
                        return GateOutcome::Unresolved;
                    }
                    Err(_) => {
                        warn!(id = %candidate.id, "coincidence query timed out");
                        return GateOutcome::Unresolved;
                    }
                }
            }
        };

        if count == 0 {
            return GateOutcome::Passed;
        }
        if self.cfg.labels.treat_injections_as_real {
            if candidate.note_once("coincidence", format!("{count} markers, treated as real")) {
                info!(id = %candidate.id, count, "co-incident markers found, policy passes them");
            }
            GateOutcome::Passed
        } else {
            warn!(id = %candidate.id, count, "co-incident markers found");
            GateOutcome::Failed
        }
    }

    fn joint_metric(&self, candidate: &mut Candidate) -> GateOutcome {
        let cfg = &self.cfg.joint_metric;
        if cfg.bypassed(&candidate.category) {
            return GateOutcome::Passed;
        }
        match evidence::completeness(cfg, candidate) {
            Completeness::Excess => {
                if candidate.note_once(
                    "joint-metric",
                    format!("{} fragments exceed expectation", evidence::fragment_count(candidate)),
                ) {
                    warn!(id = %candidate.id, "more evidence fragments than expected");
                }
                GateOutcome::Unresolved
            }
            Completeness::Complete => {
                let threshold = cfg.threshold(&candidate.pipeline, &candidate.category);
                match evidence::min_joint(cfg, candidate) {
                    Some(min) if min > threshold => GateOutcome::Passed,
                    Some(_) => GateOutcome::Failed,
                    None => GateOutcome::Unresolved,
                }
            }
            Completeness::Incomplete => {
                // Partial evidence can only fail: the running minimum never
                // increases, so a value at or below threshold is already
                // conclusive while one above it is not.
                let threshold = cfg.threshold(&candidate.pipeline, &candidate.category);
                match evidence::min_joint(cfg, candidate) {
                    Some(min) if min <= threshold => GateOutcome::Failed,
                    _ => GateOutcome::Unresolved,
                }
            }
        }
    }
}

fn artifact_availability(candidate: &Candidate) -> GateOutcome {
    match candidate.state {
        CandidateState::AwaitingInitial => match candidate.current_artifact() {
            Some(_) => GateOutcome::Passed,
            None => GateOutcome::Unresolved,
        },
        CandidateState::AwaitingUpdate => match candidate.current_artifact() {
            Some(a) if candidate.last_sent_artifact.as_deref() != Some(a.label.as_str()) => {
                GateOutcome::Passed
            }
            _ => GateOutcome::Unresolved,
        },
        _ => GateOutcome::Unresolved,
    }
}

fn operator_signoff(candidate: &Candidate) -> GateOutcome {
    use vigil_types::SignoffStatus;
    if candidate
        .operator_signoffs
        .values()
        .any(|s| *s == SignoffStatus::No)
    {
        return GateOutcome::Failed;
    }
    let covered = candidate
        .sensors
        .iter()
        .all(|s| candidate.operator_signoffs.contains_key(s));
    if covered && !candidate.sensors.is_empty() {
        GateOutcome::Passed
    } else {
        GateOutcome::Unresolved
    }
}

fn advocate_signoff(candidate: &Candidate) -> GateOutcome {
    use vigil_types::SignoffStatus;
    if candidate
        .advocate_signoffs
        .iter()
        .any(|s| *s == SignoffStatus::No)
    {
        return GateOutcome::Failed;
    }
    if candidate.advocate_signoffs.is_empty() {
        GateOutcome::Unresolved
    } else {
        GateOutcome::Passed
    }
}
