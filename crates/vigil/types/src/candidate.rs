//! The durable per-candidate record
//!
//! One `Candidate` exists per external event identifier. It is created on
//! first sighting, mutated by every subsequent signal, and never deleted by
//! this core. Everything needed for safe re-entrancy (memoized gate
//! results, evidence fragments, notification history, log fingerprints)
//! lives on the record itself so a process restart resumes exactly where an
//! uninterrupted run would be.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::{
    CandidateState, FailedNotification, GateName, GateOutcome, NotificationKind, SentNotification,
    SignoffRole, SignoffStatus,
};

/// Immutable, unique identifier assigned by the external source.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(String);

impl CandidateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CandidateId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One externally supplied artifact eligible for notification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    /// 1-based arrival order; the highest sequence is the current artifact
    pub sequence: u32,
    pub label: String,
    pub submitter: String,
    pub received_at: DateTime<Utc>,
}

/// Typed log-deduplication key: a topic plus the semantic fact it records.
///
/// Replaces deduplication by re-parsing rendered log lines: the fact is
/// stored structurally alongside the candidate.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LogFingerprint {
    pub topic: String,
    pub fact: String,
}

/// Seed fields carried by a new-candidate signal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewCandidate {
    pub id: CandidateId,
    /// Detection-confidence rate; lower is better
    pub rate: f64,
    pub pipeline: String,
    pub category: String,
    /// Detection timestamp in source time (seconds)
    pub detected_at: f64,
    pub sensors: BTreeSet<String>,
    pub labels: BTreeSet<String>,
}

/// The tracked record for one external event.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub rate: f64,
    pub pipeline: String,
    pub category: String,
    pub detected_at: f64,
    pub sensors: BTreeSet<String>,
    pub labels: BTreeSet<String>,
    pub state: CandidateState,

    /// Last resolved result per gate: the memoization table
    pub gate_results: BTreeMap<GateName, GateOutcome>,

    /// Evidence fragments: pipeline → sensor → value
    pub fragments: BTreeMap<String, BTreeMap<String, f64>>,
    /// Derived joint value per pipeline, recomputed by the aggregator
    pub joint_values: BTreeMap<String, f64>,

    /// Cached cross-reference query result (marker count), once known
    pub coincident_markers: Option<usize>,

    pub operator_signoffs: BTreeMap<String, SignoffStatus>,
    pub advocate_signoffs: Vec<SignoffStatus>,

    /// Eligible artifacts in arrival order
    pub artifacts: Vec<ArtifactEntry>,
    /// Label of the artifact attached to the most recent sent notification
    pub last_sent_artifact: Option<String>,

    pub sent: Vec<SentNotification>,
    pub failed: Vec<FailedNotification>,

    pub log_fingerprints: BTreeSet<LogFingerprint>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Candidate {
    pub fn new(seed: &NewCandidate) -> Self {
        let now = Utc::now();
        Self {
            id: seed.id.clone(),
            rate: seed.rate,
            pipeline: seed.pipeline.clone(),
            category: seed.category.clone(),
            detected_at: seed.detected_at,
            sensors: seed.sensors.clone(),
            labels: seed.labels.clone(),
            state: CandidateState::New,
            gate_results: BTreeMap::new(),
            fragments: BTreeMap::new(),
            joint_values: BTreeMap::new(),
            coincident_markers: None,
            operator_signoffs: BTreeMap::new(),
            advocate_signoffs: Vec::new(),
            artifacts: Vec::new(),
            last_sent_artifact: None,
            sent: Vec::new(),
            failed: Vec::new(),
            log_fingerprints: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    // ── Gate results ────────────────────────────────────────────────

    pub fn gate_result(&self, gate: GateName) -> GateOutcome {
        self.gate_results.get(&gate).copied().unwrap_or_default()
    }

    pub fn set_gate_result(&mut self, gate: GateName, outcome: GateOutcome) {
        self.gate_results.insert(gate, outcome);
    }

    // ── State transitions ───────────────────────────────────────────

    /// Advance to the next state in the fixed order.
    ///
    /// The artifact-availability entry is cleared so the next state re-arms
    /// it against the updated `last_sent_artifact` reference.
    pub fn advance(&mut self) {
        if let Some(next) = self.state.next() {
            self.state = next;
            self.gate_results.remove(&GateName::ArtifactAvailability);
            self.touch();
        }
    }

    /// Move sideways into the terminal rejected state.
    pub fn reject(&mut self) {
        if !self.state.is_terminal() {
            self.state = CandidateState::Rejected;
            self.touch();
        }
    }

    // ── Labels ──────────────────────────────────────────────────────

    pub fn add_label(&mut self, label: impl Into<String>) {
        self.labels.insert(label.into());
        self.touch();
    }

    pub fn remove_label(&mut self, label: &str) {
        self.labels.remove(label);
        self.touch();
    }

    // ── Sign-offs ───────────────────────────────────────────────────

    pub fn record_signoff(&mut self, role: &SignoffRole, status: SignoffStatus) {
        match role {
            SignoffRole::Operator { sensor } => {
                self.operator_signoffs.insert(sensor.clone(), status);
            }
            SignoffRole::Advocate => {
                self.advocate_signoffs.push(status);
            }
        }
        self.touch();
    }

    // ── Artifacts ───────────────────────────────────────────────────

    /// Record an eligible artifact. Duplicates by label are dropped.
    /// Returns whether the entry was newly recorded.
    pub fn record_artifact(
        &mut self,
        label: impl Into<String>,
        submitter: impl Into<String>,
    ) -> bool {
        let label = label.into();
        if self.artifacts.iter().any(|a| a.label == label) {
            return false;
        }
        let sequence = self.artifacts.len() as u32 + 1;
        self.artifacts.push(ArtifactEntry {
            sequence,
            label,
            submitter: submitter.into(),
            received_at: Utc::now(),
        });
        self.touch();
        true
    }

    /// The latest eligible artifact, if any.
    pub fn current_artifact(&self) -> Option<&ArtifactEntry> {
        self.artifacts.last()
    }

    // ── Notification history ────────────────────────────────────────

    pub fn last_sent_kind(&self) -> Option<NotificationKind> {
        self.sent.last().map(|n| n.kind)
    }

    pub fn has_sent(&self, kind: NotificationKind) -> bool {
        self.sent.iter().any(|n| n.kind == kind)
    }

    pub fn has_failed(&self, kind: NotificationKind) -> bool {
        self.failed.iter().any(|n| n.kind == kind)
    }

    // ── Log deduplication ───────────────────────────────────────────

    /// Record a (topic, fact) pair; returns `true` the first time it is
    /// seen, so callers can emit the corresponding log line exactly once.
    pub fn note_once(&mut self, topic: impl Into<String>, fact: impl Into<String>) -> bool {
        self.log_fingerprints.insert(LogFingerprint {
            topic: topic.into(),
            fact: fact.into(),
        })
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
