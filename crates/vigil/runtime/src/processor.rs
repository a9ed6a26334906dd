//! The signal processor
//!
//! One entry point, [`Processor::handle_signal`], applies an inbound
//! signal to its candidate and runs one evaluation pass. Validation
//! happens before any candidate state is touched, so a malformed signal
//! leaves the record exactly as it was. Every pass ends with a persist,
//! which is what makes processing re-entrant: after a crash the next
//! signal resumes from the durable record.

use std::sync::Arc;
use tracing::{debug, info};
use vigil_engine::{evidence, PassOutcome, TransitionController};
use vigil_store::CandidateStore;
use vigil_types::{parse_fragment_note, Candidate, Signal, VigilConfig};

use crate::error::VigilError;

pub struct Processor {
    store: Arc<dyn CandidateStore>,
    controller: TransitionController,
    cfg: VigilConfig,
}

impl Processor {
    pub fn new(
        store: Arc<dyn CandidateStore>,
        controller: TransitionController,
        cfg: VigilConfig,
    ) -> Self {
        Self {
            store,
            controller,
            cfg,
        }
    }

    /// Apply one signal and run one evaluation pass.
    ///
    /// Signals other than `NewCandidate` must reference a known candidate.
    /// The updated record is persisted whatever the pass decided, and the
    /// store's derived views are refreshed.
    pub async fn handle_signal(&self, signal: &Signal) -> Result<PassOutcome, VigilError> {
        let mut candidate = self.apply(signal).await?;
        let outcome = self.controller.evaluate(&mut candidate).await;
        info!(id = %candidate.id, state = %candidate.state, ?outcome, "pass complete");
        self.store.persist(&candidate).await?;
        self.store.sync_views().await?;
        Ok(outcome)
    }

    async fn apply(&self, signal: &Signal) -> Result<Candidate, VigilError> {
        if let Signal::NewCandidate(seed) = signal {
            let candidate = self.store.lookup_or_create(seed).await?;
            return Ok(candidate);
        }

        // Validate before fetching so a malformed note cannot touch state
        let fragment = match signal {
            Signal::EvidenceFragment { note, .. } => Some(parse_fragment_note(note)?),
            _ => None,
        };

        let id = signal.candidate_id();
        let mut candidate = self
            .store
            .lookup(id)
            .await?
            .ok_or_else(|| VigilError::UnknownCandidate(id.clone()))?;

        match signal {
            // Handled by the early return above
            Signal::NewCandidate(_) => {}
            Signal::LabelAdded { label, .. } => candidate.add_label(label.clone()),
            Signal::LabelRemoved { label, .. } => candidate.remove_label(label),
            Signal::EvidenceFragment { .. } => {
                if let Some(fragment) = fragment {
                    evidence::record_fragment(&mut candidate, &fragment);
                }
            }
            Signal::Signoff { role, status, .. } => candidate.record_signoff(role, *status),
            Signal::Artifact {
                label,
                submitter,
                tag,
                ..
            } => {
                if tag == &self.cfg.alerts.eligible_artifact_tag {
                    candidate.record_artifact(label.clone(), submitter.clone());
                } else {
                    debug!(id = %candidate.id, %label, %tag, "artifact tag not eligible, ignored");
                }
            }
        }
        Ok(candidate)
    }
}
