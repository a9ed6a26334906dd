//! The dispatcher: duplicate suppression, history bookkeeping, escalation

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use vigil_types::{
    AlertPayload, AlertPolicy, ArtifactDescriptor, Candidate, FailedNotification,
    NotificationKind, SentNotification,
};

use crate::traits::{AlertTransport, OperatorEscalator};

/// What a dispatch call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Transmitted and recorded in the sent history
    Sent,
    /// Duplicate or pointless request: nothing transmitted, nothing recorded
    Suppressed,
    /// Transmission failed; recorded for retry on the next invocation
    Failed,
}

/// Idempotent notification emitter keyed by (candidate, kind).
pub struct Dispatcher {
    transport: Arc<dyn AlertTransport>,
    escalator: Arc<dyn OperatorEscalator>,
    policy: AlertPolicy,
}

impl Dispatcher {
    pub fn new(
        transport: Arc<dyn AlertTransport>,
        escalator: Arc<dyn OperatorEscalator>,
        policy: AlertPolicy,
    ) -> Self {
        Self {
            transport,
            escalator,
            policy,
        }
    }

    /// Attempt to send `kind` for the candidate.
    ///
    /// Suppression rules:
    /// - the most recently sent notification is already of this kind
    ///   (guards duplicate triggering before state advances);
    /// - a retraction with nothing ever sent, or a retraction already sent.
    ///
    /// Payload construction mutates nothing; candidate history is updated
    /// only once the transmission outcome is known.
    pub async fn dispatch(
        &self,
        candidate: &mut Candidate,
        kind: NotificationKind,
        evidence_complete: bool,
    ) -> DispatchOutcome {
        if candidate.last_sent_kind() == Some(kind) {
            return DispatchOutcome::Suppressed;
        }
        if kind == NotificationKind::Retraction
            && (candidate.sent.is_empty() || candidate.has_sent(NotificationKind::Retraction))
        {
            return DispatchOutcome::Suppressed;
        }

        let payload = self.build_payload(candidate, kind);

        match self.transport.transmit(&payload).await {
            Ok(()) => {
                let sequence = candidate.sent.len() as u32 + 1;
                candidate.sent.push(SentNotification {
                    kind,
                    internal: payload.internal,
                    evidence_complete,
                    sequence,
                    sent_at: Utc::now(),
                });
                candidate.failed.retain(|f| f.kind != kind);
                if kind.carries_artifact() {
                    candidate.last_sent_artifact =
                        payload.artifact.as_ref().map(|a| a.label.clone());
                }
                candidate.touch();
                info!(id = %candidate.id, %kind, sequence, "notification sent");
                DispatchOutcome::Sent
            }
            Err(err) => {
                warn!(id = %candidate.id, %kind, error = %err, "notification failed");
                if !candidate.has_failed(kind) {
                    self.escalator
                        .escalate(&format!(
                            "could not send {kind} notification for {}: {err}",
                            candidate.id
                        ))
                        .await;
                    let sequence = candidate.failed.len() as u32 + 1;
                    candidate.failed.push(FailedNotification {
                        kind,
                        sequence,
                        error: err.to_string(),
                        failed_at: Utc::now(),
                    });
                    candidate.touch();
                }
                DispatchOutcome::Failed
            }
        }
    }

    fn build_payload(&self, candidate: &Candidate, kind: NotificationKind) -> AlertPayload {
        let artifact = if kind.carries_artifact() {
            candidate.current_artifact().map(|a| ArtifactDescriptor {
                label: a.label.clone(),
                submitter: a.submitter.clone(),
                sequence: a.sequence,
            })
        } else {
            None
        };
        AlertPayload {
            candidate_id: candidate.id.clone(),
            kind,
            internal: self.policy.internal(&candidate.pipeline),
            artifact,
        }
    }
}
