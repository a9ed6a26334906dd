//! Transition decisions
//!
//! One evaluation pass runs the current state's ordered gate plan and
//! folds the outcomes into a single decision. Unanimity advances, any
//! failure rejects, anything else waits for more signals.

use tracing::{debug, warn};
use vigil_dispatch::{DispatchOutcome, Dispatcher};
use vigil_types::{
    Candidate, CandidateState, GateName, GateOutcome, NotificationKind, VigilConfig,
};

use crate::evidence::{self, Completeness};
use crate::gates::GateEngine;

/// What one evaluation pass decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassOutcome {
    /// At least one gate is unresolved, or the notification could not be
    /// sent; the candidate stays put and the next signal re-runs the pass
    Held,
    /// All gates passed and the state's notification went out (or was
    /// already out); the candidate moved to the next state
    Advanced,
    /// A gate failed; the candidate is terminally rejected
    Rejected,
}

/// Runs gate plans and commits the resulting transitions.
pub struct TransitionController {
    cfg: VigilConfig,
    engine: GateEngine,
    dispatcher: Dispatcher,
}

impl TransitionController {
    pub fn new(cfg: VigilConfig, engine: GateEngine, dispatcher: Dispatcher) -> Self {
        Self {
            cfg,
            engine,
            dispatcher,
        }
    }

    /// The ordered gate plan for a state. Cheap structural gates come
    /// first so a conclusive failure avoids the expensive ones.
    fn gate_plan(&self, state: CandidateState) -> Vec<GateName> {
        match state {
            CandidateState::New => vec![
                GateName::RateThreshold,
                GateName::LabelExclusion,
                GateName::CoincidenceWindow,
            ],
            CandidateState::AwaitingInitial => {
                let mut plan = vec![
                    GateName::RateThreshold,
                    GateName::LabelExclusion,
                    GateName::ArtifactAvailability,
                    GateName::JointMetric,
                ];
                if self.cfg.signoff.require_operator {
                    plan.push(GateName::OperatorSignoff);
                }
                if self.cfg.signoff.require_advocate {
                    plan.push(GateName::AdvocateSignoff);
                }
                plan
            }
            // Rejection is reachable only before the initial notification
            // went out; past that point the only question is artifact
            // currency, and that gate never fails.
            CandidateState::AwaitingUpdate => vec![GateName::ArtifactAvailability],
            CandidateState::Complete | CandidateState::Rejected => Vec::new(),
        }
    }

    /// The notification a state emits on leaving forward.
    fn notification_for(state: CandidateState) -> Option<NotificationKind> {
        match state {
            CandidateState::New => Some(NotificationKind::Preliminary),
            CandidateState::AwaitingInitial => Some(NotificationKind::Initial),
            CandidateState::AwaitingUpdate => Some(NotificationKind::Update),
            CandidateState::Complete | CandidateState::Rejected => None,
        }
    }

    /// Run one evaluation pass over the candidate's current state.
    ///
    /// Memoized gates with a stored conclusive result are not re-run; the
    /// rest are evaluated in plan order and their outcomes recorded. Any
    /// failure rejects immediately and triggers a retraction. A state only
    /// advances once its notification is confirmed out, so a transmission
    /// failure leaves the candidate where it was and the next signal
    /// retries the send.
    pub async fn evaluate(&self, candidate: &mut Candidate) -> PassOutcome {
        if candidate.state.is_terminal() {
            return PassOutcome::Held;
        }

        let mut unanimous = true;
        for gate in self.gate_plan(candidate.state) {
            let stored = candidate.gate_result(gate);
            let outcome = if gate.memoized() && stored.is_resolved() {
                stored
            } else {
                let outcome = self.engine.evaluate(candidate, gate).await;
                candidate.set_gate_result(gate, outcome);
                outcome
            };
            debug!(id = %candidate.id, state = %candidate.state, %gate, %outcome, "gate evaluated");
            match outcome {
                GateOutcome::Failed => {
                    warn!(id = %candidate.id, %gate, "gate failed, rejecting candidate");
                    candidate.reject();
                    // Best effort: a failed retraction stays in the failure
                    // history and nothing further depends on it
                    self.dispatcher
                        .dispatch(candidate, NotificationKind::Retraction, false)
                        .await;
                    return PassOutcome::Rejected;
                }
                GateOutcome::Unresolved => unanimous = false,
                GateOutcome::Passed => {}
            }
        }
        if !unanimous {
            return PassOutcome::Held;
        }

        let Some(kind) = Self::notification_for(candidate.state) else {
            return PassOutcome::Held;
        };
        let evidence_complete = matches!(
            evidence::completeness(&self.cfg.joint_metric, candidate),
            Completeness::Complete
        );
        match self.dispatcher.dispatch(candidate, kind, evidence_complete).await {
            DispatchOutcome::Sent | DispatchOutcome::Suppressed => {
                candidate.advance();
                PassOutcome::Advanced
            }
            DispatchOutcome::Failed => PassOutcome::Held,
        }
    }
}
