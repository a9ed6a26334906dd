//! End-to-end signal-driven scenarios over the assembled core.

use async_trait::async_trait;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use vigil_dispatch::{AlertTransport, Dispatcher, OperatorEscalator, TransportError};
use vigil_engine::{
    CoincidenceError, CoincidenceSource, CoincidentMarker, GateEngine, PassOutcome,
    TransitionController,
};
use vigil_runtime::{Processor, VigilError};
use vigil_store::{CandidateStore, InMemoryCandidateStore};
use vigil_types::{
    AlertPayload, CandidateId, CandidateState, NewCandidate, NotificationKind, Signal,
    SignoffRole, SignoffStatus, VigilConfig,
};

struct RecordingTransport {
    fail: AtomicBool,
    kinds: Mutex<Vec<NotificationKind>>,
}

impl RecordingTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            fail: AtomicBool::new(false),
            kinds: Mutex::new(Vec::new()),
        })
    }

    fn sent(&self) -> Vec<NotificationKind> {
        self.kinds.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertTransport for RecordingTransport {
    async fn transmit(&self, payload: &AlertPayload) -> Result<(), TransportError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(TransportError("channel down".into()));
        }
        self.kinds.lock().unwrap().push(payload.kind);
        Ok(())
    }
}

struct NoEscalation;

#[async_trait]
impl OperatorEscalator for NoEscalation {
    async fn escalate(&self, _message: &str) {}
}

struct QuietSky;

#[async_trait]
impl CoincidenceSource for QuietSky {
    async fn markers_within(
        &self,
        _around: f64,
        _window_secs: f64,
    ) -> Result<Vec<CoincidentMarker>, CoincidenceError> {
        Ok(Vec::new())
    }
}

struct Harness {
    processor: Processor,
    store: Arc<InMemoryCandidateStore>,
    transport: Arc<RecordingTransport>,
}

fn harness(cfg: VigilConfig) -> Harness {
    let store = Arc::new(InMemoryCandidateStore::new());
    let transport = RecordingTransport::new();
    let engine = GateEngine::new(cfg.clone(), Arc::new(QuietSky));
    let dispatcher = Dispatcher::new(transport.clone(), Arc::new(NoEscalation), cfg.alerts.clone());
    let controller = TransitionController::new(cfg.clone(), engine, dispatcher);
    let processor = Processor::new(store.clone(), controller, cfg);
    Harness {
        processor,
        store,
        transport,
    }
}

fn seed(id: &str, rate: f64) -> Signal {
    Signal::NewCandidate(NewCandidate {
        id: CandidateId::new(id),
        rate,
        pipeline: "cwb".into(),
        category: "allsky".into(),
        detected_at: 1_126_259_462.391,
        sensors: ["H1", "L1"].iter().map(|s| s.to_string()).collect(),
        labels: BTreeSet::new(),
    })
}

fn fragment(id: &str, sensor: &str, value: &str) -> Signal {
    Signal::EvidenceFragment {
        id: CandidateId::new(id),
        note: format!(
            "minimum glitch-FAP for ovl at {sensor} within [1126259462.338, 1126259462.438] is {value}"
        ),
    }
}

fn artifact(id: &str, label: &str) -> Signal {
    Signal::Artifact {
        id: CandidateId::new(id),
        label: label.into(),
        submitter: "alice".into(),
        tag: "shareable".into(),
    }
}

async fn state_of(h: &Harness, id: &str) -> CandidateState {
    h.store
        .lookup(&CandidateId::new(id))
        .await
        .unwrap()
        .unwrap()
        .state
}

#[tokio::test]
async fn test_clean_run_to_complete() {
    let h = harness(VigilConfig::default());

    h.processor.handle_signal(&seed("C1", 1.0e-8)).await.unwrap();
    assert_eq!(state_of(&h, "C1").await, CandidateState::AwaitingInitial);

    h.processor.handle_signal(&artifact("C1", "map-1.fits")).await.unwrap();
    h.processor.handle_signal(&fragment("C1", "H1", "1.000e0")).await.unwrap();
    let outcome = h
        .processor
        .handle_signal(&fragment("C1", "L1", "4.000e-2"))
        .await
        .unwrap();
    assert_eq!(outcome, PassOutcome::Advanced);
    assert_eq!(state_of(&h, "C1").await, CandidateState::AwaitingUpdate);

    h.processor.handle_signal(&artifact("C1", "map-2.fits")).await.unwrap();
    assert_eq!(state_of(&h, "C1").await, CandidateState::Complete);
    assert_eq!(
        h.transport.sent(),
        vec![
            NotificationKind::Preliminary,
            NotificationKind::Initial,
            NotificationKind::Update,
        ]
    );
}

#[tokio::test]
async fn test_late_blocking_label_retracts() {
    let h = harness(VigilConfig::default());

    h.processor.handle_signal(&seed("C1", 1.0e-8)).await.unwrap();
    let outcome = h
        .processor
        .handle_signal(&Signal::LabelAdded {
            id: CandidateId::new("C1"),
            label: "DQV".into(),
        })
        .await
        .unwrap();
    assert_eq!(outcome, PassOutcome::Rejected);
    assert_eq!(state_of(&h, "C1").await, CandidateState::Rejected);
    assert_eq!(
        h.transport.sent(),
        vec![NotificationKind::Preliminary, NotificationKind::Retraction]
    );
}

#[tokio::test]
async fn test_blocked_label_after_initial_does_not_retract() {
    let h = harness(VigilConfig::default());

    h.processor.handle_signal(&seed("C1", 1.0e-8)).await.unwrap();
    h.processor.handle_signal(&artifact("C1", "map-1.fits")).await.unwrap();
    h.processor.handle_signal(&fragment("C1", "H1", "1.000e0")).await.unwrap();
    h.processor.handle_signal(&fragment("C1", "L1", "4.000e-2")).await.unwrap();
    assert_eq!(state_of(&h, "C1").await, CandidateState::AwaitingUpdate);

    // Once the initial notification is out, a late blocked label can no
    // longer reject the candidate
    let outcome = h
        .processor
        .handle_signal(&Signal::LabelAdded {
            id: CandidateId::new("C1"),
            label: "DQV".into(),
        })
        .await
        .unwrap();
    assert_eq!(outcome, PassOutcome::Held);
    assert_eq!(state_of(&h, "C1").await, CandidateState::AwaitingUpdate);
    assert!(!h.transport.sent().contains(&NotificationKind::Retraction));
}

#[tokio::test]
async fn test_partial_evidence_early_fail() {
    let h = harness(VigilConfig::default());

    h.processor.handle_signal(&seed("C1", 1.0e-8)).await.unwrap();
    h.processor.handle_signal(&artifact("C1", "map-1.fits")).await.unwrap();
    // The first of two expected fragments is already at threshold
    let outcome = h
        .processor
        .handle_signal(&fragment("C1", "H1", "1.000e-3"))
        .await
        .unwrap();
    assert_eq!(outcome, PassOutcome::Rejected);
    assert_eq!(state_of(&h, "C1").await, CandidateState::Rejected);
    assert!(h.transport.sent().contains(&NotificationKind::Retraction));
}

#[tokio::test]
async fn test_hopeless_candidate_never_notifies() {
    let h = harness(VigilConfig::default());

    let outcome = h.processor.handle_signal(&seed("C1", 1.0)).await.unwrap();
    assert_eq!(outcome, PassOutcome::Rejected);
    assert_eq!(state_of(&h, "C1").await, CandidateState::Rejected);
    // Nothing was ever sent, so there is nothing to retract
    assert!(h.transport.sent().is_empty());
}

#[tokio::test]
async fn test_transmission_failure_held_until_next_signal() {
    let h = harness(VigilConfig::default());

    h.transport.fail.store(true, Ordering::SeqCst);
    let outcome = h.processor.handle_signal(&seed("C1", 1.0e-8)).await.unwrap();
    assert_eq!(outcome, PassOutcome::Held);
    assert_eq!(state_of(&h, "C1").await, CandidateState::New);

    // Any later signal re-runs the pass and retries the send
    h.transport.fail.store(false, Ordering::SeqCst);
    let outcome = h
        .processor
        .handle_signal(&fragment("C1", "H1", "9.000e-1"))
        .await
        .unwrap();
    assert_eq!(outcome, PassOutcome::Advanced);
    assert_eq!(state_of(&h, "C1").await, CandidateState::AwaitingInitial);
    assert_eq!(h.transport.sent(), vec![NotificationKind::Preliminary]);
}

#[tokio::test]
async fn test_duplicate_delivery_is_idempotent() {
    let h = harness(VigilConfig::default());

    h.processor.handle_signal(&seed("C1", 1.0e-8)).await.unwrap();
    // Re-delivered seed: no second record, no second preliminary
    h.processor.handle_signal(&seed("C1", 1.0e-8)).await.unwrap();
    h.processor.handle_signal(&artifact("C1", "map-1.fits")).await.unwrap();
    h.processor.handle_signal(&artifact("C1", "map-1.fits")).await.unwrap();
    h.processor.handle_signal(&fragment("C1", "H1", "1.000e0")).await.unwrap();
    h.processor.handle_signal(&fragment("C1", "H1", "1.000e0")).await.unwrap();
    h.processor.handle_signal(&fragment("C1", "L1", "4.000e-2")).await.unwrap();

    let c = h.store.lookup(&CandidateId::new("C1")).await.unwrap().unwrap();
    assert_eq!(c.artifacts.len(), 1);
    assert_eq!(
        h.transport.sent(),
        vec![NotificationKind::Preliminary, NotificationKind::Initial]
    );
}

#[tokio::test]
async fn test_unknown_candidate_is_an_error() {
    let h = harness(VigilConfig::default());

    let err = h
        .processor
        .handle_signal(&Signal::LabelAdded {
            id: CandidateId::new("ghost"),
            label: "DQV".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, VigilError::UnknownCandidate(_)));
}

#[tokio::test]
async fn test_malformed_note_leaves_state_untouched() {
    let h = harness(VigilConfig::default());

    h.processor.handle_signal(&seed("C1", 1.0e-8)).await.unwrap();
    let err = h
        .processor
        .handle_signal(&Signal::EvidenceFragment {
            id: CandidateId::new("C1"),
            note: "not a provenance note".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, VigilError::Parse(_)));

    let c = h.store.lookup(&CandidateId::new("C1")).await.unwrap().unwrap();
    assert!(c.fragments.is_empty());
}

#[tokio::test]
async fn test_ineligible_artifact_is_ignored() {
    let h = harness(VigilConfig::default());

    h.processor.handle_signal(&seed("C1", 1.0e-8)).await.unwrap();
    h.processor
        .handle_signal(&Signal::Artifact {
            id: CandidateId::new("C1"),
            label: "draft.fits".into(),
            submitter: "alice".into(),
            tag: "private".into(),
        })
        .await
        .unwrap();

    let c = h.store.lookup(&CandidateId::new("C1")).await.unwrap().unwrap();
    assert!(c.artifacts.is_empty());
    assert_eq!(c.state, CandidateState::AwaitingInitial);
}

#[tokio::test]
async fn test_signoff_gates_when_required() {
    let mut cfg = VigilConfig::default();
    cfg.signoff.require_operator = true;
    cfg.signoff.require_advocate = true;
    let h = harness(cfg);

    h.processor.handle_signal(&seed("C1", 1.0e-8)).await.unwrap();
    h.processor.handle_signal(&artifact("C1", "map-1.fits")).await.unwrap();
    h.processor.handle_signal(&fragment("C1", "H1", "1.000e0")).await.unwrap();
    h.processor.handle_signal(&fragment("C1", "L1", "4.000e-2")).await.unwrap();
    assert_eq!(state_of(&h, "C1").await, CandidateState::AwaitingInitial);

    for sensor in ["H1", "L1"] {
        h.processor
            .handle_signal(&Signal::Signoff {
                id: CandidateId::new("C1"),
                role: SignoffRole::Operator {
                    sensor: sensor.into(),
                },
                status: SignoffStatus::Ok,
            })
            .await
            .unwrap();
    }
    assert_eq!(state_of(&h, "C1").await, CandidateState::AwaitingInitial);

    h.processor
        .handle_signal(&Signal::Signoff {
            id: CandidateId::new("C1"),
            role: SignoffRole::Advocate,
            status: SignoffStatus::Ok,
        })
        .await
        .unwrap();
    assert_eq!(state_of(&h, "C1").await, CandidateState::AwaitingUpdate);
}

#[tokio::test]
async fn test_signal_wire_format() {
    let json = r#"{"type":"label_added","id":"C1","label":"DQV"}"#;
    let signal: Signal = serde_json::from_str(json).unwrap();
    assert_eq!(
        signal,
        Signal::LabelAdded {
            id: CandidateId::new("C1"),
            label: "DQV".into(),
        }
    );
}

// Random post-seed signal orderings: whatever arrives, the state ordinal
// never decreases and a terminal state stays terminal.
fn arbitrary_signal() -> impl Strategy<Value = Signal> {
    prop_oneof![
        Just(seed("C1", 1.0e-8)),
        Just(artifact("C1", "map-1.fits")),
        Just(artifact("C1", "map-2.fits")),
        Just(fragment("C1", "H1", "1.000e0")),
        Just(fragment("C1", "L1", "4.000e-2")),
        Just(fragment("C1", "L1", "1.000e-4")),
        Just(Signal::LabelAdded {
            id: CandidateId::new("C1"),
            label: "DQV".into(),
        }),
        Just(Signal::LabelRemoved {
            id: CandidateId::new("C1"),
            label: "DQV".into(),
        }),
        Just(Signal::Signoff {
            id: CandidateId::new("C1"),
            role: SignoffRole::Advocate,
            status: SignoffStatus::Ok,
        }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_state_only_moves_forward(signals in proptest::collection::vec(arbitrary_signal(), 0..24)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let h = harness(VigilConfig::default());
            h.processor.handle_signal(&seed("C1", 1.0e-8)).await.unwrap();
            let mut previous = state_of(&h, "C1").await;
            for signal in &signals {
                let _ = h.processor.handle_signal(signal).await;
                let current = state_of(&h, "C1").await;
                prop_assert!(current.ordinal() >= previous.ordinal());
                if previous.is_terminal() {
                    prop_assert_eq!(current, previous);
                }
                previous = current;
            }
            Ok(())
        })?;
    }
}
