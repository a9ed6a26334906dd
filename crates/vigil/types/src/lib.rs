//! Domain types for the vigil candidate approval core
//!
//! A **candidate** is an externally detected event that moves through an
//! ordered approval workflow as evidence arrives. Every concept the rest of
//! the workspace operates on is defined here:
//!
//! - **Candidate**: the durable per-event record: descriptors, labels,
//!   evidence fragments, memoized gate results, notification history.
//! - **CandidateState**: the fixed forward-only workflow order, plus the
//!   terminal `Rejected` state.
//! - **GateName / GateOutcome**: the fixed set of admission gates and their
//!   three-valued results (`unresolved | passed | failed`).
//! - **NotificationKind** and the sent/failed history records.
//! - **Signal**: the transport-agnostic inbound message shapes, including
//!   the provenance-note parser for evidence fragments.
//! - **VigilConfig**: per-deployment policy (thresholds, gate toggles,
//!   alert internality).
//!
//! # Design Principles
//!
//! 1. State only moves forward through the fixed order, or sideways into
//!    `Rejected`. Never backward.
//! 2. Gate results and notification history live on the candidate record so
//!    restart-and-resume reproduces an uninterrupted run.
//! 3. Log deduplication uses typed fingerprints, never re-parsed text.

#![deny(unsafe_code)]

mod candidate;
mod config;
mod errors;
mod gate;
mod notification;
mod signal;
mod state;

pub use candidate::*;
pub use config::*;
pub use errors::*;
pub use gate::*;
pub use notification::*;
pub use signal::*;
pub use state::*;
