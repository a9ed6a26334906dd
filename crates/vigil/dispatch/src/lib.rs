//! Idempotent outbound-notification dispatcher
//!
//! Guarantees at-most-one notification per (candidate, kind) under retries
//! and process restarts. The dispatcher never retries internally: durable
//! history on the candidate record makes the next inbound signal the retry
//! mechanism. Repeated transmission failures escalate to an operator at
//! most once per (candidate, kind).

#![deny(unsafe_code)]

mod dispatcher;
mod traits;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use traits::{AlertTransport, OperatorEscalator, TransportError};
