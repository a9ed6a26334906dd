//! Durable candidate storage
//!
//! One record per candidate identifier, loaded at startup and persisted
//! after every mutation. Writes are serialized per candidate key; writes to
//! different candidates may proceed in parallel.
//!
//! Two adapters:
//! - [`InMemoryCandidateStore`], deterministic and test-friendly.
//! - [`FileCandidateStore`], one JSON document per candidate under a root
//!   directory, plus derived snapshot and human-readable listing views
//!   rebuildable from the canonical records at any time.
//!
//! An unreadable or unwritable root at startup is the one fatal error in
//! the system; everything else degrades and retries.

#![deny(unsafe_code)]

mod error;
mod file;
mod memory;
mod traits;

pub use error::{StoreError, StoreResult};
pub use file::FileCandidateStore;
pub use memory::InMemoryCandidateStore;
pub use traits::CandidateStore;
