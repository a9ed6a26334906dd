use thiserror::Error;
use vigil_types::{CandidateId, ParseError};

/// Top-level runtime errors.
///
/// A parse or unknown-candidate error means the signal was dropped before
/// any state changed; a store error may leave an in-memory mutation
/// unpersisted, which the next signal's re-evaluation repairs.
#[derive(Debug, Error)]
pub enum VigilError {
    #[error(transparent)]
    Store(#[from] vigil_store::StoreError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("signal references unknown candidate: {0}")]
    UnknownCandidate(CandidateId),
}
