//! Error types for signal validation

/// Errors raised while validating an inbound signal, always before any
/// candidate state is mutated.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("unrecognized provenance note: {0}")]
    UnrecognizedNote(String),

    #[error("invalid fragment value '{value}': {reason}")]
    InvalidValue { value: String, reason: String },

    #[error("missing required field: {0}")]
    MissingField(&'static str),
}
