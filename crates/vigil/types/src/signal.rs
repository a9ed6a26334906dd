//! Inbound signal shapes and the provenance-note parser
//!
//! Signals are transport-agnostic: whatever delivers them, the core only
//! sees these shapes. A malformed signal is rejected here, before any
//! candidate state is touched.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::{CandidateId, NewCandidate, ParseError};

/// Sign-off verdict from a human party.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignoffStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "NO")]
    No,
}

/// Which party a sign-off comes from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignoffRole {
    /// Site operator for one sensor
    Operator { sensor: String },
    /// Follow-up advocate (not tied to a sensor)
    Advocate,
}

/// One inbound signal referencing a candidate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Signal {
    NewCandidate(NewCandidate),
    LabelAdded {
        id: CandidateId,
        label: String,
    },
    LabelRemoved {
        id: CandidateId,
        label: String,
    },
    /// Free-text provenance note carrying one evidence fragment
    EvidenceFragment {
        id: CandidateId,
        note: String,
    },
    Signoff {
        id: CandidateId,
        role: SignoffRole,
        status: SignoffStatus,
    },
    Artifact {
        id: CandidateId,
        label: String,
        submitter: String,
        tag: String,
    },
}

impl Signal {
    /// The candidate the signal refers to.
    pub fn candidate_id(&self) -> &CandidateId {
        match self {
            Self::NewCandidate(seed) => &seed.id,
            Self::LabelAdded { id, .. }
            | Self::LabelRemoved { id, .. }
            | Self::EvidenceFragment { id, .. }
            | Self::Signoff { id, .. }
            | Self::Artifact { id, .. } => id,
        }
    }
}

/// One evidence fragment extracted from a provenance note.
#[derive(Clone, Debug, PartialEq)]
pub struct FragmentNote {
    pub pipeline: String,
    pub sensor: String,
    pub value: f64,
}

static FRAGMENT_NOTE: OnceLock<Regex> = OnceLock::new();

/// Extract (pipeline, sensor, value) from the literal phrasing
/// `"minimum glitch-FAP for <pipeline> at <sensor> ... is <value>"`.
///
/// Anything between the sensor and the trailing `is <value>` clause (such
/// as a time interval) is tolerated and ignored. The value is a
/// probability and must lie in `[0, 1]`; anything else (including NaN) is
/// rejected, which is what keeps the joint product monotone.
pub fn parse_fragment_note(note: &str) -> Result<FragmentNote, ParseError> {
    let re = FRAGMENT_NOTE.get_or_init(|| {
        Regex::new(r"minimum glitch-FAP for (\S+) at (\S+).*\bis\s+(\S+)\s*$")
            .expect("static fragment-note pattern compiles")
    });
    let captures = re
        .captures(note)
        .ok_or_else(|| ParseError::UnrecognizedNote(note.to_string()))?;
    let raw_value = &captures[3];
    let value = raw_value
        .parse::<f64>()
        .map_err(|e| ParseError::InvalidValue {
            value: raw_value.to_string(),
            reason: e.to_string(),
        })?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ParseError::InvalidValue {
            value: raw_value.to_string(),
            reason: "outside the [0, 1] probability range".to_string(),
        });
    }
    Ok(FragmentNote {
        pipeline: captures[1].to_string(),
        sensor: captures[2].to_string(),
        value,
    })
}
