//! Outbound notification kinds, history records and wire payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::CandidateId;

/// The fixed enumeration of outbound notification kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Preliminary,
    Initial,
    Update,
    Retraction,
}

impl NotificationKind {
    /// Initial and update notifications attach the current artifact;
    /// preliminary and retraction ones never do.
    pub fn carries_artifact(self) -> bool {
        matches!(self, Self::Initial | Self::Update)
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Preliminary => "preliminary",
            Self::Initial => "initial",
            Self::Update => "update",
            Self::Retraction => "retraction",
        };
        f.write_str(name)
    }
}

/// One successfully transmitted notification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SentNotification {
    pub kind: NotificationKind,
    /// Internal-only distribution (per-pipeline policy or global override)
    pub internal: bool,
    /// Whether the evidence-fragment set was complete at send time
    pub evidence_complete: bool,
    /// 1-based position in the candidate's sent history
    pub sequence: u32,
    pub sent_at: DateTime<Utc>,
}

/// One failed transmission attempt, deduplicated by kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FailedNotification {
    pub kind: NotificationKind,
    pub sequence: u32,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

/// Description of the artifact attached to a notification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    pub label: String,
    pub submitter: String,
    pub sequence: u32,
}

/// The payload handed to the external transmission channel.
///
/// Building a payload never mutates candidate state; history updates happen
/// only after the transmission outcome is known.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlertPayload {
    pub candidate_id: CandidateId,
    pub kind: NotificationKind,
    pub internal: bool,
    pub artifact: Option<ArtifactDescriptor>,
}
