//! Workflow states and the fixed transition order

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a candidate sits in the approval workflow.
///
/// The order is total and fixed: `New → AwaitingInitial → AwaitingUpdate →
/// Complete`. `Rejected` is terminal and reachable sideways from any
/// non-terminal state when a gate fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateState {
    /// Freshly sighted, no notification sent yet
    New,
    /// Preliminary notification sent, gathering evidence for the initial one
    AwaitingInitial,
    /// Initial notification sent, watching for updated artifacts
    AwaitingUpdate,
    /// Update notification sent; nothing left to do
    Complete,
    /// A gate failed; terminal and irreversible
    Rejected,
}

impl CandidateState {
    /// The next state in the fixed order, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::New => Some(Self::AwaitingInitial),
            Self::AwaitingInitial => Some(Self::AwaitingUpdate),
            Self::AwaitingUpdate => Some(Self::Complete),
            Self::Complete | Self::Rejected => None,
        }
    }

    /// Terminal states have no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Rejected)
    }

    /// Position along the forward order. `Rejected` sorts last so that any
    /// legal transition strictly increases the ordinal.
    pub fn ordinal(self) -> u8 {
        match self {
            Self::New => 0,
            Self::AwaitingInitial => 1,
            Self::AwaitingUpdate => 2,
            Self::Complete => 3,
            Self::Rejected => 4,
        }
    }

    /// Whether a transition from `self` to `to` respects the fixed order.
    pub fn may_transition(self, to: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == Self::Rejected || self.next() == Some(to)
    }
}

impl fmt::Display for CandidateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::New => "new",
            Self::AwaitingInitial => "awaiting_initial",
            Self::AwaitingUpdate => "awaiting_update",
            Self::Complete => "complete",
            Self::Rejected => "rejected",
        };
        f.write_str(name)
    }
}
