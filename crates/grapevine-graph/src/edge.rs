//! Social graph edge model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier recorded when the inviter of a join cannot be determined.
pub const UNKNOWN_INVITER: &str = "unknown";

/// Numeric id recorded alongside [`UNKNOWN_INVITER`].
pub const UNKNOWN_INVITER_ID: i64 = 0;

/// How an invitee came to join the chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InviteKind {
    /// Joined through an approval-gated invite link.
    #[serde(rename = "invited_by_link")]
    LinkInvite,
    /// Added to the chat directly by an existing member.
    #[serde(rename = "direct_invite")]
    DirectInvite,
}

impl InviteKind {
    /// Wire name used in the log.
    pub const fn as_str(&self) -> &'static str {
        match self {
            InviteKind::LinkInvite => "invited_by_link",
            InviteKind::DirectInvite => "direct_invite",
        }
    }
}

impl fmt::Display for InviteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded attribution: `inviter` brought `invitee` into the chat.
///
/// Edges are immutable once written. The timestamp is assigned when the edge
/// is built, not taken from the chat platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialGraphEdge {
    /// Display identifier of the inviter, or [`UNKNOWN_INVITER`]
    pub inviter: String,

    /// Platform id of the inviter, or [`UNKNOWN_INVITER_ID`]
    pub inviter_id: i64,

    /// Display identifier of the new member
    pub invitee: String,

    /// Platform id of the new member
    pub invitee_id: i64,

    /// Attribution path
    pub invite_type: InviteKind,

    /// When the edge was recorded
    pub timestamp: DateTime<Utc>,
}

impl SocialGraphEdge {
    /// Build an edge stamped with the current time.
    pub fn new(
        inviter: impl Into<String>,
        inviter_id: i64,
        invitee: impl Into<String>,
        invitee_id: i64,
        invite_type: InviteKind,
    ) -> Self {
        Self::at(inviter, inviter_id, invitee, invitee_id, invite_type, Utc::now())
    }

    /// Build an edge with an explicit timestamp.
    pub fn at(
        inviter: impl Into<String>,
        inviter_id: i64,
        invitee: impl Into<String>,
        invitee_id: i64,
        invite_type: InviteKind,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            inviter: inviter.into(),
            inviter_id,
            invitee: invitee.into(),
            invitee_id,
            invite_type,
            timestamp,
        }
    }

    /// Whether the inviter could not be resolved.
    pub fn is_unattributed(&self) -> bool {
        self.inviter == UNKNOWN_INVITER && self.inviter_id == UNKNOWN_INVITER_ID
    }
}
