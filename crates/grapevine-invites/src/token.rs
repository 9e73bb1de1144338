//! Invite token and the record stored against it.

use std::fmt;

/// Opaque invite link issued by the chat platform.
///
/// Anyone holding the token can ask to join the room, so neither `Debug`
/// nor `Display` print it; both show a short fingerprint instead.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InviteToken(String);

impl InviteToken {
    /// Wrap a token string as issued by the platform.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The full token text, suitable for sending to the requester.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 bytes of the blake3 hash, hex encoded.
    pub fn fingerprint(&self) -> String {
        let hash = blake3::hash(self.0.as_bytes());
        hex::encode(&hash.as_bytes()[..8])
    }
}

impl From<String> for InviteToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for InviteToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for InviteToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invite:{}", self.fingerprint())
    }
}

impl fmt::Debug for InviteToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InviteToken").field(&self.fingerprint()).finish()
    }
}

/// Who created an invite token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteRecord {
    /// Display identifier of the creator
    pub inviter_identity: String,

    /// Platform id of the creator
    pub inviter_id: i64,
}

impl InviteRecord {
    /// Identity reported for tokens the registry does not know.
    pub const UNKNOWN_IDENTITY: &'static str = "unknown";

    /// Create a record for a known inviter.
    pub fn new(inviter_identity: impl Into<String>, inviter_id: i64) -> Self {
        Self {
            inviter_identity: inviter_identity.into(),
            inviter_id,
        }
    }

    /// The sentinel record returned for unresolved tokens.
    pub fn unknown() -> Self {
        Self::new(Self::UNKNOWN_IDENTITY, 0)
    }

    /// Whether this is the unresolved sentinel.
    pub fn is_unknown(&self) -> bool {
        self.inviter_identity == Self::UNKNOWN_IDENTITY && self.inviter_id == 0
    }
}
