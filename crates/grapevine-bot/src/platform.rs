//! Outbound actions on the chat platform.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grapevine_invites::InviteToken;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by platform calls.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The request never got a usable answer (connect, timeout, reset)
    #[error("transport error: {0}")]
    Transport(String),

    /// The platform answered with an error
    #[error("API error {code:?}: {description}")]
    Api {
        code: Option<i64>,
        description: String,
        retry_after: Option<u64>,
    },

    /// The platform answered successfully but the payload made no sense
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl PlatformError {
    /// Whether repeating the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            PlatformError::Transport(_) => true,
            PlatformError::Api { code: Some(code), .. } => *code == 429 || (500..600).contains(code),
            PlatformError::Api { code: None, .. } => false,
            PlatformError::Decode(_) => false,
        }
    }

    /// Delay requested by the platform before retrying, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            PlatformError::Api {
                retry_after: Some(secs),
                ..
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for PlatformError {
    fn from(e: reqwest::Error) -> Self {
        // Bot API URLs embed the credential.
        let e = e.without_url();
        if e.is_decode() {
            PlatformError::Decode(e.to_string())
        } else {
            PlatformError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for PlatformError {
    fn from(e: serde_json::Error) -> Self {
        PlatformError::Decode(e.to_string())
    }
}

/// Parameters for a new invite link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteLinkRequest {
    /// Room the link admits to
    pub chat_id: i64,
    /// Label shown to chat admins
    pub name: String,
    /// Moment the link stops working
    pub expires_at: DateTime<Utc>,
    /// Joins through the link wait for approval
    pub creates_join_request: bool,
}

/// A text message to post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub chat_id: i64,
    pub text: String,
    /// Message to thread the reply under
    pub reply_to: Option<i64>,
}

impl OutgoingMessage {
    /// A plain message to `chat_id`.
    pub fn new(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            reply_to: None,
        }
    }

    /// Thread this message under `message_id`.
    pub fn replying_to(mut self, message_id: i64) -> Self {
        self.reply_to = Some(message_id);
        self
    }
}

/// Actions the engine asks the chat platform to perform.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Approve a pending join request. `Ok(false)` means the platform
    /// answered but did not approve.
    async fn approve_join(&self, chat_id: i64, user_id: i64) -> Result<bool, PlatformError>;

    /// Create an invite link and return its token.
    async fn create_invite_link(
        &self,
        request: &InviteLinkRequest,
    ) -> Result<InviteToken, PlatformError>;

    /// Post a message.
    async fn send_message(&self, message: &OutgoingMessage) -> Result<(), PlatformError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(code: i64) -> PlatformError {
        PlatformError::Api {
            code: Some(code),
            description: "x".into(),
            retry_after: None,
        }
    }

    #[test]
    fn retry_classification() {
        assert!(PlatformError::Transport("timeout".into()).is_retryable());
        assert!(api(429).is_retryable());
        assert!(api(502).is_retryable());
        assert!(!api(400).is_retryable());
        assert!(!api(401).is_retryable());
        assert!(!PlatformError::Decode("bad".into()).is_retryable());
    }

    #[test]
    fn retry_after_is_reported() {
        let err = PlatformError::Api {
            code: Some(429),
            description: "Too Many Requests: retry after 7".into(),
            retry_after: Some(7),
        };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
        assert_eq!(api(500).retry_after(), None);
    }

    #[test]
    fn reply_threading() {
        let msg = OutgoingMessage::new(5, "hi").replying_to(42);
        assert_eq!(msg.reply_to, Some(42));
        assert_eq!(OutgoingMessage::new(5, "hi").reply_to, None);
    }
}
