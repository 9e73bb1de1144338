//! Chat events the engine reacts to.
//!
//! These are platform-neutral; the Telegram adapter converts raw updates
//! into them and drops everything else as [`ChatEvent::Other`].

use grapevine_invites::InviteToken;

/// A chat participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatUser {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub is_bot: bool,
}

impl ChatUser {
    /// Create a user with a username.
    pub fn new(id: i64, username: impl Into<String>, first_name: impl Into<String>) -> Self {
        Self {
            id,
            username: Some(username.into()),
            first_name: first_name.into(),
            is_bot: false,
        }
    }

    /// Create a user that has no username set.
    pub fn without_username(id: i64, first_name: impl Into<String>) -> Self {
        Self {
            id,
            username: None,
            first_name: first_name.into(),
            is_bot: false,
        }
    }

    /// Name used in the graph and in messages: the username when set,
    /// otherwise the first name.
    pub fn identifier(&self) -> &str {
        match self.username.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.first_name,
        }
    }
}

/// Kind of conversation a message was sent in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
    Unknown,
}

impl ChatKind {
    /// Map the platform's chat type string.
    pub fn from_wire(kind: &str) -> Self {
        match kind {
            "private" => ChatKind::Private,
            "group" => ChatKind::Group,
            "supergroup" => ChatKind::Supergroup,
            "channel" => ChatKind::Channel,
            _ => ChatKind::Unknown,
        }
    }

    /// One-to-one conversation with the bot.
    pub fn is_private(&self) -> bool {
        matches!(self, ChatKind::Private)
    }
}

/// A user asked to join a chat through an approval-gated link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRequest {
    pub chat_id: i64,
    pub user: ChatUser,
    /// Link the request came through, if the platform reported one
    pub invite_token: Option<InviteToken>,
}

/// A message posted in some chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub message_id: i64,
    pub chat_id: i64,
    pub chat_kind: ChatKind,
    pub from: ChatUser,
    pub text: String,
    /// Members added to the chat by this message's sender
    pub new_members: Vec<ChatUser>,
}

/// One item from the event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    JoinRequest(JoinRequest),
    Message(ChatMessage),
    /// Anything the engine does not handle
    Other,
}
