//! Telegram Bot API adapter.
//!
//! [`TelegramClient`] implements [`ChatPlatform`] over the HTTPS Bot API and
//! [`TelegramPoller`] turns `getUpdates` long polling into an
//! [`UpdateSource`]. Only the fields the engine uses are modelled; unknown
//! fields in responses are ignored.

use crate::dispatcher::UpdateSource;
use crate::events::{ChatEvent, ChatKind, ChatMessage, ChatUser, JoinRequest};
use crate::platform::{ChatPlatform, InviteLinkRequest, OutgoingMessage, PlatformError};
use async_trait::async_trait;
use grapevine_invites::InviteToken;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Update kinds requested from `getUpdates`.
const ALLOWED_UPDATES: [&str; 2] = ["message", "chat_join_request"];

// --- Wire types ---

/// Envelope around every Bot API response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
    pub parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseParameters {
    pub retry_after: Option<u64>,
}

impl<T> ApiResponse<T> {
    /// Convert the envelope into the result or an API error.
    pub fn into_result(self) -> Result<T, PlatformError> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            (true, None) => Err(PlatformError::Decode("ok response without result".into())),
            (false, _) => Err(PlatformError::Api {
                code: self.error_code,
                description: self.description.unwrap_or_default(),
                retry_after: self.parameters.and_then(|p| p.retry_after),
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

impl From<User> for ChatUser {
    fn from(u: User) -> Self {
        ChatUser {
            id: u.id,
            username: u.username,
            first_name: u.first_name,
            is_bot: u.is_bot,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    pub new_chat_members: Option<Vec<User>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatInviteLink {
    pub invite_link: String,
    pub name: Option<String>,
    pub expire_date: Option<i64>,
    #[serde(default)]
    pub creates_join_request: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatJoinRequest {
    pub chat: Chat,
    pub from: User,
    pub invite_link: Option<ChatInviteLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub chat_join_request: Option<ChatJoinRequest>,
}

impl From<Update> for ChatEvent {
    fn from(update: Update) -> Self {
        if let Some(request) = update.chat_join_request {
            return ChatEvent::JoinRequest(JoinRequest {
                chat_id: request.chat.id,
                user: request.from.into(),
                invite_token: request
                    .invite_link
                    .map(|link| InviteToken::new(link.invite_link)),
            });
        }

        match update.message {
            Some(Message {
                message_id,
                from: Some(from),
                chat,
                text,
                new_chat_members,
            }) => ChatEvent::Message(ChatMessage {
                message_id,
                chat_id: chat.id,
                chat_kind: ChatKind::from_wire(&chat.kind),
                from: from.into(),
                text: text.unwrap_or_default(),
                new_members: new_chat_members
                    .unwrap_or_default()
                    .into_iter()
                    .map(ChatUser::from)
                    .collect(),
            }),
            _ => ChatEvent::Other,
        }
    }
}

#[derive(Serialize)]
struct GetUpdatesParams<'a> {
    offset: i64,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Serialize)]
struct ApproveJoinParams {
    chat_id: i64,
    user_id: i64,
}

#[derive(Serialize)]
struct CreateInviteLinkParams<'a> {
    chat_id: i64,
    name: &'a str,
    expire_date: i64,
    creates_join_request: bool,
}

#[derive(Serialize)]
struct ReplyParameters {
    message_id: i64,
    allow_sending_without_reply: bool,
}

#[derive(Serialize)]
struct SendMessageParams<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_parameters: Option<ReplyParameters>,
}

#[derive(Serialize)]
struct NoParams {}

// --- Client ---

/// Bot API client.
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base: String,
}

impl TelegramClient {
    /// Create a client for `api_url` authenticated with `token`.
    pub fn new(api_url: &str, token: &str, timeout: Duration) -> Result<Self, PlatformError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        })
    }

    async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, PlatformError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!("Bot API call {}", method);
        let response = self
            .http
            .post(format!("{}/{}", self.base, method))
            .json(params)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;

        match serde_json::from_slice::<ApiResponse<R>>(&body) {
            Ok(envelope) => envelope.into_result(),
            Err(e) if !status.is_success() => Err(PlatformError::Api {
                code: Some(i64::from(status.as_u16())),
                description: format!("{} with undecodable body: {}", status, e),
                retry_after: None,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// The bot's own account; fails if the credential is rejected.
    pub async fn get_me(&self) -> Result<ChatUser, PlatformError> {
        let me: User = self.call("getMe", &NoParams {}).await?;
        Ok(me.into())
    }

    /// Long-poll for updates starting at `offset`.
    pub async fn get_updates(&self, offset: i64, timeout: Duration) -> Result<Vec<Update>, PlatformError> {
        let params = GetUpdatesParams {
            offset,
            timeout: timeout.as_secs(),
            allowed_updates: &ALLOWED_UPDATES,
        };
        self.call("getUpdates", &params).await
    }
}

#[async_trait]
impl ChatPlatform for TelegramClient {
    async fn approve_join(&self, chat_id: i64, user_id: i64) -> Result<bool, PlatformError> {
        self.call("approveChatJoinRequest", &ApproveJoinParams { chat_id, user_id })
            .await
    }

    async fn create_invite_link(
        &self,
        request: &InviteLinkRequest,
    ) -> Result<InviteToken, PlatformError> {
        let params = CreateInviteLinkParams {
            chat_id: request.chat_id,
            name: &request.name,
            expire_date: request.expires_at.timestamp(),
            creates_join_request: request.creates_join_request,
        };
        let link: ChatInviteLink = self.call("createChatInviteLink", &params).await?;
        if link.invite_link.is_empty() {
            return Err(PlatformError::Decode("created invite link is empty".into()));
        }
        Ok(InviteToken::new(link.invite_link))
    }

    async fn send_message(&self, message: &OutgoingMessage) -> Result<(), PlatformError> {
        let params = SendMessageParams {
            chat_id: message.chat_id,
            text: &message.text,
            reply_parameters: message.reply_to.map(|message_id| ReplyParameters {
                message_id,
                allow_sending_without_reply: true,
            }),
        };
        let _sent: Message = self.call("sendMessage", &params).await?;
        Ok(())
    }
}

// --- Poller ---

/// [`UpdateSource`] backed by `getUpdates` long polling.
pub struct TelegramPoller {
    client: TelegramClient,
    offset: i64,
    timeout: Duration,
}

impl TelegramPoller {
    /// Poll with `client`, waiting up to `timeout` per request.
    pub fn new(client: TelegramClient, timeout: Duration) -> Self {
        Self {
            client,
            offset: 0,
            timeout,
        }
    }

    /// Next update id the poller will ask for.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Convert a batch and advance past every update in it.
    fn accept(&mut self, updates: Vec<Update>) -> Vec<ChatEvent> {
        let mut events = Vec::with_capacity(updates.len());
        for update in updates {
            self.offset = self.offset.max(update.update_id + 1);
            events.push(ChatEvent::from(update));
        }
        events
    }
}

#[async_trait]
impl UpdateSource for TelegramPoller {
    async fn next_batch(&mut self) -> Result<Option<Vec<ChatEvent>>, PlatformError> {
        let updates = self.client.get_updates(self.offset, self.timeout).await?;
        Ok(Some(self.accept(updates)))
    }
}
