//! Invite attribution state machine.
//!
//! The engine turns chat events into graph edges:
//!
//! - **Join request via link**: approve the request, look up who issued the
//!   link, record a `LinkInvite` edge and welcome the new member.
//! - **Members added directly**: record a `DirectInvite` edge from the member
//!   who added them, one per added member, skipping self-joins.
//! - **Invite command in a private chat**: create a short-lived link for the
//!   managed room, remember who asked for it and reply with the link.
//!
//! Events are handled one at a time. The engine owns the registry and the
//! recorder outright, so `&mut self` is the only lock either needs.
//!
//! Graph writes and welcome messages are best effort: a failed append or
//! send is logged and the event carries on. Failed approve or create-link
//! calls end the event with an error for the dispatcher to log.

use crate::error::{Error, Result};
use crate::events::{ChatEvent, ChatMessage, ChatUser, JoinRequest};
use crate::platform::{ChatPlatform, InviteLinkRequest, OutgoingMessage};
use chrono::Utc;
use grapevine_graph::{GraphRecorder, InviteKind, SocialGraphEdge};
use grapevine_invites::{InviteRecord, InviteRegistry, InviteToken, Resolution};
use std::fs::File;
use std::io::Write;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Settings the engine needs from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Room that invite links admit to
    pub target_room: i64,

    /// Name of that room in replies
    pub room_name: String,

    /// Command that requests a link
    pub invite_command: String,

    /// Lifetime of issued links
    pub invite_validity: Duration,

    /// Label attached to issued links
    pub link_name: String,
}

impl EngineConfig {
    /// Defaults for the given target room.
    pub fn new(target_room: i64) -> Self {
        Self {
            target_room,
            room_name: "the group".to_string(),
            invite_command: "/invite".to_string(),
            invite_validity: crate::config::INVITE_VALIDITY,
            link_name: "tmp".to_string(),
        }
    }
}

/// What handling an event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A join request was approved and recorded.
    LinkJoin {
        edge: SocialGraphEdge,
        /// Whether the link's issuer was known
        attributed: bool,
    },
    /// The platform declined to approve a join request.
    JoinDeclined { user_id: i64 },
    /// A directly added member was recorded.
    DirectAdd { edge: SocialGraphEdge },
    /// An invite link was issued and registered.
    InviteIssued { token: InviteToken, requester_id: i64 },
}

/// Attribution engine over a chat platform and a graph log sink.
pub struct AttributionEngine<P: ChatPlatform, W: Write = File> {
    platform: P,
    registry: InviteRegistry,
    recorder: GraphRecorder<W>,
    config: EngineConfig,
}

impl<P: ChatPlatform, W: Write> AttributionEngine<P, W> {
    /// Create an engine from its collaborators.
    pub fn new(
        platform: P,
        registry: InviteRegistry,
        recorder: GraphRecorder<W>,
        config: EngineConfig,
    ) -> Self {
        Self {
            platform,
            registry,
            recorder,
            config,
        }
    }

    /// Handle one event. Unhandled event shapes produce no outcomes.
    pub async fn handle(&mut self, event: ChatEvent) -> Result<Vec<Outcome>> {
        match event {
            ChatEvent::JoinRequest(request) => {
                let outcome = self.handle_join_request(request).await?;
                Ok(vec![outcome])
            }
            ChatEvent::Message(message) => self.handle_message(message).await,
            ChatEvent::Other => Ok(Vec::new()),
        }
    }

    /// The invite registry.
    pub fn registry(&self) -> &InviteRegistry {
        &self.registry
    }

    /// The graph recorder.
    pub fn recorder(&self) -> &GraphRecorder<W> {
        &self.recorder
    }

    /// The chat platform.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    async fn handle_join_request(&mut self, request: JoinRequest) -> Result<Outcome> {
        let invitee = request.user.identifier().to_string();
        match &request.invite_token {
            Some(token) => info!("User {} asked to join chat {} via {}", invitee, request.chat_id, token),
            None => info!("User {} asked to join chat {} without a link", invitee, request.chat_id),
        }

        let approved = self
            .platform
            .approve_join(request.chat_id, request.user.id)
            .await?;
        if !approved {
            warn!("Join request from {} ({}) was not approved", invitee, request.user.id);
            return Ok(Outcome::JoinDeclined {
                user_id: request.user.id,
            });
        }

        let resolution = match &request.invite_token {
            Some(token) => self.registry.resolve(token),
            None => Resolution {
                record: InviteRecord::unknown(),
                found: false,
            },
        };
        if !resolution.found {
            match &request.invite_token {
                Some(token) => info!("No known issuer for {} used by {}", token, invitee),
                None => info!("No link to attribute {} to", invitee),
            }
        }

        let inviter = resolution.record;
        let edge = SocialGraphEdge::new(
            inviter.inviter_identity.clone(),
            inviter.inviter_id,
            invitee.clone(),
            request.user.id,
            InviteKind::LinkInvite,
        );
        self.record(&edge);

        let text = link_welcome(&invitee, &inviter.inviter_identity);
        self.notify(OutgoingMessage::new(request.chat_id, text)).await;

        Ok(Outcome::LinkJoin {
            edge,
            attributed: resolution.found,
        })
    }

    async fn handle_message(&mut self, message: ChatMessage) -> Result<Vec<Outcome>> {
        let mut outcomes = Vec::new();

        for member in &message.new_members {
            if member.id == message.from.id {
                debug!("{} joined on their own, not recording", member.identifier());
                continue;
            }
            let edge = self.record_direct_add(&message.from, member);
            self.notify(OutgoingMessage::new(message.chat_id, direct_welcome(member.identifier())))
                .await;
            outcomes.push(Outcome::DirectAdd { edge });
        }

        if is_command(&message.text, &self.config.invite_command) {
            if message.chat_kind.is_private() {
                outcomes.push(self.issue_invite(&message).await?);
            } else {
                debug!(
                    "Ignoring {} from {} outside a private chat",
                    self.config.invite_command,
                    message.from.identifier()
                );
            }
        }

        Ok(outcomes)
    }

    fn record_direct_add(&mut self, inviter: &ChatUser, invitee: &ChatUser) -> SocialGraphEdge {
        let edge = SocialGraphEdge::new(
            inviter.identifier(),
            inviter.id,
            invitee.identifier(),
            invitee.id,
            InviteKind::DirectInvite,
        );
        self.record(&edge);
        info!("User {} added by {}", edge.invitee, edge.inviter);
        edge
    }

    async fn issue_invite(&mut self, message: &ChatMessage) -> Result<Outcome> {
        let validity = chrono::Duration::from_std(self.config.invite_validity)
            .map_err(|e| Error::Config(format!("invite validity out of range: {}", e)))?;
        let request = InviteLinkRequest {
            chat_id: self.config.target_room,
            name: self.config.link_name.clone(),
            expires_at: Utc::now() + validity,
            creates_join_request: true,
        };

        let token = self.platform.create_invite_link(&request).await?;

        let requester = &message.from;
        info!("User {} created invite link {}", requester.identifier(), token);
        self.registry
            .register(token.clone(), requester.identifier(), requester.id);

        let text = format!(
            "Generated invite link for {}: {}\nThis link is valid for {}",
            self.config.room_name,
            token.as_str(),
            describe_validity(self.config.invite_validity)
        );
        self.notify(OutgoingMessage::new(message.chat_id, text).replying_to(message.message_id))
            .await;

        Ok(Outcome::InviteIssued {
            token,
            requester_id: requester.id,
        })
    }

    fn record(&mut self, edge: &SocialGraphEdge) {
        if let Err(e) = self.recorder.append(edge) {
            error!(
                "Failed to record {} edge {} -> {}: {}",
                edge.invite_type, edge.inviter, edge.invitee, e
            );
        }
    }

    async fn notify(&self, message: OutgoingMessage) {
        if let Err(e) = self.platform.send_message(&message).await {
            warn!("Failed to send message to chat {}: {}", message.chat_id, e);
        }
    }
}

/// Welcome for a member who joined through a link.
pub fn link_welcome(invitee: &str, inviter: &str) -> String {
    format!(
        "Say hello to {} who just joined us by invite from: {}",
        invitee, inviter
    )
}

/// Welcome for a member who was added directly.
pub fn direct_welcome(invitee: &str) -> String {
    format!("Hi welcome @{}!", invitee)
}

/// Whether `text` contains `command` as a word, optionally addressed to a
/// bot (`/invite@grapevine_bot`).
pub fn is_command(text: &str, command: &str) -> bool {
    text.split_whitespace().any(|word| match word.strip_prefix(command) {
        Some(rest) => rest.is_empty() || rest.starts_with('@'),
        None => false,
    })
}

fn describe_validity(validity: Duration) -> String {
    let secs = validity.as_secs();
    match secs {
        1 => "1 second".to_string(),
        60 => "1 minute".to_string(),
        s if s >= 60 && s % 60 == 0 => format!("{} minutes", s / 60),
        s => format!("{} seconds", s),
    }
}
