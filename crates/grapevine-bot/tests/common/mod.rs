//! Shared fixtures for engine and dispatcher tests.

#![allow(dead_code)]

use async_trait::async_trait;
use grapevine_bot::{
    AttributionEngine, ChatEvent, ChatKind, ChatMessage, ChatPlatform, ChatUser, EngineConfig,
    InviteLinkRequest, JoinRequest, OutgoingMessage, PlatformError,
};
use grapevine_graph::GraphRecorder;
use grapevine_invites::{InviteRegistry, InviteToken};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

pub const ROOM: i64 = -1001234567890;

/// How the mock answers join approvals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approval {
    Approve,
    Decline,
    Fail,
}

#[derive(Debug, Default)]
struct Calls {
    approvals: Vec<(i64, i64)>,
    links: Vec<InviteLinkRequest>,
    sent: Vec<OutgoingMessage>,
    /// Edges in the watched log when each message went out
    edges_at_send: Vec<usize>,
}

/// Chat platform that records every call and answers from a script.
pub struct MockPlatform {
    calls: Mutex<Calls>,
    approval: Approval,
    fail_links: bool,
    fail_sends: bool,
    fixed_link: Option<String>,
    log_path: Option<PathBuf>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Calls::default()),
            approval: Approval::Approve,
            fail_links: false,
            fail_sends: false,
            fixed_link: None,
            log_path: None,
        }
    }

    pub fn with_approval(mut self, approval: Approval) -> Self {
        self.approval = approval;
        self
    }

    pub fn failing_links(mut self) -> Self {
        self.fail_links = true;
        self
    }

    pub fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    /// Hand out the same link text for every creation request.
    pub fn with_fixed_link(mut self, link: &str) -> Self {
        self.fixed_link = Some(link.to_string());
        self
    }

    /// Count the edges in `path` whenever a message is sent.
    pub fn watching_log(mut self, path: &Path) -> Self {
        self.log_path = Some(path.to_path_buf());
        self
    }

    pub fn approvals(&self) -> Vec<(i64, i64)> {
        self.calls.lock().unwrap().approvals.clone()
    }

    pub fn links(&self) -> Vec<InviteLinkRequest> {
        self.calls.lock().unwrap().links.clone()
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.calls.lock().unwrap().sent.clone()
    }

    pub fn edges_at_send(&self) -> Vec<usize> {
        self.calls.lock().unwrap().edges_at_send.clone()
    }

    fn logged_edges(&self) -> usize {
        match &self.log_path {
            Some(path) => std::fs::read_to_string(path)
                .map(|text| text.lines().filter(|l| !l.trim().is_empty()).count())
                .unwrap_or(0),
            None => 0,
        }
    }
}

#[async_trait]
impl ChatPlatform for MockPlatform {
    async fn approve_join(&self, chat_id: i64, user_id: i64) -> Result<bool, PlatformError> {
        self.calls.lock().unwrap().approvals.push((chat_id, user_id));
        match self.approval {
            Approval::Approve => Ok(true),
            Approval::Decline => Ok(false),
            Approval::Fail => Err(PlatformError::Api {
                code: Some(400),
                description: "Bad Request: HIDE_REQUESTER_MISSING".into(),
                retry_after: None,
            }),
        }
    }

    async fn create_invite_link(
        &self,
        request: &InviteLinkRequest,
    ) -> Result<InviteToken, PlatformError> {
        let mut calls = self.calls.lock().unwrap();
        calls.links.push(request.clone());
        if self.fail_links {
            return Err(PlatformError::Transport("connection reset".into()));
        }
        let link = match &self.fixed_link {
            Some(link) => link.clone(),
            None => format!("https://t.me/+link{}", calls.links.len()),
        };
        Ok(InviteToken::new(link))
    }

    async fn send_message(&self, message: &OutgoingMessage) -> Result<(), PlatformError> {
        let logged = self.logged_edges();
        let mut calls = self.calls.lock().unwrap();
        calls.sent.push(message.clone());
        calls.edges_at_send.push(logged);
        if self.fail_sends {
            return Err(PlatformError::Transport("timed out".into()));
        }
        Ok(())
    }
}

/// Log sink that rejects every write.
pub struct BrokenSink;

impl io::Write for BrokenSink {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only file system"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Engine writing to a log file in a fresh temp dir.
pub struct Harness {
    pub engine: AttributionEngine<MockPlatform, File>,
    pub log_path: PathBuf,
    _dir: TempDir,
}

impl Harness {
    pub fn new(platform: MockPlatform) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("invitegraph.jsonl");
        let recorder = GraphRecorder::open(&log_path).unwrap();
        let platform = platform.watching_log(&log_path);
        let mut config = EngineConfig::new(ROOM);
        config.room_name = "hackerdrinks".to_string();
        let engine = AttributionEngine::new(platform, InviteRegistry::new(), recorder, config);
        Self {
            engine,
            log_path,
            _dir: dir,
        }
    }

    pub fn edges(&self) -> Vec<grapevine_graph::SocialGraphEdge> {
        grapevine_graph::read_log(&self.log_path).unwrap()
    }
}

pub fn user(id: i64, username: &str) -> ChatUser {
    ChatUser::new(id, username, username.to_uppercase())
}

pub fn dm(message_id: i64, from: ChatUser, text: &str) -> ChatEvent {
    ChatEvent::Message(ChatMessage {
        message_id,
        chat_id: from.id,
        chat_kind: ChatKind::Private,
        from,
        text: text.to_string(),
        new_members: Vec::new(),
    })
}

pub fn group_message(message_id: i64, from: ChatUser, text: &str) -> ChatEvent {
    ChatEvent::Message(ChatMessage {
        message_id,
        chat_id: ROOM,
        chat_kind: ChatKind::Supergroup,
        from,
        text: text.to_string(),
        new_members: Vec::new(),
    })
}

pub fn members_added(message_id: i64, from: ChatUser, added: Vec<ChatUser>) -> ChatEvent {
    ChatEvent::Message(ChatMessage {
        message_id,
        chat_id: ROOM,
        chat_kind: ChatKind::Supergroup,
        from,
        text: String::new(),
        new_members: added,
    })
}

pub fn join(user: ChatUser, link: Option<&InviteToken>) -> ChatEvent {
    ChatEvent::JoinRequest(JoinRequest {
        chat_id: ROOM,
        user,
        invite_token: link.cloned(),
    })
}
