//! Grapevine Bot - invite attribution for a Telegram group
//!
//! Watches a group chat and records, for every new member, who brought them
//! in. Members can DM the bot `/invite` to get a short-lived, approval-gated
//! link; whoever joins through it is attributed to them. Members added
//! directly are attributed to whoever added them.
//!
//! # Architecture
//!
//! - **Events**: platform-neutral chat events
//! - **Platform**: outbound actions (approve, create link, send)
//! - **Engine**: the attribution state machine
//! - **Dispatcher**: sequential event loop with poll retry
//! - **Telegram**: Bot API client and long poller
//!
//! # Example
//!
//! ```no_run
//! use grapevine_bot::{shutdown_signal, BotConfig, GrapevineBot};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BotConfig::from_env()?;
//!     let bot = GrapevineBot::new(config).await?;
//!     bot.run(shutdown_signal()).await?;
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod events;
pub mod platform;
pub mod telegram;

pub use bot::{shutdown_signal, GrapevineBot};
pub use config::{BotConfig, INVITE_VALIDITY};
pub use dispatcher::{DispatchStats, UpdateSource};
pub use engine::{AttributionEngine, EngineConfig, Outcome};
pub use error::{Error, Result};
pub use events::{ChatEvent, ChatKind, ChatMessage, ChatUser, JoinRequest};
pub use platform::{ChatPlatform, InviteLinkRequest, OutgoingMessage, PlatformError};
pub use telegram::{TelegramClient, TelegramPoller};
