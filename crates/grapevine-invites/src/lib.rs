//! Grapevine Invites - who issued which invite link
//!
//! When a member asks the bot for an invite link, the link is registered
//! here against that member. When someone later joins through the link, the
//! registry answers who brought them in. Unknown links resolve to an
//! `"unknown"` sentinel instead of failing, so a join is never blocked by a
//! missing attribution.
//!
//! The table lives only in memory and is owned by whoever processes chat
//! events; nothing here is persisted.

pub mod registry;
pub mod token;

pub use registry::{InviteRegistry, RegistryLimits, Resolution};
pub use token::{InviteRecord, InviteToken};
