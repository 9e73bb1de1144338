//! Grapevine Graph - append-only invite attribution log
//!
//! Every time someone joins the managed chat, the bot records who brought
//! them in as a [`SocialGraphEdge`]. Edges are appended to a JSON-lines log
//! that is never rewritten; the log is the only durable state the bot keeps.
//!
//! # Example
//!
//! ```no_run
//! use grapevine_graph::{GraphRecorder, InviteKind, SocialGraphEdge};
//!
//! fn main() -> grapevine_graph::Result<()> {
//!     let mut recorder = GraphRecorder::open("invitegraph.jsonl")?;
//!     let edge = SocialGraphEdge::new("alice", 1, "bob", 2, InviteKind::LinkInvite);
//!     recorder.append(&edge)?;
//!     Ok(())
//! }
//! ```

pub mod edge;
pub mod error;
pub mod recorder;
pub mod tally;

pub use edge::{InviteKind, SocialGraphEdge, UNKNOWN_INVITER, UNKNOWN_INVITER_ID};
pub use error::{Error, Result};
pub use recorder::{read_edges, read_log, GraphRecorder};
pub use tally::{tally_by_inviter, InviterTally};
