//! Per-inviter summaries of a graph log.

use crate::edge::{InviteKind, SocialGraphEdge};
use serde::Serialize;
use std::collections::BTreeMap;

/// Invite counts for one inviter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InviterTally {
    pub inviter: String,
    pub inviter_id: i64,
    pub by_link: u64,
    pub direct: u64,
}

impl InviterTally {
    /// Total invitees attributed to this inviter.
    pub fn total(&self) -> u64 {
        self.by_link + self.direct
    }
}

/// Group edges by inviter, ordered by descending total then name.
///
/// Inviters are keyed by `(inviter, inviter_id)` so that a renamed account
/// shows up once per name it used.
pub fn tally_by_inviter<'a, I>(edges: I) -> Vec<InviterTally>
where
    I: IntoIterator<Item = &'a SocialGraphEdge>,
{
    let mut map: BTreeMap<(String, i64), InviterTally> = BTreeMap::new();

    for edge in edges {
        let entry = map
            .entry((edge.inviter.clone(), edge.inviter_id))
            .or_insert_with(|| InviterTally {
                inviter: edge.inviter.clone(),
                inviter_id: edge.inviter_id,
                ..Default::default()
            });
        match edge.invite_type {
            InviteKind::LinkInvite => entry.by_link += 1,
            InviteKind::DirectInvite => entry.direct += 1,
        }
    }

    let mut tallies: Vec<_> = map.into_values().collect();
    tallies.sort_by(|a, b| b.total().cmp(&a.total()).then_with(|| a.inviter.cmp(&b.inviter)));
    tallies
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_each_kind_separately() {
        let edges = vec![
            SocialGraphEdge::new("alice", 1, "bob", 2, InviteKind::LinkInvite),
            SocialGraphEdge::new("alice", 1, "carol", 3, InviteKind::DirectInvite),
            SocialGraphEdge::new("alice", 1, "dave", 4, InviteKind::LinkInvite),
            SocialGraphEdge::new("unknown", 0, "erin", 5, InviteKind::LinkInvite),
        ];

        let tallies = tally_by_inviter(&edges);
        assert_eq!(tallies.len(), 2);
        assert_eq!(tallies[0].inviter, "alice");
        assert_eq!(tallies[0].by_link, 2);
        assert_eq!(tallies[0].direct, 1);
        assert_eq!(tallies[1].inviter, "unknown");
        assert_eq!(tallies[1].total(), 1);
    }

    #[test]
    fn empty_log_has_no_tallies() {
        assert!(tally_by_inviter(&Vec::<SocialGraphEdge>::new()).is_empty());
    }
}
