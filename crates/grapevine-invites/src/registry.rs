//! Token to inviter table.

use crate::token::{InviteRecord, InviteToken};
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Bounds applied to a registry. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryLimits {
    /// How long a registration stays resolvable
    pub retention: Option<Duration>,

    /// Maximum number of live registrations
    pub capacity: Option<usize>,
}

impl RegistryLimits {
    /// No expiry and no size bound.
    pub const fn unbounded() -> Self {
        Self {
            retention: None,
            capacity: None,
        }
    }
}

/// Result of looking a token up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The registered record, or the unknown sentinel
    pub record: InviteRecord,

    /// Whether the token was registered and still live
    pub found: bool,
}

#[derive(Debug)]
struct Entry {
    record: InviteRecord,
    registered_at: Instant,
    seq: u64,
}

/// In-memory table mapping invite tokens to their creators.
///
/// Re-registering a token replaces the previous record (last write wins).
/// Lookups never remove entries; with [`RegistryLimits`] set, entries older
/// than the retention window stop resolving and are swept on the next
/// registration, and the oldest entry is evicted once capacity is exceeded.
#[derive(Debug, Default)]
pub struct InviteRegistry {
    entries: HashMap<InviteToken, Entry>,
    /// Registration order, oldest first.
    order: BTreeMap<u64, InviteToken>,
    next_seq: u64,
    limits: RegistryLimits,
}

impl InviteRegistry {
    /// Create an unbounded registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the given bounds.
    pub fn with_limits(limits: RegistryLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    /// The bounds this registry enforces.
    pub fn limits(&self) -> RegistryLimits {
        self.limits
    }

    /// Record `inviter` as the creator of `token`.
    ///
    /// Returns the record this registration replaced, if any.
    pub fn register(
        &mut self,
        token: InviteToken,
        inviter_identity: impl Into<String>,
        inviter_id: i64,
    ) -> Option<InviteRecord> {
        self.register_at(token, InviteRecord::new(inviter_identity, inviter_id), Instant::now())
    }

    /// Record `record` for `token` as of `now`.
    pub fn register_at(
        &mut self,
        token: InviteToken,
        record: InviteRecord,
        now: Instant,
    ) -> Option<InviteRecord> {
        self.prune_expired(now);

        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, token.clone());

        let replaced = self.entries.insert(
            token.clone(),
            Entry {
                record,
                registered_at: now,
                seq,
            },
        );

        let replaced = replaced.map(|old| {
            self.order.remove(&old.seq);
            warn!(
                "Invite {} re-registered, replacing inviter {} ({})",
                token, old.record.inviter_identity, old.record.inviter_id
            );
            old.record
        });

        if let Some(capacity) = self.limits.capacity {
            while self.entries.len() > capacity.max(1) {
                if !self.evict_oldest() {
                    break;
                }
            }
        }

        replaced
    }

    /// Look up the creator of `token`.
    pub fn resolve(&self, token: &InviteToken) -> Resolution {
        self.resolve_at(token, Instant::now())
    }

    /// Look up the creator of `token` as of `now`.
    pub fn resolve_at(&self, token: &InviteToken, now: Instant) -> Resolution {
        match self.entries.get(token) {
            Some(entry) if !self.is_expired(entry, now) => Resolution {
                record: entry.record.clone(),
                found: true,
            },
            _ => Resolution {
                record: InviteRecord::unknown(),
                found: false,
            },
        }
    }

    /// Drop registrations older than the retention window.
    /// Returns the number of entries removed.
    pub fn prune_expired(&mut self, now: Instant) -> usize {
        if self.limits.retention.is_none() {
            return 0;
        }

        let mut removed = 0;
        while let Some((&seq, token)) = self.order.first_key_value() {
            let expired = self
                .entries
                .get(token)
                .map(|entry| self.is_expired(entry, now))
                .unwrap_or(true);
            if !expired {
                break;
            }
            if let Some(token) = self.order.remove(&seq) {
                self.entries.remove(&token);
                removed += 1;
            }
        }

        if removed > 0 {
            debug!("Pruned {} expired invites", removed);
        }
        removed
    }

    /// Number of stored registrations, including expired ones not yet pruned.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_expired(&self, entry: &Entry, now: Instant) -> bool {
        match self.limits.retention {
            Some(retention) => now.saturating_duration_since(entry.registered_at) > retention,
            None => false,
        }
    }

    fn evict_oldest(&mut self) -> bool {
        match self.order.pop_first() {
            Some((_, token)) => {
                self.entries.remove(&token);
                debug!("Evicted {} to stay within capacity", token);
                true
            }
            None => false,
        }
    }
}
