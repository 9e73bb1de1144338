//! Sequential event loop.
//!
//! Pulls batches from an [`UpdateSource`] and hands every event to the
//! engine in arrival order. An event is fully handled before the next one
//! is looked at. Event handling failures are logged and skipped; polling
//! failures are retried with backoff when the platform says they may
//! succeed later, and end the loop otherwise.

use crate::engine::AttributionEngine;
use crate::error::Result;
use crate::events::ChatEvent;
use crate::platform::{ChatPlatform, PlatformError};
use async_trait::async_trait;
use std::future::Future;
use std::io::Write;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Source of chat events, in arrival order.
#[async_trait]
pub trait UpdateSource: Send {
    /// Wait for the next batch. `Ok(None)` means the source is exhausted.
    async fn next_batch(&mut self) -> std::result::Result<Option<Vec<ChatEvent>>, PlatformError>;
}

/// Counters from one dispatcher run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Events handed to the engine
    pub events: u64,
    /// Events whose handling returned an error
    pub failures: u64,
    /// Polls that failed and were retried
    pub poll_retries: u64,
}

/// Run until `shutdown` resolves, the source is exhausted, or polling fails
/// in a way that retrying will not fix.
pub async fn run<S, P, W, F>(
    engine: &mut AttributionEngine<P, W>,
    source: &mut S,
    shutdown: F,
) -> Result<DispatchStats>
where
    S: UpdateSource,
    P: ChatPlatform,
    W: Write,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut stats = DispatchStats::default();
    let mut backoff = INITIAL_BACKOFF;

    loop {
        let batch = tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested, stopping event loop");
                break;
            }
            batch = source.next_batch() => batch,
        };

        match batch {
            Ok(Some(events)) => {
                backoff = INITIAL_BACKOFF;
                if !events.is_empty() {
                    debug!("Received {} events", events.len());
                }
                for event in events {
                    stats.events += 1;
                    if let Err(e) = engine.handle(event).await {
                        stats.failures += 1;
                        warn!("Failed to handle event: {}", e);
                    }
                }
            }
            Ok(None) => {
                info!("Update source closed");
                break;
            }
            Err(e) if e.is_retryable() => {
                stats.poll_retries += 1;
                let delay = e.retry_after().unwrap_or(backoff);
                warn!("Polling failed, retrying in {:?}: {}", delay, e);
                tokio::select! {
                    _ = &mut shutdown => {
                        info!("Shutdown requested, stopping event loop");
                        break;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
            Err(e) => {
                error!("Polling failed permanently: {}", e);
                return Err(e.into());
            }
        }
    }

    Ok(stats)
}
