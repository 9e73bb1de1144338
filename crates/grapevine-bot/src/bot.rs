//! Grapevine bot - process wiring.
//!
//! Architecture:
//! - One append-only graph log, opened at startup and held until exit
//! - One in-memory invite registry, owned by the engine
//! - Telegram long polling feeding a single sequential event loop

use crate::config::BotConfig;
use crate::dispatcher::{self, DispatchStats};
use crate::engine::AttributionEngine;
use crate::error::Result;
use crate::telegram::{TelegramClient, TelegramPoller};
use grapevine_graph::GraphRecorder;
use grapevine_invites::InviteRegistry;
use std::future::Future;
use tracing::{error, info};

/// A configured, authenticated bot ready to process updates.
pub struct GrapevineBot {
    engine: AttributionEngine<TelegramClient>,
    poller: TelegramPoller,
}

impl GrapevineBot {
    /// Open the graph log and authenticate against the Bot API.
    ///
    /// The log is opened before authenticating; if authentication fails the
    /// recorder is dropped, and with it flushed and closed, on the way out.
    pub async fn new(config: BotConfig) -> Result<Self> {
        let recorder = GraphRecorder::open(&config.graph_log_path)?;

        let client = TelegramClient::new(&config.api_url, &config.api_token, config.request_timeout())?;
        let me = client.get_me().await?;
        info!("Authorized on account {}", me.identifier());

        let registry = InviteRegistry::with_limits(config.registry_limits());
        let engine = AttributionEngine::new(client.clone(), registry, recorder, config.engine_config());
        let poller = TelegramPoller::new(client, config.poll_timeout);

        Ok(Self { engine, poller })
    }

    /// Process updates until `shutdown` resolves.
    pub async fn run<F>(mut self, shutdown: F) -> Result<DispatchStats>
    where
        F: Future<Output = ()>,
    {
        info!("Grapevine bot listening for updates");
        let stats = dispatcher::run(&mut self.engine, &mut self.poller, shutdown).await?;
        info!(
            "Event loop stopped after {} events ({} failed, {} poll retries), {} edges recorded",
            stats.events,
            stats.failures,
            stats.poll_retries,
            self.engine.recorder().appended()
        );
        Ok(stats)
    }
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
