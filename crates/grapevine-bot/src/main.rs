//! Grapevine binary
//!
//! Telegram bot that records who invited whom into a group chat.

use grapevine_bot::{shutdown_signal, BotConfig, GrapevineBot};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grapevine=info,grapevine_bot=info,grapevine_invites=info,grapevine_graph=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Grapevine");

    let config = BotConfig::from_env()?;
    tracing::info!("  Log: {:?}", config.graph_log_path);
    tracing::info!("  Room: {} ({})", config.room_id, config.room_name);

    let bot = GrapevineBot::new(config).await?;
    bot.run(shutdown_signal()).await?;

    Ok(())
}
