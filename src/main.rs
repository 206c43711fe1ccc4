//! Tanod - Telegram community management bot
//!
//! Group management for Filipino communities: moderation, leveling,
//! welcome/goodbye cards, suggestions, broadcasts and NSFW screening.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `database` - MongoDB models and repositories (with Moka caching)
//! - `pipeline` - Fixed-order admission gates run on every update
//! - `session` - Per-user conversational flow state
//! - `flows` - Multi-step wizards (age gate, suggestions, cards, broadcast)
//! - `permissions` - Admin checking
//! - `bot` - Dispatcher, polling/webhook runtime (Throttle for API limits)
//! - `plugins` - Command and callback handlers
//! - `events` - Member join/leave and plain-message side effects
//! - `broadcast` - Paged fan-out runner
//! - `render` - Welcome/goodbye card images
//! - `services` - Remote instance verification
//! - `utils` - Utility functions

mod bot;
mod broadcast;
mod config;
mod database;
mod events;
mod flows;
mod permissions;
mod pipeline;
mod plugins;
mod render;
mod services;
mod session;
mod utils;

use std::sync::Arc;

use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bot::AppState;
use config::Config;
use database::Database;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tanod=info,teloxide=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    info!("Starting Tanod bot...");

    let config = Arc::new(Config::from_env());
    info!("Configuration loaded");
    info!("Bot mode: {:?}", config.bot_mode);

    info!("Connecting to MongoDB...");
    let db = Database::connect(&config.mongodb_uri, &config.mongodb_database).await?;
    let db = Arc::new(db);

    // Throttle keeps us inside Telegram's per-chat and global send limits.
    let bot = Bot::new(&config.bot_token).throttle(Limits::default());

    let me = bot.get_me().await?;
    let bot_username = config
        .bot_username
        .clone()
        .unwrap_or_else(|| me.username().to_string());
    info!("Running as @{}", bot_username);

    if config.admin_ids.is_empty() {
        info!("No admin IDs configured (ADMIN_IDS is empty)");
    } else {
        info!("Admins: {:?}", config.admin_ids);
    }

    let state = AppState::new(db, Arc::clone(&config), bot_username);
    state.suggestions.ensure_indexes().await?;
    state.reports.ensure_indexes().await?;
    state.maintenance.load().await?;

    // The verify gate starts closed; the poller opens it on the first
    // successful check and keeps polling in the background.
    Arc::clone(&state.verify).spawn_loop();

    let dispatcher = bot::build_dispatcher(bot.clone(), state);
    bot::run(&config, dispatcher, bot).await
}
