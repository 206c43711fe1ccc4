//! Webhook mode via teloxide's built-in axum support.
//!
//! Registers the webhook with Telegram, spawns an axum server for
//! updates and deletes the webhook again on shutdown.

use std::net::SocketAddr;

use teloxide::prelude::*;
use teloxide::update_listeners::webhooks::{self, Options};
use tracing::info;
use url::Url;

use super::dispatcher::ThrottledBot;
use crate::config::Config;

pub async fn start_webhook(
    config: &Config,
    mut dispatcher: Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey>,
    bot: ThrottledBot,
) -> anyhow::Result<()> {
    let webhook_url = config
        .webhook_url
        .as_ref()
        .expect("WEBHOOK_URL must be set when BOT_MODE is webhook");
    let url = Url::parse(webhook_url)?;

    let address = SocketAddr::from(([0, 0, 0, 0], config.webhook_port));
    let mut options = Options::new(address, url.clone());
    if let Some(secret) = &config.webhook_secret {
        options = options.secret_token(secret.clone());
    }

    info!("Setting webhook URL: {}", url);
    info!("Listening on {}", address);

    let listener = webhooks::axum(bot, options).await?;
    dispatcher
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("Update listener error"),
        )
        .await;
    Ok(())
}
