//! Welcome/goodbye card commands. The actual configuration happens in
//! the card wizard flow; these commands start it and manage the result.

use mongodb::bson::doc;
use teloxide::prelude::*;
use teloxide::types::{InputFile, Message, ParseMode};

use crate::bot::{AppState, ThrottledBot};
use crate::database::models::CardConfigDoc;
use crate::render::CardSpec;
use crate::session::{CardDraft, CardKind, Flow};
use crate::utils::fill_template;

pub async fn setwelcome(bot: &ThrottledBot, state: &AppState, msg: &Message) -> anyhow::Result<()> {
    begin_wizard(bot, state, msg, CardKind::Welcome).await
}

pub async fn setgoodbye(bot: &ThrottledBot, state: &AppState, msg: &Message) -> anyhow::Result<()> {
    begin_wizard(bot, state, msg, CardKind::Goodbye).await
}

async fn begin_wizard(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    kind: CardKind,
) -> anyhow::Result<()> {
    if !super::require_admin(bot, state, msg).await? {
        return Ok(());
    }
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    state
        .sessions
        .begin(user.id.0, Flow::CardConfig(CardDraft::new(kind, msg.chat.id.0)));
    bot.send_message(
        msg.chat.id,
        format!(
            "I-configure natin ang {} card. Ano ang mensahe? \
             Puwede ang mga placeholder na {{name}}, {{group}}, at {{count}}.",
            kind.label()
        ),
    )
    .await?;
    Ok(())
}

pub async fn preview(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    kind: CardKind,
) -> anyhow::Result<()> {
    let config = state.settings.card_config(msg.chat.id.0).await?;

    let template = match kind {
        CardKind::Welcome => config
            .as_ref()
            .and_then(|c| c.welcome_message.clone())
            .unwrap_or_else(|| state.config.cards.welcome_message.clone()),
        CardKind::Goodbye => config
            .as_ref()
            .and_then(|c| c.goodbye_message.clone())
            .unwrap_or_else(|| state.config.cards.goodbye_message.clone()),
    };

    let name = msg
        .from
        .as_ref()
        .map(|u| u.first_name.as_str())
        .unwrap_or("Miyembro");
    let caption = fill_template(&template, name, msg.chat.title().unwrap_or("ang grupo"), 100);

    let spec = CardSpec {
        text_color: config
            .as_ref()
            .and_then(|c| c.text_color.clone())
            .or_else(|| Some(state.config.cards.text_color.clone())),
        background: config.as_ref().and_then(|c| c.background.clone()),
    };
    match state.renderer.render(&spec) {
        Ok(Some(png)) => {
            bot.send_photo(msg.chat.id, InputFile::memory(png))
                .caption(caption)
                .await?;
        }
        _ => {
            bot.send_message(msg.chat.id, caption).await?;
        }
    }
    Ok(())
}

pub async fn reset(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    kind: CardKind,
) -> anyhow::Result<()> {
    if !super::require_admin(bot, state, msg).await? {
        return Ok(());
    }

    let chat_id = msg.chat.id.0;
    if let Some(mut config) = state.settings.card_config(chat_id).await? {
        match kind {
            CardKind::Welcome => {
                config.welcome_message = None;
                config.welcome_enabled = true;
            }
            CardKind::Goodbye => {
                config.goodbye_message = None;
                config.goodbye_enabled = true;
            }
        }
        // Drop the shared fields only when both cards are reset.
        if config.welcome_message.is_none() && config.goodbye_message.is_none() {
            state.settings.reset_card_config(chat_id).await?;
        } else {
            state.settings.save_card_config(&config).await?;
        }
    }

    let sender = msg.from.as_ref().map(|u| u.id.0).unwrap_or(0);
    state.audit_log(
        sender,
        "reset_card",
        doc! { "chat_id": chat_id, "kind": kind.label() },
    );
    bot.send_message(
        msg.chat.id,
        format!("Ibinalik sa default ang {} card.", kind.label()),
    )
    .await?;
    Ok(())
}

pub async fn toggle(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    kind: CardKind,
) -> anyhow::Result<()> {
    if !super::require_admin(bot, state, msg).await? {
        return Ok(());
    }

    let chat_id = msg.chat.id.0;
    let mut config = state
        .settings
        .card_config(chat_id)
        .await?
        .unwrap_or_else(|| CardConfigDoc::new(chat_id));

    let enabled = match kind {
        CardKind::Welcome => {
            config.welcome_enabled = !config.welcome_enabled;
            config.welcome_enabled
        }
        CardKind::Goodbye => {
            config.goodbye_enabled = !config.goodbye_enabled;
            config.goodbye_enabled
        }
    };
    state.settings.save_card_config(&config).await?;
    let sender = msg.from.as_ref().map(|u| u.id.0).unwrap_or(0);
    state.audit_log(
        sender,
        "toggle_card",
        doc! { "chat_id": chat_id, "kind": kind.label(), "enabled": enabled },
    );

    bot.send_message(
        msg.chat.id,
        format!(
            "{} card: {}",
            kind.label(),
            if enabled { "✅ naka-on" } else { "❌ naka-off" }
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}
