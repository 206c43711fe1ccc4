//! Member join/leave cards.
//!
//! Joins and leaves arrive as chat-member updates. The card image is a
//! capability: when the renderer yields nothing, the greeting goes out as
//! plain text with the same filled template.

use anyhow::Result;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{ChatMemberUpdated, InputFile, ParseMode};
use tracing::debug;

use crate::bot::{AppState, ThrottledBot};
use crate::render::CardSpec;
use crate::utils::{fill_template, html_escape};

pub fn join_handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter(is_join).endpoint(on_join)
}

pub fn leave_handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter(is_leave).endpoint(on_leave)
}

fn is_join(update: ChatMemberUpdated) -> bool {
    !update.old_chat_member.is_present()
        && update.new_chat_member.is_present()
        && !update.new_chat_member.user.is_bot
}

fn is_leave(update: ChatMemberUpdated) -> bool {
    update.old_chat_member.is_present()
        && !update.new_chat_member.is_present()
        && !update.old_chat_member.user.is_bot
}

async fn on_join(bot: ThrottledBot, update: ChatMemberUpdated, state: AppState) -> Result<()> {
    let chat = update.chat;
    let user = &update.new_chat_member.user;
    debug!("Member {} joined chat {}", user.id, chat.id);

    let config = state.settings.card_config(chat.id.0).await?;
    if let Some(c) = &config {
        if !c.welcome_enabled {
            return Ok(());
        }
    }

    let template = config
        .as_ref()
        .and_then(|c| c.welcome_message.clone())
        .unwrap_or_else(|| state.config.cards.welcome_message.clone());

    let count = bot.get_chat_member_count(chat.id).await.unwrap_or(0) as u64;
    let caption = fill_template(
        &template,
        &html_escape(&user.first_name),
        chat.title().unwrap_or("ang grupo"),
        count,
    );

    let spec = CardSpec {
        text_color: config
            .as_ref()
            .and_then(|c| c.text_color.clone())
            .or_else(|| Some(state.config.cards.text_color.clone())),
        background: config.as_ref().and_then(|c| c.background.clone()),
    };
    match state.renderer.render(&spec) {
        Ok(Some(png)) => {
            bot.send_photo(chat.id, InputFile::memory(png))
                .caption(caption)
                .parse_mode(ParseMode::Html)
                .await?;
        }
        _ => {
            bot.send_message(chat.id, caption)
                .parse_mode(ParseMode::Html)
                .await?;
        }
    }
    Ok(())
}

async fn on_leave(bot: ThrottledBot, update: ChatMemberUpdated, state: AppState) -> Result<()> {
    let chat = update.chat;
    let user = &update.old_chat_member.user;
    debug!("Member {} left chat {}", user.id, chat.id);

    let config = state.settings.card_config(chat.id.0).await?;
    if let Some(c) = &config {
        if !c.goodbye_enabled {
            return Ok(());
        }
    }

    let template = config
        .as_ref()
        .and_then(|c| c.goodbye_message.clone())
        .unwrap_or_else(|| state.config.cards.goodbye_message.clone());

    let text = fill_template(
        &template,
        &html_escape(&user.first_name),
        chat.title().unwrap_or("ang grupo"),
        0,
    );
    bot.send_message(chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}
