//! FAQ browser: category keyboard, then question keyboard, then the
//! answer, with back navigation. All driven by `faq:`-namespaced
//! callbacks.

use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup, Message, ParseMode};

use crate::bot::{AppState, ThrottledBot};
use crate::utils::html_escape;

pub async fn faq(bot: &ThrottledBot, state: &AppState, msg: &Message) -> anyhow::Result<()> {
    let categories = state.faq.categories().await?;
    if categories.is_empty() {
        bot.send_message(msg.chat.id, "Wala pang FAQ entries.").await?;
        return Ok(());
    }

    bot.send_message(msg.chat.id, "❓ <b>FAQ</b> — pumili ng kategorya:")
        .parse_mode(ParseMode::Html)
        .reply_markup(category_keyboard(&categories))
        .await?;
    Ok(())
}

fn category_keyboard(categories: &[String]) -> InlineKeyboardMarkup {
    let rows = categories
        .iter()
        .map(|c| vec![InlineKeyboardButton::callback(c.clone(), format!("faq:cat:{c}"))])
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

fn question_keyboard(entries: &[(i64, String)]) -> InlineKeyboardMarkup {
    let mut rows = entries
        .iter()
        .map(|(id, q)| vec![InlineKeyboardButton::callback(q.clone(), format!("faq:q:{id}"))])
        .collect::<Vec<_>>();
    rows.push(vec![InlineKeyboardButton::callback(
        "« Bumalik",
        "faq:back:",
    )]);
    InlineKeyboardMarkup::new(rows)
}

pub async fn on_callback(
    bot: &ThrottledBot,
    state: &AppState,
    query: &CallbackQuery,
    action: &str,
    args: &str,
) -> anyhow::Result<Option<String>> {
    let Some(message) = query.message.as_ref() else {
        return Ok(None);
    };
    let chat_id = message.chat().id;
    let message_id = message.id();

    match action {
        "cat" => {
            let entries = state.faq.by_category(args).await?;
            if entries.is_empty() {
                return Ok(Some("Walang laman ang kategoryang iyan.".to_string()));
            }
            let listing: Vec<(i64, String)> = entries
                .iter()
                .map(|e| (e.faq_id, e.question.clone()))
                .collect();
            bot.edit_message_text(
                chat_id,
                message_id,
                format!("❓ <b>{}</b> — pumili ng tanong:", html_escape(args)),
            )
            .parse_mode(ParseMode::Html)
            .reply_markup(question_keyboard(&listing))
            .await?;
            Ok(None)
        }
        "q" => {
            let Ok(faq_id) = args.parse::<i64>() else {
                return Ok(Some("Sira ang FAQ id.".to_string()));
            };
            let Some(entry) = state.faq.get(faq_id).await? else {
                return Ok(Some("Wala na ang tanong na iyan.".to_string()));
            };
            let back = InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
                "« Bumalik",
                format!("faq:cat:{}", entry.category),
            )]]);
            bot.edit_message_text(
                chat_id,
                message_id,
                format!(
                    "<b>{}</b>\n\n{}",
                    html_escape(&entry.question),
                    html_escape(&entry.answer)
                ),
            )
            .parse_mode(ParseMode::Html)
            .reply_markup(back)
            .await?;
            Ok(None)
        }
        "back" => {
            let categories = state.faq.categories().await?;
            bot.edit_message_text(chat_id, message_id, "❓ <b>FAQ</b> — pumili ng kategorya:")
                .parse_mode(ParseMode::Html)
                .reply_markup(category_keyboard(&categories))
                .await?;
            Ok(None)
        }
        _ => Ok(Some("Hindi kilalang aksyon.".to_string())),
    }
}
