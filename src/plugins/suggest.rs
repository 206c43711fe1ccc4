//! Suggestion commands: the /suggest flow entry, tracking, voting and
//! the admin review tools.

use teloxide::prelude::*;
use teloxide::types::{Message, ParseMode};

use crate::bot::{AppState, ThrottledBot};
use crate::database::models::SuggestionStatus;
use crate::session::{Flow, SuggestionDraft};
use crate::utils::html_escape;

pub async fn suggest(bot: &ThrottledBot, state: &AppState, msg: &Message) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    state
        .sessions
        .begin(user.id.0, Flow::Suggestion(SuggestionDraft::default()));
    bot.send_message(
        msg.chat.id,
        "💡 Anong kategorya ang mungkahi mo? (hal. feature, bug, iba pa)",
    )
    .await?;
    Ok(())
}

pub async fn mysuggestions(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    let list = state.suggestions.by_user(user.id.0).await?;
    if list.is_empty() {
        bot.send_message(msg.chat.id, "Wala ka pang mungkahi. Subukan ang /suggest!")
            .await?;
        return Ok(());
    }

    let mut lines = vec!["💡 <b>Mga mungkahi mo</b>".to_string()];
    for s in list {
        lines.push(format!(
            "<code>{}</code> [{}] {} — {} boto",
            s.reference,
            s.status.label(),
            html_escape(&s.category),
            s.upvotes.len()
        ));
    }
    bot.send_message(msg.chat.id, lines.join("\n"))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

pub async fn track(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    args: &str,
) -> anyhow::Result<()> {
    let reference = args.trim();
    if reference.is_empty() {
        bot.send_message(msg.chat.id, "Gamit: /tracksuggestion SUG-00001").await?;
        return Ok(());
    }

    match state.suggestions.by_reference(reference).await? {
        Some(s) => {
            let reply = s
                .admin_reply
                .as_deref()
                .map(|r| format!("\nSagot ng admin: {}", html_escape(r)))
                .unwrap_or_default();
            bot.send_message(
                msg.chat.id,
                format!(
                    "<code>{}</code> — {}\nKategorya: {}\nBoto: {}\n{}{}",
                    s.reference,
                    s.status.label(),
                    html_escape(&s.category),
                    s.upvotes.len(),
                    html_escape(&s.content),
                    reply
                ),
            )
            .parse_mode(ParseMode::Html)
            .await?;
        }
        None => {
            bot.send_message(msg.chat.id, "Walang mungkahi sa reference na iyan.")
                .await?;
        }
    }
    Ok(())
}

pub async fn upvote(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    args: &str,
) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let reference = args.trim();
    if reference.is_empty() {
        bot.send_message(msg.chat.id, "Gamit: /upvote SUG-00001").await?;
        return Ok(());
    }

    let reply = if state.suggestions.upvote(reference, user.id.0).await? {
        "👍 Naitala ang boto mo!"
    } else {
        "Nakaboto ka na dito, o walang ganiyang mungkahi."
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

pub async fn top(bot: &ThrottledBot, state: &AppState, msg: &Message) -> anyhow::Result<()> {
    let list = state.suggestions.top(5).await?;
    if list.is_empty() {
        bot.send_message(msg.chat.id, "Wala pang pending na mungkahi.").await?;
        return Ok(());
    }

    let mut lines = vec!["🔝 <b>Top na mungkahi</b>".to_string()];
    for s in list {
        lines.push(format!(
            "<code>{}</code> ({} boto) — {}",
            s.reference,
            s.upvotes.len(),
            html_escape(&s.content)
        ));
    }
    bot.send_message(msg.chat.id, lines.join("\n"))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

pub async fn pending(bot: &ThrottledBot, state: &AppState, msg: &Message) -> anyhow::Result<()> {
    if !super::require_admin(bot, state, msg).await? {
        return Ok(());
    }

    let list = state.suggestions.pending().await?;
    if list.is_empty() {
        bot.send_message(msg.chat.id, "Walang pending na mungkahi. 🎉").await?;
        return Ok(());
    }

    let mut lines = vec![format!("📋 Pending na mungkahi ({}):", list.len())];
    for s in list.iter().take(15) {
        lines.push(format!(
            "<code>{}</code> [{}] {}",
            s.reference,
            html_escape(&s.category),
            html_escape(&s.content)
        ));
    }
    bot.send_message(msg.chat.id, lines.join("\n"))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Approve or reject: `/approvesuggestion SUG-00001 [sagot]`.
pub async fn review(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    args: &str,
    approve: bool,
) -> anyhow::Result<()> {
    if !super::require_admin(bot, state, msg).await? {
        return Ok(());
    }

    let mut parts = args.trim().splitn(2, char::is_whitespace);
    let reference = parts.next().unwrap_or_default().trim();
    let reply = parts.next().map(str::trim).filter(|s| !s.is_empty());
    if reference.is_empty() {
        bot.send_message(
            msg.chat.id,
            "Gamit: /approvesuggestion SUG-00001 [sagot] o /rejectsuggestion SUG-00001 [sagot]",
        )
        .await?;
        return Ok(());
    }

    let status = if approve {
        SuggestionStatus::Approved
    } else {
        SuggestionStatus::Rejected
    };
    if !state.suggestions.set_status(reference, status, reply).await? {
        bot.send_message(msg.chat.id, "Walang mungkahi sa reference na iyan.")
            .await?;
        return Ok(());
    }

    // Best-effort heads-up to the author.
    if let Some(s) = state.suggestions.by_reference(reference).await? {
        let verdict = if approve { "inaprubahan" } else { "tinanggihan" };
        let note = reply
            .map(|r| format!("\nSagot: {}", html_escape(r)))
            .unwrap_or_default();
        let _ = bot
            .send_message(
                teloxide::types::ChatId(s.user_id as i64),
                format!(
                    "Ang mungkahi mong <code>{}</code> ay {}.{}",
                    s.reference, verdict, note
                ),
            )
            .parse_mode(ParseMode::Html)
            .await;
    }

    bot.send_message(msg.chat.id, format!("Naitala: {} → {}.", reference, status.label()))
        .await?;
    Ok(())
}
