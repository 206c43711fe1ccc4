//! Core commands: registration, profile, status and housekeeping.

use chrono::Utc;
use teloxide::prelude::*;
use teloxide::types::{Message, ParseMode};

use crate::bot::{AppState, ThrottledBot};
use crate::database::models::AgeStatus;
use crate::session::Flow;
use crate::utils::{format_duration, html_escape, target};

pub async fn start(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    _payload: &str,
) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let doc = state.users.upsert(user).await?;

    let mut text = format!(
        "Kumusta, {}! 👋\n\nAko si Tanod, ang bantay ng komunidad. \
         Gamitin ang /help para makita ang lahat ng commands.",
        html_escape(&user.first_name)
    );

    if doc.age_status == AgeStatus::Unverified && msg.chat.is_private() {
        state.sessions.begin(user.id.0, Flow::AgePending);
        text.push_str(
            "\n\nBago tayo magpatuloy: kailan ka ipinanganak? \
             Isulat bilang YYYY-MM-DD (hal. 2005-07-14).",
        );
    }

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

pub async fn me(bot: &ThrottledBot, state: &AppState, msg: &Message) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    send_profile(bot, state, msg, user.id.0).await
}

pub async fn whois(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    args: &str,
) -> anyhow::Result<()> {
    match target::resolve(state, msg, args).await {
        Some(t) => send_profile(bot, state, msg, t.user_id).await,
        None => {
            bot.send_message(msg.chat.id, "Gamit: /whois <id|@username> o mag-reply sa user.")
                .await?;
            Ok(())
        }
    }
}

async fn send_profile(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    user_id: u64,
) -> anyhow::Result<()> {
    let Some(doc) = state.users.find(user_id).await? else {
        bot.send_message(msg.chat.id, "Hindi ko kilala ang user na iyan.")
            .await?;
        return Ok(());
    };

    let level = state.levels.get_or_create(user_id, None).await?;
    let warns = state.moderation.warns_of(user_id).await?.len();
    let age = match doc.age_status {
        AgeStatus::Verified => "verified",
        AgeStatus::Rejected => "rejected",
        AgeStatus::Unverified => "unverified",
    };

    bot.send_message(
        msg.chat.id,
        format!(
            "👤 <b>{}</b>\n\
             ID: <code>{}</code>\n\
             Level: {} ({} XP)\n\
             Warnings: {}\n\
             Edad: {}\n\
             Huling aktibo: {}",
            html_escape(&doc.display_name()),
            doc.user_id,
            level.level,
            level.xp,
            warns,
            age,
            doc.last_active.format("%Y-%m-%d %H:%M UTC")
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

pub async fn ping(bot: &ThrottledBot, _state: &AppState, msg: &Message) -> anyhow::Result<()> {
    bot.send_message(msg.chat.id, "🏓 Pong!").await?;
    Ok(())
}

pub async fn status(bot: &ThrottledBot, state: &AppState, msg: &Message) -> anyhow::Result<()> {
    let uptime = (Utc::now() - state.started_at).num_seconds().max(0) as u64;
    let users = state.users.count().await.unwrap_or(0);
    bot.send_message(
        msg.chat.id,
        format!(
            "✅ Gumagana ang bot.\nUptime: {}\nRehistradong users: {}",
            format_duration(uptime),
            users
        ),
    )
    .await?;
    Ok(())
}

pub async fn about(bot: &ThrottledBot, state: &AppState, msg: &Message) -> anyhow::Result<()> {
    bot.send_message(
        msg.chat.id,
        format!(
            "🤖 <b>Tanod</b> — bantay ng komunidad.\n\
             Leveling, moderation, welcome cards, mungkahi at broadcasts.\n\
             Makipag-ugnayan: @{}",
            state.bot_username
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

pub async fn cancel(bot: &ThrottledBot, state: &AppState, msg: &Message) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let had_flow = !state.sessions.flow(user.id.0).is_idle();
    state.sessions.clear(user.id.0);
    let reply = if had_flow {
        "Kinansela. Ano pa ang maitutulong ko?"
    } else {
        "Walang kasalukuyang flow na kakanselahin."
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

pub async fn feedback(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    text: &str,
) -> anyhow::Result<()> {
    let text = text.trim();
    if text.is_empty() {
        bot.send_message(msg.chat.id, "Gamit: /feedback <mensahe>").await?;
        return Ok(());
    }
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    let note = format!(
        "📬 Feedback mula kay {} (<code>{}</code>):\n{}",
        html_escape(&user.first_name),
        user.id.0,
        html_escape(text)
    );
    for admin_id in &state.config.admin_ids {
        let _ = bot
            .send_message(teloxide::types::ChatId(*admin_id as i64), note.clone())
            .parse_mode(ParseMode::Html)
            .await;
    }
    bot.send_message(msg.chat.id, "Salamat! Naipasa na ang iyong feedback.")
        .await?;
    Ok(())
}

pub async fn verifystatus(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
) -> anyhow::Result<()> {
    if !super::require_admin(bot, state, msg).await? {
        return Ok(());
    }
    let allowed = state.verify.allowed();
    let reason = state
        .verify
        .last_reason()
        .map(|r| format!("\nDahilan: {}", html_escape(&r)))
        .unwrap_or_default();
    bot.send_message(
        msg.chat.id,
        format!(
            "Instance verification: {}{}",
            if allowed { "✅ allowed" } else { "❌ denied" },
            reason
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}
