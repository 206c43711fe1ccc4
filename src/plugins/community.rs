//! Community features: AFK markers, trivia rounds, shoutouts and chat
//! rules.

use std::time::Instant;

use mongodb::bson::doc;
use rand::seq::SliceRandom;
use teloxide::prelude::*;
use teloxide::types::{Message, ParseMode};

use crate::bot::{AppState, ThrottledBot};
use crate::events::TRIVIA_ROUND_SECS;
use crate::plugins::require_admin;
use crate::utils::{format_duration, html_escape};

pub async fn afk(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    reason: &str,
) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    let reason = reason.trim();
    let reason = (!reason.is_empty()).then(|| reason.to_string());
    state.afk.set(user.id.0, reason.clone());

    let note = match reason {
        Some(r) => format!("💤 AFK na si {} — {}", html_escape(&user.first_name), html_escape(&r)),
        None => format!("💤 AFK na si {}.", html_escape(&user.first_name)),
    };
    bot.send_message(msg.chat.id, note).parse_mode(ParseMode::Html).await?;
    Ok(())
}

/// Question pool for trivia rounds. Answers are matched case-insensitively
/// against plain messages in the chat that started the round.
static TRIVIA_QUESTIONS: &[(&str, &str)] = &[
    ("Ano ang pambansang bulaklak ng Pilipinas?", "sampaguita"),
    ("Ilang isla mayroon ang Pilipinas (humigit-kumulang, sa libo)?", "7641"),
    ("Sino ang pambansang bayani ng Pilipinas?", "jose rizal"),
    ("Ano ang pinakamataas na bundok sa Pilipinas?", "apo"),
    ("Anong taon idineklara ang kalayaan ng Pilipinas?", "1898"),
    ("Ano ang kabisera ng Pilipinas?", "manila"),
    ("Ano ang pinakamaliit na lalawigan ng Pilipinas?", "batanes"),
    ("Anong hayop ang nasa harap ng barya na isang piso noon?", "kalabaw"),
];

pub async fn trivia(bot: &ThrottledBot, state: &AppState, msg: &Message) -> anyhow::Result<()> {
    if !require_admin(bot, state, msg).await? {
        return Ok(());
    }

    let now = Instant::now();
    if state.trivia.is_open(msg.chat.id.0, now) {
        bot.send_message(msg.chat.id, "May tumatakbong trivia round pa sa chat na ito.")
            .await?;
        return Ok(());
    }

    let Some((question, answer)) = TRIVIA_QUESTIONS.choose(&mut rand::thread_rng()) else {
        return Ok(());
    };

    let prize = state.config.levels.trivia_prize_xp;
    state.trivia.start(msg.chat.id.0, answer, prize, now);
    bot.send_message(
        msg.chat.id,
        format!(
            "🎲 <b>Trivia!</b> {question}\n\nUnang tamang sagot sa loob ng {TRIVIA_ROUND_SECS}s ay makakakuha ng {prize} XP."
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

pub async fn shoutout(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    text: &str,
) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    let text = text.trim();
    if text.is_empty() {
        bot.send_message(msg.chat.id, "Gamit: /shoutout <mensahe>").await?;
        return Ok(());
    }

    match state.shoutouts.try_claim(user.id.0, Instant::now()) {
        Ok(()) => {
            bot.send_message(
                msg.chat.id,
                format!(
                    "📢 Shoutout mula kay {}:\n\n{}",
                    html_escape(&user.first_name),
                    html_escape(text)
                ),
            )
            .parse_mode(ParseMode::Html)
            .await?;
        }
        Err(remaining) => {
            bot.send_message(
                msg.chat.id,
                format!(
                    "⏳ Isang shoutout lang kada 6 na oras. Subukan ulit pagkatapos ng {}.",
                    format_duration(remaining.as_secs())
                ),
            )
            .await?;
        }
    }
    Ok(())
}

pub async fn rules(bot: &ThrottledBot, state: &AppState, msg: &Message) -> anyhow::Result<()> {
    let text = match state.settings.rules(msg.chat.id.0).await? {
        Some(doc) => format!("📜 <b>Mga patakaran</b>\n\n{}", html_escape(&doc.text)),
        None => "📜 Wala pang naitakdang patakaran sa chat na ito. Ang admin ay maaaring mag-/setrules.".to_string(),
    };
    bot.send_message(msg.chat.id, text).parse_mode(ParseMode::Html).await?;
    Ok(())
}

pub async fn setrules(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    text: &str,
) -> anyhow::Result<()> {
    if !require_admin(bot, state, msg).await? {
        return Ok(());
    }
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    let text = text.trim();
    if text.is_empty() {
        bot.send_message(msg.chat.id, "Gamit: /setrules <patakaran>").await?;
        return Ok(());
    }

    state.settings.set_rules(msg.chat.id.0, text, user.id.0).await?;
    state.audit_log(user.id.0, "set_rules", doc! { "chat_id": msg.chat.id.0 });
    bot.send_message(msg.chat.id, "✅ Na-update ang mga patakaran ng chat.").await?;
    Ok(())
}

/// Save the replied-to message into the chat's quote book.
pub async fn quote(bot: &ThrottledBot, state: &AppState, msg: &Message) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let Some(reply) = msg.reply_to_message() else {
        bot.send_message(msg.chat.id, "Mag-reply sa mensahe na gusto mong i-save gamit ang /quote.")
            .await?;
        return Ok(());
    };

    let text = reply
        .text()
        .or_else(|| reply.caption())
        .map(str::to_string)
        .or_else(|| reply.sticker().map(|_| "[sticker]".to_string()));
    let Some(text) = text else {
        bot.send_message(msg.chat.id, "Walang teksto ang mensaheng iyan.").await?;
        return Ok(());
    };

    let author = reply.from.as_ref();
    let saved = state
        .quotes
        .add(
            msg.chat.id.0,
            reply.id.0,
            author.map(|a| a.id.0),
            author.map(|a| a.first_name.as_str()),
            &text,
            user.id.0,
        )
        .await?;
    state.audit_log(
        user.id.0,
        "add_quote",
        doc! { "chat_id": msg.chat.id.0, "quote_id": saved.quote_id },
    );
    bot.send_message(msg.chat.id, format!("💬 Naka-save bilang quote #{}.", saved.quote_id))
        .await?;
    Ok(())
}

pub async fn quotes(bot: &ThrottledBot, state: &AppState, msg: &Message) -> anyhow::Result<()> {
    let latest = state.quotes.latest(msg.chat.id.0, 10).await?;
    if latest.is_empty() {
        bot.send_message(msg.chat.id, "Wala pang quote sa chat na ito.").await?;
        return Ok(());
    }

    let mut lines = vec!["💬 <b>Mga quote ng chat</b>".to_string()];
    for q in latest {
        lines.push(format!(
            "#{} — {} — ni {}",
            q.quote_id,
            html_escape(&q.text),
            html_escape(q.author_name.as_deref().unwrap_or("di-kilala")),
        ));
    }
    bot.send_message(msg.chat.id, lines.join("\n"))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}
