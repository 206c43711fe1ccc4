//! Leveling commands: rank, leaderboard, badges, daily rewards and the
//! admin XP tools.

use chrono::Utc;
use mongodb::bson::doc;
use teloxide::prelude::*;
use teloxide::types::{Message, ParseMode};

use crate::bot::{AppState, ThrottledBot};
use crate::config::{next_tier, tier_for_level, LEVEL_TIERS};
use crate::utils::{html_escape, target};

pub async fn rank(bot: &ThrottledBot, state: &AppState, msg: &Message) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    let chat_id = if msg.chat.is_private() { None } else { Some(msg.chat.id.0) };
    let doc = state.levels.get_or_create(user.id.0, chat_id).await?;
    let tier = tier_for_level(doc.level).map(|t| t.name).unwrap_or("—");
    let next = next_tier(doc.level)
        .map(|t| format!("\nSusunod na tier: {} sa level {} ({} XP)", t.name, t.level, t.xp_required))
        .unwrap_or_default();

    bot.send_message(
        msg.chat.id,
        format!(
            "📊 {} — Level {} ({})\nXP: {}\nMensahe: {}{}",
            html_escape(&user.first_name),
            doc.level,
            tier,
            doc.xp,
            doc.total_messages,
            next
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

pub async fn leaderboard(bot: &ThrottledBot, state: &AppState, msg: &Message) -> anyhow::Result<()> {
    let chat_id = if msg.chat.is_private() { None } else { Some(msg.chat.id.0) };
    let top = state.levels.top(chat_id, 10).await?;
    if top.is_empty() {
        bot.send_message(msg.chat.id, "Wala pang XP dito. Mag-chat muna!").await?;
        return Ok(());
    }

    let mut lines = vec!["🏆 <b>Leaderboard</b>".to_string()];
    for (i, doc) in top.iter().enumerate() {
        let name = match state.users.find(doc.user_id).await? {
            Some(u) => u.display_name(),
            None => format!("User {}", doc.user_id),
        };
        lines.push(format!(
            "{}. {} — lvl {} ({} XP)",
            i + 1,
            html_escape(&name),
            doc.level,
            doc.xp
        ));
    }
    bot.send_message(msg.chat.id, lines.join("\n"))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

pub async fn tier_chart(bot: &ThrottledBot, _state: &AppState, msg: &Message) -> anyhow::Result<()> {
    let mut lines = vec!["🪜 <b>Mga tier</b>".to_string()];
    for tier in LEVEL_TIERS {
        lines.push(format!(
            "Level {} — {} ({} XP)",
            tier.level, tier.name, tier.xp_required
        ));
    }
    bot.send_message(msg.chat.id, lines.join("\n"))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

pub async fn badges(bot: &ThrottledBot, state: &AppState, msg: &Message) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let badges = state.levels.badges_of(user.id.0).await?;
    if badges.is_empty() {
        bot.send_message(msg.chat.id, "Wala ka pang badge. Tuloy lang sa pag-level up!")
            .await?;
        return Ok(());
    }

    let mut lines = vec!["🎖 <b>Mga badge mo</b>".to_string()];
    for b in badges {
        lines.push(format!(
            "• {} ({})",
            html_escape(&b.name),
            b.awarded_at.format("%Y-%m-%d")
        ));
    }
    bot.send_message(msg.chat.id, lines.join("\n"))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

pub async fn setlevel(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    args: &str,
) -> anyhow::Result<()> {
    if !super::require_admin(bot, state, msg).await? {
        return Ok(());
    }
    let Some(t) = target::resolve(state, msg, args).await else {
        bot.send_message(msg.chat.id, "Gamit: /setlevel <id|@username> <level>").await?;
        return Ok(());
    };
    let Ok(level) = t.rest.trim().parse::<u32>() else {
        bot.send_message(msg.chat.id, "Gamit: /setlevel <id|@username> <level>").await?;
        return Ok(());
    };

    let chat_id = if msg.chat.is_private() { None } else { Some(msg.chat.id.0) };
    state.levels.set_level(t.user_id, chat_id, level).await?;
    let sender = msg.from.as_ref().map(|u| u.id.0).unwrap_or(0);
    state.audit_log(
        sender,
        "set_level",
        doc! { "user_id": t.user_id as i64, "level": level as i64 },
    );
    bot.send_message(
        msg.chat.id,
        format!("Itinakda ang level ni {} sa {}.", html_escape(&t.name), level),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

pub async fn addxp(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    args: &str,
) -> anyhow::Result<()> {
    if !super::require_admin(bot, state, msg).await? {
        return Ok(());
    }
    let Some(t) = target::resolve(state, msg, args).await else {
        bot.send_message(msg.chat.id, "Gamit: /addxp <id|@username> <xp>").await?;
        return Ok(());
    };
    let Ok(amount) = t.rest.trim().parse::<i64>() else {
        bot.send_message(msg.chat.id, "Gamit: /addxp <id|@username> <xp>").await?;
        return Ok(());
    };

    let chat_id = if msg.chat.is_private() { None } else { Some(msg.chat.id.0) };
    let (_, after) = state.levels.add_xp(t.user_id, chat_id, amount).await?;
    let sender = msg.from.as_ref().map(|u| u.id.0).unwrap_or(0);
    state.audit_log(
        sender,
        "add_xp",
        doc! { "user_id": t.user_id as i64, "amount": amount },
    );
    bot.send_message(
        msg.chat.id,
        format!(
            "Nadagdagan ng {} XP si {} (level {} na, {} XP).",
            amount,
            html_escape(&t.name),
            after.level,
            after.xp
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

/// Base daily XP; the streak adds 5 per consecutive day, capped at x3.
const DAILY_BASE_XP: i64 = 25;
const DAILY_STREAK_BONUS: i64 = 5;

pub async fn daily(bot: &ThrottledBot, state: &AppState, msg: &Message) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = user.id.0;
    let now = Utc::now();

    let streak = match state.levels.last_daily_claim(user_id).await? {
        Some(last) => {
            let hours = (now - last.claimed_at).num_hours();
            if hours < 24 {
                let wait = 24 - hours.max(0);
                bot.send_message(
                    msg.chat.id,
                    format!("⏳ Nakuha mo na ang daily mo. Balik ka sa ~{} oras.", wait),
                )
                .await?;
                return Ok(());
            }
            // Streak continues within 48h, otherwise resets.
            if hours < 48 { last.streak + 1 } else { 1 }
        }
        None => 1,
    };

    let bonus = (DAILY_STREAK_BONUS * (streak as i64 - 1)).min(DAILY_BASE_XP * 2);
    let xp = DAILY_BASE_XP + bonus;
    state.levels.record_daily_claim(user_id, xp, streak).await?;
    let (_, after) = state.levels.add_xp(user_id, None, xp).await?;

    bot.send_message(
        msg.chat.id,
        format!(
            "🎁 +{} XP! Streak: {} araw. (Level {}, {} XP kabuuan)",
            xp, streak, after.level, after.xp
        ),
    )
    .await?;
    Ok(())
}

pub async fn streak(bot: &ThrottledBot, state: &AppState, msg: &Message) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let reply = match state.levels.last_daily_claim(user.id.0).await? {
        Some(last) => {
            let hours = (Utc::now() - last.claimed_at).num_hours();
            if hours < 48 {
                format!(
                    "🔥 Streak mo: {} araw. Huling claim: {} oras na ang nakalipas.",
                    last.streak,
                    hours.max(0)
                )
            } else {
                "Naputol na ang streak mo. Mag-/daily para magsimula ulit!".to_string()
            }
        }
        None => "Wala ka pang streak. Subukan ang /daily!".to_string(),
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}
