//! Moderation commands: bans (global), warnings, and per-chat mutes.

use chrono::{Duration, Utc};
use mongodb::bson::doc;
use teloxide::prelude::*;
use teloxide::types::{Message, ParseMode};

use crate::bot::{AppState, ThrottledBot};
use crate::database::models::UserRole;
use crate::utils::{html_escape, target};

pub async fn ban(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    args: &str,
) -> anyhow::Result<()> {
    if !super::require_admin(bot, state, msg).await? {
        return Ok(());
    }
    let Some(t) = target::resolve(state, msg, args).await else {
        bot.send_message(msg.chat.id, "Gamit: /ban <id|@username> [dahilan] o mag-reply.")
            .await?;
        return Ok(());
    };
    if state.permissions.is_admin(t.user_id).await {
        bot.send_message(msg.chat.id, "Hindi puwedeng i-ban ang isang admin.").await?;
        return Ok(());
    }

    let reason = if t.rest.is_empty() { None } else { Some(t.rest.clone()) };
    state.users.set_banned(t.user_id, true, reason.clone()).await?;
    let sender = msg.from.as_ref().map(|u| u.id.0).unwrap_or(0);
    state.audit_log(sender, "ban", doc! { "user_id": t.user_id as i64, "reason": reason.clone() });
    bot.send_message(
        msg.chat.id,
        format!(
            "🔨 Na-ban si {}{}.",
            html_escape(&t.name),
            reason
                .map(|r| format!(" — {}", html_escape(&r)))
                .unwrap_or_default()
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

pub async fn unban(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    args: &str,
) -> anyhow::Result<()> {
    if !super::require_admin(bot, state, msg).await? {
        return Ok(());
    }
    let Some(t) = target::resolve(state, msg, args).await else {
        bot.send_message(msg.chat.id, "Gamit: /unban <id|@username>").await?;
        return Ok(());
    };

    state.users.set_banned(t.user_id, false, None).await?;
    let sender = msg.from.as_ref().map(|u| u.id.0).unwrap_or(0);
    state.audit_log(sender, "unban", doc! { "user_id": t.user_id as i64 });
    bot.send_message(msg.chat.id, format!("✅ Na-unban si {}.", html_escape(&t.name)))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

pub async fn warn(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    args: &str,
) -> anyhow::Result<()> {
    if !super::require_admin(bot, state, msg).await? {
        return Ok(());
    }
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let Some(t) = target::resolve(state, msg, args).await else {
        bot.send_message(msg.chat.id, "Gamit: /warn <id|@username> [dahilan] o mag-reply.")
            .await?;
        return Ok(());
    };

    let reason = if t.rest.is_empty() { "walang dahilan" } else { &t.rest };
    state.moderation.add_warn(t.user_id, user.id.0, reason).await?;
    state.audit_log(user.id.0, "warn", doc! { "user_id": t.user_id as i64, "reason": reason });
    let total = state.moderation.warns_of(t.user_id).await?.len();
    bot.send_message(
        msg.chat.id,
        format!(
            "⚠️ Binigyan ng warning si {} ({} na lahat) — {}",
            html_escape(&t.name),
            total,
            html_escape(reason)
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

pub async fn warnings(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    args: &str,
) -> anyhow::Result<()> {
    let target = match target::resolve(state, msg, args).await {
        Some(t) => t,
        // Without a target, show the sender's own warnings.
        None => match msg.from.as_ref() {
            Some(u) => target::Target {
                user_id: u.id.0,
                name: u.first_name.clone(),
                rest: String::new(),
            },
            None => return Ok(()),
        },
    };

    let warns = state.moderation.warns_of(target.user_id).await?;
    if warns.is_empty() {
        bot.send_message(
            msg.chat.id,
            format!("Walang warning si {}.", html_escape(&target.name)),
        )
        .parse_mode(ParseMode::Html)
        .await?;
        return Ok(());
    }

    let mut lines = vec![format!(
        "⚠️ Mga warning ni {} ({}):",
        html_escape(&target.name),
        warns.len()
    )];
    for w in warns {
        lines.push(format!(
            "• {} — {}",
            w.created_at.format("%Y-%m-%d"),
            html_escape(&w.reason)
        ));
    }
    bot.send_message(msg.chat.id, lines.join("\n"))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

pub async fn clearwarnings(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    args: &str,
) -> anyhow::Result<()> {
    if !super::require_admin(bot, state, msg).await? {
        return Ok(());
    }
    let Some(t) = target::resolve(state, msg, args).await else {
        bot.send_message(msg.chat.id, "Gamit: /clearwarnings <id|@username>").await?;
        return Ok(());
    };

    let cleared = state.moderation.clear_warns(t.user_id).await?;
    let sender = msg.from.as_ref().map(|u| u.id.0).unwrap_or(0);
    state.audit_log(
        sender,
        "clear_warnings",
        doc! { "user_id": t.user_id as i64, "cleared": cleared as i64 },
    );
    bot.send_message(
        msg.chat.id,
        format!("Binura ang {} warning ni {}.", cleared, html_escape(&t.name)),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

pub async fn mute(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    args: &str,
) -> anyhow::Result<()> {
    if !super::require_admin(bot, state, msg).await? {
        return Ok(());
    }
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let Some(t) = target::resolve(state, msg, args).await else {
        bot.send_message(msg.chat.id, "Gamit: /mute <id|@username> [minuto] o mag-reply.")
            .await?;
        return Ok(());
    };
    if state.permissions.is_admin(t.user_id).await {
        bot.send_message(msg.chat.id, "Hindi puwedeng i-mute ang isang admin.").await?;
        return Ok(());
    }

    let minutes: Option<i64> = t.rest.split_whitespace().next().and_then(|s| s.parse().ok());
    let until = minutes.map(|m| Utc::now() + Duration::minutes(m.max(1)));
    state
        .moderation
        .add_mute(t.user_id, msg.chat.id.0, user.id.0, None, until)
        .await?;
    state.audit_log(
        user.id.0,
        "mute",
        doc! {
            "user_id": t.user_id as i64,
            "chat_id": msg.chat.id.0,
            "until": until.map(|u| u.to_rfc3339()),
        },
    );

    let span = minutes
        .map(|m| format!(" nang {} minuto", m.max(1)))
        .unwrap_or_else(|| " nang walang takda".to_string());
    bot.send_message(
        msg.chat.id,
        format!("🔇 Na-mute si {}{}.", html_escape(&t.name), span),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

pub async fn unmute(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    args: &str,
) -> anyhow::Result<()> {
    if !super::require_admin(bot, state, msg).await? {
        return Ok(());
    }
    let Some(t) = target::resolve(state, msg, args).await else {
        bot.send_message(msg.chat.id, "Gamit: /unmute <id|@username>").await?;
        return Ok(());
    };

    let removed = state.moderation.remove_mute(t.user_id, msg.chat.id.0).await?;
    if removed {
        let sender = msg.from.as_ref().map(|u| u.id.0).unwrap_or(0);
        state.audit_log(
            sender,
            "unmute",
            doc! { "user_id": t.user_id as i64, "chat_id": msg.chat.id.0 },
        );
    }
    let reply = if removed {
        format!("🔊 Na-unmute si {}.", html_escape(&t.name))
    } else {
        format!("Hindi naka-mute si {} dito.", html_escape(&t.name))
    };
    bot.send_message(msg.chat.id, reply)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

pub async fn mutelist(bot: &ThrottledBot, state: &AppState, msg: &Message) -> anyhow::Result<()> {
    if !super::require_admin(bot, state, msg).await? {
        return Ok(());
    }

    let mutes = state.moderation.active_mutes(msg.chat.id.0).await?;
    if mutes.is_empty() {
        bot.send_message(msg.chat.id, "Walang naka-mute sa chat na ito.").await?;
        return Ok(());
    }

    let mut lines = vec!["🔇 Mga naka-mute:".to_string()];
    for m in mutes {
        let name = match state.users.find(m.user_id).await? {
            Some(u) => u.display_name(),
            None => format!("User {}", m.user_id),
        };
        let until = m
            .muted_until
            .map(|u| format!(" hanggang {}", u.format("%Y-%m-%d %H:%M UTC")))
            .unwrap_or_else(|| " (walang takda)".to_string());
        lines.push(format!("• {}{}", html_escape(&name), until));
    }
    bot.send_message(msg.chat.id, lines.join("\n"))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Grant or revoke the stored admin role. Super admin only.
pub async fn set_role(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    args: &str,
    role: UserRole,
) -> anyhow::Result<()> {
    let sender = msg.from.as_ref().map(|u| u.id.0).unwrap_or(0);
    if !state.permissions.is_super_admin(sender) {
        bot.send_message(msg.chat.id, "🚫 Para lang ito sa super admin.").await?;
        return Ok(());
    }
    let Some(t) = target::resolve(state, msg, args).await else {
        bot.send_message(msg.chat.id, "Gamit: /promote <id|@username> o mag-reply.")
            .await?;
        return Ok(());
    };

    state.users.set_role(t.user_id, role).await?;
    state.audit_log(
        sender,
        "set_role",
        doc! { "user_id": t.user_id as i64, "role": format!("{role:?}") },
    );
    let reply = match role {
        UserRole::Admin => format!("⭐ Admin na si {}.", html_escape(&t.name)),
        UserRole::Member => format!("Tinanggal ang admin role ni {}.", html_escape(&t.name)),
    };
    bot.send_message(msg.chat.id, reply)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

pub async fn users(bot: &ThrottledBot, state: &AppState, msg: &Message) -> anyhow::Result<()> {
    if !super::require_admin(bot, state, msg).await? {
        return Ok(());
    }

    let recent = state.users.recent(20).await?;
    if recent.is_empty() {
        bot.send_message(msg.chat.id, "Wala pang rehistradong user.").await?;
        return Ok(());
    }

    let mut lines = vec!["👥 <b>Mga kamakailang aktibo</b>".to_string()];
    for u in recent {
        lines.push(format!(
            "{} — {} — huling aktibo {}",
            u.user_id,
            u.username
                .map(|n| format!("@{}", html_escape(&n)))
                .unwrap_or_else(|| html_escape(&u.first_name)),
            u.last_active.format("%Y-%m-%d %H:%M"),
        ));
    }
    bot.send_message(msg.chat.id, lines.join("\n"))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

pub async fn userinfo(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    args: &str,
) -> anyhow::Result<()> {
    if !super::require_admin(bot, state, msg).await? {
        return Ok(());
    }
    let Some(t) = target::resolve(state, msg, args).await else {
        bot.send_message(msg.chat.id, "Gamit: /userinfo <id|@username> o mag-reply.")
            .await?;
        return Ok(());
    };
    let Some(user) = state.users.find(t.user_id).await? else {
        bot.send_message(msg.chat.id, "Hindi kilala ang user na iyan.").await?;
        return Ok(());
    };

    let level = state.levels.get_or_create(user.user_id, None).await?;
    let text = format!(
        "🪪 <b>{}</b>\n\
         ID: {}\n\
         Username: {}\n\
         Role: {:?}\n\
         Banned: {}{}\n\
         Wika: {}\n\
         Notifications: {}\n\
         Level {} — {} XP\n\
         Huling aktibo: {}",
        html_escape(&user.first_name),
        user.user_id,
        user.username.map(|n| format!("@{}", html_escape(&n))).unwrap_or_else(|| "—".into()),
        user.role,
        if user.is_banned { "oo" } else { "hindi" },
        user.ban_reason
            .map(|r| format!(" ({})", html_escape(&r)))
            .unwrap_or_default(),
        user.language.unwrap_or_else(|| "—".into()),
        if user.notifications_enabled { "on" } else { "off" },
        level.level,
        level.xp,
        user.last_active.format("%Y-%m-%d %H:%M"),
    );
    bot.send_message(msg.chat.id, text).parse_mode(ParseMode::Html).await?;
    Ok(())
}

pub async fn lookup(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    args: &str,
) -> anyhow::Result<()> {
    if !super::require_admin(bot, state, msg).await? {
        return Ok(());
    }
    let username = args.trim().trim_start_matches('@');
    if username.is_empty() {
        bot.send_message(msg.chat.id, "Gamit: /lookup <username>").await?;
        return Ok(());
    }

    match state.users.find_by_username(username).await? {
        Some(u) => {
            bot.send_message(
                msg.chat.id,
                format!(
                    "Nahanap: {} — @{} — {}",
                    u.user_id,
                    html_escape(u.username.as_deref().unwrap_or(username)),
                    html_escape(&u.first_name),
                ),
            )
            .parse_mode(ParseMode::Html)
            .await?;
        }
        None => {
            bot.send_message(msg.chat.id, "Walang nahanap.").await?;
        }
    }
    Ok(())
}
