//! Admin surface for the NSFW screening gate: inspect effective
//! settings, flip per-chat overrides and review detection logs.

use mongodb::bson::doc;
use teloxide::prelude::*;
use teloxide::types::{Message, ParseMode};

use crate::bot::{AppState, ThrottledBot};
use crate::pipeline::effective;
use crate::plugins::require_admin;

pub async fn status(bot: &ThrottledBot, state: &AppState, msg: &Message) -> anyhow::Result<()> {
    if !require_admin(bot, state, msg).await? {
        return Ok(());
    }

    let settings = state.settings.chat_settings(msg.chat.id.0).await?;
    let eff = effective(&state.config.nsfw, &settings.nsfw);
    let overridden = |set: bool| if set { " (override)" } else { "" };

    bot.send_message(
        msg.chat.id,
        format!(
            "🔞 <b>NSFW screening</b>\n\
             Aktibo: {}{}\n\
             Threshold: {:.2}{}\n\
             Burahin kapag nadetect: {}{}\n\
             Abisuhan ang user: {}{}",
            eff.enabled,
            overridden(settings.nsfw.enabled.is_some()),
            eff.threshold,
            overridden(settings.nsfw.threshold.is_some()),
            eff.delete_on_detect,
            overridden(settings.nsfw.delete_on_detect.is_some()),
            eff.notify_user,
            overridden(settings.nsfw.notify_user.is_some()),
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

pub async fn toggle(bot: &ThrottledBot, state: &AppState, msg: &Message) -> anyhow::Result<()> {
    if !require_admin(bot, state, msg).await? {
        return Ok(());
    }

    let mut settings = state.settings.chat_settings(msg.chat.id.0).await?;
    let current = settings.nsfw.enabled.unwrap_or(state.config.nsfw.enabled);
    settings.nsfw.enabled = Some(!current);
    state.settings.save_chat_settings(&settings).await?;
    let sender = msg.from.as_ref().map(|u| u.id.0).unwrap_or(0);
    state.audit_log(
        sender,
        "nsfw_toggle",
        doc! { "chat_id": msg.chat.id.0, "enabled": !current },
    );

    let reply = if current {
        "🔞 Pinatay ang NSFW screening sa chat na ito."
    } else {
        "🔞 Binuksan ang NSFW screening sa chat na ito."
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

const CONFIG_USAGE: &str =
    "Gamit: /nsfwconfig <threshold|delete|notify> <value>\nHal.: /nsfwconfig threshold 0.45";

pub async fn configure(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    args: &str,
) -> anyhow::Result<()> {
    if !require_admin(bot, state, msg).await? {
        return Ok(());
    }

    let mut parts = args.split_whitespace();
    let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
        bot.send_message(msg.chat.id, CONFIG_USAGE).await?;
        return Ok(());
    };

    let mut settings = state.settings.chat_settings(msg.chat.id.0).await?;
    let reply = match key {
        "threshold" => match value.parse::<f32>() {
            Ok(t) if (0.0..=1.0).contains(&t) => {
                settings.nsfw.threshold = Some(t);
                format!("✅ Threshold nakatakda sa {t:.2}.")
            }
            _ => {
                bot.send_message(msg.chat.id, "Ang threshold ay dapat nasa 0.0 hanggang 1.0.")
                    .await?;
                return Ok(());
            }
        },
        "delete" => match parse_bool(value) {
            Some(v) => {
                settings.nsfw.delete_on_detect = Some(v);
                format!("✅ delete_on_detect = {v}.")
            }
            None => {
                bot.send_message(msg.chat.id, CONFIG_USAGE).await?;
                return Ok(());
            }
        },
        "notify" => match parse_bool(value) {
            Some(v) => {
                settings.nsfw.notify_user = Some(v);
                format!("✅ notify_user = {v}.")
            }
            None => {
                bot.send_message(msg.chat.id, CONFIG_USAGE).await?;
                return Ok(());
            }
        },
        _ => {
            bot.send_message(msg.chat.id, CONFIG_USAGE).await?;
            return Ok(());
        }
    };

    state.settings.save_chat_settings(&settings).await?;
    let sender = msg.from.as_ref().map(|u| u.id.0).unwrap_or(0);
    state.audit_log(
        sender,
        "nsfw_config",
        doc! { "chat_id": msg.chat.id.0, "key": key, "value": value },
    );
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "yes" => Some(true),
        "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

pub async fn logs(bot: &ThrottledBot, state: &AppState, msg: &Message) -> anyhow::Result<()> {
    if !require_admin(bot, state, msg).await? {
        return Ok(());
    }

    let entries = state.settings.nsfw_logs(10, 0).await?;
    if entries.is_empty() {
        bot.send_message(msg.chat.id, "Walang naka-log na NSFW detection.").await?;
        return Ok(());
    }

    let lines = entries
        .iter()
        .map(|e| {
            format!(
                "{} — user {} — {:.2} — {}",
                e.detected_at.format("%Y-%m-%d %H:%M"),
                e.user_id.map_or_else(|| "?".to_string(), |id| id.to_string()),
                e.confidence,
                e.action.label(),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    bot.send_message(msg.chat.id, format!("🔞 <b>Mga huling detection</b>\n{lines}"))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

pub async fn clear_logs(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    args: &str,
) -> anyhow::Result<()> {
    if !require_admin(bot, state, msg).await? {
        return Ok(());
    }

    let Ok(user_id) = args.trim().parse::<u64>() else {
        bot.send_message(msg.chat.id, "Gamit: /clearnsfwlog <user id>").await?;
        return Ok(());
    };

    let removed = state.settings.clear_nsfw_logs(user_id).await?;
    let sender = msg.from.as_ref().map(|u| u.id.0).unwrap_or(0);
    state.audit_log(
        sender,
        "clear_nsfw_logs",
        doc! { "user_id": user_id as i64, "removed": removed as i64 },
    );
    bot.send_message(
        msg.chat.id,
        format!("🧹 Tinanggal ang {removed} log entry para sa user {user_id}."),
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::parse_bool;

    #[test]
    fn bool_aliases() {
        assert_eq!(parse_bool("on"), Some(true));
        assert_eq!(parse_bool("FALSE"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
