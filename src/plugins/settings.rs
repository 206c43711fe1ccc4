//! Per-user preferences and per-chat settings commands.

use chrono::{DateTime, NaiveTime, Utc};
use mongodb::bson::doc;
use teloxide::prelude::*;
use teloxide::types::Message;

use crate::bot::{AppState, ThrottledBot};
use crate::plugins::require_admin;

const SUPPORTED_LANGUAGES: &[&str] = &["fil", "en"];

pub async fn notify(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    args: &str,
) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    let enabled = match args.trim().to_lowercase().as_str() {
        "on" => true,
        "off" => false,
        "" | "toggle" => {
            let current = state
                .users
                .find(user.id.0)
                .await?
                .map(|u| u.notifications_enabled)
                .unwrap_or(true);
            !current
        }
        _ => {
            bot.send_message(msg.chat.id, "Gamit: /notify on|off").await?;
            return Ok(());
        }
    };

    state.users.set_notifications(user.id.0, enabled).await?;
    let reply = if enabled {
        "🔔 Bukas na ang mga abiso para sa iyo."
    } else {
        "🔕 Sarado na ang mga abiso para sa iyo."
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

pub async fn language(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    args: &str,
) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    let code = args.trim().to_lowercase();
    if code.is_empty() {
        let current = state
            .users
            .find(user.id.0)
            .await?
            .and_then(|u| u.language)
            .unwrap_or_else(|| "fil".to_string());
        bot.send_message(
            msg.chat.id,
            format!(
                "🌐 Kasalukuyang wika: {current}. Gamit: /language <{}>",
                SUPPORTED_LANGUAGES.join("|")
            ),
        )
        .await?;
        return Ok(());
    }

    if !SUPPORTED_LANGUAGES.contains(&code.as_str()) {
        bot.send_message(
            msg.chat.id,
            format!("Hindi suportado ang \"{code}\". Piliin sa: {}", SUPPORTED_LANGUAGES.join(", ")),
        )
        .await?;
        return Ok(());
    }

    state.users.set_language(user.id.0, &code).await?;
    bot.send_message(msg.chat.id, format!("🌐 Nakatakda na ang wika sa {code}.")).await?;
    Ok(())
}

fn valid_prefix(prefix: &str) -> bool {
    prefix.len() == 1
        && prefix
            .chars()
            .all(|c| c.is_ascii_punctuation() && c != '@' && c != '#')
}

pub async fn setprefix(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    args: &str,
) -> anyhow::Result<()> {
    if !require_admin(bot, state, msg).await? {
        return Ok(());
    }

    let prefix = args.trim();
    if !valid_prefix(prefix) {
        bot.send_message(
            msg.chat.id,
            "Gamit: /setprefix <isang bantas, hal. ! o .> — hindi pwede ang @ at #.",
        )
        .await?;
        return Ok(());
    }

    let mut settings = state.settings.chat_settings(msg.chat.id.0).await?;
    settings.command_prefix = Some(prefix.to_string());
    state.settings.save_chat_settings(&settings).await?;
    bot.send_message(
        msg.chat.id,
        format!("✅ Tatanggapin na rin ang mga command na nagsisimula sa \"{prefix}\" dito."),
    )
    .await?;
    Ok(())
}

pub async fn listprefix(bot: &ThrottledBot, state: &AppState, msg: &Message) -> anyhow::Result<()> {
    let mut prefixes: Vec<String> = state.config.prefixes.clone();
    if let Some(custom) = state
        .settings
        .chat_settings(msg.chat.id.0)
        .await?
        .command_prefix
    {
        if !prefixes.contains(&custom) {
            prefixes.push(custom);
        }
    }

    let listing = prefixes
        .iter()
        .map(|p| format!("\"{p}\""))
        .collect::<Vec<_>>()
        .join(", ");
    bot.send_message(msg.chat.id, format!("Mga tinatanggap na prefix dito: {listing}"))
        .await?;
    Ok(())
}

/// Maintenance control: `/maintenance on|off|schedule <start> <end>|cancel|status`.
pub async fn maintenance(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    args: &str,
) -> anyhow::Result<()> {
    if !require_admin(bot, state, msg).await? {
        return Ok(());
    }
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    const USAGE: &str = "Gamit: /maintenance <on|off|schedule <simula> <katapusan>|cancel|status>";
    let mut parts = args.split_whitespace();
    match parts.next() {
        Some(tok @ ("on" | "off")) => {
            let enabled = tok == "on";
            state.maintenance.set_enabled(enabled, None).await?;
            state.audit_log(user.id.0, "maintenance_toggle", doc! { "enabled": enabled });
            let reply = if enabled {
                "🔧 Naka-ON na ang maintenance mode. Mga admin lang ang papasok sa pipeline."
            } else {
                "✅ Naka-OFF na ang maintenance mode."
            };
            bot.send_message(msg.chat.id, reply).await?;
        }
        Some("schedule") => {
            let (Some(start), Some(end)) = (parts.next(), parts.next()) else {
                bot.send_message(
                    msg.chat.id,
                    "Gamit: /maintenance schedule <simula> <katapusan> (RFC 3339 o HH:MM UTC)",
                )
                .await?;
                return Ok(());
            };
            let (Some(start), Some(end)) = (parse_schedule_time(start), parse_schedule_time(end))
            else {
                bot.send_message(
                    msg.chat.id,
                    "Hindi mabasa ang oras. RFC 3339 (2026-08-28T22:00:00Z) o HH:MM (UTC).",
                )
                .await?;
                return Ok(());
            };
            if end <= start {
                bot.send_message(msg.chat.id, "Dapat mauna ang simula sa katapusan.").await?;
                return Ok(());
            }
            state.maintenance.schedule(start, end).await?;
            state.audit_log(
                user.id.0,
                "maintenance_schedule",
                doc! { "start": start.to_rfc3339(), "end": end.to_rfc3339() },
            );
            bot.send_message(
                msg.chat.id,
                format!(
                    "🗓 Naka-iskedyul ang maintenance: {} hanggang {}.",
                    start.format("%Y-%m-%d %H:%M UTC"),
                    end.format("%Y-%m-%d %H:%M UTC"),
                ),
            )
            .await?;
        }
        Some("cancel") => {
            state.maintenance.cancel_schedule().await?;
            state.audit_log(user.id.0, "maintenance_schedule_cancel", doc! {});
            bot.send_message(msg.chat.id, "Kinansela ang maintenance schedule.").await?;
        }
        Some("status") => {
            let s = state.maintenance.current();
            let window = match (s.scheduled_start, s.scheduled_end) {
                (Some(a), Some(b)) => format!(
                    "{} -> {}",
                    a.format("%Y-%m-%d %H:%M UTC"),
                    b.format("%Y-%m-%d %H:%M UTC")
                ),
                _ => "—".to_string(),
            };
            bot.send_message(
                msg.chat.id,
                format!(
                    "🔧 Maintenance\nNaka-ON: {}\nAktibo ngayon: {}\nIskedyul: {}",
                    if s.enabled { "oo" } else { "hindi" },
                    if state.maintenance.active(Utc::now()) { "oo" } else { "hindi" },
                    window,
                ),
            )
            .await?;
        }
        _ => {
            bot.send_message(msg.chat.id, USAGE).await?;
        }
    }
    Ok(())
}

/// Accepts an RFC 3339 datetime or a bare `HH:MM`, taken as today UTC.
fn parse_schedule_time(token: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(token) {
        return Some(dt.with_timezone(&Utc));
    }
    let time = NaiveTime::parse_from_str(token, "%H:%M").ok()?;
    Utc::now().date_naive().and_time(time).and_local_timezone(Utc).single()
}

#[cfg(test)]
mod tests {
    use super::valid_prefix;

    #[test]
    fn accepts_single_punctuation() {
        assert!(valid_prefix("!"));
        assert!(valid_prefix("."));
        assert!(valid_prefix("$"));
    }

    #[test]
    fn rejects_reserved_and_long() {
        assert!(!valid_prefix("@"));
        assert!(!valid_prefix("#"));
        assert!(!valid_prefix("!!"));
        assert!(!valid_prefix("a"));
        assert!(!valid_prefix(""));
    }

    #[test]
    fn schedule_time_accepts_rfc3339_and_hhmm() {
        let dt = super::parse_schedule_time("2026-08-28T22:00:00Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-08-28T22:00:00+00:00");
        assert!(super::parse_schedule_time("22:30").is_some());
        assert!(super::parse_schedule_time("mamaya").is_none());
        assert!(super::parse_schedule_time("25:69").is_none());
    }
}
