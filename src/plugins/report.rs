//! Report commands: member reports against messages and the admin
//! review queue with inline action buttons.

use teloxide::prelude::*;
use teloxide::types::{
    CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup, Message, ParseMode,
};

use mongodb::bson::doc;

use crate::bot::{AppState, ThrottledBot};
use crate::database::models::ReportStatus;
use crate::utils::html_escape;

pub async fn report(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    args: &str,
) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let Some(replied) = msg.reply_to_message() else {
        bot.send_message(
            msg.chat.id,
            "Mag-reply sa mensaheng gusto mong i-report: /report [dahilan]",
        )
        .await?;
        return Ok(());
    };

    let reason = args.trim();
    let report = state
        .reports
        .create(
            user.id.0,
            replied.from.as_ref().map(|u| u.id.0),
            Some(msg.chat.id.0),
            Some(replied.id.0),
            "message",
            if reason.is_empty() { None } else { Some(reason) },
        )
        .await?;

    // Notify the configured admins with action buttons.
    let reported = replied
        .from
        .as_ref()
        .map(|u| html_escape(&u.first_name))
        .unwrap_or_else(|| "hindi kilala".to_string());
    let excerpt = replied
        .text()
        .map(|t| t.chars().take(200).collect::<String>())
        .unwrap_or_else(|| "(walang teksto)".to_string());
    let note = format!(
        "🚨 Report #{} mula kay {}\nLaban kay: {}\nDahilan: {}\n---\n{}",
        report.report_id,
        html_escape(&user.first_name),
        reported,
        if reason.is_empty() { "wala" } else { reason },
        html_escape(&excerpt)
    );
    let keyboard = report_keyboard(report.report_id);
    for admin_id in &state.config.admin_ids {
        let _ = bot
            .send_message(teloxide::types::ChatId(*admin_id as i64), note.clone())
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard.clone())
            .await;
    }

    bot.send_message(
        msg.chat.id,
        format!("Naitala ang report #{}. Titingnan ito ng mga admin.", report.report_id),
    )
    .await?;
    Ok(())
}

fn report_keyboard(report_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("I-dismiss", format!("report:dismiss:{report_id}")),
        InlineKeyboardButton::callback("Warn", format!("report:warn:{report_id}")),
        InlineKeyboardButton::callback("Ban", format!("report:ban:{report_id}")),
    ]])
}

pub async fn myreports(bot: &ThrottledBot, state: &AppState, msg: &Message) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let list = state.reports.by_reporter(user.id.0).await?;
    if list.is_empty() {
        bot.send_message(msg.chat.id, "Wala ka pang naipapadalang report.").await?;
        return Ok(());
    }

    let mut lines = vec!["🚨 <b>Mga report mo</b>".to_string()];
    for r in list {
        lines.push(format!(
            "#{} [{}] {}",
            r.report_id,
            r.status.label(),
            r.created_at.format("%Y-%m-%d")
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

    let list = state.reports.pending(10).await?;
    if list.is_empty() {
        bot.send_message(msg.chat.id, "Walang pending na report. 🎉").await?;
        return Ok(());
    }

    for r in list {
        let reported = match r.reported_id {
            Some(id) => match state.users.find(id).await? {
                Some(u) => u.display_name(),
                None => format!("User {}", id),
            },
            None => "hindi kilala".to_string(),
        };
        bot.send_message(
            msg.chat.id,
            format!(
                "🚨 #{} laban kay {}\nDahilan: {}\nPetsa: {}",
                r.report_id,
                html_escape(&reported),
                r.reason.as_deref().map(html_escape).unwrap_or_else(|| "wala".to_string()),
                r.created_at.format("%Y-%m-%d %H:%M UTC")
            ),
        )
        .parse_mode(ParseMode::Html)
        .reply_markup(report_keyboard(r.report_id))
        .await?;
    }
    Ok(())
}

pub async fn dismiss(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    args: &str,
) -> anyhow::Result<()> {
    if !super::require_admin(bot, state, msg).await? {
        return Ok(());
    }
    let Ok(report_id) = args.trim().parse::<i64>() else {
        bot.send_message(msg.chat.id, "Gamit: /dismissreport <id>").await?;
        return Ok(());
    };

    let reply = if state.reports.set_status(report_id, ReportStatus::Dismissed).await? {
        let sender = msg.from.as_ref().map(|u| u.id.0).unwrap_or(0);
        state.audit_log(sender, "dismiss_report", doc! { "report_id": report_id });
        format!("Na-dismiss ang report #{report_id}.")
    } else {
        "Walang ganiyang report.".to_string()
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

pub async fn action(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    args: &str,
) -> anyhow::Result<()> {
    if !super::require_admin(bot, state, msg).await? {
        return Ok(());
    }
    let Ok(report_id) = args.trim().parse::<i64>() else {
        bot.send_message(msg.chat.id, "Gamit: /actionreport <id>").await?;
        return Ok(());
    };

    let reply = if state.reports.set_status(report_id, ReportStatus::Actioned).await? {
        let sender = msg.from.as_ref().map(|u| u.id.0).unwrap_or(0);
        state.audit_log(sender, "action_report", doc! { "report_id": report_id });
        format!("Minarkahang actioned ang report #{report_id}.")
    } else {
        "Walang ganiyang report.".to_string()
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

/// Inline button actions on a report notification.
pub async fn on_callback(
    bot: &ThrottledBot,
    state: &AppState,
    query: &CallbackQuery,
    action: &str,
    args: &str,
) -> anyhow::Result<Option<String>> {
    if !state.permissions.is_admin(query.from.id.0).await {
        return Ok(Some("Para lang ito sa mga admin.".to_string()));
    }
    let Ok(report_id) = args.parse::<i64>() else {
        return Ok(Some("Sira ang report id.".to_string()));
    };
    let Some(report) = state.reports.get(report_id).await? else {
        return Ok(Some("Wala na ang report na iyan.".to_string()));
    };

    let toast = match action {
        "dismiss" => {
            state.reports.set_status(report_id, ReportStatus::Dismissed).await?;
            format!("Na-dismiss ang #{report_id}.")
        }
        "warn" => {
            if let Some(reported) = report.reported_id {
                let reason = report.reason.clone().unwrap_or_else(|| "report".to_string());
                state.moderation.add_warn(reported, query.from.id.0, &reason).await?;
            }
            state.reports.set_status(report_id, ReportStatus::Actioned).await?;
            format!("Binigyan ng warning (#{report_id}).")
        }
        "ban" => {
            if let Some(reported) = report.reported_id {
                state
                    .users
                    .set_banned(reported, true, report.reason.clone())
                    .await?;
            }
            state.reports.set_status(report_id, ReportStatus::Actioned).await?;
            format!("Na-ban ang user (#{report_id}).")
        }
        _ => return Ok(Some("Hindi kilalang aksyon.".to_string())),
    };

    // Strip the buttons off the notification once it is handled.
    if let Some(message) = query.message.as_ref() {
        let _ = bot
            .edit_message_reply_markup(message.chat().id, message.id())
            .await;
    }

    Ok(Some(toast))
}
