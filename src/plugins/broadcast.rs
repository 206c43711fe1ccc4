//! Admin broadcast commands: start the compose wizard, inspect job
//! progress, review history and request cancellation.

use teloxide::prelude::*;
use teloxide::types::{Message, ParseMode};

use crate::bot::{AppState, ThrottledBot};
use crate::database::models::BroadcastDoc;
use crate::plugins::require_admin;
use crate::session::{BroadcastDraft, Flow};
use crate::utils::html_escape;

pub async fn begin(bot: &ThrottledBot, state: &AppState, msg: &Message) -> anyhow::Result<()> {
    if !require_admin(bot, state, msg).await? {
        return Ok(());
    }
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    state
        .sessions
        .begin(user.id.0, Flow::BroadcastCompose(BroadcastDraft::new()));
    bot.send_message(
        msg.chat.id,
        "📣 Bagong broadcast. Ipadala ang <b>header</b> ng mensahe, o /cancel para itigil.",
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

fn describe(job: &BroadcastDoc) -> String {
    format!(
        "📣 <b>Job #{}</b> — {}\n{}\nNaipadala: {} | Bigo: {}\nGinawa: {}",
        job.job_id,
        job.status.label(),
        html_escape(&job.header),
        job.sent,
        job.failed,
        job.created_at.format("%Y-%m-%d %H:%M UTC"),
    )
}

pub async fn status(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    args: &str,
) -> anyhow::Result<()> {
    if !require_admin(bot, state, msg).await? {
        return Ok(());
    }

    let job = if args.trim().is_empty() {
        state.broadcasts.latest(1).await?.into_iter().next()
    } else {
        match args.trim().parse::<i64>() {
            Ok(job_id) => state.broadcasts.get(job_id).await?,
            Err(_) => {
                bot.send_message(msg.chat.id, "Gamit: /broadcaststatus [job id]").await?;
                return Ok(());
            }
        }
    };

    match job {
        Some(job) => {
            bot.send_message(msg.chat.id, describe(&job))
                .parse_mode(ParseMode::Html)
                .await?;
        }
        None => {
            bot.send_message(msg.chat.id, "Walang nahanap na broadcast job.").await?;
        }
    }
    Ok(())
}

pub async fn history(bot: &ThrottledBot, state: &AppState, msg: &Message) -> anyhow::Result<()> {
    if !require_admin(bot, state, msg).await? {
        return Ok(());
    }

    let jobs = state.broadcasts.latest(5).await?;
    if jobs.is_empty() {
        bot.send_message(msg.chat.id, "Wala pang broadcast history.").await?;
        return Ok(());
    }

    let lines = jobs
        .iter()
        .map(|j| {
            format!(
                "#{} — {} ({} sent, {} failed) — {}",
                j.job_id,
                j.status.label(),
                j.sent,
                j.failed,
                html_escape(&j.header),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    bot.send_message(msg.chat.id, format!("📣 <b>Mga huling broadcast</b>\n{lines}"))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

pub async fn cancel(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    args: &str,
) -> anyhow::Result<()> {
    if !require_admin(bot, state, msg).await? {
        return Ok(());
    }

    let Ok(job_id) = args.trim().parse::<i64>() else {
        bot.send_message(msg.chat.id, "Gamit: /broadcastcancel <job id>").await?;
        return Ok(());
    };

    // Cancellation is observed at the next page boundary; an already
    // terminal job is reported as such.
    let accepted = state.broadcasts.request_cancel(job_id).await?;
    let reply = if accepted {
        format!("🛑 Hiniling ang pagkansela ng job #{job_id}. Titigil ito sa susunod na batch.")
    } else {
        format!("Hindi na makakansela ang job #{job_id} — tapos na o wala ito.")
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}
