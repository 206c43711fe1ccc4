//! Broadcast composition wizard: header, body, then a literal "confirm".
//! Anything other than "confirm" at the last step cancels.

use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{Message, ParseMode};
use tracing::error;

use crate::bot::{AppState, BotDeliverySink, RepoRecipients, ThrottledBot};
use crate::broadcast::{BroadcastRunner, DEFAULT_PAGE_SIZE};
use crate::session::{BroadcastDraft, BroadcastStep, Flow};
use crate::utils::html_escape;

/// What one textual input does to the composition wizard.
#[derive(Debug)]
enum ComposeResult {
    /// No usable text; the draft stays where it is.
    Stay,
    /// Draft advanced; keep collecting.
    Collect(BroadcastDraft),
    /// "confirm" at the last step: hand off to the runner.
    Launch { header: String, body: String },
    /// Anything else at the last step cancels.
    Cancel,
}

fn apply(mut draft: BroadcastDraft, text: Option<&str>) -> ComposeResult {
    let Some(text) = text else {
        return ComposeResult::Stay;
    };
    match draft.step {
        BroadcastStep::Header => {
            draft.header = Some(text.to_string());
            draft.step = BroadcastStep::Body;
            ComposeResult::Collect(draft)
        }
        BroadcastStep::Body => {
            draft.body = Some(text.to_string());
            draft.step = BroadcastStep::Confirm;
            ComposeResult::Collect(draft)
        }
        BroadcastStep::Confirm => {
            if text.eq_ignore_ascii_case("confirm") {
                ComposeResult::Launch {
                    header: draft.header.unwrap_or_default(),
                    body: draft.body.unwrap_or_default(),
                }
            } else {
                ComposeResult::Cancel
            }
        }
    }
}

pub async fn advance(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    draft: BroadcastDraft,
) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = user.id.0;

    let text = msg.text().map(str::trim).filter(|t| !t.is_empty());
    match apply(draft, text) {
        ComposeResult::Stay => {
            bot.send_message(msg.chat.id, "Mag-type ng teksto, o /cancel para itigil.")
                .await?;
        }

        ComposeResult::Collect(next) => {
            let prompt = match next.step {
                BroadcastStep::Body => "Header naitala. Ano ang nilalaman ng mensahe?".to_string(),
                BroadcastStep::Confirm => {
                    let recipients = state.users.count().await.unwrap_or(0);
                    format!(
                        "<b>{}</b>\n{}\n\nIpapadala sa ~{} user. \
                         Isulat ang \"confirm\" para ituloy, o kahit ano para kanselahin.",
                        html_escape(next.header.as_deref().unwrap_or_default()),
                        html_escape(next.body.as_deref().unwrap_or_default()),
                        recipients
                    )
                }
                BroadcastStep::Header => unreachable!("collect never lands on the first step"),
            };
            state.sessions.begin(user_id, Flow::BroadcastCompose(next));
            bot.send_message(msg.chat.id, prompt)
                .parse_mode(ParseMode::Html)
                .await?;
        }

        ComposeResult::Cancel => {
            state.sessions.clear(user_id);
            bot.send_message(msg.chat.id, "Kinansela ang broadcast.").await?;
        }

        ComposeResult::Launch { header, body } => {
            state.sessions.clear(user_id);
            let job = state.broadcasts.create(&header, &body, user_id).await?;
            bot.send_message(
                msg.chat.id,
                format!(
                    "📣 Sinimulan ang broadcast (job <code>{}</code>). \
                     Gamitin ang /broadcastcancel {} para ihinto.",
                    job.job_id, job.job_id
                ),
            )
            .parse_mode(ParseMode::Html)
            .await?;

            let runner = BroadcastRunner::new(
                RepoRecipients(Arc::clone(&state.users)),
                BotDeliverySink(bot.clone()),
                Arc::clone(&state.broadcasts),
                DEFAULT_PAGE_SIZE,
            );
            match runner.run(job.job_id, &header, &body).await {
                Ok(outcome) => {
                    bot.send_message(
                        msg.chat.id,
                        format!(
                            "Broadcast {}: {} naipadala, {} bigo.",
                            outcome.status.label(),
                            outcome.sent,
                            outcome.failed
                        ),
                    )
                    .await?;
                }
                Err(e) => {
                    error!("Broadcast {} aborted: {:#}", job.job_id, e);
                    bot.send_message(
                        msg.chat.id,
                        "⚠️ Naantala ang broadcast dahil sa panloob na error.",
                    )
                    .await?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_then_body_then_confirm() {
        let d = BroadcastDraft::new();
        let ComposeResult::Collect(d) = apply(d, Some("Hello")) else {
            panic!("header input should collect");
        };
        assert_eq!(d.step, BroadcastStep::Body);

        let ComposeResult::Collect(d) = apply(d, Some("World")) else {
            panic!("body input should collect");
        };
        assert_eq!(d.step, BroadcastStep::Confirm);

        match apply(d, Some("CONFIRM")) {
            ComposeResult::Launch { header, body } => {
                assert_eq!(header, "Hello");
                assert_eq!(body, "World");
            }
            other => panic!("expected launch, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_text_stays_at_step() {
        let mut d = BroadcastDraft::new();
        d.step = BroadcastStep::Body;
        d.header = Some("Hello".into());
        assert!(matches!(apply(d, None), ComposeResult::Stay));
    }

    #[test]
    fn test_anything_but_confirm_cancels() {
        let mut d = BroadcastDraft::new();
        d.step = BroadcastStep::Confirm;
        assert!(matches!(apply(d, Some("wag na")), ComposeResult::Cancel));
    }
}
