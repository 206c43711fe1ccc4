//! Multi-step conversation flows.
//!
//! The session's tagged flow decides which handler sees a plain update;
//! at most one flow advances per message.

mod age;
mod broadcast_compose;
mod card_config;
mod suggestion;

pub use age::{evaluate_dob, AgeDecision};

use anyhow::Result;
use teloxide::types::Message;

use crate::bot::{AppState, ThrottledBot};
use crate::session::Flow;

/// Advance the sender's active flow, if any.
///
/// Returns true when a flow consumed the update.
pub async fn handle_message(bot: &ThrottledBot, state: &AppState, msg: &Message) -> Result<bool> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(false);
    };

    match state.sessions.flow(user.id.0) {
        Flow::Idle => Ok(false),
        Flow::Suggestion(draft) => {
            suggestion::advance(bot, state, msg, draft).await?;
            Ok(true)
        }
        Flow::CardConfig(draft) => {
            card_config::advance(bot, state, msg, draft).await?;
            Ok(true)
        }
        Flow::BroadcastCompose(draft) => {
            broadcast_compose::advance(bot, state, msg, draft).await?;
            Ok(true)
        }
        Flow::AgePending => {
            age::advance(bot, state, msg).await?;
            Ok(true)
        }
    }
}
