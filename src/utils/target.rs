//! Target-user resolution for moderation commands.
//!
//! Resolution order: reply target, numeric id argument, then @username
//! looked up in the user collection.

use teloxide::types::Message;

use crate::bot::AppState;

/// A resolved command target.
pub struct Target {
    pub user_id: u64,
    pub name: String,
    /// Argument tail after the target token (reason, duration, ...).
    pub rest: String,
}

/// Resolve the target of an admin command from a reply or from `args`.
pub async fn resolve(state: &AppState, msg: &Message, args: &str) -> Option<Target> {
    if let Some(user) = msg.reply_to_message().and_then(|r| r.from.as_ref()) {
        return Some(Target {
            user_id: user.id.0,
            name: user.first_name.clone(),
            rest: args.trim().to_string(),
        });
    }

    let mut parts = args.trim().splitn(2, char::is_whitespace);
    let token = parts.next()?.trim();
    if token.is_empty() {
        return None;
    }
    let rest = parts.next().unwrap_or_default().trim().to_string();

    if let Ok(id) = token.parse::<u64>() {
        let name = match state.users.find(id).await {
            Ok(Some(doc)) => doc.first_name,
            _ => format!("User {}", id),
        };
        return Some(Target { user_id: id, name, rest });
    }

    if let Some(username) = token.strip_prefix('@') {
        if let Ok(Some(doc)) = state.users.find_by_username(username).await {
            return Some(Target {
                user_id: doc.user_id,
                name: doc.first_name,
                rest,
            });
        }
    }

    None
}
