//! Suggestion flow: category, then content, then a persisted suggestion
//! with a generated reference.

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{Message, ParseMode};

use crate::bot::{AppState, ThrottledBot};
use crate::session::{Flow, SuggestionDraft};
use crate::utils::html_escape;

/// What one textual input does to the suggestion flow.
#[derive(Debug)]
enum SuggestionResult {
    /// No usable text; the draft stays where it is.
    Stay,
    /// Category recorded; ask for content next.
    AskContent(SuggestionDraft),
    /// Both answers collected; persist.
    Submit { category: String, content: String },
}

fn apply(mut draft: SuggestionDraft, text: Option<&str>) -> SuggestionResult {
    let Some(text) = text else {
        return SuggestionResult::Stay;
    };
    match draft.category.take() {
        None => {
            draft.category = Some(text.to_string());
            SuggestionResult::AskContent(draft)
        }
        Some(category) => SuggestionResult::Submit {
            category,
            content: text.to_string(),
        },
    }
}

pub async fn advance(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    draft: SuggestionDraft,
) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = user.id.0;

    let text = msg.text().map(str::trim).filter(|t| !t.is_empty());
    match apply(draft, text) {
        SuggestionResult::Stay => {
            bot.send_message(msg.chat.id, "Mag-type ng teksto, o /cancel para itigil.")
                .await?;
        }
        SuggestionResult::AskContent(next) => {
            state.sessions.begin(user_id, Flow::Suggestion(next));
            bot.send_message(
                msg.chat.id,
                "Salamat! Ngayon, ilarawan ang iyong mungkahi.",
            )
            .await?;
        }
        SuggestionResult::Submit { category, content } => {
            let suggestion = state.suggestions.create(user_id, &category, &content).await?;
            state.sessions.clear(user_id);
            bot.send_message(
                msg.chat.id,
                format!(
                    "✅ Naitala ang iyong mungkahi!\n\
                     Reference: <code>{}</code>\n\
                     Kategorya: {}\n\n\
                     Gamitin ang /mysuggestions para makita ang status.",
                    suggestion.reference,
                    html_escape(&category)
                ),
            )
            .parse_mode(ParseMode::Html)
            .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_then_content_submits() {
        let d = SuggestionDraft::default();
        let SuggestionResult::AskContent(d) = apply(d, Some("feature")) else {
            panic!("category input should ask for content");
        };
        assert_eq!(d.category.as_deref(), Some("feature"));

        match apply(d, Some("please add dark mode")) {
            SuggestionResult::Submit { category, content } => {
                assert_eq!(category, "feature");
                assert_eq!(content, "please add dark mode");
            }
            other => panic!("expected submit, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_text_keeps_draft() {
        let d = SuggestionDraft {
            category: Some("feature".into()),
        };
        assert!(matches!(apply(d, None), SuggestionResult::Stay));
    }
}
