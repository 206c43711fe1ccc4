//! Welcome/goodbye card configuration wizard.
//!
//! Three steps: message template, accent color, background. The
//! background step accepts an attached photo, a direct image URL, or
//! "default". Invalid input re-prompts at the same step, and a download
//! or storage failure keeps the wizard at the background step so the
//! user can retry.

use anyhow::{Context, Result};
use teloxide::prelude::*;
use teloxide::types::{InputFile, Message, ParseMode};
use tracing::warn;

use crate::bot::{AppState, ThrottledBot};
use crate::database::models::CardConfigDoc;
use crate::render::CardSpec;
use crate::session::{CardDraft, CardKind, CardStep, Flow};
use crate::utils::{fill_template, parse_hex_color};

pub async fn advance(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    draft: CardDraft,
) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = user.id.0;

    match draft.step {
        CardStep::Message => match apply_message(draft, non_empty_text(msg)) {
            StepResult::Stay(_) => {
                bot.send_message(msg.chat.id, "Mag-type ng mensahe, o /cancel para itigil.")
                    .await?;
            }
            StepResult::Advance(next) => {
                state.sessions.begin(user_id, Flow::CardConfig(next));
                bot.send_message(
                    msg.chat.id,
                    "Kulay ng teksto? Magpadala ng hex code (hal. <code>#FFD700</code>) \
                     o isulat ang \"skip\".",
                )
                .parse_mode(ParseMode::Html)
                .await?;
            }
        },

        CardStep::Color => match apply_color(draft, non_empty_text(msg)) {
            StepResult::Stay(_) => {
                bot.send_message(
                    msg.chat.id,
                    "Hindi valid na kulay. Subukan ang format na #RRGGBB, o \"skip\".",
                )
                .await?;
            }
            StepResult::Advance(next) => {
                state.sessions.begin(user_id, Flow::CardConfig(next));
                bot.send_message(
                    msg.chat.id,
                    "Background? Magpadala ng larawan, ng direktang URL, \
                     o isulat ang \"default\".",
                )
                .await?;
            }
        },

        CardStep::Background => {
            let background = match resolve_background(bot, state, msg, &draft).await {
                Ok(Some(resolved)) => resolved,
                Ok(None) => {
                    bot.send_message(
                        msg.chat.id,
                        "Magpadala ng larawan, ng direktang URL, o isulat ang \"default\".",
                    )
                    .await?;
                    return Ok(());
                }
                Err(e) => {
                    // Keep the step; the user may retry the same input.
                    warn!("Card background fetch failed: {:#}", e);
                    bot.send_message(
                        msg.chat.id,
                        "Hindi nakuha ang background. Subukan muli, o isulat ang \"default\".",
                    )
                    .await?;
                    return Ok(());
                }
            };

            save_and_preview(bot, state, msg, &draft, background, user_id).await?;
        }
    }
    Ok(())
}

fn non_empty_text(msg: &Message) -> Option<&str> {
    msg.text().map(str::trim).filter(|t| !t.is_empty())
}

/// Outcome of feeding one textual input to a wizard step.
#[derive(Debug)]
enum StepResult {
    /// Input rejected; the draft (and the session) stays as it was.
    Stay(CardDraft),
    /// Draft advanced to the next step.
    Advance(CardDraft),
}

fn apply_message(mut draft: CardDraft, text: Option<&str>) -> StepResult {
    let Some(text) = text else {
        return StepResult::Stay(draft);
    };
    draft.message = Some(text.to_string());
    draft.step = CardStep::Color;
    StepResult::Advance(draft)
}

fn apply_color(mut draft: CardDraft, text: Option<&str>) -> StepResult {
    let Some(text) = text else {
        return StepResult::Stay(draft);
    };
    if !text.eq_ignore_ascii_case("skip") {
        if parse_hex_color(text).is_none() {
            return StepResult::Stay(draft);
        }
        draft.color = Some(text.to_string());
    }
    draft.step = CardStep::Background;
    StepResult::Advance(draft)
}

/// What a textual background-step input means.
#[derive(Debug, PartialEq, Eq)]
enum BackgroundText<'a> {
    Default,
    Url(&'a str),
    Unrecognized,
}

fn classify_background(text: &str) -> BackgroundText<'_> {
    if text.eq_ignore_ascii_case("default") {
        BackgroundText::Default
    } else if text.starts_with("http://") || text.starts_with("https://") {
        BackgroundText::Url(text)
    } else {
        BackgroundText::Unrecognized
    }
}

/// Resolve the background-step input to a stored asset path.
///
/// `Ok(None)` means the input was not recognized (re-prompt);
/// `Ok(Some(None))` means the default solid background was chosen.
async fn resolve_background(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    draft: &CardDraft,
) -> Result<Option<Option<String>>> {
    if let Some(photo) = msg.photo().and_then(|p| p.last()) {
        let file = bot
            .get_file(photo.file.id.clone())
            .await
            .context("get_file failed")?;
        let url = format!(
            "https://api.telegram.org/file/bot{}/{}",
            state.config.bot_token, file.path
        );
        let path = store_asset(state, draft, &url).await?;
        return Ok(Some(Some(path)));
    }

    let Some(text) = non_empty_text(msg) else {
        return Ok(None);
    };
    match classify_background(text) {
        BackgroundText::Default => Ok(Some(None)),
        BackgroundText::Url(url) => {
            let path = store_asset(state, draft, url).await?;
            Ok(Some(Some(path)))
        }
        BackgroundText::Unrecognized => Ok(None),
    }
}

/// Download an image and write it under the assets directory.
async fn store_asset(state: &AppState, draft: &CardDraft, url: &str) -> Result<String> {
    let bytes = state
        .http
        .get(url)
        .send()
        .await
        .context("background download failed")?
        .error_for_status()?
        .bytes()
        .await?;

    // Reject non-images before they reach the renderer.
    image::load_from_memory(&bytes).context("background is not a decodable image")?;

    tokio::fs::create_dir_all(&state.config.assets_dir).await?;
    let path = format!(
        "{}/{}_{}.img",
        state.config.assets_dir,
        draft.chat_id.unsigned_abs(),
        draft.kind.label()
    );
    tokio::fs::write(&path, &bytes)
        .await
        .context("background store failed")?;
    Ok(path)
}

async fn save_and_preview(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    draft: &CardDraft,
    background: Option<String>,
    user_id: u64,
) -> Result<()> {
    let mut config = state
        .settings
        .card_config(draft.chat_id)
        .await?
        .unwrap_or_else(|| CardConfigDoc::new(draft.chat_id));

    match draft.kind {
        CardKind::Welcome => config.welcome_message = draft.message.clone(),
        CardKind::Goodbye => config.goodbye_message = draft.message.clone(),
    }
    if draft.color.is_some() {
        config.text_color = draft.color.clone();
    }
    config.background = background;
    config.updated_by = Some(user_id);
    state.settings.save_card_config(&config).await?;
    state.sessions.clear(user_id);

    let caption = preview_caption(draft, msg);
    let spec = CardSpec {
        text_color: config.text_color.clone(),
        background: config.background.clone(),
    };
    match state.renderer.render(&spec) {
        Ok(Some(png)) => {
            bot.send_photo(msg.chat.id, InputFile::memory(png))
                .caption(format!("Preview:\n{caption}"))
                .await?;
        }
        Ok(None) => {
            bot.send_message(msg.chat.id, format!("Naitala! Preview:\n{caption}"))
                .await?;
        }
        Err(e) => {
            // Configuration is saved; only the preview failed.
            warn!("Card preview render failed: {:#}", e);
            bot.send_message(msg.chat.id, format!("Naitala! Preview:\n{caption}"))
                .await?;
        }
    }
    Ok(())
}

fn preview_caption(draft: &CardDraft, msg: &Message) -> String {
    let template = draft.message.as_deref().unwrap_or_default();
    let name = msg
        .from
        .as_ref()
        .map(|u| u.first_name.as_str())
        .unwrap_or("Miyembro");
    let group = msg.chat.title().unwrap_or("ang grupo");
    fill_template(template, name, group, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft_at(step: CardStep) -> CardDraft {
        let mut d = CardDraft::new(CardKind::Welcome, -100);
        d.step = step;
        d
    }

    #[test]
    fn test_message_step_advances_on_text() {
        match apply_message(draft_at(CardStep::Message), Some("Mabuhay, {name}!")) {
            StepResult::Advance(d) => {
                assert_eq!(d.step, CardStep::Color);
                assert_eq!(d.message.as_deref(), Some("Mabuhay, {name}!"));
            }
            other => panic!("expected advance, got {other:?}"),
        }
    }

    #[test]
    fn test_message_step_stays_without_text() {
        match apply_message(draft_at(CardStep::Message), None) {
            StepResult::Stay(d) => assert_eq!(d.step, CardStep::Message),
            other => panic!("expected stay, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_color_keeps_color_step() {
        match apply_color(draft_at(CardStep::Color), Some("maroon")) {
            StepResult::Stay(d) => {
                assert_eq!(d.step, CardStep::Color);
                assert!(d.color.is_none());
            }
            other => panic!("expected stay, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_color_and_skip_advance() {
        match apply_color(draft_at(CardStep::Color), Some("#FFD700")) {
            StepResult::Advance(d) => {
                assert_eq!(d.step, CardStep::Background);
                assert_eq!(d.color.as_deref(), Some("#FFD700"));
            }
            other => panic!("expected advance, got {other:?}"),
        }
        match apply_color(draft_at(CardStep::Color), Some("skip")) {
            StepResult::Advance(d) => assert!(d.color.is_none()),
            other => panic!("expected advance, got {other:?}"),
        }
    }

    #[test]
    fn test_background_text_classification() {
        assert_eq!(classify_background("default"), BackgroundText::Default);
        assert_eq!(classify_background("DEFAULT"), BackgroundText::Default);
        assert_eq!(
            classify_background("https://example.com/bg.png"),
            BackgroundText::Url("https://example.com/bg.png")
        );
        assert_eq!(classify_background("larawan po"), BackgroundText::Unrecognized);
    }
}
