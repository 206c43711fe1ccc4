//! Age verification flow.
//!
//! Not step-based: a single pending flag gates parsing of one strict
//! `YYYY-MM-DD` token. Invalid input re-prompts without clearing the
//! flag; any valid date settles verification (verified or rejected) and
//! clears the flag regardless of outcome.

use anyhow::Result;
use chrono::NaiveDate;
use teloxide::prelude::*;
use teloxide::types::Message;

use crate::bot::{AppState, ThrottledBot};
use crate::config::MIN_AGE_YEARS;
use crate::database::models::AgeStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeDecision {
    Verified { age: i64 },
    Rejected { age: i64 },
    /// Not a strict `YYYY-MM-DD` date; verification state untouched.
    Invalid,
}

/// Evaluate a date-of-birth answer against a reference date.
///
/// Age is whole years computed as elapsed days / 365.25, floored.
pub fn evaluate_dob(input: &str, today: NaiveDate) -> AgeDecision {
    let Ok(dob) = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d") else {
        return AgeDecision::Invalid;
    };

    let days = (today - dob).num_days();
    let age = (days as f64 / 365.25).floor() as i64;
    if age >= MIN_AGE_YEARS {
        AgeDecision::Verified { age }
    } else {
        AgeDecision::Rejected { age }
    }
}

pub async fn advance(bot: &ThrottledBot, state: &AppState, msg: &Message) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = user.id.0;
    let text = msg.text().unwrap_or_default();

    match evaluate_dob(text, chrono::Utc::now().date_naive()) {
        AgeDecision::Invalid => {
            bot.send_message(
                msg.chat.id,
                "Hindi tamang format. Isulat ang iyong kaarawan bilang YYYY-MM-DD, \
                 halimbawa: 2005-07-14",
            )
            .await?;
        }
        AgeDecision::Verified { age } => {
            state
                .users
                .set_age_verification(user_id, text.trim(), AgeStatus::Verified)
                .await?;
            state.sessions.clear(user_id);
            bot.send_message(
                msg.chat.id,
                format!("✅ Na-verify ang iyong edad ({age}). Maligayang paggamit!"),
            )
            .await?;
        }
        AgeDecision::Rejected { age } => {
            state
                .users
                .set_age_verification(user_id, text.trim(), AgeStatus::Rejected)
                .await?;
            state.sessions.clear(user_id);
            bot.send_message(
                msg.chat.id,
                format!(
                    "❌ Paumanhin, ang serbisyong ito ay para sa {MIN_AGE_YEARS} \
                     taong gulang pataas (edad mo: {age})."
                ),
            )
            .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_old_enough_is_verified() {
        match evaluate_dob("2008-02-20", date("2026-08-28")) {
            AgeDecision::Verified { age } => assert_eq!(age, 18),
            other => panic!("expected verified, got {:?}", other),
        }
    }

    #[test]
    fn test_same_date_young_is_rejected() {
        match evaluate_dob("2008-02-20", date("2020-01-01")) {
            AgeDecision::Rejected { age } => assert!(age < MIN_AGE_YEARS),
            other => panic!("expected rejected, got {:?}", other),
        }
    }

    #[test]
    fn test_exactly_minimum_age_is_verified() {
        // 14 years and a few days earlier than the reference date.
        assert!(matches!(
            evaluate_dob("2012-08-01", date("2026-08-28")),
            AgeDecision::Verified { age: 14 }
        ));
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert_eq!(evaluate_dob("not-a-date", date("2026-08-28")), AgeDecision::Invalid);
        assert_eq!(evaluate_dob("20/02/2008", date("2026-08-28")), AgeDecision::Invalid);
        assert_eq!(evaluate_dob("", date("2026-08-28")), AgeDecision::Invalid);
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        assert!(matches!(
            evaluate_dob("  2000-01-01  ", date("2026-08-28")),
            AgeDecision::Verified { .. }
        ));
    }
}
