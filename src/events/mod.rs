//! Community side effects that run on every plain message regardless of
//! any active flow: AFK bookkeeping and trivia answers. Member join and
//! leave cards live in [`members`].

pub mod members;

use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use teloxide::prelude::*;
use teloxide::types::{Message, ParseMode};

use crate::bot::{AppState, ThrottledBot};
use crate::utils::{format_duration, html_escape};

/// One open trivia round per chat.
#[derive(Debug, Clone)]
struct TriviaRound {
    answer: String,
    expires_at: Instant,
    prize_xp: i64,
}

/// In-memory trivia rounds keyed by chat.
#[derive(Default)]
pub struct TriviaTracker {
    rounds: DashMap<i64, TriviaRound>,
}

pub const TRIVIA_ROUND_SECS: u64 = 30;

impl TriviaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a round; replaces any previous round in the chat.
    pub fn start(&self, chat_id: i64, answer: &str, prize_xp: i64, now: Instant) {
        self.rounds.insert(
            chat_id,
            TriviaRound {
                answer: answer.trim().to_lowercase(),
                expires_at: now + Duration::from_secs(TRIVIA_ROUND_SECS),
                prize_xp,
            },
        );
    }

    pub fn is_open(&self, chat_id: i64, now: Instant) -> bool {
        let open = match self.rounds.get(&chat_id) {
            Some(r) => now < r.expires_at,
            None => return false,
        };
        if !open {
            self.rounds.remove(&chat_id);
        }
        open
    }

    /// Check a guess. A correct answer consumes the round and yields the
    /// prize; an expired round is consumed by the check itself.
    pub fn check_answer(&self, chat_id: i64, guess: &str, now: Instant) -> Option<i64> {
        let expired = {
            let round = self.rounds.get(&chat_id)?;
            now >= round.expires_at
        };
        if expired {
            self.rounds.remove(&chat_id);
            return None;
        }

        let correct = {
            let round = self.rounds.get(&chat_id)?;
            round.answer == guess.trim().to_lowercase()
        };
        if correct {
            self.rounds
                .remove(&chat_id)
                .map(|(_, round)| round.prize_xp)
        } else {
            None
        }
    }
}

/// AFK state.
#[derive(Debug, Clone)]
pub struct AfkEntry {
    pub reason: Option<String>,
    pub since: DateTime<Utc>,
}

#[derive(Default)]
pub struct AfkTracker {
    away: DashMap<u64, AfkEntry>,
}

impl AfkTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, user_id: u64, reason: Option<String>) {
        self.away.insert(
            user_id,
            AfkEntry {
                reason,
                since: Utc::now(),
            },
        );
    }

    pub fn get(&self, user_id: u64) -> Option<AfkEntry> {
        self.away.get(&user_id).map(|e| e.clone())
    }

    /// Clear AFK state, returning the entry if the user was away.
    pub fn clear(&self, user_id: u64) -> Option<AfkEntry> {
        self.away.remove(&user_id).map(|(_, e)| e)
    }
}

/// Shoutout cooldowns per user.
#[derive(Default)]
pub struct ShoutoutCooldowns {
    last: DashMap<u64, Instant>,
}

pub const SHOUTOUT_COOLDOWN: Duration = Duration::from_secs(6 * 60 * 60);

impl ShoutoutCooldowns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a shoutout slot, or learn how long is left on the cooldown.
    pub fn try_claim(&self, user_id: u64, now: Instant) -> Result<(), Duration> {
        match self.last.entry(user_id) {
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(now);
                Ok(())
            }
            dashmap::mapref::entry::Entry::Occupied(mut slot) => {
                let elapsed = now.duration_since(*slot.get());
                if elapsed >= SHOUTOUT_COOLDOWN {
                    *slot.get_mut() = now;
                    Ok(())
                } else {
                    Err(SHOUTOUT_COOLDOWN - elapsed)
                }
            }
        }
    }
}

/// Side effects for every plain (non-command) message: the sender's AFK
/// flag clears, replies to AFK users get an explanation, and trivia
/// guesses are judged.
pub async fn plain_message_side_effects(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = user.id.0;

    if let Some(entry) = state.afk.clear(user_id) {
        let away_for = (Utc::now() - entry.since).num_seconds().max(0) as u64;
        bot.send_message(
            msg.chat.id,
            format!(
                "👋 Bumalik na si {} (nawala nang {}).",
                html_escape(&user.first_name),
                format_duration(away_for)
            ),
        )
        .parse_mode(ParseMode::Html)
        .await?;
    }

    if let Some(replied) = msg.reply_to_message().and_then(|r| r.from.as_ref()) {
        if let Some(entry) = state.afk.get(replied.id.0) {
            let reason = entry
                .reason
                .as_deref()
                .map(|r| format!(" — {}", html_escape(r)))
                .unwrap_or_default();
            bot.send_message(
                msg.chat.id,
                format!("💤 Si {} ay AFK ngayon{}.", html_escape(&replied.first_name), reason),
            )
            .parse_mode(ParseMode::Html)
            .await?;
        }
    }

    if let Some(text) = msg.text() {
        let chat_id = msg.chat.id.0;
        if let Some(prize) = state.trivia.check_answer(chat_id, text, Instant::now()) {
            state.levels.add_xp(user_id, Some(chat_id), prize).await?;
            bot.send_message(
                msg.chat.id,
                format!(
                    "🏆 Tama, {}! +{} XP.",
                    html_escape(&user.first_name),
                    prize
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
    fn test_trivia_correct_answer_consumes_round() {
        let t = TriviaTracker::new();
        let now = Instant::now();
        t.start(-100, "Manila", 20, now);

        assert_eq!(t.check_answer(-100, "wrong", now), None);
        assert_eq!(t.check_answer(-100, "  MANILA ", now), Some(20));
        // Consumed: nobody else can win.
        assert_eq!(t.check_answer(-100, "manila", now), None);
    }

    #[test]
    fn test_trivia_expired_round_is_consumed_by_check() {
        let t = TriviaTracker::new();
        let now = Instant::now();
        t.start(-100, "Manila", 20, now);

        let late = now + Duration::from_secs(TRIVIA_ROUND_SECS + 1);
        assert_eq!(t.check_answer(-100, "manila", late), None);
        assert!(!t.is_open(-100, late));
    }

    #[test]
    fn test_trivia_rounds_are_per_chat() {
        let t = TriviaTracker::new();
        let now = Instant::now();
        t.start(-1, "a", 10, now);
        t.start(-2, "b", 10, now);
        assert_eq!(t.check_answer(-2, "b", now), Some(10));
        assert_eq!(t.check_answer(-1, "a", now), Some(10));
    }

    #[test]
    fn test_afk_set_and_clear() {
        let a = AfkTracker::new();
        a.set(1, Some("lunch".to_string()));
        assert!(a.get(1).is_some());

        let cleared = a.clear(1).unwrap();
        assert_eq!(cleared.reason.as_deref(), Some("lunch"));
        assert!(a.get(1).is_none());
        assert!(a.clear(1).is_none());
    }

    #[test]
    fn test_shoutout_cooldown() {
        let s = ShoutoutCooldowns::new();
        let now = Instant::now();
        assert!(s.try_claim(1, now).is_ok());

        let soon = now + Duration::from_secs(60);
        let remaining = s.try_claim(1, soon).unwrap_err();
        assert!(remaining <= SHOUTOUT_COOLDOWN - Duration::from_secs(60));

        assert!(s.try_claim(1, now + SHOUTOUT_COOLDOWN).is_ok());
        // Other users are unaffected.
        assert!(s.try_claim(2, soon).is_ok());
    }
}
