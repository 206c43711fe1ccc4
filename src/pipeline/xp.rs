//! XP award stage.
//!
//! Grants XP for messages at most once per cooldown per (user, chat) and
//! reports level-ups back to the pipeline so it can announce them. Badge
//! awarding on tier boundaries is best-effort.

use std::time::{Duration, Instant};

use anyhow::Result;
use dashmap::DashMap;
use tracing::warn;

use crate::config::{tier_for_level, LevelsConfig};
use crate::database::LevelRepo;

/// A crossed level boundary.
pub struct LevelUp {
    pub level: u32,
    /// Tier badge newly reached, if the new level hit a tier boundary.
    pub tier_name: Option<&'static str>,
}

pub struct XpTracker {
    last_award: DashMap<(u64, i64), Instant>,
    xp_per_message: i64,
    cooldown: Duration,
}

impl XpTracker {
    pub fn new(config: &LevelsConfig) -> Self {
        Self {
            last_award: DashMap::new(),
            xp_per_message: config.xp_per_message,
            cooldown: Duration::from_secs(config.xp_cooldown_secs),
        }
    }

    /// Whether the cooldown allows an award now; records the award time.
    fn due(&self, user_id: u64, chat_id: i64, now: Instant) -> bool {
        use dashmap::mapref::entry::Entry;

        match self.last_award.entry((user_id, chat_id)) {
            Entry::Vacant(slot) => {
                slot.insert(now);
                true
            }
            Entry::Occupied(mut slot) => {
                if now.duration_since(*slot.get()) >= self.cooldown {
                    slot.insert(now);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Award message XP if the cooldown has elapsed.
    ///
    /// Returns the level-up, if the award crossed a level boundary.
    pub async fn award(
        &self,
        levels: &LevelRepo,
        user_id: u64,
        chat_id: i64,
    ) -> Result<Option<LevelUp>> {
        if !self.due(user_id, chat_id, Instant::now()) {
            return Ok(None);
        }

        let (before, after) = levels.add_xp(user_id, Some(chat_id), self.xp_per_message).await?;
        if after.level <= before.level {
            return Ok(None);
        }

        let tier = tier_for_level(after.level).filter(|t| t.level > before.level);
        if let Some(t) = tier {
            // Badge awarding is best-effort; a failure must not block the update.
            let key = format!("tier_{}", t.level);
            if let Err(e) = levels.award_badge(user_id, &key, t.name, None).await {
                warn!("Failed to award tier badge {}: {:#}", t.name, e);
            }
        }

        Ok(Some(LevelUp {
            level: after.level,
            tier_name: tier.map(|t| t.name),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> XpTracker {
        XpTracker::new(&LevelsConfig {
            xp_per_message: 5,
            xp_cooldown_secs: 60,
            trivia_prize_xp: 20,
        })
    }

    #[test]
    fn test_first_message_is_due() {
        let t = tracker();
        assert!(t.due(1, 10, Instant::now()));
    }

    #[test]
    fn test_cooldown_blocks_second_award() {
        let t = tracker();
        let base = Instant::now();
        assert!(t.due(1, 10, base));
        assert!(!t.due(1, 10, base + Duration::from_secs(30)));
        assert!(t.due(1, 10, base + Duration::from_secs(61)));
    }

    #[test]
    fn test_same_instant_second_award_blocked() {
        let t = tracker();
        let base = Instant::now();
        assert!(t.due(1, 10, base));
        assert!(!t.due(1, 10, base));
    }

    #[test]
    fn test_cooldown_is_per_chat() {
        let t = tracker();
        let base = Instant::now();
        assert!(t.due(1, 10, base));
        assert!(t.due(1, 11, base + Duration::from_secs(1)));
    }
}
