//! Leveling repository: XP, badges, daily claims.

use anyhow::Result;
use chrono::Utc;
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::Collection;
use tracing::debug;

use crate::config::level_for_xp;
use crate::database::models::{BadgeDoc, DailyClaimDoc, LevelDoc};
use crate::database::Database;

pub struct LevelRepo {
    levels: Collection<LevelDoc>,
    badges: Collection<BadgeDoc>,
    daily: Collection<DailyClaimDoc>,
}

impl LevelRepo {
    pub fn new(db: &Database) -> Self {
        Self {
            levels: db.collection("levels"),
            badges: db.collection("badges"),
            daily: db.collection("daily_claims"),
        }
    }

    fn scope_filter(user_id: u64, chat_id: Option<i64>) -> mongodb::bson::Document {
        match chat_id {
            Some(c) => doc! { "user_id": user_id as i64, "chat_id": c },
            None => doc! { "user_id": user_id as i64, "chat_id": null },
        }
    }

    pub async fn get_or_create(&self, user_id: u64, chat_id: Option<i64>) -> Result<LevelDoc> {
        let filter = Self::scope_filter(user_id, chat_id);
        if let Some(doc) = self.levels.find_one(filter).await? {
            return Ok(doc);
        }

        let fresh = LevelDoc::new(user_id, chat_id);
        self.save(&fresh).await?;
        Ok(fresh)
    }

    /// Add XP and recompute the level from the tier chart.
    ///
    /// Returns (before, after) so callers can detect level-ups.
    pub async fn add_xp(
        &self,
        user_id: u64,
        chat_id: Option<i64>,
        amount: i64,
    ) -> Result<(LevelDoc, LevelDoc)> {
        let before = self.get_or_create(user_id, chat_id).await?;

        let mut after = before.clone();
        after.xp += amount;
        after.total_messages += 1;
        after.level = level_for_xp(after.xp);
        self.save(&after).await?;

        Ok((before, after))
    }

    pub async fn set_level(&self, user_id: u64, chat_id: Option<i64>, level: u32) -> Result<LevelDoc> {
        let mut doc = self.get_or_create(user_id, chat_id).await?;
        doc.level = level;
        self.save(&doc).await?;
        Ok(doc)
    }

    /// Top users of a chat by XP.
    pub async fn top(&self, chat_id: Option<i64>, limit: i64) -> Result<Vec<LevelDoc>> {
        let filter = match chat_id {
            Some(c) => doc! { "chat_id": c },
            None => doc! { "chat_id": null },
        };
        let cursor = self
            .levels
            .find(filter)
            .sort(doc! { "xp": -1 })
            .limit(limit)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// Award a badge once; re-awards with the same key are ignored.
    pub async fn award_badge(
        &self,
        user_id: u64,
        key: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<()> {
        let filter = doc! { "user_id": user_id as i64, "key": key };
        if self.badges.find_one(filter).await?.is_some() {
            return Ok(());
        }

        self.badges
            .insert_one(BadgeDoc {
                id: None,
                user_id,
                key: key.to_string(),
                name: name.to_string(),
                description: description.map(str::to_string),
                awarded_at: Utc::now(),
            })
            .await?;
        debug!("Awarded badge {} to user {}", key, user_id);
        Ok(())
    }

    pub async fn badges_of(&self, user_id: u64) -> Result<Vec<BadgeDoc>> {
        let cursor = self
            .badges
            .find(doc! { "user_id": user_id as i64 })
            .sort(doc! { "awarded_at": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn last_daily_claim(&self, user_id: u64) -> Result<Option<DailyClaimDoc>> {
        Ok(self
            .daily
            .find_one(doc! { "user_id": user_id as i64 })
            .sort(doc! { "claimed_at": -1 })
            .await?)
    }

    pub async fn record_daily_claim(&self, user_id: u64, xp: i64, streak: u32) -> Result<()> {
        self.daily
            .insert_one(DailyClaimDoc {
                id: None,
                user_id,
                claimed_at: Utc::now(),
                xp_awarded: xp,
                streak,
            })
            .await?;
        Ok(())
    }

    async fn save(&self, level: &LevelDoc) -> Result<()> {
        let filter = Self::scope_filter(level.user_id, level.chat_id);
        let options = mongodb::options::ReplaceOptions::builder()
            .upsert(true)
            .build();
        self.levels
            .replace_one(filter, level)
            .with_options(options)
            .await?;
        Ok(())
    }
}
