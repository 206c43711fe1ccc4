//! Moderation repository: warnings and mutes.
//!
//! `is_muted` sits on the hot path (mute gate), so active mutes are
//! cached per (user, chat) with a short TTL.

use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::stream::TryStreamExt;
use moka::sync::Cache;
use mongodb::bson::doc;
use mongodb::Collection;

use crate::database::models::{MuteDoc, WarnDoc};
use crate::database::Database;

pub struct ModerationRepo {
    warns: Collection<WarnDoc>,
    mutes: Collection<MuteDoc>,
    mute_cache: Cache<(u64, i64), Option<MuteDoc>>,
}

impl ModerationRepo {
    pub fn new(db: &Database) -> Self {
        Self {
            warns: db.collection("warnings"),
            mutes: db.collection("mutes"),
            mute_cache: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(Duration::from_secs(60))
                .build(),
        }
    }

    pub async fn add_warn(&self, user_id: u64, warned_by: u64, reason: &str) -> Result<()> {
        self.warns
            .insert_one(WarnDoc {
                id: None,
                user_id,
                warned_by,
                reason: reason.to_string(),
                is_active: true,
                created_at: Utc::now(),
            })
            .await?;
        Ok(())
    }

    pub async fn warns_of(&self, user_id: u64) -> Result<Vec<WarnDoc>> {
        let cursor = self
            .warns
            .find(doc! { "user_id": user_id as i64, "is_active": true })
            .sort(doc! { "created_at": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn clear_warns(&self, user_id: u64) -> Result<u64> {
        let result = self
            .warns
            .update_many(
                doc! { "user_id": user_id as i64, "is_active": true },
                doc! { "$set": { "is_active": false } },
            )
            .await?;
        Ok(result.modified_count)
    }

    pub async fn add_mute(
        &self,
        user_id: u64,
        chat_id: i64,
        muted_by: u64,
        reason: Option<String>,
        muted_until: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let filter = doc! { "user_id": user_id as i64, "chat_id": chat_id };
        let mute = MuteDoc {
            id: None,
            user_id,
            chat_id,
            muted_by,
            reason,
            muted_until,
            created_at: Utc::now(),
        };
        let options = mongodb::options::ReplaceOptions::builder()
            .upsert(true)
            .build();
        self.mutes
            .replace_one(filter, &mute)
            .with_options(options)
            .await?;
        self.mute_cache.insert((user_id, chat_id), Some(mute));
        Ok(())
    }

    pub async fn remove_mute(&self, user_id: u64, chat_id: i64) -> Result<bool> {
        let filter = doc! { "user_id": user_id as i64, "chat_id": chat_id };
        let result = self.mutes.delete_one(filter).await?;
        self.mute_cache.insert((user_id, chat_id), None);
        Ok(result.deleted_count > 0)
    }

    /// Mute gate lookup. Expired mutes count as unmuted (lazy expiry, the
    /// record is left in place until /unmute).
    pub async fn is_muted(&self, user_id: u64, chat_id: i64) -> Result<bool> {
        let now = Utc::now();
        let key = (user_id, chat_id);

        if let Some(cached) = self.mute_cache.get(&key) {
            return Ok(cached.map(|m| m.active_at(now)).unwrap_or(false));
        }

        let filter = doc! { "user_id": user_id as i64, "chat_id": chat_id };
        let mute = self.mutes.find_one(filter).await?;
        self.mute_cache.insert(key, mute.clone());
        Ok(mute.map(|m| m.active_at(now)).unwrap_or(false))
    }

    pub async fn active_mutes(&self, chat_id: i64) -> Result<Vec<MuteDoc>> {
        let cursor = self.mutes.find(doc! { "chat_id": chat_id }).await?;
        let all: Vec<MuteDoc> = cursor.try_collect().await?;
        let now = Utc::now();
        Ok(all.into_iter().filter(|m| m.active_at(now)).collect())
    }
}
