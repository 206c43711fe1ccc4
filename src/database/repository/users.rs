//! User repository with cache-first reads.
//!
//! The ban flag is consulted by the pipeline on every update, so reads go
//! through a short-TTL moka cache; all mutations write through and refresh
//! the cache entry.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use futures::stream::TryStreamExt;
use moka::sync::Cache;
use mongodb::bson::doc;
use mongodb::Collection;
use teloxide::types::User;
use tokio::spawn;
use tracing::{debug, warn};

use crate::database::models::{AgeStatus, UserDoc, UserRole};
use crate::database::Database;

pub struct UserRepo {
    collection: Collection<UserDoc>,
    cache: Cache<u64, UserDoc>,
}

impl UserRepo {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("users"),
            cache: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(Duration::from_secs(300))
                .build(),
        }
    }

    /// Upsert identity fields from a Telegram user and bump last_active.
    pub async fn upsert(&self, user: &User) -> Result<UserDoc> {
        let user_id = user.id.0;

        let doc = match self.find(user_id).await? {
            Some(mut existing) => {
                if existing.identity_changed(user) {
                    existing.username = user.username.as_ref().map(|u| u.to_lowercase());
                    existing.first_name = user.first_name.clone();
                    existing.last_name = user.last_name.clone();
                }
                existing.last_active = Utc::now();
                existing
            }
            None => UserDoc::from_telegram(user),
        };

        self.save(&doc).await?;
        Ok(doc)
    }

    /// Upsert in the background (registration must never block the pipeline).
    pub fn upsert_background(self: Arc<Self>, user: User) {
        spawn(async move {
            if let Err(e) = self.upsert(&user).await {
                warn!("Failed to upsert user {}: {}", user.id, e);
            }
        });
    }

    pub async fn find(&self, user_id: u64) -> Result<Option<UserDoc>> {
        if let Some(doc) = self.cache.get(&user_id) {
            return Ok(Some(doc));
        }

        let filter = doc! { "user_id": user_id as i64 };
        let result = self.collection.find_one(filter).await?;

        if let Some(doc) = &result {
            self.cache.insert(user_id, doc.clone());
        }
        Ok(result)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<UserDoc>> {
        let filter = doc! { "username": username.trim_start_matches('@').to_lowercase() };
        Ok(self.collection.find_one(filter).await?)
    }

    /// Most recently active users, for the admin listing.
    pub async fn recent(&self, limit: i64) -> Result<Vec<UserDoc>> {
        let cursor = self
            .collection
            .find(doc! {})
            .sort(doc! { "last_active": -1 })
            .limit(limit)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// Ban gate lookup. Unknown users are not banned.
    pub async fn is_banned(&self, user_id: u64) -> Result<bool> {
        Ok(self.find(user_id).await?.map(|u| u.is_banned).unwrap_or(false))
    }

    pub async fn set_banned(&self, user_id: u64, banned: bool, reason: Option<String>) -> Result<()> {
        if let Some(mut doc) = self.find(user_id).await? {
            doc.is_banned = banned;
            doc.ban_reason = if banned { reason } else { None };
            self.save(&doc).await?;
        }
        Ok(())
    }

    pub async fn set_role(&self, user_id: u64, role: UserRole) -> Result<()> {
        if let Some(mut doc) = self.find(user_id).await? {
            doc.role = role;
            self.save(&doc).await?;
        }
        Ok(())
    }

    pub async fn set_notifications(&self, user_id: u64, enabled: bool) -> Result<()> {
        if let Some(mut doc) = self.find(user_id).await? {
            doc.notifications_enabled = enabled;
            self.save(&doc).await?;
        }
        Ok(())
    }

    pub async fn set_language(&self, user_id: u64, language: &str) -> Result<()> {
        if let Some(mut doc) = self.find(user_id).await? {
            doc.language = Some(language.to_string());
            self.save(&doc).await?;
        }
        Ok(())
    }

    /// Record the DOB and the verification outcome in one write.
    pub async fn set_age_verification(
        &self,
        user_id: u64,
        date_of_birth: &str,
        status: AgeStatus,
    ) -> Result<()> {
        if let Some(mut doc) = self.find(user_id).await? {
            doc.date_of_birth = Some(date_of_birth.to_string());
            doc.age_status = status;
            self.save(&doc).await?;
        }
        Ok(())
    }

    /// One page of broadcast recipients: notification-enabled, unbanned
    /// users ordered by user_id.
    pub async fn recipient_page(&self, limit: u32, offset: u64) -> Result<Vec<u64>> {
        let filter = doc! { "is_banned": false, "notifications_enabled": true };
        let cursor = self
            .collection
            .find(filter)
            .sort(doc! { "user_id": 1 })
            .skip(offset)
            .limit(limit as i64)
            .await?;

        let docs: Vec<UserDoc> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(|u| u.user_id).collect())
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    async fn save(&self, user: &UserDoc) -> Result<()> {
        let filter = doc! { "user_id": user.user_id as i64 };
        let options = mongodb::options::ReplaceOptions::builder()
            .upsert(true)
            .build();

        self.collection
            .replace_one(filter, user)
            .with_options(options)
            .await?;

        self.cache.insert(user.user_id, user.clone());
        debug!("Saved user {}", user.user_id);
        Ok(())
    }
}
