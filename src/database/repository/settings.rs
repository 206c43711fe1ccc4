//! Per-chat settings repository: chat overrides, card configs, rules,
//! NSFW detection logs.
//!
//! Chat settings are read by the prefix and NSFW pipeline stages on hot
//! paths, so they sit behind a moka cache.

use std::time::Duration;

use anyhow::Result;
use futures::stream::TryStreamExt;
use moka::sync::Cache;
use mongodb::bson::doc;
use mongodb::Collection;
use tracing::debug;

use crate::database::models::{CardConfigDoc, ChatSettingsDoc, NsfwLogDoc, RulesDoc};
use crate::database::Database;

pub struct SettingsRepo {
    chat_settings: Collection<ChatSettingsDoc>,
    cards: Collection<CardConfigDoc>,
    rules: Collection<RulesDoc>,
    nsfw_logs: Collection<NsfwLogDoc>,
    settings_cache: Cache<i64, ChatSettingsDoc>,
    card_cache: Cache<i64, CardConfigDoc>,
}

impl SettingsRepo {
    pub fn new(db: &Database) -> Self {
        Self {
            chat_settings: db.collection("chat_settings"),
            cards: db.collection("card_configs"),
            rules: db.collection("rules"),
            nsfw_logs: db.collection("nsfw_logs"),
            settings_cache: Cache::builder()
                .max_capacity(2_000)
                .time_to_live(Duration::from_secs(120))
                .build(),
            card_cache: Cache::builder()
                .max_capacity(2_000)
                .time_to_live(Duration::from_secs(300))
                .build(),
        }
    }

    // -- chat settings --------------------------------------------------

    pub async fn chat_settings(&self, chat_id: i64) -> Result<ChatSettingsDoc> {
        if let Some(s) = self.settings_cache.get(&chat_id) {
            return Ok(s);
        }

        let found = self
            .chat_settings
            .find_one(doc! { "chat_id": chat_id })
            .await?
            .unwrap_or_else(|| ChatSettingsDoc::new(chat_id));

        self.settings_cache.insert(chat_id, found.clone());
        Ok(found)
    }

    pub async fn save_chat_settings(&self, settings: &ChatSettingsDoc) -> Result<()> {
        let filter = doc! { "chat_id": settings.chat_id };
        let options = mongodb::options::ReplaceOptions::builder()
            .upsert(true)
            .build();
        self.chat_settings
            .replace_one(filter, settings)
            .with_options(options)
            .await?;
        self.settings_cache.insert(settings.chat_id, settings.clone());
        debug!("Saved chat settings for {}", settings.chat_id);
        Ok(())
    }

    // -- card configuration ---------------------------------------------

    pub async fn card_config(&self, chat_id: i64) -> Result<Option<CardConfigDoc>> {
        if let Some(c) = self.card_cache.get(&chat_id) {
            return Ok(Some(c));
        }

        let result = self.cards.find_one(doc! { "chat_id": chat_id }).await?;
        if let Some(c) = &result {
            self.card_cache.insert(chat_id, c.clone());
        }
        Ok(result)
    }

    pub async fn save_card_config(&self, config: &CardConfigDoc) -> Result<()> {
        let filter = doc! { "chat_id": config.chat_id };
        let options = mongodb::options::ReplaceOptions::builder()
            .upsert(true)
            .build();
        self.cards
            .replace_one(filter, config)
            .with_options(options)
            .await?;
        self.card_cache.insert(config.chat_id, config.clone());
        debug!("Saved card config for chat {}", config.chat_id);
        Ok(())
    }

    pub async fn reset_card_config(&self, chat_id: i64) -> Result<()> {
        self.cards.delete_one(doc! { "chat_id": chat_id }).await?;
        self.card_cache.invalidate(&chat_id);
        Ok(())
    }

    // -- rules ----------------------------------------------------------

    pub async fn rules(&self, chat_id: i64) -> Result<Option<RulesDoc>> {
        Ok(self.rules.find_one(doc! { "chat_id": chat_id }).await?)
    }

    pub async fn set_rules(&self, chat_id: i64, text: &str, updated_by: u64) -> Result<()> {
        let filter = doc! { "chat_id": chat_id };
        let options = mongodb::options::ReplaceOptions::builder()
            .upsert(true)
            .build();
        self.rules
            .replace_one(
                filter,
                RulesDoc {
                    id: None,
                    chat_id,
                    text: text.to_string(),
                    updated_by: Some(updated_by),
                },
            )
            .with_options(options)
            .await?;
        Ok(())
    }

    // -- NSFW logs -------------------------------------------------------

    pub async fn log_nsfw(&self, entry: NsfwLogDoc) -> Result<()> {
        self.nsfw_logs.insert_one(entry).await?;
        Ok(())
    }

    pub async fn nsfw_logs(&self, limit: i64, offset: u64) -> Result<Vec<NsfwLogDoc>> {
        let cursor = self
            .nsfw_logs
            .find(doc! {})
            .sort(doc! { "detected_at": -1 })
            .skip(offset)
            .limit(limit)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn clear_nsfw_logs(&self, user_id: u64) -> Result<u64> {
        let result = self
            .nsfw_logs
            .delete_many(doc! { "user_id": user_id as i64 })
            .await?;
        Ok(result.deleted_count)
    }
}
