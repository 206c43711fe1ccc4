//! Suggestion repository.

use anyhow::Result;
use chrono::Utc;
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Collection, IndexModel};

use crate::database::models::{SuggestionDoc, SuggestionStatus};
use crate::database::repository::Counters;
use crate::database::Database;

pub struct SuggestionRepo {
    collection: Collection<SuggestionDoc>,
    counters: Counters,
}

impl SuggestionRepo {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("suggestions"),
            counters: Counters::new(db),
        }
    }

    /// Unique index on `reference`; a duplicate insert fails loudly
    /// instead of leaving two suggestions answering to one reference.
    pub async fn ensure_indexes(&self) -> Result<()> {
        self.collection
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "reference": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await?;
        Ok(())
    }

    /// Create a suggestion with the next `SUG-#####` reference.
    pub async fn create(&self, user_id: u64, category: &str, content: &str) -> Result<SuggestionDoc> {
        let seq = self.counters.next("suggestion_reference").await? as u64;
        let suggestion = SuggestionDoc {
            id: None,
            reference: SuggestionDoc::reference_for(seq),
            user_id,
            category: category.to_string(),
            content: content.to_string(),
            status: SuggestionStatus::Pending,
            upvotes: Vec::new(),
            admin_reply: None,
            created_at: Utc::now(),
        };
        self.collection.insert_one(&suggestion).await?;
        Ok(suggestion)
    }

    pub async fn by_user(&self, user_id: u64) -> Result<Vec<SuggestionDoc>> {
        let cursor = self
            .collection
            .find(doc! { "user_id": user_id as i64 })
            .sort(doc! { "created_at": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn by_reference(&self, reference: &str) -> Result<Option<SuggestionDoc>> {
        Ok(self
            .collection
            .find_one(doc! { "reference": reference.to_uppercase() })
            .await?)
    }

    /// Add an upvote; returns false if the reference is unknown or the
    /// user already voted.
    pub async fn upvote(&self, reference: &str, user_id: u64) -> Result<bool> {
        let filter = doc! {
            "reference": reference.to_uppercase(),
            "upvotes": { "$ne": user_id as i64 },
        };
        let result = self
            .collection
            .update_one(filter, doc! { "$push": { "upvotes": user_id as i64 } })
            .await?;
        Ok(result.modified_count > 0)
    }

    pub async fn top(&self, limit: i64) -> Result<Vec<SuggestionDoc>> {
        // Sorting by array length needs an aggregation; a sorted in-memory
        // pass over pending suggestions is fine at this scale.
        let mut pending = self.pending().await?;
        pending.sort_by_key(|s| std::cmp::Reverse(s.upvotes.len()));
        pending.truncate(limit as usize);
        Ok(pending)
    }

    pub async fn pending(&self) -> Result<Vec<SuggestionDoc>> {
        let cursor = self
            .collection
            .find(doc! { "status": "pending" })
            .sort(doc! { "created_at": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn set_status(
        &self,
        reference: &str,
        status: SuggestionStatus,
        admin_reply: Option<&str>,
    ) -> Result<bool> {
        let status_bson = mongodb::bson::to_bson(&status)?;
        let result = self
            .collection
            .update_one(
                doc! { "reference": reference.to_uppercase() },
                doc! { "$set": {
                    "status": status_bson,
                    "admin_reply": admin_reply,
                } },
            )
            .await?;
        Ok(result.modified_count > 0)
    }
}
