//! Broadcast job repository.
//!
//! The persisted job is the source of truth for cancellation: the runner
//! re-reads `status` before each page, and /broadcastcancel flips it here.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::Collection;

use crate::broadcast::JobStore;
use crate::database::models::{BroadcastDoc, BroadcastStatus};
use crate::database::Database;

pub struct BroadcastRepo {
    collection: Collection<BroadcastDoc>,
}

impl BroadcastRepo {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("broadcasts"),
        }
    }

    pub async fn create(&self, header: &str, body: &str, created_by: u64) -> Result<BroadcastDoc> {
        let job_id = Utc::now().timestamp_millis();
        let job = BroadcastDoc::new(job_id, header.to_string(), body.to_string(), created_by);
        self.collection.insert_one(&job).await?;
        Ok(job)
    }

    pub async fn get(&self, job_id: i64) -> Result<Option<BroadcastDoc>> {
        Ok(self.collection.find_one(doc! { "job_id": job_id }).await?)
    }

    pub async fn latest(&self, limit: i64) -> Result<Vec<BroadcastDoc>> {
        let cursor = self
            .collection
            .find(doc! {})
            .sort(doc! { "created_at": -1 })
            .limit(limit)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// Request cancellation. The runner observes it at its next page
    /// boundary; returns false for unknown or already-terminal jobs.
    pub async fn request_cancel(&self, job_id: i64) -> Result<bool> {
        let filter = doc! {
            "job_id": job_id,
            "status": { "$in": ["pending", "sending"] },
        };
        let result = self
            .collection
            .update_one(filter, doc! { "$set": { "status": "cancelled" } })
            .await?;
        Ok(result.modified_count > 0)
    }
}

#[async_trait]
impl JobStore for BroadcastRepo {
    async fn status(&self, job_id: i64) -> Result<BroadcastStatus> {
        self.get(job_id)
            .await?
            .map(|j| j.status)
            .ok_or_else(|| anyhow::anyhow!("broadcast job {} not found", job_id))
    }

    async fn checkpoint(
        &self,
        job_id: i64,
        sent: u32,
        failed: u32,
        status: BroadcastStatus,
    ) -> Result<()> {
        let status_bson = mongodb::bson::to_bson(&status)?;
        // A progress checkpoint must not overwrite a cancellation that
        // landed while the page was being sent.
        let filter = if status == BroadcastStatus::Sending {
            doc! { "job_id": job_id, "status": { "$ne": "cancelled" } }
        } else {
            doc! { "job_id": job_id }
        };
        self.collection
            .update_one(
                filter,
                doc! { "$set": {
                    "sent": sent,
                    "failed": failed,
                    "status": status_bson,
                    "updated_at": mongodb::bson::to_bson(&Utc::now())?,
                } },
            )
            .await?;
        Ok(())
    }
}
