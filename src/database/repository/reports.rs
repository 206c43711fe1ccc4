//! Report repository.

use anyhow::Result;
use chrono::Utc;
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Collection, IndexModel};

use crate::database::models::{ReportDoc, ReportStatus};
use crate::database::repository::Counters;
use crate::database::Database;

pub struct ReportRepo {
    collection: Collection<ReportDoc>,
    counters: Counters,
}

impl ReportRepo {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("reports"),
            counters: Counters::new(db),
        }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        self.collection
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "report_id": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        reporter_id: u64,
        reported_id: Option<u64>,
        chat_id: Option<i64>,
        message_id: Option<i32>,
        category: &str,
        reason: Option<&str>,
    ) -> Result<ReportDoc> {
        let report = ReportDoc {
            id: None,
            report_id: self.counters.next("report_id").await?,
            reporter_id,
            reported_id,
            chat_id,
            message_id,
            category: category.to_string(),
            reason: reason.map(str::to_string),
            status: ReportStatus::Pending,
            created_at: Utc::now(),
        };
        self.collection.insert_one(&report).await?;
        Ok(report)
    }

    pub async fn get(&self, report_id: i64) -> Result<Option<ReportDoc>> {
        Ok(self
            .collection
            .find_one(doc! { "report_id": report_id })
            .await?)
    }

    pub async fn by_reporter(&self, reporter_id: u64) -> Result<Vec<ReportDoc>> {
        let cursor = self
            .collection
            .find(doc! { "reporter_id": reporter_id as i64 })
            .sort(doc! { "created_at": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn pending(&self, limit: i64) -> Result<Vec<ReportDoc>> {
        let cursor = self
            .collection
            .find(doc! { "status": "pending" })
            .sort(doc! { "created_at": 1 })
            .limit(limit)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn set_status(&self, report_id: i64, status: ReportStatus) -> Result<bool> {
        let status_bson = mongodb::bson::to_bson(&status)?;
        let result = self
            .collection
            .update_one(
                doc! { "report_id": report_id },
                doc! { "$set": { "status": status_bson } },
            )
            .await?;
        Ok(result.modified_count > 0)
    }
}
