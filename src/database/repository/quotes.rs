//! Quote-book repository.

use anyhow::Result;
use chrono::Utc;
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::Collection;
use rand::seq::SliceRandom;

use crate::database::models::QuoteDoc;
use crate::database::repository::Counters;
use crate::database::Database;

pub struct QuoteRepo {
    collection: Collection<QuoteDoc>,
    counters: Counters,
}

impl QuoteRepo {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("quotes"),
            counters: Counters::new(db),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn add(
        &self,
        chat_id: i64,
        message_id: i32,
        author_id: Option<u64>,
        author_name: Option<&str>,
        text: &str,
        added_by: u64,
    ) -> Result<QuoteDoc> {
        let quote = QuoteDoc {
            id: None,
            quote_id: self.counters.next("quote_id").await?,
            chat_id,
            message_id,
            author_id,
            author_name: author_name.map(str::to_string),
            text: text.to_string(),
            added_by,
            created_at: Utc::now(),
        };
        self.collection.insert_one(&quote).await?;
        Ok(quote)
    }

    pub async fn latest(&self, chat_id: i64, limit: i64) -> Result<Vec<QuoteDoc>> {
        let cursor = self
            .collection
            .find(doc! { "chat_id": chat_id })
            .sort(doc! { "created_at": -1 })
            .limit(limit)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// A random quote from the chat's book, if any.
    pub async fn random(&self, chat_id: i64) -> Result<Option<QuoteDoc>> {
        // The book stays small per chat; sampling in memory beats a
        // $sample aggregation round-trip here.
        let all: Vec<QuoteDoc> = self
            .collection
            .find(doc! { "chat_id": chat_id })
            .await?
            .try_collect()
            .await?;
        Ok(all.choose(&mut rand::thread_rng()).cloned())
    }
}
