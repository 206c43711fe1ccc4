//! FAQ repository.
//!
//! FAQ content changes rarely; list reads are cached briefly to keep the
//! callback browser snappy.

use std::time::Duration;

use anyhow::Result;
use futures::stream::TryStreamExt;
use moka::sync::Cache;
use mongodb::bson::doc;
use mongodb::Collection;

use crate::database::models::FaqDoc;
use crate::database::Database;

pub struct FaqRepo {
    collection: Collection<FaqDoc>,
    category_cache: Cache<(), Vec<String>>,
}

impl FaqRepo {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("faq"),
            category_cache: Cache::builder()
                .max_capacity(1)
                .time_to_live(Duration::from_secs(120))
                .build(),
        }
    }

    pub async fn categories(&self) -> Result<Vec<String>> {
        if let Some(cats) = self.category_cache.get(&()) {
            return Ok(cats);
        }

        let cursor = self.collection.find(doc! {}).await?;
        let all: Vec<FaqDoc> = cursor.try_collect().await?;

        let mut cats: Vec<String> = all.into_iter().map(|f| f.category).collect();
        cats.sort();
        cats.dedup();

        self.category_cache.insert((), cats.clone());
        Ok(cats)
    }

    pub async fn by_category(&self, category: &str) -> Result<Vec<FaqDoc>> {
        let cursor = self
            .collection
            .find(doc! { "category": category })
            .sort(doc! { "faq_id": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn get(&self, faq_id: i64) -> Result<Option<FaqDoc>> {
        Ok(self.collection.find_one(doc! { "faq_id": faq_id }).await?)
    }
}
