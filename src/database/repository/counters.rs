//! Atomic sequence counters.
//!
//! Sequential identifiers (suggestion references, report ids) come from a
//! single `$inc` on a counter document, so two concurrent inserts can never
//! mint the same number.

use anyhow::{Context, Result};
use mongodb::bson::{doc, Document};
use mongodb::options::ReturnDocument;
use mongodb::Collection;

use crate::database::Database;

pub struct Counters {
    collection: Collection<Document>,
}

impl Counters {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("counters"),
        }
    }

    /// Next value of the named sequence, starting at 1.
    pub async fn next(&self, name: &str) -> Result<i64> {
        let updated = self
            .collection
            .find_one_and_update(doc! { "_id": name }, doc! { "$inc": { "seq": 1_i64 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?
            .with_context(|| format!("counter '{name}' missing after upsert"))?;
        Ok(updated.get_i64("seq")?)
    }
}
