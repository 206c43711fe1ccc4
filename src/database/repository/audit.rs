//! Admin audit-trail repository.

use anyhow::Result;
use chrono::Utc;
use mongodb::bson::Document;
use mongodb::Collection;

use crate::database::models::AuditDoc;
use crate::database::Database;

pub struct AuditRepo {
    collection: Collection<AuditDoc>,
}

impl AuditRepo {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("audit_logs"),
        }
    }

    pub async fn record(&self, admin_id: u64, action: &str, details: Document) -> Result<()> {
        let entry = AuditDoc {
            id: None,
            admin_id,
            action: action.to_string(),
            details,
            created_at: Utc::now(),
        };
        self.collection.insert_one(&entry).await?;
        Ok(())
    }
}
