//! Admin audit-trail document.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::Document;
use serde::{Deserialize, Serialize};

/// One recorded admin action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub admin_id: u64,
    pub action: String,
    #[serde(default)]
    pub details: Document,
    pub created_at: DateTime<Utc>,
}
