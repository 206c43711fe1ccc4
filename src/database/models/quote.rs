//! Quote-book document.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A message saved into a chat's quote book via a reply to `/quote`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Short numeric id shown in `/quotes` listings.
    pub quote_id: i64,
    pub chat_id: i64,
    pub message_id: i32,
    #[serde(default)]
    pub author_id: Option<u64>,
    #[serde(default)]
    pub author_name: Option<String>,
    pub text: String,
    /// Who ran `/quote`.
    pub added_by: u64,
    pub created_at: DateTime<Utc>,
}
