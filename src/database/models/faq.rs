//! FAQ entry document.

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// One FAQ entry, browsed by category through inline keyboards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Short numeric id used in callback payloads.
    pub faq_id: i64,
    pub category: String,
    pub question: String,
    pub answer: String,
}
