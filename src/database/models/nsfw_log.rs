//! NSFW detection log document.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Action taken on a flagged image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NsfwAction {
    Deleted,
    Warned,
}

impl NsfwAction {
    pub fn label(self) -> &'static str {
        match self {
            NsfwAction::Deleted => "deleted",
            NsfwAction::Warned => "warned",
        }
    }
}

/// One NSFW detection, kept for admin review via /nsfwlogs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NsfwLogDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub chat_id: Option<i64>,
    pub file_id: String,
    pub confidence: f32,
    pub action: NsfwAction,
    pub detected_at: DateTime<Utc>,
}
