//! Moderation documents: warnings and mutes.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A warning issued to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarnDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub user_id: u64,
    pub warned_by: u64,
    pub reason: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

/// A mute, scoped to a chat. `muted_until == None` means indefinite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MuteDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub user_id: u64,
    pub chat_id: i64,
    pub muted_by: u64,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub muted_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl MuteDoc {
    /// Whether this mute is still in force at `now`.
    pub fn active_at(&self, now: DateTime<Utc>) -> bool {
        self.muted_until.map(|until| until > now).unwrap_or(true)
    }
}
