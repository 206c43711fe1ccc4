//! Leveling documents: per-chat XP, badges, daily claims.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// XP record, scoped to a chat (None = global profile).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub user_id: u64,
    #[serde(default)]
    pub chat_id: Option<i64>,

    pub xp: i64,
    pub level: u32,
    pub total_messages: i64,
}

impl LevelDoc {
    pub fn new(user_id: u64, chat_id: Option<i64>) -> Self {
        Self {
            id: None,
            user_id,
            chat_id,
            xp: 0,
            level: 1,
            total_messages: 0,
        }
    }
}

/// A badge awarded to a user (tier badges come from level-ups).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub user_id: u64,
    /// Stable key, e.g. `tier_10`.
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub awarded_at: DateTime<Utc>,
}

/// A daily-reward claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyClaimDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub user_id: u64,
    pub claimed_at: DateTime<Utc>,
    pub xp_awarded: i64,
    pub streak: u32,
}
