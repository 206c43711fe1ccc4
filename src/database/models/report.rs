//! Report document.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Pending,
    Dismissed,
    Actioned,
}

impl ReportStatus {
    pub fn label(self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Dismissed => "dismissed",
            ReportStatus::Actioned => "actioned",
        }
    }
}

/// A member report against a message, reviewed by admins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Short numeric id referenced by admin commands and callbacks.
    pub report_id: i64,
    pub reporter_id: u64,
    #[serde(default)]
    pub reported_id: Option<u64>,
    #[serde(default)]
    pub chat_id: Option<i64>,
    #[serde(default)]
    pub message_id: Option<i32>,
    pub category: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
}
