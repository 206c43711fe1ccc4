//! Broadcast job document.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Lifecycle of a broadcast job. `Cancelled` and `Completed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastStatus {
    Pending,
    Sending,
    Completed,
    Cancelled,
}

impl BroadcastStatus {
    pub fn label(self) -> &'static str {
        match self {
            BroadcastStatus::Pending => "pending",
            BroadcastStatus::Sending => "sending",
            BroadcastStatus::Completed => "completed",
            BroadcastStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BroadcastStatus::Completed | BroadcastStatus::Cancelled)
    }
}

/// One broadcast fan-out. The persisted copy is the source of truth for
/// cancellation polling; counters are monotonically non-decreasing until a
/// terminal status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Short numeric id referenced by admin commands.
    pub job_id: i64,
    pub header: String,
    pub body: String,
    pub status: BroadcastStatus,
    pub sent: u32,
    pub failed: u32,
    pub created_by: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BroadcastDoc {
    pub fn new(job_id: i64, header: String, body: String, created_by: u64) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            job_id,
            header,
            body,
            status: BroadcastStatus::Pending,
            sent: 0,
            failed: 0,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }
}
