//! Suggestion document.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl SuggestionStatus {
    pub fn label(self) -> &'static str {
        match self {
            SuggestionStatus::Pending => "pending",
            SuggestionStatus::Approved => "approved",
            SuggestionStatus::Rejected => "rejected",
        }
    }
}

/// A member suggestion with a human-readable reference (`SUG-00042`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub reference: String,
    pub user_id: u64,
    pub category: String,
    pub content: String,
    #[serde(default)]
    pub status: SuggestionStatus,
    /// Telegram user ids that upvoted; one vote per user.
    #[serde(default)]
    pub upvotes: Vec<u64>,
    #[serde(default)]
    pub admin_reply: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SuggestionDoc {
    /// Format the reference for the `seq`-th suggestion.
    pub fn reference_for(seq: u64) -> String {
        format!("SUG-{:05}", seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_format() {
        assert_eq!(SuggestionDoc::reference_for(1), "SUG-00001");
        assert_eq!(SuggestionDoc::reference_for(42), "SUG-00042");
        assert_eq!(SuggestionDoc::reference_for(99_999), "SUG-99999");
    }
}
