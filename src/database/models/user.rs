//! User document.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use teloxide::types::User;

/// Stored role granted to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Member,
    Admin,
}

/// Age-verification state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgeStatus {
    #[default]
    Unverified,
    Verified,
    Rejected,
}

/// Registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Telegram user id (indexed).
    pub user_id: u64,

    #[serde(default)]
    pub username: Option<String>,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,

    #[serde(default)]
    pub role: UserRole,

    #[serde(default)]
    pub is_banned: bool,
    #[serde(default)]
    pub ban_reason: Option<String>,

    /// Stored preference; replies are not localized.
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,

    /// `YYYY-MM-DD`, collected by the age-verification flow.
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub age_status: AgeStatus,

    pub last_active: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl UserDoc {
    /// Build a fresh document from a Telegram user.
    pub fn from_telegram(user: &User) -> Self {
        Self {
            id: None,
            user_id: user.id.0,
            username: user.username.as_ref().map(|u| u.to_lowercase()),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: UserRole::Member,
            is_banned: false,
            ban_reason: None,
            language: None,
            notifications_enabled: true,
            date_of_birth: None,
            age_status: AgeStatus::Unverified,
            last_active: Utc::now(),
        }
    }

    /// Whether the Telegram-provided identity fields differ from this doc.
    pub fn identity_changed(&self, user: &User) -> bool {
        self.username != user.username.as_ref().map(|u| u.to_lowercase())
            || self.first_name != user.first_name
            || self.last_name != user.last_name
    }

    pub fn display_name(&self) -> String {
        crate::utils::display_name(&self.first_name, self.username.as_deref())
    }
}
