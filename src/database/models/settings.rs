//! Per-chat settings documents: card configuration, chat overrides, rules.

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Welcome/goodbye card configuration for a chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardConfigDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub chat_id: i64,

    #[serde(default)]
    pub welcome_message: Option<String>,
    #[serde(default)]
    pub goodbye_message: Option<String>,

    /// `#RRGGBB`; falls back to the global default when None.
    #[serde(default)]
    pub text_color: Option<String>,
    /// Path of a downloaded background asset; None = solid default.
    #[serde(default)]
    pub background: Option<String>,

    #[serde(default = "default_enabled")]
    pub welcome_enabled: bool,
    #[serde(default = "default_enabled")]
    pub goodbye_enabled: bool,

    #[serde(default)]
    pub updated_by: Option<u64>,
}

fn default_enabled() -> bool {
    true
}

impl CardConfigDoc {
    pub fn new(chat_id: i64) -> Self {
        Self {
            id: None,
            chat_id,
            welcome_message: None,
            goodbye_message: None,
            text_color: None,
            background: None,
            welcome_enabled: true,
            goodbye_enabled: true,
            updated_by: None,
        }
    }
}

/// Chat-level NSFW overrides; None inherits the global config.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NsfwOverrides {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub threshold: Option<f32>,
    #[serde(default)]
    pub delete_on_detect: Option<bool>,
    #[serde(default)]
    pub notify_user: Option<bool>,
}

/// Per-chat settings read by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSettingsDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub chat_id: i64,

    /// Extra command prefix recognized in this chat.
    #[serde(default)]
    pub command_prefix: Option<String>,

    #[serde(default)]
    pub nsfw: NsfwOverrides,
}

impl ChatSettingsDoc {
    pub fn new(chat_id: i64) -> Self {
        Self {
            id: None,
            chat_id,
            command_prefix: None,
            nsfw: NsfwOverrides::default(),
        }
    }
}

/// Group rules text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub chat_id: i64,
    pub text: String,
    #[serde(default)]
    pub updated_by: Option<u64>,
}
