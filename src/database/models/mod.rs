//! Document models.

mod audit;
mod broadcast;
mod faq;
mod level;
mod maintenance;
mod moderation;
mod nsfw_log;
mod quote;
mod report;
mod settings;
mod suggestion;
mod user;

pub use audit::AuditDoc;
pub use broadcast::{BroadcastDoc, BroadcastStatus};
pub use faq::FaqDoc;
pub use level::{BadgeDoc, DailyClaimDoc, LevelDoc};
pub use maintenance::MaintenanceDoc;
pub use moderation::{MuteDoc, WarnDoc};
pub use nsfw_log::{NsfwAction, NsfwLogDoc};
pub use quote::QuoteDoc;
pub use report::{ReportDoc, ReportStatus};
pub use settings::{CardConfigDoc, ChatSettingsDoc, NsfwOverrides, RulesDoc};
pub use suggestion::{SuggestionDoc, SuggestionStatus};
pub use user::{AgeStatus, UserDoc, UserRole};
