//! Repository layer: one repo per concern, MongoDB behind moka caches
//! where reads sit on hot paths.

mod audit;
mod broadcasts;
mod counters;
mod faq;
mod levels;
mod moderation;
mod quotes;
mod reports;
mod settings;
mod suggestions;
mod users;

pub use audit::AuditRepo;
pub use broadcasts::BroadcastRepo;
pub use counters::Counters;
pub use faq::FaqRepo;
pub use levels::LevelRepo;
pub use moderation::ModerationRepo;
pub use quotes::QuoteRepo;
pub use reports::ReportRepo;
pub use settings::SettingsRepo;
pub use suggestions::SuggestionRepo;
pub use users::UserRepo;
