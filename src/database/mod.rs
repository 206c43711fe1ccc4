//! Database module exports.

pub mod models;
mod mongo;
mod repository;

pub use mongo::Database;
pub use repository::{
    AuditRepo, BroadcastRepo, FaqRepo, LevelRepo, ModerationRepo, QuoteRepo, ReportRepo,
    SettingsRepo, SuggestionRepo, UserRepo,
};
