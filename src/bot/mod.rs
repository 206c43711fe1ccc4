//! Bot module: dispatcher, shared state and runtime.

pub mod dispatcher;
mod runtime;
mod webhook;

pub use dispatcher::{build_dispatcher, AppState, BotDeliverySink, RepoRecipients, ThrottledBot};
pub use runtime::run;
