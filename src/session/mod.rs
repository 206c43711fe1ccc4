//! Per-user session state.
//!
//! A session holds at most one active conversational flow. The flow is a
//! tagged enum rather than a bag of ad hoc flags, so mutual exclusivity is
//! structural: starting a new flow replaces whatever was in progress.
//!
//! Sessions are created lazily on first update and live for the process
//! lifetime. `DashMap` entry guards serialize mutation of the same key, so
//! two in-flight updates from one user cannot interleave a flow transition.

use std::sync::Arc;

use dashmap::DashMap;

/// Steps of the welcome/goodbye card configuration wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardStep {
    /// Awaiting the message template.
    Message,
    /// Awaiting a hex color or "skip".
    Color,
    /// Awaiting an attached photo, a direct URL, or "default".
    Background,
}

/// Which card a configuration wizard is editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKind {
    Welcome,
    Goodbye,
}

impl CardKind {
    pub fn label(self) -> &'static str {
        match self {
            CardKind::Welcome => "welcome",
            CardKind::Goodbye => "goodbye",
        }
    }
}

/// Draft state for the card configuration wizard.
#[derive(Debug, Clone)]
pub struct CardDraft {
    pub kind: CardKind,
    pub chat_id: i64,
    pub step: CardStep,
    pub message: Option<String>,
    pub color: Option<String>,
}

impl CardDraft {
    pub fn new(kind: CardKind, chat_id: i64) -> Self {
        Self {
            kind,
            chat_id,
            step: CardStep::Message,
            message: None,
            color: None,
        }
    }
}

/// Draft state for the suggestion flow.
#[derive(Debug, Clone, Default)]
pub struct SuggestionDraft {
    /// Set once step 1 (category) is answered.
    pub category: Option<String>,
}

/// Steps of the broadcast composition wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastStep {
    Header,
    Body,
    Confirm,
}

/// Draft state for the broadcast composition wizard.
#[derive(Debug, Clone)]
pub struct BroadcastDraft {
    pub step: BroadcastStep,
    pub header: Option<String>,
    pub body: Option<String>,
}

impl BroadcastDraft {
    pub fn new() -> Self {
        Self {
            step: BroadcastStep::Header,
            header: None,
            body: None,
        }
    }
}

impl Default for BroadcastDraft {
    fn default() -> Self {
        Self::new()
    }
}

/// The one active conversational flow of a session.
#[derive(Debug, Clone, Default)]
pub enum Flow {
    #[default]
    Idle,
    Suggestion(SuggestionDraft),
    CardConfig(CardDraft),
    BroadcastCompose(BroadcastDraft),
    /// Awaiting a `YYYY-MM-DD` date of birth.
    AgePending,
}

impl Flow {
    pub fn is_idle(&self) -> bool {
        matches!(self, Flow::Idle)
    }
}

/// Mutable per-user state surviving across updates.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub flow: Flow,
}

/// In-memory session store keyed by Telegram user id.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<DashMap<u64, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a session exists for the user (lazy creation).
    pub fn attach(&self, user_id: u64) {
        self.inner.entry(user_id).or_default();
    }

    /// Snapshot of the user's current flow.
    pub fn flow(&self, user_id: u64) -> Flow {
        self.inner
            .get(&user_id)
            .map(|s| s.flow.clone())
            .unwrap_or_default()
    }

    /// Start (or replace) the user's active flow.
    pub fn begin(&self, user_id: u64, flow: Flow) {
        self.inner.entry(user_id).or_default().flow = flow;
    }

    /// Clear the user's active flow (cancel or terminal step).
    pub fn clear(&self, user_id: u64) {
        if let Some(mut s) = self.inner.get_mut(&user_id) {
            s.flow = Flow::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_creation_and_default_flow() {
        let store = SessionStore::new();
        assert!(store.flow(1).is_idle());
        store.attach(1);
        assert!(store.flow(1).is_idle());
    }

    #[test]
    fn test_flows_are_mutually_exclusive() {
        let store = SessionStore::new();
        store.begin(7, Flow::Suggestion(SuggestionDraft::default()));
        assert!(matches!(store.flow(7), Flow::Suggestion(_)));

        // Starting another flow replaces the first one.
        store.begin(7, Flow::BroadcastCompose(BroadcastDraft::new()));
        assert!(matches!(store.flow(7), Flow::BroadcastCompose(_)));
    }

    #[test]
    fn test_clear_resets_to_idle() {
        let store = SessionStore::new();
        store.begin(7, Flow::AgePending);
        store.clear(7);
        assert!(store.flow(7).is_idle());
    }

    #[test]
    fn test_sessions_are_per_user() {
        let store = SessionStore::new();
        store.begin(1, Flow::CardConfig(CardDraft::new(CardKind::Welcome, -100)));
        store.begin(2, Flow::CardConfig(CardDraft::new(CardKind::Goodbye, -200)));

        match (store.flow(1), store.flow(2)) {
            (Flow::CardConfig(a), Flow::CardConfig(b)) => {
                assert_eq!(a.kind, CardKind::Welcome);
                assert_eq!(b.kind, CardKind::Goodbye);
                assert_ne!(a.chat_id, b.chat_id);
            }
            _ => panic!("expected card config flows"),
        }
    }
}
