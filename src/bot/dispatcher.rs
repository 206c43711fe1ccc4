//! Dispatcher setup and shared application state.
//!
//! All messages funnel through a single endpoint that runs the admission
//! pipeline first; command parsing happens after the gates, so a banned
//! or rate-limited user cannot reach any handler.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use teloxide::adaptors::Throttle;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{ChatId, Message, ParseMode};
use teloxide::utils::command::BotCommands;
use tracing::debug;

use crate::broadcast::{DeliverySink, RecipientSource};
use crate::config::Config;
use crate::database::{
    AuditRepo, BroadcastRepo, Database, FaqRepo, LevelRepo, ModerationRepo, QuoteRepo, ReportRepo,
    SettingsRepo, SuggestionRepo, UserRepo,
};
use crate::events::{self, AfkTracker, ShoutoutCooldowns, TriviaTracker};
use crate::flows;
use crate::permissions::Permissions;
use crate::pipeline::{NsfwScanner, Pipeline, RateWindow, XpTracker};
use crate::plugins::{self, Command};
use crate::render::{CardRenderer, DisabledRenderer, ImageCardRenderer};
use crate::services::{Maintenance, VerifyGate};
use crate::session::SessionStore;
use crate::utils::html_escape;

/// Bot type with the Throttle adaptor for API rate limiting.
pub type ThrottledBot = Throttle<Bot>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    pub sessions: Arc<SessionStore>,
    pub permissions: Permissions,

    pub users: Arc<UserRepo>,
    pub levels: Arc<LevelRepo>,
    pub moderation: Arc<ModerationRepo>,
    pub suggestions: Arc<SuggestionRepo>,
    pub broadcasts: Arc<BroadcastRepo>,
    pub reports: Arc<ReportRepo>,
    pub faq: Arc<FaqRepo>,
    pub settings: Arc<SettingsRepo>,
    pub quotes: Arc<QuoteRepo>,
    pub audit: Arc<AuditRepo>,

    pub pipeline: Arc<Pipeline>,
    pub verify: Arc<VerifyGate>,
    pub maintenance: Arc<Maintenance>,
    pub renderer: Arc<dyn CardRenderer>,
    pub http: reqwest::Client,

    pub trivia: Arc<TriviaTracker>,
    pub afk: Arc<AfkTracker>,
    pub shoutouts: Arc<ShoutoutCooldowns>,

    /// Bot username (without @) for command parsing and deep links.
    pub bot_username: String,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: Arc<Database>, config: Arc<Config>, bot_username: String) -> Self {
        let http = reqwest::Client::new();

        let sessions = Arc::new(SessionStore::new());
        let users = Arc::new(UserRepo::new(&db));
        let levels = Arc::new(LevelRepo::new(&db));
        let moderation = Arc::new(ModerationRepo::new(&db));
        let suggestions = Arc::new(SuggestionRepo::new(&db));
        let broadcasts = Arc::new(BroadcastRepo::new(&db));
        let reports = Arc::new(ReportRepo::new(&db));
        let faq = Arc::new(FaqRepo::new(&db));
        let settings = Arc::new(SettingsRepo::new(&db));
        let quotes = Arc::new(QuoteRepo::new(&db));
        let audit = Arc::new(AuditRepo::new(&db));
        let maintenance = Arc::new(Maintenance::new(&db));

        let permissions = Permissions::new(config.admin_ids.clone(), Arc::clone(&users));
        // An interval of zero means there is no verifier for this
        // deployment; polling would never open the gate.
        let verify = Arc::new(if config.verify.interval_secs == 0 {
            VerifyGate::always_allowed()
        } else {
            VerifyGate::new(http.clone(), config.verify.clone())
        });

        let pipeline = Arc::new(Pipeline::new(
            Arc::clone(&verify),
            Arc::clone(&maintenance),
            permissions.clone(),
            Arc::clone(&sessions),
            Arc::clone(&users),
            Arc::clone(&levels),
            Arc::clone(&moderation),
            Arc::clone(&settings),
            RateWindow::new(
                config.rate_limit.max_messages,
                Duration::from_secs(config.rate_limit.window_secs),
            ),
            XpTracker::new(&config.levels),
            NsfwScanner::new(http.clone(), config.bot_token.clone(), config.nsfw.clone()),
            config.prefixes.clone(),
        ));

        let renderer: Arc<dyn CardRenderer> = if config.cards.render_images {
            Arc::new(ImageCardRenderer)
        } else {
            Arc::new(DisabledRenderer)
        };

        Self {
            config,
            sessions,
            permissions,
            users,
            levels,
            moderation,
            suggestions,
            broadcasts,
            reports,
            faq,
            settings,
            quotes,
            audit,
            pipeline,
            verify,
            maintenance,
            renderer,
            http,
            trivia: Arc::new(TriviaTracker::new()),
            afk: Arc::new(AfkTracker::new()),
            shoutouts: Arc::new(ShoutoutCooldowns::new()),
            bot_username,
            started_at: Utc::now(),
        }
    }

    /// Record an admin action in the audit trail, best-effort.
    pub fn audit_log(
        &self,
        admin_id: u64,
        action: &'static str,
        details: mongodb::bson::Document,
    ) {
        let audit = Arc::clone(&self.audit);
        tokio::spawn(async move {
            if let Err(e) = audit.record(admin_id, action, details).await {
                debug!("Failed to record audit entry '{}': {:#}", action, e);
            }
        });
    }
}

/// Broadcast recipient pages backed by the user collection.
pub struct RepoRecipients(pub Arc<UserRepo>);

#[async_trait]
impl RecipientSource for RepoRecipients {
    async fn page(&self, limit: u32, offset: u64) -> anyhow::Result<Vec<u64>> {
        self.0.recipient_page(limit, offset).await
    }
}

/// Broadcast delivery over the bot transport.
pub struct BotDeliverySink(pub ThrottledBot);

#[async_trait]
impl DeliverySink for BotDeliverySink {
    async fn deliver(&self, user_id: u64, header: &str, body: &str) -> anyhow::Result<()> {
        self.0
            .send_message(
                ChatId(user_id as i64),
                format!("📣 <b>{}</b>\n\n{}", html_escape(header), html_escape(body)),
            )
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }
}

/// Build the dispatcher with all handlers.
pub fn build_dispatcher(
    bot: ThrottledBot,
    state: AppState,
) -> Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey> {
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
}

fn schema() -> UpdateHandler<anyhow::Error> {
    use teloxide::dispatching::UpdateFilterExt;

    let message_handler = Update::filter_message().endpoint(handle_message);

    let member_handler = Update::filter_chat_member()
        .branch(events::members::join_handler())
        .branch(events::members::leave_handler());

    let callback_handler = Update::filter_callback_query().endpoint(plugins::route_callback);

    dptree::entry()
        .branch(message_handler)
        .branch(member_handler)
        .branch(callback_handler)
}

/// Single message endpoint: pipeline, then routing.
async fn handle_message(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some(outcome) = state.pipeline.admit(&bot, &msg).await else {
        return Ok(());
    };

    if let Some(command_text) = outcome.command_text {
        match Command::parse(&command_text, &state.bot_username) {
            Ok(command) => return plugins::route_command(&bot, &state, &msg, command).await,
            Err(_) => {
                // Unrecognized commands fall through silently.
                debug!("Unknown command: {}", command_text);
                return Ok(());
            }
        }
    }

    // Side effects run on every plain message regardless of flow state.
    events::plain_message_side_effects(&bot, &state, &msg).await?;
    flows::handle_message(&bot, &state, &msg).await?;
    Ok(())
}
