//! Update admission pipeline.
//!
//! Every inbound message passes a fixed, ordered sequence of gates before
//! it reaches command routing or an active conversation flow:
//!
//!   log -> verify -> maintenance -> session-attach -> prefix-detect ->
//!   ban -> rate -> mute -> xp -> nsfw
//!
//! Each gate either proceeds or drops the update. Failure behavior is
//! asymmetric on purpose: the ban and mute lookups treat a persistence
//! error as "not banned/muted" so a transient outage never locks out the
//! whole user base, while the verification and rate gates treat failure
//! as a drop. [`GATE_POLICIES`] records that choice per gate instead of
//! leaving it scattered through the stage code.

mod nsfw;
mod ratelimit;
mod xp;

pub use nsfw::{effective, skin_ratio, EffectiveNsfw, NsfwScanner};
pub use ratelimit::RateWindow;
pub use xp::{LevelUp, XpTracker};

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::Message;
use tracing::{debug, warn};

use crate::bot::ThrottledBot;
use crate::database::models::NsfwAction;
use crate::database::models::NsfwLogDoc;
use crate::database::{LevelRepo, ModerationRepo, SettingsRepo, UserRepo};
use crate::permissions::Permissions;
use crate::services::{Maintenance, VerifyGate};
use crate::session::SessionStore;
use crate::utils::html_escape;

/// A gate's decision for this update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateVerdict {
    Proceed,
    Drop,
}

/// Failure policy of a single gate.
pub struct GatePolicy {
    pub name: &'static str,
    /// On gate error: true = proceed as if the gate passed, false = drop.
    pub fail_open: bool,
}

/// Ordered gate policies. The order here is the execution order.
pub const GATE_POLICIES: &[GatePolicy] = &[
    GatePolicy { name: "log", fail_open: true },
    GatePolicy { name: "verify", fail_open: false },
    GatePolicy { name: "maintenance", fail_open: true },
    GatePolicy { name: "session", fail_open: true },
    GatePolicy { name: "prefix", fail_open: true },
    GatePolicy { name: "ban", fail_open: true },
    GatePolicy { name: "rate", fail_open: false },
    GatePolicy { name: "mute", fail_open: true },
    GatePolicy { name: "xp", fail_open: true },
    GatePolicy { name: "nsfw", fail_open: false },
];

fn policy(name: &str) -> &'static GatePolicy {
    GATE_POLICIES
        .iter()
        .find(|p| p.name == name)
        .unwrap_or(&GatePolicy { name: "unknown", fail_open: false })
}

/// Map a gate result onto its failure policy.
fn resolve(name: &str, result: Result<GateVerdict>) -> GateVerdict {
    match result {
        Ok(v) => v,
        Err(e) => {
            let p = policy(name);
            warn!("Pipeline gate '{}' failed: {:#}", name, e);
            if p.fail_open {
                GateVerdict::Proceed
            } else {
                GateVerdict::Drop
            }
        }
    }
}

/// What the pipeline hands to routing once all gates pass.
pub struct PipelineOutcome {
    /// Canonical `/`-prefixed command text, when the message used any
    /// recognized command prefix.
    pub command_text: Option<String>,
}

pub struct Pipeline {
    pub verify: Arc<VerifyGate>,
    pub maintenance: Arc<Maintenance>,
    pub permissions: Permissions,
    pub sessions: Arc<SessionStore>,
    pub users: Arc<UserRepo>,
    pub levels: Arc<LevelRepo>,
    pub moderation: Arc<ModerationRepo>,
    pub settings: Arc<SettingsRepo>,
    pub rate: RateWindow,
    pub xp: XpTracker,
    pub nsfw: NsfwScanner,
    prefixes: Vec<String>,
}

impl Pipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        verify: Arc<VerifyGate>,
        maintenance: Arc<Maintenance>,
        permissions: Permissions,
        sessions: Arc<SessionStore>,
        users: Arc<UserRepo>,
        levels: Arc<LevelRepo>,
        moderation: Arc<ModerationRepo>,
        settings: Arc<SettingsRepo>,
        rate: RateWindow,
        xp: XpTracker,
        nsfw: NsfwScanner,
        prefixes: Vec<String>,
    ) -> Self {
        Self {
            verify,
            maintenance,
            permissions,
            sessions,
            users,
            levels,
            moderation,
            settings,
            rate,
            xp,
            nsfw,
            prefixes,
        }
    }

    /// Run every gate in order. `None` means the update was dropped.
    pub async fn admit(&self, bot: &ThrottledBot, msg: &Message) -> Option<PipelineOutcome> {
        let Some(user) = msg.from.as_ref() else {
            // Channel posts and service messages carry no sender.
            return None;
        };
        if user.is_bot {
            return None;
        }
        let user_id = user.id.0;
        let chat_id = msg.chat.id.0;

        // log
        debug!(
            "update: chat={} user={} kind={}",
            chat_id,
            user_id,
            if msg.photo().is_some() { "photo" } else { "text" }
        );

        // verify
        if !self.verify.allowed() {
            debug!("Dropping update: instance not verified");
            return None;
        }

        // maintenance: only admins get through while it is in effect, so
        // whoever switched it on can still switch it off
        if self.maintenance.active(chrono::Utc::now())
            && !self.permissions.is_admin(user_id).await
        {
            debug!("Dropping update from {}: maintenance mode", user_id);
            return None;
        }

        // session attach + background profile refresh
        self.sessions.attach(user_id);
        Arc::clone(&self.users).upsert_background(user.clone());

        // prefix detect
        let command_text = self.detect_prefix(msg).await;

        // ban gate (fails open)
        let banned = resolve(
            "ban",
            self.users.is_banned(user_id).await.map(|b| {
                if b {
                    GateVerdict::Drop
                } else {
                    GateVerdict::Proceed
                }
            }),
        );
        if banned == GateVerdict::Drop {
            return None;
        }

        // rate gate
        if !self.rate.admit(user_id, Instant::now()) {
            debug!("Rate limited user {}", user_id);
            return None;
        }

        // mute gate (fails open); delete the muted user's message best-effort
        let muted = resolve(
            "mute",
            self.moderation.is_muted(user_id, chat_id).await.map(|m| {
                if m {
                    GateVerdict::Drop
                } else {
                    GateVerdict::Proceed
                }
            }),
        );
        if muted == GateVerdict::Drop {
            let _ = bot.delete_message(msg.chat.id, msg.id).await;
            return None;
        }

        // xp (side effect, never blocks)
        if let Err(e) = self.award_xp(bot, msg, user_id, chat_id).await {
            warn!("XP stage failed: {:#}", e);
        }

        // nsfw scan (fails closed)
        let verdict = resolve("nsfw", self.scan_nsfw(bot, msg, user_id, chat_id).await);
        if verdict == GateVerdict::Drop {
            return None;
        }

        Some(PipelineOutcome { command_text })
    }

    /// Normalize alternate command prefixes to the canonical `/` form.
    async fn detect_prefix(&self, msg: &Message) -> Option<String> {
        let text = msg.text()?;
        if let Some(rest) = text.strip_prefix('/') {
            if rest.is_empty() {
                return None;
            }
            return Some(text.to_string());
        }

        let mut prefixes: Vec<String> =
            self.prefixes.iter().filter(|p| *p != "/").cloned().collect();
        if let Ok(settings) = self.settings.chat_settings(msg.chat.id.0).await {
            if let Some(extra) = settings.command_prefix {
                prefixes.push(extra);
            }
        }

        for prefix in &prefixes {
            if let Some(rest) = text.strip_prefix(prefix.as_str()) {
                if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
                    return Some(format!("/{rest}"));
                }
            }
        }
        None
    }

    async fn award_xp(
        &self,
        bot: &ThrottledBot,
        msg: &Message,
        user_id: u64,
        chat_id: i64,
    ) -> Result<()> {
        // Groups only; private chats don't earn XP.
        if chat_id >= 0 {
            return Ok(());
        }

        if let Some(up) = self.xp.award(&self.levels, user_id, chat_id).await? {
            let name = msg
                .from
                .as_ref()
                .map(|u| html_escape(&u.first_name))
                .unwrap_or_default();
            let mut text = format!("🎉 {name} umakyat sa level {}!", up.level);
            if let Some(tier) = up.tier_name {
                text.push_str(&format!(" Bagong badge: <b>{tier}</b>"));
            }
            bot.send_message(msg.chat.id, text)
                .parse_mode(teloxide::types::ParseMode::Html)
                .await?;
        }
        Ok(())
    }

    async fn scan_nsfw(
        &self,
        bot: &ThrottledBot,
        msg: &Message,
        user_id: u64,
        chat_id: i64,
    ) -> Result<GateVerdict> {
        if msg.photo().is_none() {
            return Ok(GateVerdict::Proceed);
        }

        let overrides = self.settings.chat_settings(chat_id).await?.nsfw;
        let eff = self.nsfw.settings_for(&overrides);
        if !eff.enabled {
            return Ok(GateVerdict::Proceed);
        }

        let Some(ratio) = self.nsfw.measure(bot, msg).await? else {
            return Ok(GateVerdict::Proceed);
        };
        if ratio < eff.threshold {
            return Ok(GateVerdict::Proceed);
        }

        let action = if eff.delete_on_detect {
            bot.delete_message(msg.chat.id, msg.id).await?;
            NsfwAction::Deleted
        } else {
            NsfwAction::Warned
        };

        let file_id = msg
            .photo()
            .and_then(|p| p.last())
            .map(|p| p.file.id.clone())
            .unwrap_or_default();
        let entry = NsfwLogDoc {
            id: None,
            user_id: Some(user_id),
            chat_id: Some(chat_id),
            file_id,
            confidence: ratio,
            action,
            detected_at: chrono::Utc::now(),
        };
        if let Err(e) = self.settings.log_nsfw(entry).await {
            warn!("Failed to record NSFW detection: {:#}", e);
        }

        if eff.notify_user {
            bot.send_message(
                msg.chat.id,
                "⚠️ Ang larawan ay na-flag bilang hindi angkop at tinanggal.",
            )
            .await?;
        }

        Ok(GateVerdict::Drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_order_is_fixed() {
        let names: Vec<&str> = GATE_POLICIES.iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            ["log", "verify", "maintenance", "session", "prefix", "ban", "rate", "mute", "xp", "nsfw"]
        );
    }

    #[test]
    fn test_ban_and_mute_fail_open_others_closed() {
        assert!(policy("ban").fail_open);
        assert!(policy("mute").fail_open);
        assert!(!policy("verify").fail_open);
        assert!(!policy("rate").fail_open);
        assert!(!policy("nsfw").fail_open);
    }

    #[test]
    fn test_resolve_applies_policy_on_error() {
        let err = || Err(anyhow::anyhow!("db down"));
        assert_eq!(resolve("ban", err()), GateVerdict::Proceed);
        assert_eq!(resolve("mute", err()), GateVerdict::Proceed);
        assert_eq!(resolve("nsfw", err()), GateVerdict::Drop);
        assert_eq!(resolve("ban", Ok(GateVerdict::Drop)), GateVerdict::Drop);
    }
}
