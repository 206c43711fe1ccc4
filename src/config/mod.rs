//! Configuration module.
//!
//! Loads configuration from environment variables. Tunables that the
//! original deployment kept in flat config (rate window, XP rates, NSFW
//! thresholds, verification endpoint) all live here with defaults.

use std::env;

use serde::Deserialize;

/// Minimum age (whole years) accepted by age verification.
pub const MIN_AGE_YEARS: i64 = 14;

/// Bot running mode.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BotMode {
    Polling,
    Webhook,
}

impl Default for BotMode {
    fn default() -> Self {
        Self::Polling
    }
}

/// A level tier: reaching `level` grants the named badge.
#[derive(Debug, Clone)]
pub struct LevelTier {
    pub level: u32,
    pub name: &'static str,
    pub xp_required: i64,
}

/// Fixed level tier chart.
pub const LEVEL_TIERS: &[LevelTier] = &[
    LevelTier { level: 1, name: "Bagito", xp_required: 0 },
    LevelTier { level: 5, name: "Kasapi", xp_required: 250 },
    LevelTier { level: 10, name: "Suki", xp_required: 1_000 },
    LevelTier { level: 20, name: "Beterano", xp_required: 4_000 },
    LevelTier { level: 35, name: "Alamat", xp_required: 12_000 },
    LevelTier { level: 50, name: "Tanod", xp_required: 30_000 },
];

/// Rate-limit gate settings.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Max admitted updates per user within the window.
    pub max_messages: usize,
    /// Trailing window length in seconds.
    pub window_secs: u64,
}

/// Leveling settings.
#[derive(Debug, Clone)]
pub struct LevelsConfig {
    pub xp_per_message: i64,
    pub xp_cooldown_secs: u64,
    pub trivia_prize_xp: i64,
}

/// Global NSFW screening defaults (chats can override).
#[derive(Debug, Clone)]
pub struct NsfwConfig {
    pub enabled: bool,
    pub threshold: f32,
    pub delete_on_detect: bool,
    pub notify_user: bool,
}

/// Remote instance verification settings.
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    pub url: String,
    pub instance_id: Option<String>,
    pub interval_secs: u64,
}

/// Welcome/goodbye card defaults used when a chat has no configuration.
#[derive(Debug, Clone)]
pub struct CardDefaults {
    pub welcome_message: String,
    pub goodbye_message: String,
    pub text_color: String,
    /// When false, cards go out as plain text (no image rendering).
    pub render_images: bool,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub bot_token: String,
    pub bot_mode: BotMode,
    pub webhook_url: Option<String>,
    pub webhook_port: u16,
    pub webhook_secret: Option<String>,
    pub bot_username: Option<String>,

    /// Admin user IDs (comma-separated ADMIN_IDS). The first entry is the
    /// super admin.
    pub admin_ids: Vec<u64>,

    // MongoDB
    pub mongodb_uri: String,
    pub mongodb_database: String,

    pub rate_limit: RateLimitConfig,
    pub levels: LevelsConfig,
    pub nsfw: NsfwConfig,
    pub verify: VerifyConfig,
    pub cards: CardDefaults,

    /// Directory for downloaded card backgrounds.
    pub assets_dir: String,

    /// Global command prefixes recognized besides `/` (chat settings can
    /// add a per-chat one).
    pub prefixes: Vec<String>,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if required environment variables are not set.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let bot_mode = match env::var("BOT_MODE")
            .unwrap_or_else(|_| "polling".to_string())
            .to_lowercase()
            .as_str()
        {
            "webhook" => BotMode::Webhook,
            _ => BotMode::Polling,
        };

        let webhook_url = env::var("WEBHOOK_URL").ok();
        if bot_mode == BotMode::Webhook && webhook_url.is_none() {
            panic!("WEBHOOK_URL must be set when BOT_MODE is webhook");
        }

        let admin_ids = env::var("ADMIN_IDS")
            .unwrap_or_default()
            .split(',')
            .filter_map(|s| s.trim().parse::<u64>().ok())
            .collect();

        let bot_username = env::var("BOT_USERNAME")
            .ok()
            .map(|s| s.trim_start_matches('@').to_string())
            .filter(|s| !s.is_empty());

        let instance_id = env::var("INSTANCE_ID")
            .ok()
            .or_else(|| env::var("HOSTNAME").ok())
            .filter(|s| !s.is_empty());

        Self {
            bot_token: env::var("BOT_TOKEN").expect("BOT_TOKEN must be set"),
            bot_mode,
            webhook_url,
            webhook_port: env_or("WEBHOOK_PORT", 8443),
            webhook_secret: env::var("WEBHOOK_SECRET").ok().filter(|s| !s.is_empty()),
            bot_username,
            admin_ids,
            mongodb_uri: env::var("MONGODB_URI").expect("MONGODB_URI must be set"),
            mongodb_database: env::var("MONGODB_DATABASE")
                .unwrap_or_else(|_| "tanod".to_string()),
            rate_limit: RateLimitConfig {
                max_messages: env_or("RATE_MAX_MESSAGES", 8),
                window_secs: env_or("RATE_WINDOW_SECS", 10),
            },
            levels: LevelsConfig {
                xp_per_message: env_or("XP_PER_MESSAGE", 5),
                xp_cooldown_secs: env_or("XP_COOLDOWN_SECS", 60),
                trivia_prize_xp: env_or("TRIVIA_PRIZE_XP", 20),
            },
            nsfw: NsfwConfig {
                enabled: env_or("NSFW_ENABLED", true),
                threshold: env_or("NSFW_THRESHOLD", 0.42),
                delete_on_detect: env_or("NSFW_DELETE_ON_DETECT", true),
                notify_user: env_or("NSFW_NOTIFY_USER", true),
            },
            verify: VerifyConfig {
                url: env::var("API_VERIFY_URL")
                    .unwrap_or_else(|_| "https://api.panindigan.com/verify".to_string()),
                instance_id,
                interval_secs: env_or("VERIFY_INTERVAL_SECS", 60),
            },
            cards: CardDefaults {
                welcome_message: env::var("WELCOME_MESSAGE").unwrap_or_else(|_| {
                    "Maligayang pagdating, {name}! Ikaw ang ika-{count} miyembro ng {group}.".to_string()
                }),
                goodbye_message: env::var("GOODBYE_MESSAGE")
                    .unwrap_or_else(|_| "Paalam, {name}. Hanggang sa muli!".to_string()),
                text_color: env::var("CARD_TEXT_COLOR").unwrap_or_else(|_| "#FFFFFF".to_string()),
                render_images: env_or("CARD_IMAGES", true),
            },
            assets_dir: env::var("ASSETS_DIR").unwrap_or_else(|_| "assets".to_string()),
            prefixes: vec!["/".to_string(), "!".to_string()],
        }
    }

}

/// Tier matching a level, if the level has reached any tier at all.
pub fn tier_for_level(level: u32) -> Option<&'static LevelTier> {
    LEVEL_TIERS.iter().rev().find(|t| level >= t.level)
}

/// The next tier above a level, if any.
pub fn next_tier(level: u32) -> Option<&'static LevelTier> {
    LEVEL_TIERS.iter().find(|t| t.level > level)
}

/// Level reached for a cumulative XP total, derived from the tier chart.
///
/// Levels between tiers are interpolated linearly on XP.
pub fn level_for_xp(xp: i64) -> u32 {
    let mut level = 1;
    for window in LEVEL_TIERS.windows(2) {
        let (lo, hi) = (&window[0], &window[1]);
        if xp < hi.xp_required {
            let span_xp = hi.xp_required - lo.xp_required;
            let span_lv = (hi.level - lo.level) as i64;
            let into = xp - lo.xp_required;
            if into <= 0 {
                return level.max(lo.level);
            }
            return lo.level + ((into * span_lv) / span_xp) as u32;
        }
        level = hi.level;
    }
    level
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_xp_monotonic() {
        let mut prev = 0;
        for xp in (0..35_000).step_by(500) {
            let lvl = level_for_xp(xp);
            assert!(lvl >= prev, "level regressed at xp={}", xp);
            prev = lvl;
        }
    }

    #[test]
    fn test_level_tier_boundaries() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(250), 5);
        assert_eq!(level_for_xp(1_000), 10);
        assert_eq!(level_for_xp(30_000), 50);
    }

    #[test]
    fn test_tier_lookup() {
        assert_eq!(tier_for_level(7).map(|t| t.name), Some("Kasapi"));
        assert_eq!(next_tier(7).map(|t| t.level), Some(10));
        assert!(next_tier(50).is_none());
    }
}
