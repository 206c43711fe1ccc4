//! Command handlers.
//!
//! One handler module per concern. Commands parse from the canonical
//! `/`-prefixed text the pipeline produced, so alternate prefixes work
//! transparently. Callback payloads are colon-delimited
//! (`namespace:action:args`) and every callback is answered exactly
//! once, unknown payloads included.

pub mod broadcast;
pub mod cards;
pub mod community;
pub mod faq;
pub mod help;
pub mod levels;
pub mod moderation;
pub mod nsfw_admin;
pub mod report;
pub mod settings;
pub mod start;
pub mod suggest;

use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, Message};
use teloxide::utils::command::BotCommands;
use tracing::debug;

use crate::bot::{AppState, ThrottledBot};

/// All bot commands.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Mga available na command:")]
pub enum Command {
    // Core
    #[command(description = "Simulan ang bot")]
    Start(String),
    #[command(description = "Tulong at listahan ng commands")]
    Help,
    #[command(description = "Ang iyong profile")]
    Me,
    #[command(description = "Profile ng ibang user")]
    Whois(String),
    #[command(description = "Pong")]
    Ping,
    #[command(description = "Status ng bot")]
    Status,
    #[command(description = "Tungkol sa bot")]
    About,
    #[command(description = "Kanselahin ang kasalukuyang flow")]
    Cancel,
    #[command(description = "Magpadala ng feedback sa admins")]
    Feedback(String),
    #[command(description = "Status ng instance verification (admin)")]
    Verifystatus,

    // Leveling
    #[command(description = "Ang iyong level at XP")]
    Rank,
    #[command(description = "Top users")]
    Leaderboard,
    #[command(description = "Tier chart")]
    Levels,
    #[command(description = "Ang iyong badges")]
    Badges,
    #[command(description = "Itakda ang level ng user (admin)")]
    Setlevel(String),
    #[command(description = "Magdagdag ng XP (admin)")]
    Addxp(String),
    #[command(description = "Arawang gantimpala")]
    Daily,
    #[command(description = "Ang iyong daily streak")]
    Streak,

    // Moderation
    #[command(description = "I-ban ang user (admin)")]
    Ban(String),
    #[command(description = "I-unban ang user (admin)")]
    Unban(String),
    #[command(description = "Bigyan ng warning (admin)")]
    Warn(String),
    #[command(description = "Mga warning ng user")]
    Warnings(String),
    #[command(description = "Burahin ang warnings (admin)")]
    Clearwarnings(String),
    #[command(description = "I-mute ang user (admin)")]
    Mute(String),
    #[command(description = "I-unmute ang user (admin)")]
    Unmute(String),
    #[command(description = "Mga naka-mute sa chat (admin)")]
    Mutelist,
    #[command(description = "Gawing admin ang user (super admin)")]
    Promote(String),
    #[command(description = "Tanggalin sa pagka-admin (super admin)")]
    Demote(String),
    #[command(description = "Mga kamakailang aktibong user (admin)")]
    Users,
    #[command(description = "Detalyadong user info (admin)")]
    Userinfo(String),
    #[command(description = "Hanapin ang user sa username (admin)")]
    Lookup(String),

    // Welcome / goodbye cards
    #[command(description = "I-configure ang welcome card (admin)")]
    Setwelcome,
    #[command(description = "I-configure ang goodbye card (admin)")]
    Setgoodbye,
    #[command(description = "Preview ng welcome card")]
    Previewwelcome,
    #[command(description = "Preview ng goodbye card")]
    Previewgoodbye,
    #[command(description = "I-reset ang welcome card (admin)")]
    Resetwelcome,
    #[command(description = "I-reset ang goodbye card (admin)")]
    Resetgoodbye,
    #[command(description = "I-on/off ang welcome (admin)")]
    Togglewelcome,
    #[command(description = "I-on/off ang goodbye (admin)")]
    Togglegoodbye,

    // Suggestions
    #[command(description = "Magmungkahi")]
    Suggest,
    #[command(description = "Mga mungkahi mo")]
    Mysuggestions,
    #[command(description = "I-track ang mungkahi (SUG-xxxxx)")]
    Tracksuggestion(String),
    #[command(description = "I-upvote ang mungkahi")]
    Upvote(String),
    #[command(description = "Pinaka-boto na mungkahi")]
    Topsuggestions,
    #[command(description = "Pending na mungkahi (admin)")]
    Suggestions,
    #[command(description = "Aprubahan ang mungkahi (admin)")]
    Approvesuggestion(String),
    #[command(description = "Tanggihan ang mungkahi (admin)")]
    Rejectsuggestion(String),

    // Broadcasts
    #[command(description = "Mag-broadcast sa lahat (admin)")]
    Broadcast,
    #[command(description = "Status ng broadcast (admin)")]
    Broadcaststatus(String),
    #[command(description = "Nakaraang broadcasts (admin)")]
    Broadcasthistory,
    #[command(description = "Ihinto ang broadcast (admin)")]
    Broadcastcancel(String),

    // Reports
    #[command(description = "I-report ang niresponde na mensahe")]
    Report(String),
    #[command(description = "Mga report mo")]
    Myreports,
    #[command(description = "Pending na reports (admin)")]
    Reports,
    #[command(description = "I-dismiss ang report (admin)")]
    Dismissreport(String),
    #[command(description = "Aksyunan ang report (admin)")]
    Actionreport(String),

    // FAQ
    #[command(description = "Mga madalas itanong")]
    Faq,

    // Community
    #[command(description = "Markahan ang sarili bilang AFK")]
    Afk(String),
    #[command(description = "Magsimula ng trivia (admin)")]
    Trivia,
    #[command(description = "Mag-shoutout (may 6h cooldown)")]
    Shoutout(String),
    #[command(description = "Mga patakaran ng grupo")]
    Rules,
    #[command(description = "Itakda ang patakaran (admin)")]
    Setrules(String),
    #[command(description = "I-save ang na-reply na mensahe bilang quote")]
    Quote,
    #[command(description = "Mga naka-save na quote ng chat")]
    Quotes,

    // Settings
    #[command(description = "Broadcast notifications on/off")]
    Notify(String),
    #[command(description = "Itakda ang wika")]
    Language(String),
    #[command(description = "Karagdagang command prefix ng chat (admin)")]
    Setprefix(String),
    #[command(description = "Mga aktibong prefix")]
    Listprefix,

    // NSFW admin
    #[command(description = "NSFW screening status (admin)")]
    Nsfwstatus,
    #[command(description = "I-on/off ang NSFW screening (admin)")]
    Togglensfw,
    #[command(description = "NSFW settings (admin)")]
    Nsfwconfig(String),
    #[command(description = "NSFW detection logs (admin)")]
    Nsfwlogs,
    #[command(description = "Burahin ang NSFW logs ng user (admin)")]
    Clearnsfwlog(String),

    // Operations
    #[command(description = "Maintenance mode: on/off/schedule/cancel/status (admin)")]
    Maintenance(String),
}

/// Dispatch a parsed command to its handler.
pub async fn route_command(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
    command: Command,
) -> anyhow::Result<()> {
    use Command::*;

    match command {
        Start(payload) => start::start(bot, state, msg, &payload).await,
        Help => help::help(bot, state, msg).await,
        Me => start::me(bot, state, msg).await,
        Whois(args) => start::whois(bot, state, msg, &args).await,
        Ping => start::ping(bot, state, msg).await,
        Status => start::status(bot, state, msg).await,
        About => start::about(bot, state, msg).await,
        Cancel => start::cancel(bot, state, msg).await,
        Feedback(text) => start::feedback(bot, state, msg, &text).await,
        Verifystatus => start::verifystatus(bot, state, msg).await,

        Rank => levels::rank(bot, state, msg).await,
        Leaderboard => levels::leaderboard(bot, state, msg).await,
        Levels => levels::tier_chart(bot, state, msg).await,
        Badges => levels::badges(bot, state, msg).await,
        Setlevel(args) => levels::setlevel(bot, state, msg, &args).await,
        Addxp(args) => levels::addxp(bot, state, msg, &args).await,
        Daily => levels::daily(bot, state, msg).await,
        Streak => levels::streak(bot, state, msg).await,

        Ban(args) => moderation::ban(bot, state, msg, &args).await,
        Unban(args) => moderation::unban(bot, state, msg, &args).await,
        Warn(args) => moderation::warn(bot, state, msg, &args).await,
        Warnings(args) => moderation::warnings(bot, state, msg, &args).await,
        Clearwarnings(args) => moderation::clearwarnings(bot, state, msg, &args).await,
        Mute(args) => moderation::mute(bot, state, msg, &args).await,
        Unmute(args) => moderation::unmute(bot, state, msg, &args).await,
        Mutelist => moderation::mutelist(bot, state, msg).await,
        Promote(args) => {
            moderation::set_role(bot, state, msg, &args, crate::database::models::UserRole::Admin)
                .await
        }
        Demote(args) => {
            moderation::set_role(bot, state, msg, &args, crate::database::models::UserRole::Member)
                .await
        }
        Users => moderation::users(bot, state, msg).await,
        Userinfo(args) => moderation::userinfo(bot, state, msg, &args).await,
        Lookup(args) => moderation::lookup(bot, state, msg, &args).await,

        Setwelcome => cards::setwelcome(bot, state, msg).await,
        Setgoodbye => cards::setgoodbye(bot, state, msg).await,
        Previewwelcome => cards::preview(bot, state, msg, crate::session::CardKind::Welcome).await,
        Previewgoodbye => cards::preview(bot, state, msg, crate::session::CardKind::Goodbye).await,
        Resetwelcome => cards::reset(bot, state, msg, crate::session::CardKind::Welcome).await,
        Resetgoodbye => cards::reset(bot, state, msg, crate::session::CardKind::Goodbye).await,
        Togglewelcome => cards::toggle(bot, state, msg, crate::session::CardKind::Welcome).await,
        Togglegoodbye => cards::toggle(bot, state, msg, crate::session::CardKind::Goodbye).await,

        Suggest => suggest::suggest(bot, state, msg).await,
        Mysuggestions => suggest::mysuggestions(bot, state, msg).await,
        Tracksuggestion(args) => suggest::track(bot, state, msg, &args).await,
        Upvote(args) => suggest::upvote(bot, state, msg, &args).await,
        Topsuggestions => suggest::top(bot, state, msg).await,
        Suggestions => suggest::pending(bot, state, msg).await,
        Approvesuggestion(args) => suggest::review(bot, state, msg, &args, true).await,
        Rejectsuggestion(args) => suggest::review(bot, state, msg, &args, false).await,

        Broadcast => broadcast::begin(bot, state, msg).await,
        Broadcaststatus(args) => broadcast::status(bot, state, msg, &args).await,
        Broadcasthistory => broadcast::history(bot, state, msg).await,
        Broadcastcancel(args) => broadcast::cancel(bot, state, msg, &args).await,

        Report(args) => report::report(bot, state, msg, &args).await,
        Myreports => report::myreports(bot, state, msg).await,
        Reports => report::pending(bot, state, msg).await,
        Dismissreport(args) => report::dismiss(bot, state, msg, &args).await,
        Actionreport(args) => report::action(bot, state, msg, &args).await,

        Faq => faq::faq(bot, state, msg).await,

        Afk(reason) => community::afk(bot, state, msg, &reason).await,
        Trivia => community::trivia(bot, state, msg).await,
        Shoutout(text) => community::shoutout(bot, state, msg, &text).await,
        Rules => community::rules(bot, state, msg).await,
        Setrules(text) => community::setrules(bot, state, msg, &text).await,
        Quote => community::quote(bot, state, msg).await,
        Quotes => community::quotes(bot, state, msg).await,

        Notify(args) => settings::notify(bot, state, msg, &args).await,
        Language(args) => settings::language(bot, state, msg, &args).await,
        Setprefix(args) => settings::setprefix(bot, state, msg, &args).await,
        Listprefix => settings::listprefix(bot, state, msg).await,

        Nsfwstatus => nsfw_admin::status(bot, state, msg).await,
        Togglensfw => nsfw_admin::toggle(bot, state, msg).await,
        Nsfwconfig(args) => nsfw_admin::configure(bot, state, msg, &args).await,
        Nsfwlogs => nsfw_admin::logs(bot, state, msg).await,
        Clearnsfwlog(args) => nsfw_admin::clear_logs(bot, state, msg, &args).await,

        Maintenance(args) => settings::maintenance(bot, state, msg, &args).await,
    }
}

/// Dispatch a callback query and answer it exactly once.
pub async fn route_callback(
    bot: ThrottledBot,
    query: CallbackQuery,
    state: AppState,
) -> anyhow::Result<()> {
    let data = query.data.clone().unwrap_or_default();
    let mut parts = data.splitn(3, ':');
    let namespace = parts.next().unwrap_or_default();
    let action = parts.next().unwrap_or_default();
    let args = parts.next().unwrap_or_default();

    let result = match namespace {
        "help" => help::on_callback(&bot, &state, &query, action, args).await,
        "faq" => faq::on_callback(&bot, &state, &query, action, args).await,
        "report" => report::on_callback(&bot, &state, &query, action, args).await,
        _ => {
            debug!("Unknown callback payload: {}", data);
            Ok(None)
        }
    };

    // The acknowledgement goes out even when the handler failed, so the
    // client never hangs on a loading spinner.
    let mut answer = bot.answer_callback_query(query.id.clone());
    if let Ok(Some(toast)) = &result {
        answer = answer.text(toast.clone());
    }
    answer.await?;

    result.map(|_| ())
}

/// Reply with a denial unless the sender is an admin.
pub(crate) async fn require_admin(
    bot: &ThrottledBot,
    state: &AppState,
    msg: &Message,
) -> anyhow::Result<bool> {
    let user_id = msg.from.as_ref().map(|u| u.id.0).unwrap_or(0);
    if state.permissions.is_admin(user_id).await {
        return Ok(true);
    }
    bot.send_message(msg.chat.id, "🚫 Para lang ito sa mga admin.")
        .await?;
    Ok(false)
}
