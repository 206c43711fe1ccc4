//! Categorized help browser behind `help:`-namespaced callbacks.

use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup, Message, ParseMode};

use crate::bot::{AppState, ThrottledBot};

struct HelpCategory {
    key: &'static str,
    title: &'static str,
    body: &'static str,
}

static HELP_CATEGORIES: &[HelpCategory] = &[
    HelpCategory {
        key: "general",
        title: "ℹ️ General",
        body: "/start — simulan ang bot\n\
               /me — ang profile mo\n\
               /whois <user> — profile ng iba\n\
               /ping — buhay ba ako\n\
               /status — uptime at bilang ng users\n\
               /about — tungkol sa bot\n\
               /cancel — itigil ang kasalukuyang flow\n\
               /feedback <text> — magpadala ng feedback sa admins",
    },
    HelpCategory {
        key: "levels",
        title: "📈 Levels",
        body: "/rank — ranggo mo sa chat na ito\n\
               /leaderboard — top 10\n\
               /levels — tier chart\n\
               /badges — mga badge mo\n\
               /daily — arawang XP claim\n\
               /streak — daily streak mo",
    },
    HelpCategory {
        key: "community",
        title: "🎉 Community",
        body: "/afk [dahilan] — markahan ang sarili na AFK\n\
               /shoutout <text> — mag-shoutout (may 6h cooldown)\n\
               /rules — patakaran ng chat\n\
               /faq — mga madalas itanong\n\
               /suggest — magbigay ng suhestiyon\n\
               /mysuggestions — mga suhestiyon mo\n\
               /upvote <ref> — suportahan ang suhestiyon\n\
               /topsuggestions — pinaka-sikat na suhestiyon\n\
               /quote — i-save ang ni-reply na mensahe sa quote book\n\
               /quotes — mga huling quote ng chat\n\
               /report — i-report ang ni-reply na mensahe (reply lang)",
    },
    HelpCategory {
        key: "moderation",
        title: "🛡 Moderation (admin)",
        body: "/ban, /unban <user>\n\
               /promote, /demote <user> (super admin)\n\
               /warn, /warnings, /clearwarnings <user>\n\
               /mute <user> [minuto], /unmute <user>, /mutelist\n\
               /setwelcome, /setgoodbye — card wizard\n\
               /broadcast — mag-compose ng broadcast\n\
               /setrules <text>, /setprefix <prefix>\n\
               /users, /userinfo <user>, /lookup <username>\n\
               /maintenance on|off|schedule|cancel|status\n\
               /nsfwstatus, /togglensfw, /nsfwconfig, /nsfwlogs",
    },
];

fn category(key: &str) -> Option<&'static HelpCategory> {
    HELP_CATEGORIES.iter().find(|c| c.key == key)
}

fn root_keyboard() -> InlineKeyboardMarkup {
    let rows = HELP_CATEGORIES
        .iter()
        .map(|c| vec![InlineKeyboardButton::callback(c.title, format!("help:cat:{}", c.key))])
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

const ROOT_TEXT: &str = "🤖 <b>Tanod help</b>\n\nPumili ng kategorya:";

pub async fn help(bot: &ThrottledBot, _state: &AppState, msg: &Message) -> anyhow::Result<()> {
    bot.send_message(msg.chat.id, ROOT_TEXT)
        .parse_mode(ParseMode::Html)
        .reply_markup(root_keyboard())
        .await?;
    Ok(())
}

pub async fn on_callback(
    bot: &ThrottledBot,
    _state: &AppState,
    query: &CallbackQuery,
    action: &str,
    args: &str,
) -> anyhow::Result<Option<String>> {
    let Some(message) = query.message.as_ref() else {
        return Ok(None);
    };
    let chat_id = message.chat().id;
    let message_id = message.id();

    match action {
        "cat" => {
            let Some(cat) = category(args) else {
                return Ok(Some("Hindi kilalang kategorya.".to_string()));
            };
            let back = InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
                "« Bumalik",
                "help:back:",
            )]]);
            bot.edit_message_text(
                chat_id,
                message_id,
                format!("<b>{}</b>\n\n{}", cat.title, cat.body),
            )
            .parse_mode(ParseMode::Html)
            .reply_markup(back)
            .await?;
            Ok(None)
        }
        "back" => {
            bot.edit_message_text(chat_id, message_id, ROOT_TEXT)
                .parse_mode(ParseMode::Html)
                .reply_markup(root_keyboard())
                .await?;
            Ok(None)
        }
        _ => Ok(Some("Hindi kilalang aksyon.".to_string())),
    }
}
