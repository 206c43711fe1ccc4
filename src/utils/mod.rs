//! Utility functions.
//!
//! Small helpers shared by handlers, flows and the card renderer.

pub mod target;

/// Escape text for HTML parse mode.
pub fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Fill a card template with its supported placeholders.
///
/// Supported tokens: `{name}`, `{group}`, `{count}`.
pub fn fill_template(template: &str, name: &str, group: &str, count: u64) -> String {
    template
        .replace("{name}", name)
        .replace("{group}", group)
        .replace("{count}", &count.to_string())
}

/// Parse a `#RRGGBB` hex color into RGB components.
///
/// Returns `None` for anything that is not exactly seven characters of
/// `#` plus six hex digits.
pub fn parse_hex_color(input: &str) -> Option<[u8; 3]> {
    let s = input.trim();
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some([r, g, b])
}

/// Format seconds as a compact human duration ("2d 3h 5m 1s").
pub fn format_duration(total_secs: u64) -> String {
    if total_secs == 0 {
        return "0s".to_string();
    }

    let days = total_secs / 86400;
    let hours = (total_secs % 86400) / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    if seconds > 0 {
        parts.push(format!("{}s", seconds));
    }
    parts.join(" ")
}

/// Split a command message into its argument tail.
///
/// `/warn 123 spamming links` -> `Some("123 spamming links")`.
pub fn command_args(text: &str) -> Option<&str> {
    text.split_once(char::is_whitespace)
        .map(|(_, rest)| rest.trim())
        .filter(|s| !s.is_empty())
}

/// First display name for a Telegram user record.
pub fn display_name(first_name: &str, username: Option<&str>) -> String {
    match username {
        Some(u) => format!("@{}", u),
        None => first_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_template() {
        let out = fill_template("Hi {name}, welcome to {group} (#{count})", "Ana", "Tambayan", 42);
        assert_eq!(out, "Hi Ana, welcome to Tambayan (#42)");
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#FFFFFF"), Some([255, 255, 255]));
        assert_eq!(parse_hex_color("#00ff7f"), Some([0, 255, 127]));
        assert_eq!(parse_hex_color("FFFFFF"), None);
        assert_eq!(parse_hex_color("#FFF"), None);
        assert_eq!(parse_hex_color("#GGGGGG"), None);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(61), "1m 1s");
        assert_eq!(format_duration(90061), "1d 1h 1m 1s");
    }

    #[test]
    fn test_command_args() {
        assert_eq!(command_args("/warn 123 spam"), Some("123 spam"));
        assert_eq!(command_args("/warn"), None);
        assert_eq!(command_args("/warn   "), None);
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<b>&</b>"), "&lt;b&gt;&amp;&lt;/b&gt;");
    }
}
