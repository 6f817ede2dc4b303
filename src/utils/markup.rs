//! Telegram message markup.
//!
//! The table always goes inside the dialect's verbatim block and only the characters
//! that block treats specially are escaped. The title gets the dialect's full escaping.

use crate::error::{AppError, Result};
use crate::models::ParseMode;

/// Characters reserved by MarkdownV2 outside of code blocks.
const MARKDOWN_V2_RESERVED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    '\\',
];

/// Escape text for use outside of code blocks in MarkdownV2.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if MARKDOWN_V2_RESERVED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape text for use inside a MarkdownV2 ```` ``` ```` block.
pub fn escape_markdown_v2_code(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '`' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape text for Telegram's HTML mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Build the final message body: bold title, optional subtitle lines, verbatim table.
pub fn compose_message(mode: ParseMode, title: &str, table: &str) -> String {
    let (title, extra) = match title.split_once('\n') {
        Some((first, rest)) => (first, Some(rest)),
        None => (title, None),
    };

    match mode {
        ParseMode::MarkdownV2 => {
            let mut text = format!("*{}*\n", escape_markdown_v2(title));
            if let Some(extra) = extra {
                text.push_str(&escape_markdown_v2(extra));
                text.push('\n');
            }
            text.push_str("```\n");
            text.push_str(&escape_markdown_v2_code(table));
            text.push_str("\n```");
            text
        }
        ParseMode::Html => {
            let mut text = format!("<b>{}</b>\n", escape_html(title));
            if let Some(extra) = extra {
                text.push_str(&escape_html(extra));
                text.push('\n');
            }
            text.push_str("<pre>");
            text.push_str(&escape_html(table));
            text.push_str("</pre>");
            text
        }
    }
}

/// Like [`compose_message`], but splits the table by rows so that every message stays
/// within `max_chars`. Each part repeats the title.
pub fn compose_messages(
    mode: ParseMode,
    title: &str,
    table: &str,
    max_chars: usize,
) -> Result<Vec<String>> {
    let fits = |lines: &[&str]| {
        compose_message(mode, title, &lines.join("\n")).chars().count() <= max_chars
    };
    let too_long = || {
        AppError::delivery(
            None,
            format!("a table row does not fit in a {max_chars}-character message"),
        )
    };

    let mut messages = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in table.lines() {
        current.push(line);
        if fits(&current) {
            continue;
        }
        current.pop();
        if current.is_empty() {
            return Err(too_long());
        }
        messages.push(compose_message(mode, title, &current.join("\n")));
        current = vec![line];
        if !fits(&current) {
            return Err(too_long());
        }
    }
    if !current.is_empty() || messages.is_empty() {
        messages.push(compose_message(mode, title, &current.join("\n")));
    }
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_markdown_v2() {
        assert_eq!(escape_markdown_v2("5.2 (test)!"), "5\\.2 \\(test\\)\\!");
        assert_eq!(escape_markdown_v2("⚡ Нове оновлення:"), "⚡ Нове оновлення:");
    }

    #[test]
    fn test_code_block_escapes_only_backtick_and_backslash() {
        assert_eq!(escape_markdown_v2_code("1.1 │ 19:00-20:30"), "1.1 │ 19:00-20:30");
        assert_eq!(escape_markdown_v2_code("a`b\\c"), "a\\`b\\\\c");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>A & B</b>"), "&lt;b&gt;A &amp; B&lt;/b&gt;");
    }

    #[test]
    fn test_compose_markdown_v2() {
        let text = compose_message(ParseMode::MarkdownV2, "Update.", "1.1 │ 19:00");
        assert_eq!(text, "*Update\\.*\n```\n1.1 │ 19:00\n```");
    }

    #[test]
    fn test_compose_html_with_subtitle() {
        let text = compose_message(ParseMode::Html, "Update\n12:00 <now>", "5.2 │ x");
        assert_eq!(text, "<b>Update</b>\n12:00 &lt;now&gt;\n<pre>5.2 │ x</pre>");
    }

    #[test]
    fn test_compose_markdown_v2_with_subtitle() {
        let text = compose_message(ParseMode::MarkdownV2, "Update\nГрафік 16.10", "1.1 │ 19:00");
        assert_eq!(text, "*Update*\nГрафік 16\\.10\n```\n1.1 │ 19:00\n```");
    }

    #[test]
    fn test_short_table_is_one_message() {
        let messages = compose_messages(ParseMode::Html, "T", "a\nb", 4096).unwrap();
        assert_eq!(messages, vec![compose_message(ParseMode::Html, "T", "a\nb")]);
    }

    #[test]
    fn test_long_table_split_by_rows() {
        let table: Vec<String> = (1..=40).map(|i| format!("{i}.1   │ 19:00   │ 20:30")).collect();
        let table = table.join("\n");

        let messages = compose_messages(ParseMode::MarkdownV2, "Update", &table, 300).unwrap();
        assert!(messages.len() > 1);
        for message in &messages {
            assert!(message.chars().count() <= 300, "{message}");
            assert!(message.starts_with("*Update*\n```\n"));
        }

        let rows: Vec<&str> = messages
            .iter()
            .flat_map(|m| m.lines())
            .filter(|l| l.contains('│'))
            .collect();
        assert_eq!(rows, table.lines().collect::<Vec<_>>());
    }

    #[test]
    fn test_row_longer_than_limit_is_rejected() {
        let table = format!("1.1   │ {}", "x".repeat(100));
        assert!(matches!(
            compose_messages(ParseMode::Html, "T", &table, 50),
            Err(AppError::Delivery { .. })
        ));
    }

    #[test]
    fn test_table_not_double_escaped() {
        let text = compose_message(ParseMode::MarkdownV2, "T", "5.2 - x");
        assert!(text.contains("5.2 - x"));
        assert!(!text.contains("5\\.2"));
    }
}
