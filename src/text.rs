//! Text helpers shared by extraction, prompting, and CLI output

use std::sync::OnceLock;

use regex::Regex;

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

fn inline_space_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t\u{a0}]+").expect("valid inline space regex"))
}

/// Collapse every whitespace run into a single space
pub fn normalize_whitespace(text: &str) -> String {
    whitespace_re().replace_all(text, " ").trim().to_string()
}

/// Clean up spacing in extracted page text while keeping line structure
///
/// - runs of spaces/tabs inside a line become one space
/// - trailing spaces are removed
/// - more than one consecutive blank line is collapsed to a single blank line
pub fn fix_text_spacing(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;

    for line in text.lines() {
        let line = inline_space_re().replace_all(line, " ");
        let line = line.trim();

        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }

        out.push_str(line);
        out.push('\n');
    }

    out.trim().to_string()
}

/// First `max_chars` characters of `text` (UTF-8 safe)
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Single-line preview with an ellipsis, for CLI output
pub fn preview(text: &str, max_chars: usize) -> String {
    let cleaned = normalize_whitespace(text);
    if cleaned.chars().count() <= max_chars {
        cleaned
    } else {
        format!("{}...", truncate_chars(&cleaned, max_chars))
    }
}
