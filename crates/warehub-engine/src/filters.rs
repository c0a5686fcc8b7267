//! Template filters for the generated pages

use chrono::DateTime;

/// Escape text for HTML element content and quoted attribute values.
///
/// Only `& < > " '` are replaced, so URLs stay readable in the output.
///
/// Usage: {{ link.href | html }}
#[must_use]
pub fn html(value: String) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Human-readable byte count
///
/// Usage: {{ file.size | filesize }}
#[must_use]
pub fn filesize(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format an RFC 3339 timestamp as a short date (`Jan 2, 2024`).
/// Anything that does not parse is passed through unchanged.
///
/// Usage: {{ release.published | date }}
#[must_use]
pub fn date(value: String) -> String {
    match DateTime::parse_from_rfc3339(&value) {
        Ok(parsed) => parsed.format("%b %-d, %Y").to_string(),
        Err(_) => value,
    }
}
