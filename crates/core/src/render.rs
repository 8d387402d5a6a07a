//! Renders a notification into a MarkdownV2 caption plus an optional
//! thumbnail reference.

use chrono::DateTime;

use crate::dispatch::Notification;

/// Characters that must be backslash-escaped in MarkdownV2 text.
const SPECIAL: &str = "_*[]()~`>#+-=|{}.!";

/// A renderable message for the messenger sink.
#[derive(Clone, Debug)]
pub struct RenderedNotification {
    /// Fully escaped MarkdownV2 caption.
    pub caption: String,
    /// Server-relative thumbnail resource, if the series has one. Absence
    /// means delivery falls back to a text-only message.
    pub image_ref: Option<String>,
}

/// Escapes user-supplied text so it cannot break MarkdownV2 formatting or
/// inject markup control characters.
#[must_use]
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if SPECIAL.contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Renders an upload marker. Integer epoch-milliseconds become a UTC
/// `YYYY-MM-DD HH:MM` stamp; anything else passes through unchanged.
#[must_use]
pub fn format_upload_date(raw: &str) -> String {
    raw.parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .map_or_else(
            || raw.to_string(),
            |stamp| stamp.format("%Y-%m-%d %H:%M").to_string(),
        )
}

/// Composes the caption for a notification. Field order is fixed: header,
/// blank line, bold title, italic chapter name (if any), chapter number,
/// source (if any), upload date (if any).
#[must_use]
pub fn render(notification: &Notification) -> RenderedNotification {
    let series = &notification.series;
    let chapter = &notification.chapter;

    let mut lines = vec![
        "\u{1f4da} New Chapter Available".to_string(),
        String::new(),
        format!("*{}*", escape_markdown(&series.title)),
    ];

    if let Some(name) = chapter.name.as_deref().filter(|name| !name.is_empty()) {
        lines.push(format!("_{}_", escape_markdown(name)));
    }

    lines.push(format!("Ch\\. {}", escape_markdown(&chapter.version())));

    if let Some(source) = &series.source {
        lines.push(format!(
            "Source {} \\({}\\)",
            escape_markdown(&source.name),
            escape_markdown(&source.lang)
        ));
    }

    if let Some(raw) = chapter.upload_date.as_deref() {
        lines.push(format!(
            "Uploaded {}",
            escape_markdown(&format_upload_date(raw))
        ));
    }

    RenderedNotification {
        caption: lines.join("\n"),
        image_ref: series.thumbnail_url.clone(),
    }
}
