//! # Input Sanitizer
//!
//! Cleans raw, user-supplied values before they reach the store. Raw records arrive as
//! JSON objects (what a form or the CLI hands over); each `sanitize_*_data` function
//! returns only the fields that survived cleaning. An absent field in the result means
//! "use the default / leave unchanged", never "clear".
//!
//! The store still re-validates structure (see [`crate::validation`]); this layer is
//! about shape and hygiene: markup stripping, control characters, whitespace, length
//! limits, and coercing loosely typed values (`"7.5"` → `7.5`).

use chrono::NaiveDate;
use serde_json::Value;

use crate::model::{ColumnPatch, LabelDraft, Priority, TaskDraft, MAX_RATING, MIN_RATING};

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_DETAILS_LEN: usize = 5000;
pub const MAX_STATUS_LEN: usize = 50;
pub const MAX_COLUMN_TITLE_LEN: usize = 100;
pub const MAX_LABEL_NAME_LEN: usize = 50;
pub const MAX_LABEL_ID_LEN: usize = 64;
pub const MAX_EMAIL_LEN: usize = 254;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanitizeOptions {
    /// Maximum length in characters after cleaning.
    pub max_length: usize,
    /// Keep `<...>` markup instead of stripping it.
    pub allow_html: bool,
    /// Keep line breaks instead of folding them into spaces.
    pub preserve_newlines: bool,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            max_length: 1000,
            allow_html: false,
            preserve_newlines: false,
        }
    }
}

impl SanitizeOptions {
    pub fn max(max_length: usize) -> Self {
        Self {
            max_length,
            ..Default::default()
        }
    }

    pub fn multiline(max_length: usize) -> Self {
        Self {
            max_length,
            preserve_newlines: true,
            ..Default::default()
        }
    }
}

/// Cleans a single text value.
///
/// 1. Strips `<tag>` markup unless `allow_html`
/// 2. Drops control characters (tabs become spaces, CRLF becomes LF)
/// 3. Folds newlines into spaces unless `preserve_newlines`
/// 4. Collapses runs of spaces, trims each line and the whole value
/// 5. Truncates to `max_length` characters
pub fn sanitize_input(raw: &str, options: &SanitizeOptions) -> String {
    let text = if options.allow_html {
        raw.to_string()
    } else {
        strip_tags(raw)
    };

    let mut cleaned = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                if chars.peek() != Some(&'\n') {
                    cleaned.push('\n');
                }
            }
            '\n' => cleaned.push('\n'),
            '\t' => cleaned.push(' '),
            c if c.is_control() => {}
            c => cleaned.push(c),
        }
    }

    let lines: Vec<String> = cleaned.split('\n').map(collapse_spaces).collect();
    let joined = if options.preserve_newlines {
        lines.join("\n")
    } else {
        collapse_spaces(&lines.join(" "))
    };

    let trimmed = joined.trim();
    if trimmed.chars().count() <= options.max_length {
        return trimmed.to_string();
    }
    trimmed
        .chars()
        .take(options.max_length)
        .collect::<String>()
        .trim_end()
        .to_string()
}

fn collapse_spaces(line: &str) -> String {
    line.split(' ')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Removes `<...>` sequences that look like markup (start with a letter, `/` or `!`).
/// A lone `<` such as in `a < b` is kept.
fn strip_tags(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let looks_like_tag = after
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!');

        match after.find('>') {
            Some(end) if looks_like_tag => rest = &after[end + 1..],
            _ => {
                out.push('<');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn text_field(raw: &Value, key: &str, options: &SanitizeOptions) -> Option<String> {
    raw.get(key)
        .and_then(Value::as_str)
        .map(|s| sanitize_input(s, options))
}

fn required_text_field(raw: &Value, key: &str, options: &SanitizeOptions) -> Option<String> {
    text_field(raw, key, options).filter(|s| !s.is_empty())
}

/// Accepts JSON numbers and numeric strings; rejects non-finite values.
fn number_field(raw: &Value, key: &str) -> Option<f64> {
    let value = match raw.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    value.is_finite().then_some(value)
}

/// Cleans a raw task record.
///
/// | Field      | Accepted                           | Result                         |
/// |------------|------------------------------------|--------------------------------|
/// | `title`    | string                             | cleaned, ≤200 chars, non-empty |
/// | `details`  | string                             | cleaned, newlines kept         |
/// | `priority` | string (any case)                  | enum value                     |
/// | `rating`   | number or numeric string           | clamped to `[0, 10]`           |
/// | `labels`   | array of strings                   | cleaned ids, deduplicated      |
/// | `status`   | string                             | cleaned, ≤50 chars             |
/// | `starred`  | bool                               | as is                          |
/// | `dueDate`  | `YYYY-MM-DD` or `""`               | as is (`""` clears)            |
pub fn sanitize_task_data(raw: &Value) -> TaskDraft {
    let mut draft = TaskDraft::default();
    if !raw.is_object() {
        return draft;
    }

    draft.title = required_text_field(raw, "title", &SanitizeOptions::max(MAX_TITLE_LEN));
    draft.details = text_field(
        raw,
        "details",
        &SanitizeOptions::multiline(MAX_DETAILS_LEN),
    );
    draft.priority = raw
        .get("priority")
        .and_then(Value::as_str)
        .and_then(|p| p.parse::<Priority>().ok());
    draft.rating = number_field(raw, "rating").map(|r| r.clamp(MIN_RATING, MAX_RATING));
    draft.labels = raw.get("labels").and_then(Value::as_array).map(|items| {
        let mut labels: Vec<String> = Vec::new();
        for item in items.iter().filter_map(Value::as_str) {
            let id = sanitize_input(item, &SanitizeOptions::max(MAX_LABEL_ID_LEN));
            if !id.is_empty() && !labels.contains(&id) {
                labels.push(id);
            }
        }
        labels
    });
    draft.status = text_field(raw, "status", &SanitizeOptions::max(MAX_STATUS_LEN));
    draft.starred = raw.get("starred").and_then(Value::as_bool);
    draft.due_date = raw
        .get("dueDate")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|d| d.is_empty() || NaiveDate::parse_from_str(d, "%Y-%m-%d").is_ok())
        .map(str::to_string);

    draft
}

/// Cleans a raw column record: `title` (≤100 chars, non-empty) and `order` (≥ 0).
pub fn sanitize_column_data(raw: &Value) -> ColumnPatch {
    ColumnPatch {
        title: required_text_field(
            raw,
            "title",
            &SanitizeOptions::max(MAX_COLUMN_TITLE_LEN),
        ),
        order: raw
            .get("order")
            .and_then(Value::as_u64)
            .and_then(|o| u32::try_from(o).ok()),
    }
}

/// Cleans a raw label record: `name` (≤50 chars, non-empty) and `color` (hex,
/// lowercased).
pub fn sanitize_label_data(raw: &Value) -> LabelDraft {
    LabelDraft {
        name: required_text_field(raw, "name", &SanitizeOptions::max(MAX_LABEL_NAME_LEN)),
        color: raw
            .get("color")
            .and_then(Value::as_str)
            .map(|c| c.trim().to_ascii_lowercase())
            .filter(|c| is_hex_color(c)),
    }
}

fn is_hex_color(color: &str) -> bool {
    color.strip_prefix('#').is_some_and(|hex| {
        (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
    })
}

/// Normalizes an email address, or `None` if it is not plausibly one.
pub fn sanitize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() || email.len() > MAX_EMAIL_LEN {
        return None;
    }
    if email.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return None;
    }

    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || domain.contains('@') {
        return None;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return None;
    }
    Some(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_input_strips_markup_and_whitespace() {
        let out = sanitize_input(
            "  <b>Fix</b>   the\t<script>x</script>login  ",
            &SanitizeOptions::default(),
        );
        assert_eq!(out, "Fix the xlogin");
    }

    #[test]
    fn test_sanitize_input_keeps_comparisons() {
        let out = sanitize_input("a < b and c > d", &SanitizeOptions::default());
        assert_eq!(out, "a < b and c > d");
    }

    #[test]
    fn test_sanitize_input_allow_html() {
        let options = SanitizeOptions {
            allow_html: true,
            ..Default::default()
        };
        assert_eq!(sanitize_input("<em>hi</em>", &options), "<em>hi</em>");
    }

    #[test]
    fn test_sanitize_input_newlines() {
        let raw = "line one\r\n\r\n  line   two \u{0007}";
        assert_eq!(
            sanitize_input(raw, &SanitizeOptions::default()),
            "line one line two"
        );
        assert_eq!(
            sanitize_input(raw, &SanitizeOptions::multiline(100)),
            "line one\n\nline two"
        );
    }

    #[test]
    fn test_sanitize_input_truncates_by_chars() {
        let out = sanitize_input("héllo wörld", &SanitizeOptions::max(6));
        assert_eq!(out, "héllo");
    }

    #[test]
    fn test_sanitize_task_data_keeps_only_valid_fields() {
        let raw = json!({
            "title": "  <i>Ship</i> release ",
            "priority": "critical",
            "rating": "12",
            "labels": ["lbl-a", " lbl-a ", 7, "", "lbl-b"],
            "starred": "yes",
            "dueDate": "2025-02-30",
            "unknown": true
        });
        let draft = sanitize_task_data(&raw);

        assert_eq!(draft.title.as_deref(), Some("Ship release"));
        assert_eq!(draft.priority, Some(Priority::Critical));
        assert_eq!(draft.rating, Some(10.0));
        assert_eq!(draft.labels, Some(vec!["lbl-a".to_string(), "lbl-b".to_string()]));
        assert_eq!(draft.starred, None);
        assert_eq!(draft.due_date, None);
        assert_eq!(draft.details, None);
    }

    #[test]
    fn test_sanitize_task_data_drops_bad_enum_and_blank_title() {
        let draft = sanitize_task_data(&json!({"title": "   ", "priority": "urgent"}));
        assert!(draft.is_empty());
        assert!(sanitize_task_data(&json!("not an object")).is_empty());
    }

    #[test]
    fn test_sanitize_task_data_due_date() {
        let draft = sanitize_task_data(&json!({"dueDate": "2025-03-14"}));
        assert_eq!(draft.due_date.as_deref(), Some("2025-03-14"));
        let cleared = sanitize_task_data(&json!({"dueDate": ""}));
        assert_eq!(cleared.due_date.as_deref(), Some(""));
    }

    #[test]
    fn test_sanitize_column_data() {
        let patch = sanitize_column_data(&json!({"title": " Review ", "order": 2}));
        assert_eq!(patch.title.as_deref(), Some("Review"));
        assert_eq!(patch.order, Some(2));

        let patch = sanitize_column_data(&json!({"title": "", "order": -1}));
        assert_eq!(patch, ColumnPatch::default());
    }

    #[test]
    fn test_sanitize_label_data() {
        let draft = sanitize_label_data(&json!({"name": "Bug", "color": " #FFAA00 "}));
        assert_eq!(draft.name.as_deref(), Some("Bug"));
        assert_eq!(draft.color.as_deref(), Some("#ffaa00"));

        let draft = sanitize_label_data(&json!({"name": "Bug", "color": "orange"}));
        assert_eq!(draft.color, None);
    }

    #[test]
    fn test_sanitize_email() {
        assert_eq!(
            sanitize_email("  Ada@Example.COM "),
            Some("ada@example.com".to_string())
        );
        assert_eq!(sanitize_email("no-at-sign"), None);
        assert_eq!(sanitize_email("@example.com"), None);
        assert_eq!(sanitize_email("a@b@c.com"), None);
        assert_eq!(sanitize_email("a@localhost"), None);
        assert_eq!(sanitize_email("a b@example.com"), None);
        assert_eq!(sanitize_email("a@example..com"), None);
    }
}
