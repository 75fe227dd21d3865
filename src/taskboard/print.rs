use chrono::{DateTime, Utc};
use colored::*;
use taskboard::config::{BoardConfig, CONFIG_KEYS};
use taskboard::model::{Label, Priority, Task};
use taskboard::view::{ColumnView, FilterSpec, TaskView};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 100;
const TIME_WIDTH: usize = 14;
const PRIORITY_WIDTH: usize = 9;
const RATING_WIDTH: usize = 5;
const SHORT_ID_LEN: usize = 8;
const STAR_MARKER: &str = "★";

pub fn print_success(message: &str) {
    println!("{}", message.green());
}

pub fn print_info(message: &str) {
    println!("{}", message.dimmed());
}

/// The abbreviated task id shown in listings. Any unique prefix is accepted back.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

pub fn print_board(columns: &[ColumnView], filter: &FilterSpec) {
    if filter.is_filtering() {
        print_info(&describe_filter(filter));
    }

    for (i, view) in columns.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_column_header(view, filter.is_filtering());

        if view.tasks.is_empty() {
            println!("    {}", "(empty)".dimmed());
            continue;
        }
        for task in &view.tasks {
            print_task_line(task);
        }
    }
}

fn print_column_header(view: &ColumnView, filtering: bool) {
    let count = if filtering {
        format!("{}/{}", view.tasks.len(), view.total)
    } else {
        view.total.to_string()
    };
    println!(
        "{} {} {}",
        view.column.title.bold(),
        format!("({})", view.column.id).dimmed(),
        count.cyan()
    );
}

fn print_task_line(view: &TaskView) {
    let task = &view.task;

    let left_prefix = if task.starred {
        format!("  {} ", STAR_MARKER)
    } else {
        "    ".to_string()
    };
    let id_str = format!("{}  ", short_id(task.id.as_str()));

    let tags = format_tags(&view.labels);
    let fixed_width = left_prefix.width()
        + id_str.width()
        + PRIORITY_WIDTH
        + RATING_WIDTH
        + TIME_WIDTH;
    let available = LINE_WIDTH.saturating_sub(fixed_width);

    let title_display = truncate_to_width(&task.title, available.saturating_sub(tags.width()));
    let padding = available.saturating_sub(title_display.width() + tags.width());

    println!(
        "{}{}{}{}{}{}{}{}",
        left_prefix.yellow(),
        id_str.dimmed(),
        title_display,
        colorize_tags(&view.labels),
        " ".repeat(padding),
        colorize_priority(task.priority),
        format_rating(task),
        format_time_ago(task.created_at).dimmed()
    );

    if !task.due_date.is_empty() {
        let indent = " ".repeat(4 + SHORT_ID_LEN + 2);
        println!("{}{}", indent, format!("due {}", task.due_date).magenta());
    }
}

fn format_tags(labels: &[Label]) -> String {
    labels.iter().map(|l| format!(" [{}]", l.name)).collect()
}

fn colorize_tags(labels: &[Label]) -> String {
    labels
        .iter()
        .map(|l| {
            let tag = format!("[{}]", l.name);
            let tag = match parse_hex_color(&l.color) {
                Some((r, g, b)) => tag.truecolor(r, g, b),
                None => tag.normal(),
            };
            format!(" {}", tag)
        })
        .collect()
}

fn colorize_priority(priority: Priority) -> ColoredString {
    let text = format!("{:>width$}", priority.as_str(), width = PRIORITY_WIDTH);
    match priority {
        Priority::Critical => text.red().bold(),
        Priority::High => text.red(),
        Priority::Medium => text.yellow(),
        Priority::Low => text.green(),
    }
}

fn format_rating(task: &Task) -> String {
    match task.rating {
        Some(r) => format!("{:>width$.1}", r, width = RATING_WIDTH),
        None => format!("{:>width$}", "-", width = RATING_WIDTH),
    }
}

fn describe_filter(filter: &FilterSpec) -> String {
    let mut parts = Vec::new();
    if !filter.search.trim().is_empty() {
        parts.push(format!("search \"{}\"", filter.search.trim()));
    }
    if let Some(label) = &filter.label {
        parts.push(format!("labels {}", label.ids().join("|")));
    }
    if let Some(priority) = filter.priority {
        parts.push(format!("priority {}", priority));
    }
    format!("Filtered by {}, sorted by {}", parts.join(", "), filter.sort)
}

pub fn print_config(config: &BoardConfig) {
    for key in CONFIG_KEYS {
        if let Ok(value) = config.get(key) {
            println!("{} = {}", key, value);
        }
    }
}

/// `#RGB` or `#RRGGBB` to an RGB triple.
fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut it = hex.chars().map(|c| channel(&format!("{}{}", c, c)));
            Some((it.next()??, it.next()??, it.next()??))
        }
        6 => Some((
            channel(hex.get(0..2)?)?,
            channel(hex.get(2..4)?)?,
            channel(hex.get(4..6)?)?,
        )),
        _ => None,
    }
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;
    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            break;
        }
        result.push(c);
        current_width += char_width;
    }
    result.push('…');
    result
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    let formatter = timeago::Formatter::new();
    let time_str = formatter.convert(duration.to_std().unwrap_or_default());
    format!("{:>width$}", time_str, width = TIME_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0f8e2c1a-77aa-4d0e-9a47-1c5f0f6b2d11"), "0f8e2c1a");
        assert_eq!(short_id("771204"), "771204");
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#d73a4a"), Some((0xd7, 0x3a, 0x4a)));
        assert_eq!(parse_hex_color("#f00"), Some((255, 0, 0)));
        assert_eq!(parse_hex_color("red"), None);
        assert_eq!(parse_hex_color("#12345"), None);
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdefghij", 5), "abcd…");
        assert_eq!(truncate_to_width("日本語テキスト", 7), "日本語…");
    }
}
