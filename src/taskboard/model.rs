//! # Domain Model
//!
//! This module defines the entities the board engine stores: [`Column`], [`Task`] and
//! [`Label`], plus the [`BoardSnapshot`] shape used for persistence and hydration.
//!
//! ## Placement, Not Foreign Keys
//!
//! A task does not carry a `column_id`. Column membership is expressed by where the
//! task sits: the snapshot holds one ordered task list per column, and intra-column
//! order is the list position. Moving a task is a structural relocation between lists.
//!
//! ```text
//! {
//!   "columns": [{ "id": "to-do", "title": "To Do", "order": 0 }, ...],
//!   "tasks":   { "to-do": [ {task}, {task} ], "done": [] },
//!   "labels":  [{ "id": "lbl-bug", "name": "bug", "color": "#d73a4a" }]
//! }
//! ```
//!
//! ## Identity
//!
//! - Column and label ids are slugs derived from their title/name, made unique with a
//!   numeric suffix (see [`unique_slug`]).
//! - Task ids are UUID v4 strings. Snapshots from older clients may carry numeric task
//!   ids; [`TaskId`] deserializes those into their decimal string form.
//!
//! ## Drafts and Patches
//!
//! [`TaskDraft`], [`ColumnPatch`] and [`LabelDraft`] mirror what the sanitizer hands the
//! engine: every field is optional and an absent field means "use the default / leave
//! unchanged", never "clear".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::BoardError;

pub type ColumnId = String;
pub type LabelId = String;

/// Rating assigned to tasks created without one.
pub const DEFAULT_RATING: f64 = 8.8;
pub const MIN_RATING: f64 = 0.0;
pub const MAX_RATING: f64 = 10.0;

/// Column titles used when a board is created or reset.
pub const DEFAULT_COLUMN_TITLES: [&str; 3] = ["To Do", "In Progress", "Done"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generates a fresh, collision-free id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for TaskId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for TaskId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TaskId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// Legacy snapshots stored task ids as random integers.
impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawTaskId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawTaskId::deserialize(deserializer)? {
            RawTaskId::Text(s) => TaskId(s),
            RawTaskId::Signed(n) => TaskId(n.to_string()),
            RawTaskId::Unsigned(n) => TaskId(n.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Critical,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];

    /// Sort rank: higher is more urgent.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Critical => 4,
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Critical => "Critical",
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                BoardError::validation(
                    "priority",
                    format!(
                        "'{}' is not one of Critical, High, Medium, Low",
                        wanted
                    ),
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub title: String,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub priority: Priority,
    /// `None` only for tasks hydrated from snapshots that never had a rating.
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub labels: Vec<LabelId>,
    #[serde(default)]
    pub starred: bool,
    #[serde(default)]
    pub status: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub due_date: String,
}

impl Task {
    /// A task with engine defaults and a freshly generated id.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: TaskId::generate(),
            title: title.into(),
            details: String::new(),
            priority: Priority::default(),
            rating: Some(DEFAULT_RATING),
            labels: Vec::new(),
            starred: false,
            status: String::new(),
            created_at: Utc::now(),
            due_date: String::new(),
        }
    }

    pub fn rating_or_zero(&self) -> f64 {
        self.rating.unwrap_or(0.0)
    }

    pub fn has_label(&self, label_id: &str) -> bool {
        self.labels.iter().any(|l| l == label_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: LabelId,
    pub name: String,
    pub color: String,
}

/// The full normalized board state, as persisted and exchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub columns: Vec<Column>,
    #[serde(default)]
    pub tasks: BTreeMap<ColumnId, Vec<Task>>,
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl BoardSnapshot {
    /// The default board: one empty column per title, no tasks, no labels.
    pub fn seed<S: AsRef<str>>(titles: &[S]) -> Self {
        let mut snapshot = BoardSnapshot::default();
        for title in titles {
            let id = unique_slug(&slugify(title.as_ref(), "column"), |candidate| {
                snapshot.columns.iter().any(|c| c.id == candidate)
            });
            snapshot.columns.push(Column {
                id: id.clone(),
                title: title.as_ref().to_string(),
                order: snapshot.columns.len() as u32,
            });
            snapshot.tasks.insert(id, Vec::new());
        }
        snapshot
    }

    pub fn default_seed() -> Self {
        Self::seed(&DEFAULT_COLUMN_TITLES)
    }

    pub fn task_count(&self) -> usize {
        self.tasks.values().map(Vec::len).sum()
    }
}

/// Fields supplied when creating or editing a task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskDraft {
    pub title: Option<String>,
    pub details: Option<String>,
    pub priority: Option<Priority>,
    pub rating: Option<f64>,
    pub labels: Option<Vec<LabelId>>,
    pub status: Option<String>,
    pub starred: Option<bool>,
    pub due_date: Option<String>,
}

/// Edits use the same shape as drafts; `None` leaves a field untouched.
pub type TaskPatch = TaskDraft;

impl TaskDraft {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &TaskDraft::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnPatch {
    pub title: Option<String>,
    pub order: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelDraft {
    pub name: Option<String>,
    pub color: Option<String>,
}

pub type LabelPatch = LabelDraft;

impl LabelDraft {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            color: Some(color.into()),
        }
    }
}

/// Lowercase ASCII slug: alphanumerics kept, everything else collapsed into single
/// hyphens. Falls back to `fallback` when nothing survives.
pub fn slugify(text: &str, fallback: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}

/// Returns `base`, or `base-2`, `base-3`, ... for the first candidate not `taken`.
pub fn unique_slug(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_rank_order() {
        assert!(Priority::Critical.rank() > Priority::High.rank());
        assert!(Priority::High.rank() > Priority::Medium.rank());
        assert!(Priority::Medium.rank() > Priority::Low.rank());
    }

    #[test]
    fn test_priority_parse_case_insensitive() {
        assert_eq!("high".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(" CRITICAL ".parse::<Priority>().unwrap(), Priority::Critical);
        let err = "urgent".parse::<Priority>().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_task_defaults() {
        let task = Task::new("Write docs");
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.rating, Some(DEFAULT_RATING));
        assert!(task.labels.is_empty());
        assert!(!task.starred);
        assert!(task.due_date.is_empty());
    }

    #[test]
    fn test_generated_task_ids_are_distinct() {
        let a = TaskId::generate();
        let b = TaskId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_numeric_task_id_is_read_as_string() {
        let json = r#"{"id": 48213, "title": "Legacy", "createdAt": "2024-03-01T10:00:00Z"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.id, "48213");
        assert_eq!(task.rating, None);
        assert_eq!(task.rating_or_zero(), 0.0);
        assert_eq!(task.priority, Priority::Medium);
    }

    #[test]
    fn test_snapshot_uses_camel_case() {
        let mut snapshot = BoardSnapshot::seed(&["Backlog"]);
        let mut task = Task::new("A");
        task.due_date = "2025-01-31".into();
        snapshot.tasks.get_mut("backlog").unwrap().push(task);

        let json = serde_json::to_value(&snapshot).unwrap();
        let stored = &json["tasks"]["backlog"][0];
        assert!(stored.get("createdAt").is_some());
        assert_eq!(stored["dueDate"], "2025-01-31");
    }

    #[test]
    fn test_default_seed_columns() {
        let seed = BoardSnapshot::default_seed();
        let ids: Vec<&str> = seed.columns.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["to-do", "in-progress", "done"]);
        assert_eq!(seed.task_count(), 0);
        assert_eq!(seed.columns[2].order, 2);
    }

    #[test]
    fn test_seed_deduplicates_ids() {
        let seed = BoardSnapshot::seed(&["Done", "done!", "???"]);
        let ids: Vec<&str> = seed.columns.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["done", "done-2", "column"]);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("In Review", "x"), "in-review");
        assert_eq!(slugify("  --Bug  fix--  ", "x"), "bug-fix");
        assert_eq!(slugify("日本", "label"), "label");
    }
}
