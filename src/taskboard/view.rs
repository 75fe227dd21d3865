//! # View Projector
//!
//! Computes what a board shows from the stored state and a [`FilterSpec`], without
//! touching the store. Each column is projected independently through a fixed pipeline:
//!
//! 1. **Search**: case-insensitive substring match on `title` OR `details`.
//! 2. **Label**: a single id keeps tasks carrying it; a list keeps tasks carrying at
//!    least one of its ids (OR). An empty list passes everything.
//! 3. **Priority**: exact match.
//! 4. **Sort**: one comparator from [`SortKey`]. All sorts are stable, so tasks with
//!    equal keys keep their stored relative order.
//!
//! Filters of different kinds combine with AND.
//!
//! The result is a list of [`ColumnView`]s holding cloned tasks. Label ids that no
//! longer resolve to a label record are dropped from the projected task; the stored task
//! keeps them until it is written again.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BoardError, Result};
use crate::model::{Column, Label, LabelId, Priority, Task};
use crate::store::BoardStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Newest first.
    #[default]
    Date,
    DateAsc,
    /// Most urgent first.
    Priority,
    PriorityAsc,
    Title,
    TitleDesc,
    /// Highest first.
    Rating,
    RatingAsc,
}

impl SortKey {
    pub const ALL: [SortKey; 8] = [
        SortKey::Date,
        SortKey::DateAsc,
        SortKey::Priority,
        SortKey::PriorityAsc,
        SortKey::Title,
        SortKey::TitleDesc,
        SortKey::Rating,
        SortKey::RatingAsc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Date => "date",
            SortKey::DateAsc => "date-asc",
            SortKey::Priority => "priority",
            SortKey::PriorityAsc => "priority-asc",
            SortKey::Title => "title",
            SortKey::TitleDesc => "title-desc",
            SortKey::Rating => "rating",
            SortKey::RatingAsc => "rating-asc",
        }
    }

    fn compare(self, a: &Task, b: &Task) -> Ordering {
        match self {
            SortKey::Date => b.created_at.cmp(&a.created_at),
            SortKey::DateAsc => a.created_at.cmp(&b.created_at),
            SortKey::Priority => b.priority.rank().cmp(&a.priority.rank()),
            SortKey::PriorityAsc => a.priority.rank().cmp(&b.priority.rank()),
            SortKey::Title => compare_text(&a.title, &b.title),
            SortKey::TitleDesc => compare_text(&b.title, &a.title),
            SortKey::Rating => b.rating_or_zero().total_cmp(&a.rating_or_zero()),
            SortKey::RatingAsc => a.rating_or_zero().total_cmp(&b.rating_or_zero()),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        SortKey::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let known: Vec<&str> = SortKey::ALL.iter().map(|k| k.as_str()).collect();
                BoardError::validation(
                    "sort",
                    format!("'{}' is not one of {}", wanted, known.join(", ")),
                )
            })
    }
}

/// Collation used for title sorts: case-folded comparison first, and for strings that
/// differ only by case, lowercase sorts before uppercase. Comparison is by lowercased
/// code point, not locale-aware, so accented letters sort after `z`.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// Label filter: one id, or any of several ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelFilter {
    One(LabelId),
    AnyOf(Vec<LabelId>),
}

impl LabelFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            LabelFilter::One(id) => task.has_label(id),
            LabelFilter::AnyOf(ids) => ids.is_empty() || ids.iter().any(|id| task.has_label(id)),
        }
    }

    /// Builds a filter from a list of ids: none → no filter, one → single, more → any-of.
    pub fn from_ids(mut ids: Vec<LabelId>) -> Option<Self> {
        match ids.len() {
            0 => None,
            1 => ids.pop().map(LabelFilter::One),
            _ => Some(LabelFilter::AnyOf(ids)),
        }
    }

    pub fn ids(&self) -> Vec<&str> {
        match self {
            LabelFilter::One(id) => vec![id.as_str()],
            LabelFilter::AnyOf(ids) => ids.iter().map(String::as_str).collect(),
        }
    }
}

/// The ephemeral filter/sort configuration consumed by [`project`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    pub search: String,
    pub label: Option<LabelFilter>,
    pub priority: Option<Priority>,
    pub sort: SortKey,
}

/// A partial update for [`FilterSpec::merge`]. The outer `Option` means "leave as is";
/// `Some(None)` clears a filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPatch {
    pub search: Option<String>,
    pub label: Option<Option<LabelFilter>>,
    pub priority: Option<Option<Priority>>,
    pub sort: Option<SortKey>,
}

impl FilterSpec {
    pub fn with_sort(sort: SortKey) -> Self {
        Self {
            sort,
            ..Default::default()
        }
    }

    /// Merge-update: only fields present in `patch` change.
    pub fn merge(&mut self, patch: FilterPatch) {
        if let Some(search) = patch.search {
            self.search = search;
        }
        if let Some(label) = patch.label {
            self.label = label;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(sort) = patch.sort {
            self.sort = sort;
        }
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.sort = sort;
    }

    /// Whether any filter (not counting sort) is set.
    pub fn is_filtering(&self) -> bool {
        !self.search.trim().is_empty() || self.label.is_some() || self.priority.is_some()
    }

    /// Applies the search, label and priority stages to one task.
    pub fn matches(&self, task: &Task) -> bool {
        let term = self.search.trim().to_lowercase();
        matches_search(task, &term)
            && self.label.as_ref().map_or(true, |f| f.matches(task))
            && self.priority.map_or(true, |p| task.priority == p)
    }
}

fn matches_search(task: &Task, term_lower: &str) -> bool {
    term_lower.is_empty()
        || task.title.to_lowercase().contains(term_lower)
        || task.details.to_lowercase().contains(term_lower)
}

/// A projected task: a copy of the stored task with dangling label ids removed, plus
/// the resolved label records in the task's label order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskView {
    pub task: Task,
    pub labels: Vec<Label>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnView {
    pub column: Column,
    pub tasks: Vec<TaskView>,
    /// Number of stored tasks in the column before filtering.
    pub total: usize,
}

/// Projects every column, in display order.
pub fn project(store: &BoardStore, spec: &FilterSpec) -> Vec<ColumnView> {
    store
        .columns()
        .iter()
        .map(|column| project_tasks(store, column, spec))
        .collect()
}

/// Projects a single column.
pub fn project_column(
    store: &BoardStore,
    column_id: &str,
    spec: &FilterSpec,
) -> Result<ColumnView> {
    let column = store
        .column(column_id)
        .ok_or_else(|| BoardError::ColumnNotFound(column_id.to_string()))?;
    Ok(project_tasks(store, column, spec))
}

fn project_tasks(store: &BoardStore, column: &Column, spec: &FilterSpec) -> ColumnView {
    let stored = store.tasks_in(&column.id).unwrap_or_default();
    let mut visible: Vec<&Task> = stored.iter().filter(|t| spec.matches(t)).collect();
    sort_tasks(&mut visible, spec.sort);

    ColumnView {
        column: column.clone(),
        tasks: visible.into_iter().map(|t| resolve(store, t)).collect(),
        total: stored.len(),
    }
}

fn resolve(store: &BoardStore, task: &Task) -> TaskView {
    let labels: Vec<Label> = task
        .labels
        .iter()
        .filter_map(|id| store.label(id).cloned())
        .collect();
    let mut task = task.clone();
    task.labels = labels.iter().map(|l| l.id.clone()).collect();
    TaskView { task, labels }
}

/// Sorts tasks (owned or borrowed) in place with the comparator for `key`. The sort
/// is stable.
pub fn sort_tasks<T: Borrow<Task>>(tasks: &mut [T], key: SortKey) {
    tasks.sort_by(|a, b| key.compare(a.borrow(), b.borrow()));
}
