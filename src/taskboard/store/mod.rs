//! # Board Store
//!
//! [`BoardStore`] owns the three entity collections (columns, per-column task lists,
//! labels) and is the only component allowed to mutate them. Everything else reads
//! through accessors or a [`BoardSnapshot`].
//!
//! ## Layout
//!
//! - `columns`: kept sorted by `order`, with `order == position` at all times.
//! - `lists`: one ordered `Vec<Task>` per column id. List position *is* the task's
//!   position in the column.
//! - `placement`: a `task id -> column id` index. It is a cache over `lists` so lookups
//!   and moves do not scan every column; it is rebuilt on hydrate and kept in step by
//!   every mutation.
//! - `labels`: the label registry.
//!
//! ## Single-Placement Invariant
//!
//! Every task id appears in exactly one column's list, exactly once, and `placement`
//! agrees with it. [`BoardStore::check_integrity`] verifies this and reports
//! [`BoardError::StateIntegrity`] when it does not hold.
//!
//! ## Failure Policy
//!
//! Operations validate everything they need before touching state, so a failed call
//! leaves the store unchanged. Multi-step work that spans several operations goes
//! through [`BoardStore::transaction`], which restores the prior state on error.
//!
//! Reads are tolerant (dangling label ids on tasks are allowed and dropped by the view
//! layer); writes are strict (referenced columns and labels must exist).
//!
//! ## Operations
//!
//! - [`columns`](self::columns): add, edit, delete (cascade or relocate), bulk move
//! - [`tasks`](self::tasks): add, edit, delete, move/reorder
//! - [`labels`](self::labels): registry CRUD and attach/detach

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::error::{BoardError, Result};
use crate::model::{BoardSnapshot, Column, ColumnId, Label, Task, TaskId, MAX_RATING, MIN_RATING};
use crate::validation::DEFAULT_LABEL_CAP;

pub mod columns;
pub mod labels;
pub mod tasks;

pub use columns::ColumnDisposal;

#[derive(Debug, Clone)]
pub struct BoardStore {
    columns: Vec<Column>,
    lists: HashMap<ColumnId, Vec<Task>>,
    labels: Vec<Label>,
    placement: HashMap<TaskId, ColumnId>,
    label_cap: usize,
}

impl Default for BoardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardStore {
    /// A store holding the default seed board.
    pub fn new() -> Self {
        let mut store = Self::empty();
        store.reset_state();
        store
    }

    /// A store hydrated from `snapshot`.
    pub fn from_snapshot(snapshot: BoardSnapshot) -> Result<Self> {
        let mut store = Self::empty();
        store.replace_state(snapshot)?;
        Ok(store)
    }

    fn empty() -> Self {
        Self {
            columns: Vec::new(),
            lists: HashMap::new(),
            labels: Vec::new(),
            placement: HashMap::new(),
            label_cap: DEFAULT_LABEL_CAP,
        }
    }

    pub fn with_label_cap(mut self, cap: usize) -> Self {
        self.label_cap = cap;
        self
    }

    pub fn label_cap(&self) -> usize {
        self.label_cap
    }

    // --- Reads ---

    /// Columns in display order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    /// Tasks of a column in stored order.
    pub fn tasks_in(&self, column_id: &str) -> Result<&[Task]> {
        self.lists
            .get(column_id)
            .map(Vec::as_slice)
            .ok_or_else(|| BoardError::ColumnNotFound(column_id.to_string()))
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        let column_id = self.placement.get(task_id)?;
        self.lists
            .get(column_id)?
            .iter()
            .find(|t| t.id == task_id)
    }

    /// The column currently holding `task_id`.
    pub fn column_of(&self, task_id: &str) -> Option<&str> {
        self.placement.get(task_id).map(String::as_str)
    }

    pub fn task_count(&self) -> usize {
        self.placement.len()
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn label(&self, id: &str) -> Option<&Label> {
        self.labels.iter().find(|l| l.id == id)
    }

    // --- Whole-state operations ---

    /// The entire normalized state as a serializable value.
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            columns: self.columns.clone(),
            tasks: self
                .lists
                .iter()
                .map(|(id, list)| (id.clone(), list.clone()))
                .collect(),
            labels: self.labels.clone(),
        }
    }

    /// Hydrates the store wholesale. The snapshot is checked first; on any integrity
    /// problem the current state is kept and the error returned.
    pub fn replace_state(&mut self, snapshot: BoardSnapshot) -> Result<()> {
        let (columns, lists, labels, placement) = hydrate(snapshot)?;
        self.columns = columns;
        self.lists = lists;
        self.labels = labels;
        self.placement = placement;
        debug!(
            columns = self.columns.len(),
            tasks = self.placement.len(),
            labels = self.labels.len(),
            "board state replaced"
        );
        Ok(())
    }

    /// Restores the default seed board.
    pub fn reset_state(&mut self) {
        self.reset_to(BoardSnapshot::default_seed());
    }

    /// Restores a seed built from the given column titles.
    pub fn reset_to(&mut self, seed: BoardSnapshot) {
        self.columns = seed.columns;
        self.lists = self
            .columns
            .iter()
            .map(|c| (c.id.clone(), Vec::new()))
            .collect();
        self.labels = seed.labels;
        self.placement.clear();
        debug!(columns = self.columns.len(), "board state reset");
    }

    /// Runs `op` and rolls the whole store back if it fails.
    pub fn transaction<T, F>(&mut self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let backup = self.clone();
        match op(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                *self = backup;
                Err(err)
            }
        }
    }

    /// Verifies the single-placement invariant and the placement index.
    pub fn check_integrity(&self) -> Result<()> {
        let mut seen: HashSet<&str> = HashSet::new();

        for column in &self.columns {
            if !self.lists.contains_key(&column.id) {
                return Err(self.integrity(format!("column '{}' has no task list", column.id)));
            }
        }

        for (column_id, list) in &self.lists {
            if self.column(column_id).is_none() {
                return Err(self.integrity(format!(
                    "task list for unknown column '{}'",
                    column_id
                )));
            }
            for task in list {
                if !seen.insert(task.id.as_str()) {
                    return Err(self.integrity(format!(
                        "task '{}' is placed more than once",
                        task.id
                    )));
                }
                if self.placement.get(task.id.as_str()) != Some(column_id) {
                    return Err(self.integrity(format!(
                        "placement index disagrees for task '{}'",
                        task.id
                    )));
                }
            }
        }

        if seen.len() != self.placement.len() {
            return Err(self.integrity("placement index references missing tasks".to_string()));
        }

        for (position, column) in self.columns.iter().enumerate() {
            if column.order as usize != position {
                return Err(self.integrity(format!(
                    "column '{}' has order {} at position {}",
                    column.id, column.order, position
                )));
            }
        }

        Ok(())
    }

    // --- Internal helpers shared by the operation modules ---

    fn integrity(&self, message: String) -> BoardError {
        warn!(%message, "board integrity violation");
        BoardError::StateIntegrity(message)
    }

    fn column_position(&self, id: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| BoardError::ColumnNotFound(id.to_string()))
    }

    /// Finds `(column id, position)` for a task through the placement index.
    fn locate(&self, task_id: &str) -> Result<(ColumnId, usize)> {
        let column_id = self
            .placement
            .get(task_id)
            .ok_or_else(|| BoardError::TaskNotFound(task_id.to_string()))?;

        let position = self
            .lists
            .get(column_id)
            .and_then(|list| list.iter().position(|t| t.id == task_id))
            .ok_or_else(|| {
                self.integrity(format!(
                    "task '{}' indexed in column '{}' but not found there",
                    task_id, column_id
                ))
            })?;

        Ok((column_id.clone(), position))
    }

    fn list_mut(&mut self, column_id: &str) -> Result<&mut Vec<Task>> {
        match self.lists.get_mut(column_id) {
            Some(list) => Ok(list),
            None => Err(BoardError::StateIntegrity(format!(
                "column '{}' has no task list",
                column_id
            ))),
        }
    }

    fn renumber_columns(&mut self) {
        for (position, column) in self.columns.iter_mut().enumerate() {
            column.order = position as u32;
        }
    }
}

type Hydrated = (
    Vec<Column>,
    HashMap<ColumnId, Vec<Task>>,
    Vec<Label>,
    HashMap<TaskId, ColumnId>,
);

fn hydrate(snapshot: BoardSnapshot) -> Result<Hydrated> {
    let BoardSnapshot {
        mut columns,
        tasks,
        labels,
    } = snapshot;

    let mut column_ids = HashSet::new();
    for column in &columns {
        if column.id.trim().is_empty() {
            return Err(BoardError::StateIntegrity(
                "snapshot contains a column with an empty id".to_string(),
            ));
        }
        if !column_ids.insert(column.id.clone()) {
            return Err(BoardError::StateIntegrity(format!(
                "snapshot contains duplicate column id '{}'",
                column.id
            )));
        }
    }

    // Stable sort keeps snapshot order for tied ranks; then make ranks dense.
    columns.sort_by_key(|c| c.order);
    for (position, column) in columns.iter_mut().enumerate() {
        column.order = position as u32;
    }

    let mut lists: HashMap<ColumnId, Vec<Task>> = columns
        .iter()
        .map(|c| (c.id.clone(), Vec::new()))
        .collect();
    let mut placement = HashMap::new();

    for (column_id, list) in tasks {
        let Some(slot) = lists.get_mut(&column_id) else {
            return Err(BoardError::StateIntegrity(format!(
                "snapshot has tasks for unknown column '{}'",
                column_id
            )));
        };
        for mut task in list {
            if placement
                .insert(task.id.clone(), column_id.clone())
                .is_some()
            {
                return Err(BoardError::StateIntegrity(format!(
                    "snapshot places task '{}' more than once",
                    task.id
                )));
            }
            task.rating = task
                .rating
                .filter(|r| r.is_finite())
                .map(|r| r.clamp(MIN_RATING, MAX_RATING));
            slot.push(task);
        }
    }

    let mut label_ids = HashSet::new();
    for label in &labels {
        if !label_ids.insert(label.id.as_str()) {
            return Err(BoardError::StateIntegrity(format!(
                "snapshot contains duplicate label id '{}'",
                label.id
            )));
        }
    }

    Ok((columns, lists, labels, placement))
}
