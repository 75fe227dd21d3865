//! Column operations.
//!
//! Column `order` values are kept dense (`0..n`): adding appends at `n`, and edits or
//! deletes that change positions renumber every column.

use tracing::debug;

use super::BoardStore;
use crate::error::{BoardError, Result};
use crate::model::{slugify, unique_slug, Column, ColumnId, ColumnPatch};
use crate::validation::require_text;

/// What happens to a column's tasks when the column is deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnDisposal {
    /// Delete the column and every task in it. Irreversible.
    DeleteTasks,
    /// Append the column's tasks, in order, to another column first.
    RelocateTo(ColumnId),
}

impl BoardStore {
    /// Appends a column with `order = column count`. Returns the generated id.
    pub fn add_column(&mut self, title: &str) -> Result<ColumnId> {
        let title = require_text("title", title)?;
        let id = unique_slug(&slugify(&title, "column"), |candidate| {
            self.column(candidate).is_some()
        });

        self.columns.push(Column {
            id: id.clone(),
            title,
            order: self.columns.len() as u32,
        });
        self.lists.insert(id.clone(), Vec::new());
        debug!(column = %id, "column added");
        Ok(id)
    }

    /// Applies `patch`. A new `order` moves the column to that position (clamped to the
    /// last one) and shifts the others, so orders stay distinct.
    pub fn edit_column(&mut self, id: &str, patch: &ColumnPatch) -> Result<Column> {
        let position = self.column_position(id)?;
        let title = patch
            .title
            .as_deref()
            .map(|t| require_text("title", t))
            .transpose()?;

        if let Some(title) = title {
            self.columns[position].title = title;
        }
        if let Some(order) = patch.order {
            let target = (order as usize).min(self.columns.len() - 1);
            let column = self.columns.remove(position);
            self.columns.insert(target, column);
            self.renumber_columns();
        }

        debug!(column = id, "column edited");
        self.column(id)
            .cloned()
            .ok_or_else(|| BoardError::ColumnNotFound(id.to_string()))
    }

    /// Deletes a column, either with its tasks or after relocating them.
    ///
    /// Returns how many tasks were deleted or relocated.
    pub fn delete_column(&mut self, id: &str, disposal: &ColumnDisposal) -> Result<usize> {
        let position = self.column_position(id)?;

        let affected = match disposal {
            ColumnDisposal::DeleteTasks => {
                let tasks = self.lists.remove(id).unwrap_or_default();
                for task in &tasks {
                    self.placement.remove(task.id.as_str());
                }
                tasks.len()
            }
            ColumnDisposal::RelocateTo(target) => {
                if target == id {
                    return Err(BoardError::validation(
                        "target",
                        "cannot relocate tasks into the column being deleted",
                    ));
                }
                if self.column(target).is_none() {
                    return Err(BoardError::validation(
                        "target",
                        format!("relocation column '{}' does not exist", target),
                    ));
                }
                let moved = self.move_all_tasks(id, target)?;
                self.lists.remove(id);
                moved
            }
        };

        self.columns.remove(position);
        self.renumber_columns();
        debug!(column = id, tasks = affected, ?disposal, "column deleted");
        debug_assert!(self.check_integrity().is_ok());
        Ok(affected)
    }

    /// Appends every task of `from` to `to`, preserving relative order.
    pub fn move_all_tasks(&mut self, from: &str, to: &str) -> Result<usize> {
        self.column_position(from)?;
        self.column_position(to)?;
        if from == to {
            return Ok(0);
        }

        let tasks = std::mem::take(self.list_mut(from)?);
        let moved = tasks.len();
        for task in &tasks {
            self.placement.insert(task.id.clone(), to.to_string());
        }
        self.list_mut(to)?.extend(tasks);

        debug!(from, to, tasks = moved, "tasks relocated");
        debug_assert!(self.check_integrity().is_ok());
        Ok(moved)
    }
}
