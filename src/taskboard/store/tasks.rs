//! Task operations.
//!
//! Column membership only ever changes through [`BoardStore::move_task`] (and the bulk
//! [`BoardStore::move_all_tasks`]). Edits merge fields in place and never relocate.

use tracing::debug;

use super::BoardStore;
use crate::error::{BoardError, Result};
use crate::model::{Task, TaskDraft, TaskId, TaskPatch};
use crate::validation::{clamp_rating, normalize_label_set, require_text};

impl BoardStore {
    /// Appends a new task to the end of `column_id`.
    ///
    /// Defaults: `priority = Medium`, `rating = 8.8`, `createdAt = now`.
    pub fn add_task(&mut self, column_id: &str, draft: TaskDraft) -> Result<TaskId> {
        self.column_position(column_id)?;
        let title = require_text("title", draft.title.as_deref().unwrap_or_default())?;

        let task = self.merged(&Task::new(title), &draft)?;
        let id = task.id.clone();

        self.list_mut(column_id)?.push(task);
        self.placement.insert(id.clone(), column_id.to_string());
        debug!(task = %id, column = column_id, "task added");
        Ok(id)
    }

    /// Merges `patch` into the task wherever it lives.
    pub fn edit_task(&mut self, task_id: &str, patch: &TaskPatch) -> Result<Task> {
        let (column_id, position) = self.locate(task_id)?;
        let current = &self.tasks_in(&column_id)?[position];
        let updated = self.merged(current, patch)?;

        self.list_mut(&column_id)?[position] = updated.clone();
        debug!(task = task_id, "task edited");
        Ok(updated)
    }

    /// Removes a task. A missing id is an error; see
    /// [`delete_task_if_present`](Self::delete_task_if_present) for the lenient form.
    pub fn delete_task(&mut self, task_id: &str) -> Result<Task> {
        let (column_id, position) = self.locate(task_id)?;
        let task = self.list_mut(&column_id)?.remove(position);
        self.placement.remove(task_id);
        debug!(task = task_id, column = %column_id, "task deleted");
        Ok(task)
    }

    /// Idempotent delete: `Ok(None)` when the task is already gone.
    pub fn delete_task_if_present(&mut self, task_id: &str) -> Result<Option<Task>> {
        match self.delete_task(task_id) {
            Ok(task) => Ok(Some(task)),
            Err(BoardError::TaskNotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Moves a task to `target_column_id` at `target_index` (end when `None`, clamped to
    /// the list length). Moving within the same column reorders it.
    ///
    /// Returns the position the task landed at.
    pub fn move_task(
        &mut self,
        task_id: &str,
        target_column_id: &str,
        target_index: Option<usize>,
    ) -> Result<usize> {
        // Validate both ends before detaching anything.
        self.column_position(target_column_id)?;
        let (source_id, position) = self.locate(task_id)?;

        let task = self.list_mut(&source_id)?.remove(position);
        let target = self.list_mut(target_column_id)?;
        let landed = target_index.unwrap_or(target.len()).min(target.len());
        target.insert(landed, task);

        if source_id != target_column_id {
            self.placement
                .insert(TaskId::from(task_id), target_column_id.to_string());
        }
        debug!(
            task = task_id,
            from = %source_id,
            to = target_column_id,
            index = landed,
            "task moved"
        );
        debug_assert!(self.check_integrity().is_ok());
        Ok(landed)
    }

    /// Applies a draft/patch on top of `base`, validating every supplied field.
    fn merged(&self, base: &Task, patch: &TaskPatch) -> Result<Task> {
        let mut task = base.clone();

        if let Some(title) = &patch.title {
            task.title = require_text("title", title)?;
        }
        if let Some(details) = &patch.details {
            task.details = details.trim_end().to_string();
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(rating) = patch.rating {
            task.rating = Some(clamp_rating(rating)?);
        }
        if let Some(labels) = &patch.labels {
            let labels = normalize_label_set(labels, self.label_cap)?;
            if let Some(missing) = labels.iter().find(|id| self.label(id).is_none()) {
                return Err(BoardError::LabelNotFound(missing.clone()));
            }
            task.labels = labels;
        }
        if let Some(status) = &patch.status {
            task.status = status.trim().to_string();
        }
        if let Some(starred) = patch.starred {
            task.starred = starred;
        }
        if let Some(due_date) = &patch.due_date {
            task.due_date = due_date.trim().to_string();
        }

        Ok(task)
    }
}
