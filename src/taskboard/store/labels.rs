//! Label registry and task labelling.
//!
//! Attaching and detaching are set operations: repeating them is a no-op. Deleting a
//! label detaches it from every task in every column.

use tracing::debug;

use super::BoardStore;
use crate::error::{BoardError, Result};
use crate::model::{slugify, unique_slug, Label, LabelDraft, LabelId, LabelPatch};
use crate::validation::{check_label_cap, require_text, validate_color};

impl BoardStore {
    /// Registers a label. Both `name` and `color` are required.
    pub fn add_label(&mut self, draft: &LabelDraft) -> Result<LabelId> {
        let name = require_text("name", draft.name.as_deref().unwrap_or_default())?;
        let color = match draft.color.as_deref() {
            Some(color) => validate_color(color)?,
            None => return Err(BoardError::validation("color", "is required")),
        };

        let base = format!("lbl-{}", slugify(&name, "label"));
        let id = unique_slug(&base, |candidate| self.label(candidate).is_some());

        self.labels.push(Label {
            id: id.clone(),
            name,
            color,
        });
        debug!(label = %id, "label added");
        Ok(id)
    }

    pub fn edit_label(&mut self, id: &str, patch: &LabelPatch) -> Result<Label> {
        let name = patch
            .name
            .as_deref()
            .map(|n| require_text("name", n))
            .transpose()?;
        let color = patch.color.as_deref().map(validate_color).transpose()?;

        let label = self
            .labels
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| BoardError::LabelNotFound(id.to_string()))?;
        if let Some(name) = name {
            label.name = name;
        }
        if let Some(color) = color {
            label.color = color;
        }

        debug!(label = id, "label edited");
        Ok(label.clone())
    }

    /// Removes a label and detaches it from every task. Returns how many tasks lost it.
    pub fn delete_label(&mut self, id: &str) -> Result<usize> {
        let position = self
            .labels
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| BoardError::LabelNotFound(id.to_string()))?;
        self.labels.remove(position);

        let mut detached = 0;
        for task in self.lists.values_mut().flatten() {
            let before = task.labels.len();
            task.labels.retain(|l| l != id);
            if task.labels.len() != before {
                detached += 1;
            }
        }

        debug!(label = id, tasks = detached, "label deleted");
        Ok(detached)
    }

    /// Adds `label_id` to a task's label set. Returns `false` when it was already there.
    pub fn attach_label(&mut self, task_id: &str, label_id: &str) -> Result<bool> {
        let (column_id, position) = self.locate(task_id)?;
        if self.label(label_id).is_none() {
            return Err(BoardError::LabelNotFound(label_id.to_string()));
        }

        let cap = self.label_cap;
        let task = &mut self.list_mut(&column_id)?[position];
        if task.has_label(label_id) {
            return Ok(false);
        }
        check_label_cap(task.labels.len() + 1, cap)?;
        task.labels.push(label_id.to_string());

        debug!(task = task_id, label = label_id, "label attached");
        Ok(true)
    }

    /// Removes `label_id` from a task's label set. Dangling ids can be detached too.
    /// Returns `false` when the task did not carry it.
    pub fn detach_label(&mut self, task_id: &str, label_id: &str) -> Result<bool> {
        let (column_id, position) = self.locate(task_id)?;
        let task = &mut self.list_mut(&column_id)?[position];

        let before = task.labels.len();
        task.labels.retain(|l| l != label_id);
        let changed = task.labels.len() != before;

        if changed {
            debug!(task = task_id, label = label_id, "label detached");
        }
        Ok(changed)
    }
}
