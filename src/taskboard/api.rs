//! # API Facade
//!
//! The API layer is a **thin facade** over the board store. It is the single entry
//! point for UI clients and the place where the store meets persistence.
//!
//! ## Role and Responsibilities
//!
//! The facade:
//! - **Delegates** every mutation to the matching [`BoardStore`] operation
//! - **Persists** the resulting snapshot for the active user after each mutation
//! - **Tracks** the outcome of the last external step in a [`SyncStatus`]
//! - **Holds** the ephemeral [`FilterSpec`] and projects the visible board
//!
//! ## What the API Does NOT Do
//!
//! - **Business logic**: validation and invariants live in the store
//! - **Presentation**: it returns structured values, never formatted strings
//!
//! ## Persistence Failures
//!
//! A mutation is only kept if it was saved. When the backend rejects a save the store
//! is restored to its state before the call, the status becomes
//! [`SyncStatus::Rejected`] and the error is returned.
//!
//! ## Generic Over PersistenceBackend
//!
//! - Production: `BoardApi<FsBackend>`
//! - Testing: `BoardApi<MemBackend>`

use tracing::{info, warn};

use crate::config::BoardConfig;
use crate::error::{BoardError, Result};
use crate::model::{
    BoardSnapshot, Column, ColumnId, ColumnPatch, Label, LabelDraft, LabelId, LabelPatch, Task,
    TaskDraft, TaskId, TaskPatch,
};
use crate::persist::{load_persisted_state, storage_key, PersistenceBackend};
use crate::store::{BoardStore, ColumnDisposal};
use crate::view::{project, ColumnView, FilterPatch, FilterSpec, SortKey};

/// Outcome of the most recent load or save.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncStatus {
    #[default]
    Idle,
    Pending,
    Fulfilled,
    Rejected(String),
}

pub struct BoardApi<B: PersistenceBackend> {
    store: BoardStore,
    filter: FilterSpec,
    backend: B,
    user_key: String,
    config: BoardConfig,
    status: SyncStatus,
}

impl<B: PersistenceBackend> BoardApi<B> {
    /// Opens the board of `user`: its persisted snapshot, or the configured seed.
    pub fn open(backend: B, user: &str, config: BoardConfig) -> Result<Self> {
        let user_key = storage_key(user);
        let store = load_store(&backend, &user_key, &config)?;
        Ok(Self::assemble(store, backend, user_key, config))
    }

    /// Like [`BoardApi::open`], but a persisted board that cannot be read back
    /// (malformed JSON or a broken invariant) is replaced in memory by the seed board.
    /// The next commit overwrites the damaged file. Backend I/O errors still fail.
    pub fn open_recovering(backend: B, user: &str, config: BoardConfig) -> Result<Self> {
        let user_key = storage_key(user);
        let store = match load_store(&backend, &user_key, &config) {
            Err(err @ (BoardError::Serialization(_) | BoardError::StateIntegrity(_))) => {
                warn!(user = %user_key, error = %err, "board unreadable, starting from seed");
                seed_store(&config)
            }
            other => other?,
        };
        Ok(Self::assemble(store, backend, user_key, config))
    }

    fn assemble(store: BoardStore, backend: B, user_key: String, config: BoardConfig) -> Self {
        info!(user = %user_key, tasks = store.task_count(), "board opened");
        Self {
            store,
            filter: FilterSpec::with_sort(config.default_sort),
            backend,
            user_key,
            config,
            status: SyncStatus::Idle,
        }
    }

    pub fn store(&self) -> &BoardStore {
        &self.store
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// The storage key of the active user.
    pub fn user(&self) -> &str {
        &self.user_key
    }

    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    /// Loads another user's board. On failure the current board and user are kept.
    pub fn switch_user(&mut self, user: &str) -> Result<()> {
        let user_key = storage_key(user);
        self.status = SyncStatus::Pending;

        match load_store(&self.backend, &user_key, &self.config) {
            Ok(store) => {
                info!(from = %self.user_key, to = %user_key, "switched user");
                self.store = store;
                self.user_key = user_key;
                self.status = SyncStatus::Fulfilled;
                Ok(())
            }
            Err(err) => {
                warn!(user = %user_key, error = %err, "could not load board");
                self.status = SyncStatus::Rejected(err.to_string());
                Err(err)
            }
        }
    }

    /// Runs `op` against the store and persists the result inside one store
    /// transaction. Any failure, in the operation or in the save, restores the store
    /// as it was.
    fn commit<T, F>(&mut self, op: F) -> Result<T>
    where
        F: FnOnce(&mut BoardStore) -> Result<T>,
    {
        let Self {
            store,
            backend,
            user_key,
            status,
            ..
        } = self;
        store.transaction(|s| {
            let value = op(s)?;
            persist(backend, user_key, status, s)?;
            Ok(value)
        })
    }

    // --- Columns ---

    pub fn add_column(&mut self, title: &str) -> Result<ColumnId> {
        self.commit(|s| s.add_column(title))
    }

    pub fn edit_column(&mut self, id: &str, patch: &ColumnPatch) -> Result<Column> {
        self.commit(|s| s.edit_column(id, patch))
    }

    pub fn delete_column(&mut self, id: &str, disposal: &ColumnDisposal) -> Result<usize> {
        self.commit(|s| s.delete_column(id, disposal))
    }

    pub fn move_all_tasks(&mut self, from: &str, to: &str) -> Result<usize> {
        self.commit(|s| s.move_all_tasks(from, to))
    }

    // --- Tasks ---

    pub fn add_task(&mut self, column_id: &str, draft: TaskDraft) -> Result<TaskId> {
        self.commit(|s| s.add_task(column_id, draft))
    }

    pub fn edit_task(&mut self, task_id: &str, patch: &TaskPatch) -> Result<Task> {
        self.commit(|s| s.edit_task(task_id, patch))
    }

    pub fn delete_task(&mut self, task_id: &str) -> Result<Task> {
        self.commit(|s| s.delete_task(task_id))
    }

    pub fn move_task(
        &mut self,
        task_id: &str,
        target_column_id: &str,
        target_index: Option<usize>,
    ) -> Result<usize> {
        self.commit(|s| s.move_task(task_id, target_column_id, target_index))
    }

    /// Flips the starred flag and returns the new value.
    pub fn toggle_star(&mut self, task_id: &str) -> Result<bool> {
        let starred = self
            .store
            .task(task_id)
            .map(|t| !t.starred)
            .ok_or_else(|| BoardError::TaskNotFound(task_id.to_string()))?;
        let patch = TaskPatch {
            starred: Some(starred),
            ..Default::default()
        };
        self.commit(|s| s.edit_task(task_id, &patch))
            .map(|task| task.starred)
    }

    // --- Labels ---

    pub fn add_label(&mut self, draft: &LabelDraft) -> Result<LabelId> {
        self.commit(|s| s.add_label(draft))
    }

    pub fn edit_label(&mut self, id: &str, patch: &LabelPatch) -> Result<Label> {
        self.commit(|s| s.edit_label(id, patch))
    }

    pub fn delete_label(&mut self, id: &str) -> Result<usize> {
        self.commit(|s| s.delete_label(id))
    }

    pub fn attach_label(&mut self, task_id: &str, label_id: &str) -> Result<bool> {
        self.commit(|s| s.attach_label(task_id, label_id))
    }

    pub fn detach_label(&mut self, task_id: &str, label_id: &str) -> Result<bool> {
        self.commit(|s| s.detach_label(task_id, label_id))
    }

    // --- Filter and projection ---

    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    pub fn set_filter(&mut self, patch: FilterPatch) {
        self.filter.merge(patch);
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.filter.set_sort(sort);
    }

    /// The board as currently filtered and sorted.
    pub fn visible(&self) -> Vec<ColumnView> {
        project(&self.store, &self.filter)
    }

    // --- Whole board ---

    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.store.snapshot())?)
    }

    /// Replaces the board with a snapshot document. Nothing changes if the document
    /// is malformed or inconsistent.
    pub fn import_json(&mut self, text: &str) -> Result<usize> {
        let snapshot: BoardSnapshot = serde_json::from_str(text)?;
        let count = snapshot.task_count();
        self.commit(|s| s.replace_state(snapshot))?;
        info!(user = %self.user_key, tasks = count, "board imported");
        Ok(count)
    }

    /// Restores the configured seed board, dropping every task and label.
    pub fn reset(&mut self) -> Result<()> {
        let seed = BoardSnapshot::seed(&self.config.default_columns);
        self.commit(|s| {
            s.reset_to(seed);
            Ok(())
        })?;
        info!(user = %self.user_key, "board reset");
        Ok(())
    }
}

fn persist<B: PersistenceBackend>(
    backend: &B,
    user_key: &str,
    status: &mut SyncStatus,
    store: &BoardStore,
) -> Result<()> {
    *status = SyncStatus::Pending;
    match backend.save(user_key, &store.snapshot()) {
        Ok(()) => {
            *status = SyncStatus::Fulfilled;
            Ok(())
        }
        Err(err) => {
            warn!(user = %user_key, error = %err, "save rejected, rolling back");
            *status = SyncStatus::Rejected(err.to_string());
            Err(err)
        }
    }
}

fn load_store<B: PersistenceBackend>(
    backend: &B,
    user_key: &str,
    config: &BoardConfig,
) -> Result<BoardStore> {
    let store = match load_persisted_state(backend, user_key)? {
        Some(snapshot) => BoardStore::from_snapshot(snapshot)?,
        None => seed_store(config),
    };
    Ok(store.with_label_cap(config.label_cap))
}

fn seed_store(config: &BoardConfig) -> BoardStore {
    let mut store = BoardStore::new();
    store.reset_to(BoardSnapshot::seed(&config.default_columns));
    store.with_label_cap(config.label_cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;
    use crate::persist::memory::MemBackend;
    use crate::test_utils::sample_snapshot;

    fn api() -> BoardApi<MemBackend> {
        let backend = MemBackend::new();
        backend.save("local", &sample_snapshot()).unwrap();
        BoardApi::open(backend, "local", BoardConfig::default()).unwrap()
    }

    #[test]
    fn test_open_without_saved_board_uses_configured_seed() {
        let mut config = BoardConfig::default();
        config.default_columns = vec!["Inbox".into(), "Shipped".into()];
        let api = BoardApi::open(MemBackend::new(), "new@example.com", config).unwrap();

        let ids: Vec<&str> = api.store().columns().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["inbox", "shipped"]);
        assert_eq!(api.user(), "new_example_com");
        assert_eq!(api.status(), &SyncStatus::Idle);
        assert!(api.backend().saved_keys().is_empty());
    }

    #[test]
    fn test_open_applies_config_sort_and_label_cap() {
        let mut config = BoardConfig::default();
        config.default_sort = SortKey::Title;
        config.label_cap = 2;
        let api = BoardApi::open(MemBackend::new(), "local", config).unwrap();
        assert_eq!(api.filter().sort, SortKey::Title);
        assert_eq!(api.store().label_cap(), 2);
    }

    #[test]
    fn test_mutation_is_persisted() {
        let mut api = api();
        let id = api
            .add_task("todo", TaskDraft::titled("Ship it").with_priority(Priority::Critical))
            .unwrap();

        assert_eq!(api.status(), &SyncStatus::Fulfilled);
        let saved = api.backend().load("local").unwrap().unwrap();
        assert!(saved.tasks["todo"].iter().any(|t| t.id == id));
    }

    #[test]
    fn test_failed_save_rolls_back() {
        let mut api = api();
        let before = api.store().snapshot();
        api.backend().set_simulate_write_error(true);

        let err = api.add_task("todo", TaskDraft::titled("Lost")).unwrap_err();
        assert!(matches!(err, BoardError::Store(_)));
        assert_eq!(api.store().snapshot(), before);
        assert!(matches!(api.status(), SyncStatus::Rejected(_)));

        api.backend().set_simulate_write_error(false);
        api.add_task("todo", TaskDraft::titled("Kept")).unwrap();
        assert_eq!(api.store().task_count(), before.task_count() + 1);
    }

    #[test]
    fn test_failed_operation_does_not_save() {
        let mut api = api();
        let err = api.move_task("t-sql", "nowhere", None).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(api.status(), &SyncStatus::Idle);
    }

    #[test]
    fn test_toggle_star() {
        let mut api = api();
        assert!(api.toggle_star("t-sql").unwrap());
        assert!(!api.toggle_star("t-sql").unwrap());
        assert!(api.toggle_star("missing").unwrap_err().is_not_found());
    }

    #[test]
    fn test_switch_user_loads_other_board() {
        let mut api = api();
        api.switch_user("Ada@Example.com").unwrap();
        assert_eq!(api.user(), "ada_example_com");
        assert_eq!(api.store().task_count(), 0);
        assert_eq!(api.status(), &SyncStatus::Fulfilled);

        api.switch_user("local").unwrap();
        assert_eq!(api.store().task_count(), 4);
    }

    #[test]
    fn test_switch_user_failure_keeps_current_board() {
        let mut api = api();
        api.backend().set_simulate_read_error(true);

        assert!(api.switch_user("someone").is_err());
        assert_eq!(api.user(), "local");
        assert_eq!(api.store().task_count(), 4);
        assert!(matches!(api.status(), SyncStatus::Rejected(_)));
    }

    #[test]
    fn test_filter_and_visible() {
        let mut api = api();
        api.set_filter(FilterPatch {
            search: Some("sql".into()),
            priority: Some(Some(Priority::High)),
            ..Default::default()
        });
        api.set_sort(SortKey::Title);

        let visible = api.visible();
        let todo = visible.iter().find(|c| c.column.id == "todo").unwrap();
        let titles: Vec<&str> = todo.tasks.iter().map(|t| t.task.title.as_str()).collect();
        assert_eq!(titles, vec!["Tune sql queries"]);
        assert_eq!(todo.total, 2);

        let backlog = visible.iter().find(|c| c.column.id == "backlog").unwrap();
        assert_eq!(backlog.tasks.len(), 1);
    }

    #[test]
    fn test_export_then_import() {
        let mut api = api();
        let exported = api.export_json().unwrap();

        api.reset().unwrap();
        assert_eq!(api.store().task_count(), 0);

        assert_eq!(api.import_json(&exported).unwrap(), 4);
        assert_eq!(api.store().snapshot(), sample_snapshot());
    }

    #[test]
    fn test_import_rejects_bad_documents() {
        let mut api = api();
        let before = api.store().snapshot();

        assert!(matches!(
            api.import_json("not json"),
            Err(BoardError::Serialization(_))
        ));

        let mut dup = sample_snapshot();
        let task = dup.tasks["backlog"][0].clone();
        dup.tasks.get_mut("done").unwrap().push(task);
        let text = serde_json::to_string(&dup).unwrap();
        assert!(matches!(
            api.import_json(&text),
            Err(BoardError::StateIntegrity(_))
        ));
        assert_eq!(api.store().snapshot(), before);
    }

    #[test]
    fn test_reset_uses_configured_columns() {
        let backend = MemBackend::new();
        let mut config = BoardConfig::default();
        config.default_columns = vec!["Now".into(), "Later".into()];
        let mut api = BoardApi::open(backend, "local", config).unwrap();
        api.add_column("Someday").unwrap();

        api.reset().unwrap();
        let ids: Vec<&str> = api.store().columns().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["now", "later"]);
        let saved = api.backend().load("local").unwrap().unwrap();
        assert_eq!(saved.columns.len(), 2);
    }

    fn backend_with_duplicate_column() -> MemBackend {
        let backend = MemBackend::new();
        let mut broken = sample_snapshot();
        let dup = broken.columns[0].clone();
        broken.columns.push(dup);
        backend.save("local", &broken).unwrap();
        backend
    }

    #[test]
    fn test_open_recovering_replaces_unreadable_board() {
        assert!(matches!(
            BoardApi::open(backend_with_duplicate_column(), "local", BoardConfig::default()),
            Err(BoardError::StateIntegrity(_))
        ));

        let backend = backend_with_duplicate_column();
        let mut api = BoardApi::open_recovering(backend, "local", BoardConfig::default()).unwrap();
        let ids: Vec<&str> = api.store().columns().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["to-do", "in-progress", "done"]);
        assert_eq!(api.store().task_count(), 0);

        api.reset().unwrap();
        let saved = api.backend().load("local").unwrap().unwrap();
        assert!(BoardStore::from_snapshot(saved).is_ok());
    }

    #[test]
    fn test_open_recovering_still_fails_on_read_errors() {
        let backend = MemBackend::new();
        backend.set_simulate_read_error(true);
        assert!(matches!(
            BoardApi::open_recovering(backend, "local", BoardConfig::default()),
            Err(BoardError::Store(_))
        ));
    }

    #[test]
    fn test_delete_label_cascades_and_persists() {
        let mut api = api();
        assert_eq!(api.delete_label("lbl-security").unwrap(), 1);
        let saved = api.backend().load("local").unwrap().unwrap();
        assert!(saved.labels.iter().all(|l| l.id != "lbl-security"));
        assert!(saved.tasks["backlog"][0].labels.is_empty());
    }
}
