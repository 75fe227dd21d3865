//! # Persistence Adapter
//!
//! The board engine never performs I/O. Persistence lives behind the
//! [`PersistenceBackend`] trait, which stores one [`BoardSnapshot`] per user key.
//!
//! ## Implementations
//!
//! - [`fs::FsBackend`]: one JSON file per user under a root directory. Writes are
//!   atomic (temp file, then rename) so an interrupted save never leaves a torn file.
//! - [`memory::MemBackend`]: for testing logic without filesystem I/O.
//!
//! ## Storage Layout
//!
//! ```text
//! <data dir>/
//! ├── config.json            # BoardConfig
//! ├── board-default.json     # snapshot for user key "default"
//! └── board-ada_example_com.json
//! ```
//!
//! ## User Keys
//!
//! Keys are reduced to `[a-z0-9_-]` by [`storage_key`], so any identity (an email, a
//! display name) maps to a stable, filesystem-safe name.

use crate::error::Result;
use crate::model::BoardSnapshot;

pub mod fs;
pub mod memory;

/// Abstract interface for snapshot storage.
pub trait PersistenceBackend {
    /// Load the snapshot for `user_key`. `Ok(None)` when nothing was saved yet.
    fn load(&self, user_key: &str) -> Result<Option<BoardSnapshot>>;

    /// Save (create or replace) the snapshot for `user_key`.
    fn save(&self, user_key: &str, snapshot: &BoardSnapshot) -> Result<()>;

    /// Remove the saved snapshot. Removing a missing one is not an error.
    fn remove(&self, user_key: &str) -> Result<()>;
}

/// Loads the persisted state for a user, if any.
pub fn load_persisted_state<B: PersistenceBackend>(
    backend: &B,
    user_key: &str,
) -> Result<Option<BoardSnapshot>> {
    backend.load(&storage_key(user_key))
}

/// Maps an arbitrary user identity onto `[a-z0-9_-]+`.
pub fn storage_key(user_key: &str) -> String {
    let key: String = user_key
        .trim()
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if key.chars().all(|c| c == '_') {
        "default".to_string()
    } else {
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::memory::MemBackend;

    #[test]
    fn test_storage_key() {
        assert_eq!(storage_key("ada@example.com"), "ada_example_com");
        assert_eq!(storage_key("  Local-User "), "local-user");
        assert_eq!(storage_key(""), "default");
        assert_eq!(storage_key("@@@"), "default");
    }

    #[test]
    fn test_load_persisted_state_uses_storage_key() {
        let backend = MemBackend::new();
        backend
            .save("ada_example_com", &BoardSnapshot::default_seed())
            .unwrap();

        let loaded = load_persisted_state(&backend, "Ada@Example.com").unwrap();
        assert_eq!(loaded, Some(BoardSnapshot::default_seed()));
        assert_eq!(load_persisted_state(&backend, "someone-else").unwrap(), None);
    }
}
