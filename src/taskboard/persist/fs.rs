use super::PersistenceBackend;
use crate::error::{BoardError, Result};
use crate::model::BoardSnapshot;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Stores each user's board as `board-<key>.json` under `root`.
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn board_path(&self, user_key: &str) -> PathBuf {
        self.root.join(format!("board-{}.json", user_key))
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(BoardError::Io)?;
        }
        Ok(())
    }
}

impl PersistenceBackend for FsBackend {
    fn load(&self, user_key: &str) -> Result<Option<BoardSnapshot>> {
        let path = self.board_path(user_key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(BoardError::Io)?;
        let snapshot: BoardSnapshot =
            serde_json::from_str(&content).map_err(BoardError::Serialization)?;
        Ok(Some(snapshot))
    }

    fn save(&self, user_key: &str, snapshot: &BoardSnapshot) -> Result<()> {
        self.ensure_dir()?;
        let content = serde_json::to_string_pretty(snapshot).map_err(BoardError::Serialization)?;

        // Atomic write: a crash mid-save leaves the previous board intact.
        let tmp_file = self.root.join(format!(".board-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp_file, content).map_err(BoardError::Io)?;
        fs::rename(&tmp_file, self.board_path(user_key)).map_err(BoardError::Io)?;
        Ok(())
    }

    fn remove(&self, user_key: &str) -> Result<()> {
        let path = self.board_path(user_key);
        if path.exists() {
            fs::remove_file(path).map_err(BoardError::Io)?;
        }
        Ok(())
    }
}
