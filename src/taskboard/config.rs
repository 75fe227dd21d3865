use crate::error::{BoardError, Result};
use crate::model::DEFAULT_COLUMN_TITLES;
use crate::validation::DEFAULT_LABEL_CAP;
use crate::view::SortKey;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const CONFIG_FILENAME: &str = "config.json";

/// Keys accepted by [`BoardConfig::get`] and [`BoardConfig::set`].
pub const CONFIG_KEYS: [&str; 3] = ["default-columns", "label-cap", "default-sort"];

/// Board settings, stored in `<data dir>/config.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct BoardConfig {
    /// Column titles used when a board is created or reset.
    #[serde(default = "default_columns")]
    pub default_columns: Vec<String>,

    /// Maximum number of labels attached to a single task.
    #[serde(default = "default_label_cap")]
    pub label_cap: usize,

    /// Sort applied to a freshly opened board.
    #[serde(default)]
    pub default_sort: SortKey,
}

fn default_columns() -> Vec<String> {
    DEFAULT_COLUMN_TITLES.iter().map(|t| t.to_string()).collect()
}

fn default_label_cap() -> usize {
    DEFAULT_LABEL_CAP
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            default_columns: default_columns(),
            label_cap: DEFAULT_LABEL_CAP,
            default_sort: SortKey::default(),
        }
    }
}

impl BoardConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(BoardError::Io)?;
        let config: BoardConfig =
            serde_json::from_str(&content).map_err(BoardError::Serialization)?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();
        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(BoardError::Io)?;
        }

        let content = serde_json::to_string_pretty(self).map_err(BoardError::Serialization)?;
        fs::write(config_dir.join(CONFIG_FILENAME), content).map_err(BoardError::Io)?;
        Ok(())
    }

    /// Renders one setting for display.
    pub fn get(&self, key: &str) -> Result<String> {
        match key {
            "default-columns" => Ok(self.default_columns.join(", ")),
            "label-cap" => Ok(self.label_cap.to_string()),
            "default-sort" => Ok(self.default_sort.to_string()),
            other => Err(unknown_key(other)),
        }
    }

    /// Parses and stores one setting. Column titles are comma separated.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "default-columns" => {
                let titles: Vec<String> = value
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .collect();
                if titles.is_empty() {
                    return Err(BoardError::validation(
                        "default-columns",
                        "at least one column title is required",
                    ));
                }
                self.default_columns = titles;
            }
            "label-cap" => {
                self.label_cap = value
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .filter(|cap| *cap > 0)
                    .ok_or_else(|| {
                        BoardError::validation("label-cap", "must be a positive integer")
                    })?;
            }
            "default-sort" => self.default_sort = value.parse()?,
            other => return Err(unknown_key(other)),
        }
        Ok(())
    }
}

fn unknown_key(key: &str) -> BoardError {
    BoardError::validation(
        "config key",
        format!("'{}' is not one of {}", key, CONFIG_KEYS.join(", ")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = BoardConfig::default();
        assert_eq!(config.default_columns, vec!["To Do", "In Progress", "Done"]);
        assert_eq!(config.label_cap, 10);
        assert_eq!(config.default_sort, SortKey::Date);
    }

    #[test]
    fn test_load_missing_config() {
        let temp = TempDir::new().unwrap();
        let config = BoardConfig::load(temp.path()).unwrap();
        assert_eq!(config, BoardConfig::default());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested");

        let mut config = BoardConfig::default();
        config.set("default-columns", "Backlog, Doing ,, Shipped").unwrap();
        config.set("default-sort", "priority").unwrap();
        config.save(&dir).unwrap();

        let loaded = BoardConfig::load(&dir).unwrap();
        assert_eq!(loaded.default_columns, vec!["Backlog", "Doing", "Shipped"]);
        assert_eq!(loaded.default_sort, SortKey::Priority);

        let raw = fs::read_to_string(dir.join(CONFIG_FILENAME)).unwrap();
        assert!(raw.contains("\"label-cap\": 10"));
    }

    #[test]
    fn test_partial_config_file_fills_defaults() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILENAME), r#"{"label-cap": 3}"#).unwrap();
        let config = BoardConfig::load(temp.path()).unwrap();
        assert_eq!(config.label_cap, 3);
        assert_eq!(config.default_columns.len(), 3);
    }

    #[test]
    fn test_get_and_set_validation() {
        let mut config = BoardConfig::default();
        assert_eq!(config.get("label-cap").unwrap(), "10");
        assert_eq!(config.get("default-sort").unwrap(), "date");

        assert!(config.set("label-cap", "0").unwrap_err().is_validation());
        assert!(config.set("label-cap", "many").unwrap_err().is_validation());
        assert!(config.set("default-columns", " , ").unwrap_err().is_validation());
        assert!(config.set("default-sort", "colour").unwrap_err().is_validation());
        assert!(config.get("theme").unwrap_err().is_validation());
        assert_eq!(config, BoardConfig::default());
    }
}
