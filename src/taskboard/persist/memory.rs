use super::PersistenceBackend;
use crate::error::{BoardError, Result};
use crate::model::BoardSnapshot;
use std::cell::RefCell;
use std::collections::HashMap;

/// In-memory persistence backend for testing.
///
/// Uses `RefCell` for interior mutability since the board is single-threaded.
/// This keeps `PersistenceBackend` methods on `&self` without locking.
#[derive(Default)]
pub struct MemBackend {
    boards: RefCell<HashMap<String, BoardSnapshot>>,
    simulate_read_error: RefCell<bool>,
    simulate_write_error: RefCell<bool>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `save` fail.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.borrow_mut() = simulate;
    }

    /// Make every subsequent `load` fail.
    pub fn set_simulate_read_error(&self, simulate: bool) {
        *self.simulate_read_error.borrow_mut() = simulate;
    }

    pub fn saved_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.boards.borrow().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl PersistenceBackend for MemBackend {
    fn load(&self, user_key: &str) -> Result<Option<BoardSnapshot>> {
        if *self.simulate_read_error.borrow() {
            return Err(BoardError::Store("Simulated read error".to_string()));
        }
        Ok(self.boards.borrow().get(user_key).cloned())
    }

    fn save(&self, user_key: &str, snapshot: &BoardSnapshot) -> Result<()> {
        if *self.simulate_write_error.borrow() {
            return Err(BoardError::Store("Simulated write error".to_string()));
        }
        self.boards
            .borrow_mut()
            .insert(user_key.to_string(), snapshot.clone());
        Ok(())
    }

    fn remove(&self, user_key: &str) -> Result<()> {
        self.boards.borrow_mut().remove(user_key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_remove() {
        let backend = MemBackend::new();
        assert_eq!(backend.load("u").unwrap(), None);

        let seed = BoardSnapshot::default_seed();
        backend.save("u", &seed).unwrap();
        assert_eq!(backend.load("u").unwrap(), Some(seed));
        assert_eq!(backend.saved_keys(), vec!["u"]);

        backend.remove("u").unwrap();
        backend.remove("u").unwrap();
        assert_eq!(backend.load("u").unwrap(), None);
    }

    #[test]
    fn test_simulated_errors() {
        let backend = MemBackend::new();
        backend.set_simulate_write_error(true);
        assert!(backend.save("u", &BoardSnapshot::default()).is_err());
        backend.set_simulate_write_error(false);
        backend.save("u", &BoardSnapshot::default()).unwrap();

        backend.set_simulate_read_error(true);
        assert!(matches!(backend.load("u"), Err(BoardError::Store(_))));
    }
}
