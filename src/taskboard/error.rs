use thiserror::Error;

#[derive(Error, Debug)]
pub enum BoardError {
    /// A field failed structural validation. Always recoverable.
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Label not found: {0}")]
    LabelNotFound(String),

    /// An internal invariant is broken (e.g. a task placed in two columns).
    /// This signals an engine bug or a corrupt snapshot, never bad input.
    #[error("State integrity violation: {0}")]
    StateIntegrity(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),
}

impl BoardError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        BoardError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BoardError::ColumnNotFound(_)
                | BoardError::TaskNotFound(_)
                | BoardError::LabelNotFound(_)
        )
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, BoardError::Validation { .. })
    }
}

pub type Result<T> = std::result::Result<T, BoardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_field() {
        let err = BoardError::validation("title", "cannot be empty");
        assert_eq!(err.to_string(), "Invalid title: cannot be empty");
        assert!(err.is_validation());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_family() {
        assert!(BoardError::ColumnNotFound("todo".into()).is_not_found());
        assert!(BoardError::TaskNotFound("t1".into()).is_not_found());
        assert!(BoardError::LabelNotFound("lbl-a".into()).is_not_found());
        assert!(!BoardError::StateIntegrity("dup".into()).is_not_found());
    }
}
