//! Structural validation shared by every store mutation.
//!
//! The sanitizer cleans raw input before it reaches the engine, but the store is a
//! public contract boundary, so it re-checks:
//! - Required text fields are present and non-blank
//! - Ratings are finite; they are clamped into `[0, 10]`, never rejected for range
//! - Label colors are `#RGB` or `#RRGGBB`
//! - A task carries at most [`DEFAULT_LABEL_CAP`] labels (configurable)

use crate::error::{BoardError, Result};
use crate::model::{LabelId, MAX_RATING, MIN_RATING};

pub const DEFAULT_LABEL_CAP: usize = 10;

/// Trims `value` and rejects it when nothing is left.
pub fn require_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BoardError::validation(field, "cannot be empty"));
    }
    Ok(trimmed.to_string())
}

/// Clamps a rating into range. NaN and infinities are rejected.
pub fn clamp_rating(rating: f64) -> Result<f64> {
    if !rating.is_finite() {
        return Err(BoardError::validation("rating", "must be a finite number"));
    }
    Ok(rating.clamp(MIN_RATING, MAX_RATING))
}

/// Checks `#RGB` / `#RRGGBB` hex notation.
pub fn validate_color(color: &str) -> Result<String> {
    let color = color.trim();
    let hex = color.strip_prefix('#').ok_or_else(|| {
        BoardError::validation("color", format!("'{}' must start with '#'", color))
    })?;

    if !(hex.len() == 3 || hex.len() == 6) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(BoardError::validation(
            "color",
            format!("'{}' is not a #RGB or #RRGGBB color", color),
        ));
    }
    Ok(color.to_string())
}

/// Deduplicates label ids keeping first occurrence order, then enforces the cap.
pub fn normalize_label_set(labels: &[LabelId], cap: usize) -> Result<Vec<LabelId>> {
    let mut set: Vec<LabelId> = Vec::with_capacity(labels.len());
    for label in labels {
        let label = label.trim();
        if label.is_empty() {
            return Err(BoardError::validation("labels", "label id cannot be empty"));
        }
        if !set.iter().any(|l| l == label) {
            set.push(label.to_string());
        }
    }
    check_label_cap(set.len(), cap)?;
    Ok(set)
}

pub fn check_label_cap(count: usize, cap: usize) -> Result<()> {
    if count > cap {
        return Err(BoardError::validation(
            "labels",
            format!("a task can carry at most {} labels", cap),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text_trims() {
        assert_eq!(require_text("title", "  Ship it ").unwrap(), "Ship it");
        assert!(require_text("title", "   ").unwrap_err().is_validation());
        assert!(require_text("title", "").is_err());
    }

    #[test]
    fn test_clamp_rating() {
        assert_eq!(clamp_rating(15.0).unwrap(), 10.0);
        assert_eq!(clamp_rating(-3.0).unwrap(), 0.0);
        assert_eq!(clamp_rating(7.5).unwrap(), 7.5);
        assert!(clamp_rating(f64::NAN).is_err());
        assert!(clamp_rating(f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_color() {
        assert_eq!(validate_color("#fff").unwrap(), "#fff");
        assert_eq!(validate_color(" #A1b2C3 ").unwrap(), "#A1b2C3");
        assert!(validate_color("fff").is_err());
        assert!(validate_color("#ffff").is_err());
        assert!(validate_color("#ggg").is_err());
    }

    #[test]
    fn test_normalize_label_set_dedupes_in_order() {
        let labels = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(normalize_label_set(&labels, 10).unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn test_label_cap() {
        let labels: Vec<String> = (0..11).map(|i| format!("l{}", i)).collect();
        let err = normalize_label_set(&labels, 10).unwrap_err();
        assert!(err.to_string().contains("at most 10"));
        assert!(normalize_label_set(&labels[..10], 10).is_ok());
    }
}
