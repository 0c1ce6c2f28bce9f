//! Input validation, applied before anything touches storage.

use crate::error::ValidationError;

/// Upper bound on free-text fields (diagnosis, notes), in bytes.
pub const MAX_FIELD_LEN: usize = 64 * 1024;

/// Upper bound on display names, in bytes.
pub const MAX_NAME_LEN: usize = 256;

/// Validate a display name: non-empty, bounded.
pub fn validate_name(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    if value.len() > MAX_NAME_LEN {
        return Err(ValidationError::FieldTooLong {
            field,
            max: MAX_NAME_LEN,
            len: value.len(),
        });
    }
    Ok(())
}

/// Validate a free-text field: bounded. Empty is legal.
pub fn validate_free_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.len() > MAX_FIELD_LEN {
        return Err(ValidationError::FieldTooLong {
            field,
            max: MAX_FIELD_LEN,
            len: value.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_must_be_nonempty() {
        assert_eq!(
            validate_name("author_name", "  "),
            Err(ValidationError::EmptyField("author_name"))
        );
        assert!(validate_name("author_name", "dr. House").is_ok());
    }

    #[test]
    fn test_name_bounded() {
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(matches!(
            validate_name("author_name", &long),
            Err(ValidationError::FieldTooLong { .. })
        ));
    }

    #[test]
    fn test_free_text_allows_empty() {
        assert!(validate_free_text("notes", "").is_ok());
    }

    #[test]
    fn test_free_text_bounded() {
        let long = "x".repeat(MAX_FIELD_LEN + 1);
        assert!(matches!(
            validate_free_text("diagnosis", &long),
            Err(ValidationError::FieldTooLong { .. })
        ));
    }
}
