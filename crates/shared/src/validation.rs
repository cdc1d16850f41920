//! Common validation utilities.

use validator::ValidationError;

/// Trims a string and returns `None` when nothing is left.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Normalizes an application name for command matching.
///
/// Agents report process names with inconsistent casing, so commands are
/// keyed on the trimmed lowercase form.
pub fn normalize_app_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Validates that a string contains at least one non-whitespace character.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Validates that a surrogate id is strictly positive.
pub fn validate_positive_id(id: i64) -> Result<(), ValidationError> {
    if id > 0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("id_range");
        err.message = Some("Id must be a positive integer".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::{faker::name::en::Name, Fake};

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  abc ")), Some("abc"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(Some("")), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn test_normalize_app_name() {
        assert_eq!(normalize_app_name("  Chrome.EXE "), "chrome.exe");
        assert_eq!(normalize_app_name("edge"), "edge");
    }

    #[test]
    fn test_normalize_app_name_is_idempotent() {
        let name: String = Name().fake();
        let once = normalize_app_name(&name);
        assert_eq!(normalize_app_name(&once), once);
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("x").is_ok());
        assert!(validate_not_blank(" \t").is_err());
    }

    #[test]
    fn test_validate_not_blank_error_message() {
        let err = validate_not_blank("").unwrap_err();
        assert_eq!(err.message.unwrap().to_string(), "Value must not be blank");
    }

    #[test]
    fn test_validate_positive_id() {
        assert!(validate_positive_id(1).is_ok());
        assert!(validate_positive_id(0).is_err());
        assert!(validate_positive_id(-7).is_err());
    }
}
