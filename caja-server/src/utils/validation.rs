//! Input validation helpers
//!
//! Text length limits and checks shared by the admin and intake handlers.

use validator::Validate;

use crate::utils::{AppError, ErrorCode};

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: category, menu item
pub const MAX_NAME_LEN: usize = 200;

/// Notes and descriptions (line note "sin cebolla", item description)
pub const MAX_NOTE_LEN: usize = 500;

/// Icon labels
pub const MAX_SHORT_TEXT_LEN: usize = 100;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value {
        validate_max_len(v, field, max_len)?;
    }
    Ok(())
}

/// Validate that a string is within the length limit.
pub fn validate_max_len(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    let len = value.chars().count();
    if len > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({len} chars, max {max_len})"
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Run `validator` derive rules on a request body
///
/// The first failing field's message becomes the error message.
pub fn validate_body<T: Validate>(body: &T) -> Result<(), AppError> {
    let Err(errors) = body.validate() else {
        return Ok(());
    };

    let first = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| errs.iter().map(move |e| (field.to_string(), e)))
        .min_by(|a, b| a.0.cmp(&b.0));

    let err = match first {
        Some((field, e)) => {
            let message = e
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("{field} is invalid"));
            AppError::with_message(ErrorCode::ValidationFailed, message).with_detail("field", field)
        }
        None => AppError::validation(errors.to_string()),
    };
    Err(err)
}

/// Trimmed value, or `None` when blank
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_limits() {
        assert!(validate_max_len("Tacos", "name", MAX_NAME_LEN).is_ok());
        let long = "x".repeat(MAX_NOTE_LEN + 1);
        let err = validate_max_len(&long, "note", MAX_NOTE_LEN).unwrap_err();
        assert_eq!(err.code, shared::ErrorCode::ValidationFailed);
        assert!(validate_optional_text(&None, "icon", MAX_SHORT_TEXT_LEN).is_ok());
        assert!(validate_optional_text(&Some(long), "icon", MAX_SHORT_TEXT_LEN).is_err());
    }

    #[derive(Validate)]
    struct Login {
        #[validate(length(min = 1, message = "Email requerido"))]
        email: String,
    }

    #[test]
    fn test_validate_body() {
        assert!(validate_body(&Login { email: "a@b.c".into() }).is_ok());
        let err = validate_body(&Login { email: String::new() }).unwrap_err();
        assert_eq!(err.message, "Email requerido");
        assert_eq!(err.details.as_ref().unwrap()["field"], "email");
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  Bebidas ")), Some("Bebidas"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}
