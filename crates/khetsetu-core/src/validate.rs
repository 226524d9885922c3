//! Client-side form validation.
//!
//! Runs before any network call; a failing field never reaches the
//! session layer or the backend.

use std::sync::LazyLock;

use regex::Regex;

/// Basic `local@domain.tld` shape. Intentionally loose — the backend is the
/// authority on deliverability.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// A single failed field with a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Returns true if the email matches the basic pattern.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Checks the registration password policy:
/// at least 6 characters with one uppercase, one lowercase, and one digit.
pub fn password_errors(password: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if password.len() < 6 {
        errors.push(FieldError::new(
            "password",
            "Password must be at least 6 characters",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push(FieldError::new(
            "password",
            "Password must contain an uppercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push(FieldError::new(
            "password",
            "Password must contain a lowercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push(FieldError::new("password", "Password must contain a digit"));
    }

    errors
}

/// Validates a registration form. Returns every failing field at once so the
/// caller can surface them per-field.
pub fn validate_registration(
    email: &str,
    password: &str,
    confirm_password: Option<&str>,
) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if !is_valid_email(email) {
        errors.push(FieldError::new("email", "Enter a valid email address"));
    }

    errors.extend(password_errors(password));

    if let Some(confirm) = confirm_password {
        if confirm != password {
            errors.push(FieldError::new("confirmPassword", "Passwords do not match"));
        }
    }

    errors
}
