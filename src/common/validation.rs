// Common validation types and traits

use regex::Regex;
use std::sync::OnceLock;

pub const MAX_FIELD_LENGTH: usize = 255;
pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.is_valid = false;
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn merge(&mut self, other: ValidationResult) {
        if !other.is_valid {
            self.is_valid = false;
            self.errors.extend(other.errors);
        }
    }

    /// Turns the collected errors into a `Result` for `?` propagation
    pub fn into_result(self) -> Result<(), super::ApiError> {
        if self.is_valid {
            Ok(())
        } else {
            Err(self.into())
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

pub trait Validator<T> {
    fn validate(&self, data: &T) -> ValidationResult;
}

fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
    })
}

/// Validates an email address field
pub fn validate_email(field: &str, email: &str) -> ValidationResult {
    let mut result = ValidationResult::new();
    let email = email.trim();

    if email.is_empty() {
        result.add_error(field, "Email is required");
    } else if email.len() > MAX_FIELD_LENGTH {
        result.add_error(field, "Email must not exceed 255 characters");
    } else if !email_regex().is_match(email) {
        result.add_error(field, "Email must be a valid email address");
    }

    result
}

/// Validates a new password field
pub fn validate_new_password(field: &str, password: &str) -> ValidationResult {
    let mut result = ValidationResult::new();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        result.add_error(field, "Password must be at least 6 characters");
    }
    if password.len() > MAX_FIELD_LENGTH {
        result.add_error(field, "Password must not exceed 255 characters");
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("email", "user@example.com").is_valid);
        assert!(validate_email("email", "  user@example.com ").is_valid);
        assert!(!validate_email("email", "").is_valid);
        assert!(!validate_email("email", "user@").is_valid);
        assert!(!validate_email("email", "user example@test.com").is_valid);

        let long = format!("{}@example.com", "a".repeat(250));
        assert!(!validate_email("email", &long).is_valid);
    }

    #[test]
    fn test_validate_new_password() {
        assert!(validate_new_password("password", "secret1").is_valid);
        assert!(!validate_new_password("password", "short").is_valid);
        assert!(!validate_new_password("password", &"p".repeat(256)).is_valid);
    }

    #[test]
    fn test_merge_keeps_errors() {
        let mut result = ValidationResult::new();
        result.merge(validate_email("email", "nope"));
        result.merge(validate_new_password("password", "ok-password"));

        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].field, "email");
        assert!(result.into_result().is_err());
    }
}
