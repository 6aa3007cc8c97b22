use super::models::{ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, SignupRequest};
use crate::common::validation::{validate_email, validate_new_password, MAX_FIELD_LENGTH};
use crate::common::{ValidationResult, Validator};

/// Request body checks for the auth endpoints
pub struct AuthValidator;

impl Validator<SignupRequest> for AuthValidator {
    fn validate(&self, data: &SignupRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        let name = data.name.trim();
        if name.is_empty() {
            result.add_error("name", "Name is required");
        } else if name.chars().count() > MAX_FIELD_LENGTH {
            result.add_error("name", "Name must not exceed 255 characters");
        }

        result.merge(validate_email("email", &data.email));
        result.merge(validate_new_password("password", &data.password));

        result
    }
}

impl Validator<LoginRequest> for AuthValidator {
    fn validate(&self, data: &LoginRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        result.merge(validate_email("email", &data.email));

        if data.password.is_empty() {
            result.add_error("password", "Password is required");
        } else if data.password.len() > MAX_FIELD_LENGTH {
            result.add_error("password", "Password must not exceed 255 characters");
        }

        result
    }
}

impl Validator<ForgotPasswordRequest> for AuthValidator {
    fn validate(&self, data: &ForgotPasswordRequest) -> ValidationResult {
        validate_email("email", &data.email)
    }
}

impl Validator<ResetPasswordRequest> for AuthValidator {
    fn validate(&self, data: &ResetPasswordRequest) -> ValidationResult {
        validate_new_password("password", &data.password)
    }
}

/// Validates the `token` query parameter
pub fn validate_token(token: Option<&str>) -> ValidationResult {
    let mut result = ValidationResult::new();

    match token.map(str::trim) {
        None | Some("") => result.add_error("token", "Token is required"),
        Some(t) if t.len() > MAX_FIELD_LENGTH => {
            result.add_error("token", "Token must not exceed 255 characters")
        }
        Some(_) => {}
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_request() {
        let valid = SignupRequest {
            name: "Jane".into(),
            email: "jane@example.com".into(),
            password: "secret1".into(),
        };
        assert!(AuthValidator.validate(&valid).is_valid);

        let invalid = SignupRequest {
            name: "   ".into(),
            email: "jane".into(),
            password: "123".into(),
        };
        let result = AuthValidator.validate(&invalid);
        let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "email", "password"]);
    }

    #[test]
    fn test_login_request_accepts_any_nonempty_password() {
        let login = LoginRequest {
            email: "jane@example.com".into(),
            password: "x".into(),
        };
        assert!(AuthValidator.validate(&login).is_valid);

        let empty = LoginRequest {
            email: "jane@example.com".into(),
            password: String::new(),
        };
        assert!(!AuthValidator.validate(&empty).is_valid);
    }

    #[test]
    fn test_validate_token() {
        assert!(validate_token(Some("abc")).is_valid);
        assert!(!validate_token(Some("  ")).is_valid);
        assert!(!validate_token(None).is_valid);
        assert!(!validate_token(Some(&"t".repeat(256))).is_valid);
    }
}
