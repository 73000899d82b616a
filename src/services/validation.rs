//! Field validation shared by the request handlers.
//!
//! Validators collect every failing field into [`FieldErrors`] instead of
//! stopping at the first problem, so a form can highlight all of them at once.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::AppError;
use crate::models::user::{RegisterRequest, Role};

/// The 19 departments of Uruguay, the only accepted service locations.
pub const DEPARTMENTS: [&str; 19] = [
    "Artigas",
    "Canelones",
    "Cerro Largo",
    "Colonia",
    "Durazno",
    "Flores",
    "Florida",
    "Lavalleja",
    "Maldonado",
    "Montevideo",
    "Paysandú",
    "Río Negro",
    "Rivera",
    "Rocha",
    "Salto",
    "San José",
    "Soriano",
    "Tacuarembó",
    "Treinta y Tres",
];

pub const MAX_EMAIL_LEN: usize = 254;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_NAME_LEN: usize = 50;

/// Field name -> message, ordered by field name for stable output.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Record an error for `field`. The first message per field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `Ok(())` when nothing failed, `AppError::Validation` otherwise.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }

    /// Require `value` to be non-blank and at most `max` characters.
    pub fn require_text(&mut self, field: &str, value: &str, max: usize) {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.add(field, "This field is required");
        } else if trimmed.chars().count() > max {
            self.add(field, format!("Must be at most {max} characters"));
        }
    }

    /// Like [`Self::require_text`] with a lower bound as well.
    pub fn require_text_between(&mut self, field: &str, value: &str, min: usize, max: usize) {
        let len = value.trim().chars().count();
        if len == 0 {
            self.add(field, "This field is required");
        } else if len < min || len > max {
            self.add(field, format!("Must be between {min} and {max} characters"));
        }
    }

    /// Optional text: only checked for length when present.
    pub fn optional_text(&mut self, field: &str, value: Option<&str>, max: usize) {
        if let Some(value) = value {
            if value.trim().chars().count() > max {
                self.add(field, format!("Must be at most {max} characters"));
            }
        }
    }
}

/// Trim and lowercase an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Loose structural check: `local@domain.tld`, no whitespace, one `@`.
pub fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((name, tld)) => !name.is_empty() && tld.len() >= 2 && !domain.starts_with('.'),
        None => false,
    }
}

/// At least [`MIN_PASSWORD_LEN`] characters with a letter and a digit.
pub fn password_problem(password: &str) -> Option<String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Some(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        ));
    }
    let has_letter = password.chars().any(char::is_alphabetic);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Some("Password must contain letters and numbers".to_string());
    }
    None
}

/// Normalize a Uruguayan phone number to its digits, with `+598` kept when given.
///
/// Spaces, dashes, dots and parentheses are ignored. The national part must be
/// 8 or 9 digits (landline or mobile, optional leading 0).
pub fn normalize_phone(phone: &str) -> Option<String> {
    let compact: String = phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();

    let (prefix, national) = match compact.strip_prefix("+598") {
        Some(rest) => ("+598", rest),
        None => ("", compact.as_str()),
    };

    let valid = (8..=9).contains(&national.len()) && national.chars().all(|c| c.is_ascii_digit());
    valid.then(|| format!("{prefix}{national}"))
}

pub fn is_valid_department(department: &str) -> bool {
    DEPARTMENTS.contains(&department)
}

/// Validate every registration wizard field at once.
///
/// Returns the normalized phone number on success.
pub fn validate_registration(req: &RegisterRequest) -> Result<Option<String>, AppError> {
    let mut errors = FieldErrors::default();

    // Step 1: account
    let email = normalize_email(&req.email);
    if email.is_empty() {
        errors.add("email", "This field is required");
    } else if !is_valid_email(&email) {
        errors.add("email", "Invalid email address");
    }

    if let Some(problem) = password_problem(&req.password) {
        errors.add("password", problem);
    }
    if req.confirm_password != req.password {
        errors.add("confirm_password", "Passwords do not match");
    }

    // Step 2: personal data
    errors.require_text("first_name", &req.first_name, MAX_NAME_LEN);
    errors.require_text("last_name", &req.last_name, MAX_NAME_LEN);

    let phone = match req.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        Some(raw) => {
            let normalized = normalize_phone(raw);
            if normalized.is_none() {
                errors.add("phone", "Invalid phone number");
            }
            normalized
        }
        None => {
            if req.role == Role::Contractor {
                errors.add("phone", "Contractors must provide a phone number");
            }
            None
        }
    };

    // Step 3: role and terms
    if !req.role.is_self_assignable() {
        errors.add("role", "Role must be USER or CONTRACTOR");
    }
    if !req.accept_terms {
        errors.add("accept_terms", "You must accept the terms and conditions");
    }

    errors.into_result()?;
    Ok(phone)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> RegisterRequest {
        RegisterRequest {
            email: "  Productor@Campo.com.uy ".into(),
            password: "Cosecha2024".into(),
            confirm_password: "Cosecha2024".into(),
            first_name: "Ana".into(),
            last_name: "Pereira".into(),
            phone: Some("+598 99 123 456".into()),
            role: Role::Contractor,
            accept_terms: true,
        }
    }

    fn field_errors(req: &RegisterRequest) -> FieldErrors {
        match validate_registration(req) {
            Err(AppError::Validation(fields)) => fields,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_complete_registration() {
        let phone = validate_registration(&valid_request()).unwrap();
        assert_eq!(phone.as_deref(), Some("+59899123456"));
    }

    #[test]
    fn empty_form_reports_every_field() {
        let fields = field_errors(&RegisterRequest::default());
        for field in ["email", "password", "first_name", "last_name", "accept_terms"] {
            assert!(fields.contains(field), "missing error for {field}");
        }
        // confirm_password matches the (empty) password, so no error there
        assert!(!fields.contains("confirm_password"));
        assert!(!fields.contains("phone"));
    }

    #[test]
    fn contractor_needs_phone() {
        let req = RegisterRequest {
            phone: None,
            ..valid_request()
        };
        let fields = field_errors(&req);
        assert_eq!(fields.len(), 1);
        assert_eq!(
            fields.get("phone"),
            Some("Contractors must provide a phone number")
        );
    }

    #[test]
    fn plain_user_may_skip_phone() {
        let req = RegisterRequest {
            phone: Some("   ".into()),
            role: Role::User,
            ..valid_request()
        };
        assert_eq!(validate_registration(&req).unwrap(), None);
    }

    #[test]
    fn admin_roles_are_not_self_assignable() {
        let req = RegisterRequest {
            role: Role::Superadmin,
            ..valid_request()
        };
        assert!(field_errors(&req).contains("role"));
    }

    #[test]
    fn mismatched_confirmation_and_weak_password() {
        let req = RegisterRequest {
            password: "abcdefgh".into(),
            confirm_password: "abcdefgx".into(),
            ..valid_request()
        };
        let fields = field_errors(&req);
        assert_eq!(
            fields.get("password"),
            Some("Password must contain letters and numbers")
        );
        assert!(fields.contains("confirm_password"));
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@b.uy"));
        assert!(is_valid_email("juan.perez@campo.com.uy"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("two@@signs.com"));
        assert!(!is_valid_email("@campo.uy"));
        assert!(!is_valid_email("a@localhost"));
        assert!(!is_valid_email("a b@campo.uy"));
        assert!(!is_valid_email("a@.uy"));
    }

    #[test]
    fn phone_normalization() {
        assert_eq!(normalize_phone("099 123 456").as_deref(), Some("099123456"));
        assert_eq!(normalize_phone("(2) 900-1234").as_deref(), Some("29001234"));
        assert_eq!(normalize_phone("+598 2900 1234").as_deref(), Some("+59829001234"));
        assert_eq!(normalize_phone("12345"), None);
        assert_eq!(normalize_phone("09912345a"), None);
        assert_eq!(normalize_phone("+54 11 1234 5678"), None);
    }

    #[test]
    fn departments_are_exact_names() {
        assert!(is_valid_department("Paysandú"));
        assert!(is_valid_department("Treinta y Tres"));
        assert!(!is_valid_department("Buenos Aires"));
        assert_eq!(DEPARTMENTS.len(), 19);
    }

    #[test]
    fn text_length_rules() {
        let mut errors = FieldErrors::default();
        errors.require_text_between("title", "ab", 3, 10);
        errors.optional_text("city", Some("x".repeat(11).as_str()), 10);
        errors.optional_text("note", None, 10);
        assert_eq!(errors.len(), 2);
        assert!(errors.into_result().is_err());
    }
}
