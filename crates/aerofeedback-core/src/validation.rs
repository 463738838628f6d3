//! Client-side validation for registration, login and form drafts
//!
//! These checks are advisory; the backend remains the authority. They exist
//! so obviously bad input is reported per field without a round-trip.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::payload::FormDraft;
use crate::types::{Credentials, Role};
use crate::{Error, Result};

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$"));
static UPPERCASE_RE: LazyLock<Regex> = LazyLock::new(|| pattern(r"[A-Z]"));
static LOWERCASE_RE: LazyLock<Regex> = LazyLock::new(|| pattern(r"[a-z]"));
static DIGIT_RE: LazyLock<Regex> = LazyLock::new(|| pattern(r"[0-9]"));
static SPECIAL_RE: LazyLock<Regex> = LazyLock::new(|| pattern(r"[^A-Za-z0-9\s]"));

#[allow(clippy::expect_used)]
fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("built-in validation pattern compiles")
}

/// Registration form
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name is required (max 100 characters)"))]
    pub name: String,

    /// Login email
    #[validate(custom(function = "validate_email_address"))]
    pub email: String,

    /// Password
    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,

    /// Password repeated
    #[serde(skip_serializing, default)]
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,

    /// Requested role
    pub role: Role,

    /// Department, required for department accounts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<i64>,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("department_id", &self.department_id)
            .finish_non_exhaustive()
    }
}

impl RegisterRequest {
    /// Run every registration check, collecting messages per field.
    pub fn check(&self) -> Result<()> {
        let mut fields = match self.validate() {
            Ok(()) => BTreeMap::new(),
            Err(errors) => field_messages(&errors),
        };

        if self.role == Role::Department && self.department_id.is_none() {
            fields
                .entry("department_id".to_string())
                .or_default()
                .push("Select a department".to_string());
        }

        into_result(fields)
    }
}

/// Check login input before sending it
pub fn check_credentials(credentials: &Credentials) -> Result<()> {
    let mut fields: BTreeMap<String, Vec<String>> = BTreeMap::new();

    if let Err(error) = validate_email_address(&credentials.email) {
        fields
            .entry("email".to_string())
            .or_default()
            .push(message_of(&error));
    }
    if credentials.password.is_empty() {
        fields
            .entry("password".to_string())
            .or_default()
            .push("Password is required".to_string());
    }

    into_result(fields)
}

/// Check a form draft before it is created or updated
pub fn check_form_draft(draft: &FormDraft) -> Result<()> {
    let mut fields: BTreeMap<String, Vec<String>> = BTreeMap::new();

    if draft.title.trim().is_empty() {
        fields
            .entry("title".to_string())
            .or_default()
            .push("Title is required".to_string());
    }
    if draft.questions.is_empty() {
        fields
            .entry("questions".to_string())
            .or_default()
            .push("Add at least one question".to_string());
    }
    for (index, question) in draft.questions.iter().enumerate() {
        if question.text.trim().is_empty() {
            fields
                .entry(format!("questions[{index}].text"))
                .or_default()
                .push("Question text is required".to_string());
        }
    }

    into_result(fields)
}

fn validate_email_address(email: &str) -> std::result::Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::new("required").with_message(Cow::Borrowed("Email is required")));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(ValidationError::new("email")
            .with_message(Cow::Borrowed("Enter a valid email address")));
    }
    Ok(())
}

fn validate_password_strength(password: &str) -> std::result::Result<(), ValidationError> {
    let mut missing = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        missing.push(format!("at least {MIN_PASSWORD_LENGTH} characters"));
    }
    if !UPPERCASE_RE.is_match(password) {
        missing.push("an uppercase letter".to_string());
    }
    if !LOWERCASE_RE.is_match(password) {
        missing.push("a lowercase letter".to_string());
    }
    if !DIGIT_RE.is_match(password) {
        missing.push("a digit".to_string());
    }
    if !SPECIAL_RE.is_match(password) {
        missing.push("a special character".to_string());
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new("password_strength").with_message(Cow::Owned(format!(
            "Password must contain {}",
            missing.join(", ")
        ))))
    }
}

fn message_of(error: &ValidationError) -> String {
    error
        .message
        .as_ref()
        .map_or_else(|| error.code.to_string(), ToString::to_string)
}

fn field_messages(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            (
                field.to_string(),
                errors.iter().map(message_of).collect::<Vec<_>>(),
            )
        })
        .collect()
}

fn into_result(fields: BTreeMap<String, Vec<String>>) -> Result<()> {
    if fields.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation { fields })
    }
}
