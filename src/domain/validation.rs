//! Request schemas and the rules they share.
//!
//! Each schema decodes a raw JSON payload into its typed request and runs the
//! declarative `validator` rules on it. The outcome mirrors the `{error, value}`
//! pair callers already expect: `value` is whatever could be decoded, `error`
//! lists every field violation. Turning a populated error into an HTTP 4xx is
//! the caller's job (see `api::extract::ValidatedJson`).

use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::error::ValidationError;
use super::types::{
    CompleteFundingRequest, CreateGroupRequest, CreateLivestockRequest, CreateUserRequest,
    ForgotPasswordRequest, InitializePaymentRequest, JoinGroupRequest, ResendOtpRequest,
    ResetPasswordRequest, UpdateUserRequest, VerifyPaymentRequest,
};

static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[1-9]\d{7,14}$").expect("phone pattern is a valid regex")
});

static OTP_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{6}$").expect("otp pattern is a valid regex"));

fn rule_violation(code: &'static str, message: &'static str) -> validator::ValidationError {
    let mut err = validator::ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Password must mix lowercase, uppercase, digit and a special character.
pub fn validate_password_strength(password: &str) -> Result<(), validator::ValidationError> {
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace());

    if has_lower && has_upper && has_digit && has_special {
        Ok(())
    } else {
        Err(rule_violation(
            "password_pattern",
            "Password must contain a lowercase letter, an uppercase letter, a digit and a special character",
        ))
    }
}

pub fn validate_phone_number(phone: &str) -> Result<(), validator::ValidationError> {
    if PHONE_PATTERN.is_match(phone) {
        Ok(())
    } else {
        Err(rule_violation(
            "phone_format",
            "Phone number must be in international format, e.g. +2348012345678",
        ))
    }
}

pub fn validate_otp(otp: &str) -> Result<(), validator::ValidationError> {
    if OTP_PATTERN.is_match(otp) {
        Ok(())
    } else {
        Err(rule_violation("otp_format", "OTP must be exactly 6 digits"))
    }
}

pub fn validate_not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        Err(rule_violation("blank", "Value must not be blank"))
    } else {
        Ok(())
    }
}

/// A single failed rule on a single field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldViolation {
    /// Field path (`body` when the payload itself could not be decoded)
    #[schema(example = "password")]
    pub field: String,
    /// Machine-readable rule identifier
    #[schema(example = "password_pattern")]
    pub code: String,
    /// Human-readable explanation
    pub message: String,
}

/// Every violation found in one payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValidationReport {
    pub details: Vec<FieldViolation>,
}

impl ValidationReport {
    #[must_use]
    pub fn single(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            details: vec![FieldViolation {
                field: field.into(),
                code: code.into(),
                message: message.into(),
            }],
        }
    }

    /// True when `field` failed the rule identified by `code`
    #[must_use]
    pub fn has_violation(&self, field: &str, code: &str) -> bool {
        self.details
            .iter()
            .any(|v| v.field == field && v.code == code)
    }

    /// True when `field` failed any rule
    #[must_use]
    pub fn mentions(&self, field: &str) -> bool {
        self.details.iter().any(|v| v.field == field)
    }

    fn from_decode_error(err: &serde_json::Error) -> Self {
        let message = err.to_string();
        // serde reports "missing field `email`"; surface the field when it can be read off
        let field = message
            .strip_prefix("missing field `")
            .and_then(|rest| rest.split('`').next())
            .unwrap_or("body")
            .to_string();
        let code = if field == "body" { "decode" } else { "required" };
        Self::single(field, code, message)
    }
}

impl From<validator::ValidationErrors> for ValidationReport {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<FieldViolation> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                let field = field.to_string();
                errs.iter().map(move |e| FieldViolation {
                    field: field.clone(),
                    code: e.code.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| default_message(&field, &e.code)),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.code.cmp(&b.code)));
        Self { details }
    }
}

fn default_message(field: &str, code: &str) -> String {
    match code {
        "email" => format!("{} must be a valid email address", field),
        "length" => format!("{} has an invalid length", field),
        "range" => format!("{} is out of range", field),
        "must_match" => format!("{} does not match", field),
        "url" => format!("{} must be a valid URL", field),
        _ => format!("{} failed the {} rule", field, code),
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .details
            .iter()
            .map(|v| format!("{}: {}", v.field, v.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Schema(errors.into())
    }
}

/// Result of running a schema against a payload
#[derive(Debug, Clone)]
pub struct ValidationOutcome<T> {
    pub error: Option<ValidationReport>,
    pub value: Option<T>,
}

impl<T> ValidationOutcome<T> {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<T, ValidationError> {
        match (self.error, self.value) {
            (None, Some(value)) => Ok(value),
            (Some(report), _) => Err(ValidationError::Schema(report)),
            (None, None) => Err(ValidationError::MissingField("body".to_string())),
        }
    }
}

/// Decode `payload` into `T` and apply its rules.
pub fn validate_payload<T>(payload: &serde_json::Value) -> ValidationOutcome<T>
where
    T: DeserializeOwned + Validate,
{
    let value: T = match T::deserialize(payload) {
        Ok(value) => value,
        Err(e) => {
            return ValidationOutcome {
                error: Some(ValidationReport::from_decode_error(&e)),
                value: None,
            };
        }
    };

    let error = value.validate().err().map(ValidationReport::from);
    ValidationOutcome {
        error,
        value: Some(value),
    }
}

pub fn create_user_validation(payload: &serde_json::Value) -> ValidationOutcome<CreateUserRequest> {
    validate_payload(payload)
}

pub fn update_user_validation(payload: &serde_json::Value) -> ValidationOutcome<UpdateUserRequest> {
    validate_payload(payload)
}

pub fn create_group_validation(
    payload: &serde_json::Value,
) -> ValidationOutcome<CreateGroupRequest> {
    validate_payload(payload)
}

pub fn create_livestock_validation(
    payload: &serde_json::Value,
) -> ValidationOutcome<CreateLivestockRequest> {
    validate_payload(payload)
}

pub fn forgot_password_validation(
    payload: &serde_json::Value,
) -> ValidationOutcome<ForgotPasswordRequest> {
    validate_payload(payload)
}

pub fn reset_password_validation(
    payload: &serde_json::Value,
) -> ValidationOutcome<ResetPasswordRequest> {
    validate_payload(payload)
}

pub fn join_group_validation(payload: &serde_json::Value) -> ValidationOutcome<JoinGroupRequest> {
    validate_payload(payload)
}

pub fn resend_otp_validation(payload: &serde_json::Value) -> ValidationOutcome<ResendOtpRequest> {
    validate_payload(payload)
}

pub fn initialize_payment_validation(
    payload: &serde_json::Value,
) -> ValidationOutcome<InitializePaymentRequest> {
    validate_payload(payload)
}

pub fn verify_payment_validation(
    payload: &serde_json::Value,
) -> ValidationOutcome<VerifyPaymentRequest> {
    validate_payload(payload)
}

pub fn complete_funding_validation(
    payload: &serde_json::Value,
) -> ValidationOutcome<CompleteFundingRequest> {
    validate_payload(payload)
}
