//! Request payloads and their validation rules.

use crate::error::AppError;
use serde::Deserialize;
use std::collections::BTreeMap;
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

pub const MUST_NOT_BE_EMPTY: &str = "Must not be empty";

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(custom(function = "valid_email"))]
    pub email: String,
    #[validate(custom(function = "not_blank"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords must match"))]
    pub confirm_password: String,
    #[validate(custom(function = "not_blank"))]
    pub handle: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(custom(function = "not_blank"))]
    pub email: String,
    #[validate(custom(function = "not_blank"))]
    pub password: String,
}

/// Body of a new post or comment.
#[derive(Debug, Clone, Deserialize)]
pub struct TextBody {
    #[serde(default)]
    pub body: String,
}

impl TextBody {
    /// Trimmed body, or a validation error keyed by `field` when blank.
    pub fn require(&self, field: &str) -> Result<String, AppError> {
        let body = self.body.trim();
        if body.is_empty() {
            return Err(AppError::field(field, MUST_NOT_BE_EMPTY));
        }
        Ok(body.to_string())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserDetailsRequest {
    pub bio: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
}

/// Profile fields to store: blanks dropped, websites given a scheme.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReducedUserDetails {
    pub bio: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
}

pub fn reduce_user_details(details: &UserDetailsRequest) -> ReducedUserDetails {
    let clean = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    ReducedUserDetails {
        bio: clean(&details.bio),
        website: clean(&details.website).map(|site| {
            if site.starts_with("http://") || site.starts_with("https://") {
                site
            } else {
                format!("http://{}", site)
            }
        }),
        location: clean(&details.location),
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message(MUST_NOT_BE_EMPTY.into()));
    }
    Ok(())
}

fn valid_email(value: &str) -> Result<(), ValidationError> {
    not_blank(value)?;
    if !value.trim().validate_email() {
        return Err(
            ValidationError::new("email").with_message("Must be a valid email address".into()),
        );
    }
    Ok(())
}

/// Run validator rules and convert failures into per-field messages.
pub fn validate_request<T: Validate>(request: &T) -> Result<(), AppError> {
    request.validate().map_err(|errors| AppError::Validation(field_errors(&errors)))
}

/// First message per field, keyed by the camelCase wire name.
pub fn field_errors(errors: &ValidationErrors) -> BTreeMap<String, String> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let message = errs
                .first()
                .and_then(|e| e.message.as_ref())
                .map(|m| m.to_string())
                .unwrap_or_else(|| "Invalid value".to_string());
            (camel_case(&field), message)
        })
        .collect()
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
