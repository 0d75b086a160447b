//! Client-side validation for audit submissions.
//!
//! Validation runs before any network traffic. Failures are field-level
//! and are returned to the caller; they never reach the external service.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use url::Url;

use crate::domain::models::AuditRequest;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Not an absolute http/https URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Not shaped like an email address
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
}

impl ValidationError {
    /// Form field the error should be attached to.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::InvalidUrl(_) => "url",
            ValidationError::InvalidEmail(_) => "email",
        }
    }
}

/// Parse and check an audit target address: absolute, `http` or `https`.
pub fn validate_audit_url(raw: &str) -> Result<Url, ValidationError> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).map_err(|_| ValidationError::InvalidUrl(raw.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(ValidationError::InvalidUrl(raw.to_string())),
    }
    if url.host_str().is_none() {
        return Err(ValidationError::InvalidUrl(raw.to_string()));
    }

    Ok(url)
}

/// Check that an address has the basic `local@domain.tld` shape.
pub fn validate_email(raw: &str) -> Result<(), ValidationError> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
    });

    if pattern.is_match(raw.trim()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(raw.to_string()))
    }
}

/// Validate a full audit request, returning the parsed target URL.
pub fn validate_request(request: &AuditRequest) -> Result<Url, ValidationError> {
    let url = validate_audit_url(&request.url)?;
    validate_email(&request.email)?;
    Ok(url)
}
