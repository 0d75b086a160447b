//! Error types for the audit client core.
//!
//! This module provides structured error handling with:
//! - `AppError`: Domain-specific errors for client operations
//! - `Result<T>`: Type alias for Results using AppError
//!
//! Failures of a live audit do not surface here; they terminate in the
//! orchestrator's `Error` phase so the rendering layer can observe them.

use thiserror::Error;

use crate::domain::models::MalformedReportError;
use crate::validate::ValidationError;

/// Domain-specific errors for client operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// A submitted field failed client-side validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The external service returned an unreadable report
    #[error(transparent)]
    MalformedReport(#[from] MalformedReportError),

    /// Generic error with context
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;
