//! # Error Types
//!
//! Domain-specific error types for records-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  records-core errors (this file)                                       │
//! │  ├── CoreError        - Domain errors (bad score, forbidden actor)     │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  records-db errors (separate crate)                                    │
//! │  └── DbError          - Database failures, NotFound, wraps CoreError   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → request handler         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Errors vs Outcomes
//! Expected business rejections (duplicate registration, blocked drop,
//! missing prerequisite, submission on an approved result) are NOT errors.
//! They are outcome enums (`RegistrationOutcome`, `DropOutcome`,
//! `PrerequisiteCheck`, `SubmissionOutcome`) so callers must match on them.

use thiserror::Error;

use crate::identity::Role;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Score input could not be turned into a grade.
    ///
    /// ## When This Occurs
    /// - Text input is not a decimal number ("seventy", "7O", "")
    /// - Float input is NaN or infinite
    /// - Score is outside 0.00 - 100.00 when submitted for a result
    #[error("Invalid score '{input}': {reason}")]
    InvalidScore { input: String, reason: String },

    /// The acting identity may not perform the operation.
    ///
    /// ## When This Occurs
    /// - A student registering or dropping for another student
    /// - A lecturer submitting for a course assigned to someone else
    /// - An admin without `can_approve_results` approving results
    #[error("{role:?} is not allowed to {action}")]
    Forbidden { role: Role, action: String },

    /// The configured grade table cannot produce monotonic grades.
    #[error("Invalid grade scale: {0}")]
    InvalidGradeScale(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidScore error.
    pub fn invalid_score(input: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidScore {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Creates a Forbidden error for the given role and action.
    pub fn forbidden(role: Role, action: impl Into<String>) -> Self {
        CoreError::Forbidden {
            role,
            action: action.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when input doesn't meet requirements.
/// Used for early validation before the record rules run.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, malformed session).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// The same value appears twice where it must be unique.
    #[error("Duplicate {field}: '{value}'")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
