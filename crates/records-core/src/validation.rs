//! # Validation Module
//!
//! Input validation utilities for the records engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Web form (host framework)                                    │
//! │  ├── Basic format checks, widgets                                      │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: records-db workflows (Rust)                                  │
//! │  └── THIS MODULE: field rules (codes, sessions, scores)                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE (student, course, session, semester)                       │
//! │  └── Foreign keys with CASCADE / SET NULL                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use records_core::validation::{validate_course_code, validate_session};
//!
//! assert!(validate_course_code("CSC201").is_ok());
//! assert_eq!(validate_session("2024/2025").unwrap(), "2024/2025");
//! assert!(validate_session("2024/2026").is_err());
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::score::Score;
use crate::types::{Level, Semester};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Lowest acceptable result score.
pub const MIN_SCORE: Score = Score::from_whole(0);

/// Highest acceptable result score.
pub const MAX_SCORE: Score = Score::from_whole(100);

// =============================================================================
// String Validators
// =============================================================================

/// Validates a short business code (course code, matric number, staff id).
///
/// ## Rules
/// - Must not be empty
/// - At most `max` characters
/// - Letters, digits, hyphens, slashes and underscores only
fn validate_code(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '/')
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, numbers, hyphens, slashes, and underscores"
                .to_string(),
        });
    }

    Ok(())
}

/// Validates a course code (unique, at most 10 characters).
///
/// ## Example
/// ```rust
/// use records_core::validation::validate_course_code;
///
/// assert!(validate_course_code("CSC201").is_ok());
/// assert!(validate_course_code("").is_err());
/// assert!(validate_course_code("COMPUTERSCI201").is_err());
/// ```
pub fn validate_course_code(code: &str) -> ValidationResult<()> {
    validate_code("code", code, 10)
}

/// Validates a matriculation number (at most 20 characters).
pub fn validate_matric_no(matric_no: &str) -> ValidationResult<()> {
    validate_code("matric_no", matric_no, 20)
}

/// Validates a staff id (at most 20 characters).
pub fn validate_staff_id(staff_id: &str) -> ValidationResult<()> {
    validate_code("staff_id", staff_id, 20)
}

/// Validates a display name or title.
///
/// ## Rules
/// - Must not be empty
/// - At most `max` characters
pub fn validate_name(field: &str, name: &str, max: usize) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.len() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates an academic session and returns it trimmed.
///
/// ## Rules
/// - Format `YYYY/YYYY`
/// - The second year follows the first
pub fn validate_session(session: &str) -> ValidationResult<String> {
    let session = session.trim();

    if session.is_empty() {
        return Err(ValidationError::Required {
            field: "session".to_string(),
        });
    }

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "session".to_string(),
        reason: reason.to_string(),
    };

    let (start, end) = session
        .split_once('/')
        .ok_or_else(|| invalid("expected YYYY/YYYY"))?;

    let is_year = |part: &str| part.len() == 4 && part.bytes().all(|b| b.is_ascii_digit());
    if !is_year(start) || !is_year(end) {
        return Err(invalid("expected YYYY/YYYY"));
    }

    let start: u32 = start.parse().map_err(|_| invalid("expected YYYY/YYYY"))?;
    let end: u32 = end.parse().map_err(|_| invalid("expected YYYY/YYYY"))?;
    if end != start + 1 {
        return Err(invalid("years must be consecutive"));
    }

    Ok(session.to_string())
}

/// Parses a semester name ("First" / "Second").
pub fn parse_semester(name: &str) -> ValidationResult<Semester> {
    Semester::from_name(name).ok_or_else(|| ValidationError::NotAllowed {
        field: "semester".to_string(),
        allowed: vec!["First".to_string(), "Second".to_string()],
    })
}

/// Parses a level code ("100" .. "400").
pub fn parse_level(code: &str) -> ValidationResult<Level> {
    Level::from_code(code).ok_or_else(|| ValidationError::NotAllowed {
        field: "level".to_string(),
        allowed: ["100", "200", "300", "400"].iter().map(|c| c.to_string()).collect(),
    })
}

/// Checks that no id appears twice in a list (e.g. a prerequisite list).
pub fn validate_distinct_ids(field: &str, ids: &[String]) -> ValidationResult<()> {
    for (position, id) in ids.iter().enumerate() {
        if ids[..position].contains(id) {
            return Err(ValidationError::Duplicate {
                field: field.to_string(),
                value: id.clone(),
            });
        }
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a course credit unit.
///
/// ## Rules
/// - Must be positive (> 0)
/// - At most 12
pub fn validate_credit_unit(credit_unit: i64) -> ValidationResult<()> {
    if credit_unit <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "credit_unit".to_string(),
        });
    }

    if credit_unit > 12 {
        return Err(ValidationError::OutOfRange {
            field: "credit_unit".to_string(),
            min: 1,
            max: 12,
        });
    }

    Ok(())
}

/// Validates a pass mark in whole marks (0 - 100).
pub fn validate_pass_mark(pass_mark: i64) -> ValidationResult<()> {
    if !(0..=100).contains(&pass_mark) {
        return Err(ValidationError::OutOfRange {
            field: "pass_mark".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

/// Validates an admission year.
pub fn validate_admission_year(year: i64) -> ValidationResult<()> {
    if !(1900..=2200).contains(&year) {
        return Err(ValidationError::OutOfRange {
            field: "admission_year".to_string(),
            min: 1900,
            max: 2200,
        });
    }

    Ok(())
}

/// Validates a score submitted for a result (0.00 - 100.00).
///
/// Out-of-range scores are reported as `InvalidScore`, the same error a
/// non-numeric score produces.
pub fn validate_score(score: Score) -> CoreResult<()> {
    if !score.is_within(MIN_SCORE, MAX_SCORE) {
        return Err(CoreError::invalid_score(
            score.to_string(),
            format!("must be between {MIN_SCORE} and {MAX_SCORE}"),
        ));
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string.
///
/// ## Example
/// ```rust
/// use records_core::validation::validate_id;
///
/// assert!(validate_id("course_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_id("course_id", "not-a-uuid").is_err());
/// ```
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
