//! # records-core: Pure Academic Record Logic
//!
//! This crate holds the academic rules of the records engine as pure
//! functions with zero I/O dependencies: grading, GPA aggregation,
//! prerequisite checks, the registration lifecycle and result approval.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Records Engine Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Host application (web UI, admin, API)              │   │
//! │  │   Register ──► Submit score ──► Approve ──► Transcript          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ Identity + arguments                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                records-db (Workflows + SQLite)                  │   │
//! │  │   registrations(), results(), catalog(), people(), reports()    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ records-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌────────────┐ ┌──────────────┐ ┌───────────┐   │   │
//! │  │   │ grading  │ │aggregation │ │ prerequisite │ │ approval  │   │   │
//! │  │   │GradeScale│ │ Gpa, CGPA  │ │ can_register │ │ approve   │   │   │
//! │  │   └──────────┘ └────────────┘ └──────────────┘ └───────────┘   │   │
//! │  │   ┌──────────┐ ┌────────────┐ ┌──────────────┐ ┌───────────┐   │   │
//! │  │   │  score   │ │  identity  │ │ registration │ │validation │   │   │
//! │  │   └──────────┘ └────────────┘ └──────────────┘ └───────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Course, Student, CourseResult, etc.)
//! - [`score`] - Fixed-point score in hundredths of a mark
//! - [`grading`] - Grade letters, points and the configurable band table
//! - [`aggregation`] - Term GPA and cumulative CGPA
//! - [`prerequisite`] - Direct prerequisite validation
//! - [`registration`] - Registration key and drop rules
//! - [`approval`] - Result submission and approval transitions
//! - [`identity`] - Caller identity and authorization rules
//! - [`error`] - Domain error types
//! - [`validation`] - Field validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output
//! 2. **No I/O**: storage lives in records-db
//! 3. **Integer Scores**: scores and GPAs are hundredths (i64), never floats
//! 4. **Outcomes, not errors**: a blocked registration is a value, not an `Err`
//!
//! ## Example Usage
//!
//! ```rust
//! use records_core::grading::{grade_for, GradeLetter};
//! use records_core::aggregation::Gpa;
//! use records_core::Score;
//!
//! let grade = grade_for(Score::from_whole(72));
//! assert_eq!(grade.letter, GradeLetter::A);
//! assert_eq!(grade.points, 5);
//!
//! // (5*3 + 4*3 + 3*3) / 9 = 4.00
//! assert_eq!(Gpa::from_totals(36, 9).to_string(), "4.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregation;
pub mod approval;
pub mod error;
pub mod grading;
pub mod identity;
pub mod prerequisite;
pub mod registration;
pub mod score;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use records_core::Score` instead of
// `use records_core::score::Score`

pub use aggregation::{aggregate, Gpa, TermSummary, Transcript, TranscriptEntry};
pub use approval::{SubmissionOutcome, SubmissionPlan};
pub use error::{CoreError, CoreResult, ValidationError};
pub use grading::{Grade, GradeBand, GradeLetter, GradeScale};
pub use identity::{Identity, Role};
pub use prerequisite::PrerequisiteCheck;
pub use registration::{DropBlockReason, DropOutcome, RegistrationKey, RegistrationOutcome};
pub use score::Score;
pub use types::*;
