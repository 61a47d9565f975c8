//! # Registration Lifecycle
//!
//! Rules for creating and removing a student-course registration.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  register(key)                                                          │
//! │     ├── key unseen  → Created(registration)                            │
//! │     └── key exists  → AlreadyExists(registration)   (no-op, not error) │
//! │                                                                         │
//! │  drop(registration)                                                     │
//! │     ├── 1. result exists?        → Blocked(ResultAlreadySubmitted)     │
//! │     ├── 2. course type is core?  → Blocked(CoreCourseNotDroppable)     │
//! │     └── otherwise                → Dropped                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Uniqueness of the key is enforced by the storage layer's UNIQUE
//! constraint; `RegistrationKey` is the value that constraint is built on.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::prerequisite::PrerequisiteCheck;
use crate::types::{CourseRegistration, CourseType, Semester};
use crate::validation::{validate_id, validate_session};

// =============================================================================
// Registration Key
// =============================================================================

/// The (student, course, session, semester) tuple a registration is unique on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RegistrationKey {
    pub student_id: String,
    pub course_id: String,
    pub session: String,
    pub semester: Semester,
}

impl RegistrationKey {
    /// Builds a validated key. The session is trimmed.
    pub fn new(
        student_id: impl Into<String>,
        course_id: impl Into<String>,
        session: &str,
        semester: Semester,
    ) -> CoreResult<Self> {
        let student_id = student_id.into();
        let course_id = course_id.into();
        validate_id("student_id", &student_id)?;
        validate_id("course_id", &course_id)?;
        let session = validate_session(session)?;

        Ok(RegistrationKey {
            student_id,
            course_id,
            session,
            semester,
        })
    }

    /// Checks if a stored registration has this key.
    pub fn matches(&self, registration: &CourseRegistration) -> bool {
        registration.student_id == self.student_id
            && registration.course_id == self.course_id
            && registration.session == self.session
            && registration.semester == self.semester
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// Result of a register call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "outcome", content = "registration", rename_all = "snake_case")]
pub enum RegistrationOutcome {
    /// A new registration was stored.
    Created(CourseRegistration),
    /// The key was already registered; the existing row is returned.
    AlreadyExists(CourseRegistration),
    /// Prerequisites are not met; nothing was stored.
    Blocked(PrerequisiteCheck),
}

impl RegistrationOutcome {
    /// Returns the registration, if one exists after the call.
    pub fn registration(&self) -> Option<&CourseRegistration> {
        match self {
            RegistrationOutcome::Created(registration)
            | RegistrationOutcome::AlreadyExists(registration) => Some(registration),
            RegistrationOutcome::Blocked(_) => None,
        }
    }
}

/// Why a drop was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DropBlockReason {
    /// A result (pending or approved) is attached to the registration.
    ResultAlreadySubmitted,
    /// Core courses are compulsory.
    CoreCourseNotDroppable,
}

impl DropBlockReason {
    /// User-facing explanation.
    pub const fn message(&self) -> &'static str {
        match self {
            DropBlockReason::ResultAlreadySubmitted => {
                "You cannot drop this course because a result has already been submitted."
            }
            DropBlockReason::CoreCourseNotDroppable => "Core courses cannot be dropped.",
        }
    }
}

/// Result of a drop call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum DropOutcome {
    Dropped,
    Blocked(DropBlockReason),
}

/// Checks whether a registration may be dropped.
///
/// Reasons are checked in order; the first failing one is reported.
pub fn check_drop(has_result: bool, course_type: CourseType) -> Result<(), DropBlockReason> {
    if has_result {
        return Err(DropBlockReason::ResultAlreadySubmitted);
    }
    if course_type == CourseType::Core {
        return Err(DropBlockReason::CoreCourseNotDroppable);
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
