//! # Prerequisite Validator
//!
//! Decides whether a student may register for a course given their history.
//!
//! ## Rule
//! ```text
//! for prereq in course.prerequisites (declared order):
//!     satisfied = history has a registration on prereq
//!                 whose result is Approved
//!                 and score >= prereq.pass_mark
//!     if not satisfied → Blocked { prereq, pass_mark }   (stop here)
//! Eligible
//! ```
//!
//! Only direct prerequisites are checked. There is no recursion, so cyclic
//! prerequisite declarations cannot loop. Only the FIRST failing prerequisite
//! is reported.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{PrerequisiteRef, RegistrationRecord};

/// Outcome of a prerequisite check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PrerequisiteCheck {
    Eligible,
    Blocked {
        /// The first unmet prerequisite, in declared order.
        missing: PrerequisiteRef,
        /// Whole marks required on it.
        required_pass_mark: i64,
    },
}

impl PrerequisiteCheck {
    /// Checks if registration is allowed.
    #[inline]
    pub fn is_eligible(&self) -> bool {
        matches!(self, PrerequisiteCheck::Eligible)
    }
}

/// Checks whether a single prerequisite is met by the history.
pub fn is_satisfied(prerequisite: &PrerequisiteRef, history: &[RegistrationRecord]) -> bool {
    let pass_mark = prerequisite.pass_mark_score();
    history.iter().any(|record| {
        record.registration.course_id == prerequisite.course_id
            && record
                .result
                .as_ref()
                .is_some_and(|result| result.is_approved() && result.score() >= pass_mark)
    })
}

/// Checks the direct prerequisites of a course against a student's history.
pub fn can_register(prerequisites: &[PrerequisiteRef], history: &[RegistrationRecord]) -> PrerequisiteCheck {
    prerequisites
        .iter()
        .find(|prerequisite| !is_satisfied(prerequisite, history))
        .map(|missing| PrerequisiteCheck::Blocked {
            missing: missing.clone(),
            required_pass_mark: missing.pass_mark,
        })
        .unwrap_or(PrerequisiteCheck::Eligible)
}

// =============================================================================
// Unit Tests
// =============================================================================
