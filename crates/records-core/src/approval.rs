//! # Result Approval Workflow
//!
//! State transitions of a result: submission, correction, approval.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   (no result) ──submit──► Pending ──approve──► Approved                │
//! │                             │  ▲                  │                     │
//! │                    submit   └──┘                  │ submit / approve    │
//! │                 (overwrite score, grade,          ▼                     │
//! │                  submitter)                   no-op (immutable)         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The storage layer applies the same plan inside a transaction and guards
//! every write with `status = 'pending'`, so a result approved by someone
//! else in the meantime is never overwritten or approved twice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::grading::Grade;
use crate::types::{CourseResult, ResultStatus};

// =============================================================================
// Submission
// =============================================================================

/// What a submission will do, decided from the current result (if any).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPlan {
    /// No result yet: create one as Pending.
    Create,
    /// Pending result: overwrite score, grade and submitter.
    Overwrite,
    /// Approved result: leave it untouched.
    Ignore,
}

/// Decides how to apply a submission.
pub fn plan_submission(existing: Option<&CourseResult>) -> SubmissionPlan {
    match existing.map(|result| result.status) {
        None => SubmissionPlan::Create,
        Some(ResultStatus::Pending) => SubmissionPlan::Overwrite,
        Some(ResultStatus::Approved) => SubmissionPlan::Ignore,
    }
}

/// What a submission did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "outcome", content = "result", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Created(CourseResult),
    Updated(CourseResult),
    /// The result was already approved; returned unchanged.
    Unchanged(CourseResult),
}

impl SubmissionOutcome {
    /// The result as it stands after the submission.
    pub fn result(&self) -> &CourseResult {
        match self {
            SubmissionOutcome::Created(result)
            | SubmissionOutcome::Updated(result)
            | SubmissionOutcome::Unchanged(result) => result,
        }
    }

    /// Consumes the outcome, returning the result.
    pub fn into_result(self) -> CourseResult {
        match self {
            SubmissionOutcome::Created(result)
            | SubmissionOutcome::Updated(result)
            | SubmissionOutcome::Unchanged(result) => result,
        }
    }
}

impl CourseResult {
    /// Creates a new Pending result for a registration.
    pub fn new_pending(
        id: impl Into<String>,
        registration_id: impl Into<String>,
        score_hundredths: i64,
        grade: Grade,
        lecturer_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        CourseResult {
            id: id.into(),
            registration_id: registration_id.into(),
            score_hundredths,
            grade: grade.letter,
            status: ResultStatus::Pending,
            submitted_by: lecturer_id,
            approved_by: None,
            submitted_at: now,
            approved_at: None,
        }
    }

    /// Applies a corrected submission. Returns `false` (and changes nothing)
    /// when the result is already approved.
    pub fn resubmit(
        &mut self,
        score_hundredths: i64,
        grade: Grade,
        lecturer_id: Option<String>,
        now: DateTime<Utc>,
    ) -> bool {
        if self.is_approved() {
            return false;
        }
        self.score_hundredths = score_hundredths;
        self.grade = grade.letter;
        self.submitted_by = lecturer_id;
        self.submitted_at = now;
        true
    }

    /// Approves a pending result. Returns `false` when already approved.
    pub fn approve(&mut self, approver_user_id: &str, now: DateTime<Utc>) -> bool {
        if self.is_approved() {
            return false;
        }
        self.status = ResultStatus::Approved;
        self.approved_by = Some(approver_user_id.to_string());
        self.approved_at = Some(now);
        true
    }
}

/// Approves every pending result in the slice, returning how many changed.
///
/// Already approved results are skipped and not counted.
pub fn approve_all(results: &mut [CourseResult], approver_user_id: &str, now: DateTime<Utc>) -> usize {
    results
        .iter_mut()
        .map(|result| result.approve(approver_user_id, now))
        .filter(|changed| *changed)
        .count()
}

// =============================================================================
// Unit Tests
// =============================================================================
