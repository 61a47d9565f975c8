//! # Result Repository
//!
//! Score submission and result approval against storage.
//!
//! ## Submit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  submit(identity, registration, score)         ── one transaction ──   │
//! │     │                                                                   │
//! │     ├── score within 0.00..=100.00?        no → Err(InvalidScore)      │
//! │     ├── registration exists?               no → Err(NotFound)          │
//! │     ├── lecturer (assigned one, if set)?   no → Err(Forbidden)         │
//! │     └── plan_submission(existing result)                                │
//! │           ├── Create    → INSERT pending               → Created       │
//! │           │                 UNIQUE lost to a concurrent create:        │
//! │           │                 re-read, then Overwrite / Ignore           │
//! │           ├── Overwrite → UPDATE ... AND status='pending' → Updated    │
//! │           └── Ignore    → nothing                      → Unchanged     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Bulk Approval
//! `approve_all` runs inside one transaction with a guarded statement:
//! `UPDATE results SET status = 'approved' ... WHERE status = 'pending'`.
//! An explicit id list is bound in chunks of `APPROVAL_CHUNK_SIZE` ids, all
//! in the same transaction. The returned count is the sum of
//! `rows_affected`, so rows another approver got to first are neither
//! approved twice nor counted.

use chrono::Utc;
use records_core::approval::plan_submission;
use records_core::validation::validate_score;
use records_core::{
    CourseResult, Grade, GradeScale, Identity, ResultListing, ResultStatus, Score,
    SubmissionOutcome, SubmissionPlan,
};
use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// Column list for `CourseResult` rows.
const RESULT_COLUMNS: &str = r#"
    id, registration_id, score_hundredths, grade, status,
    submitted_by, approved_by, submitted_at, approved_at
"#;

/// Guarded bulk approval; `?1` approver, `?2` timestamp.
const APPROVE_PENDING: &str = r#"
    UPDATE results SET
        status = 'approved',
        approved_by = ?1,
        approved_at = ?2
    WHERE status = 'pending'
"#;

/// Ids bound per statement for `ApprovalScope::Results`, below SQLite's
/// host parameter limit.
const APPROVAL_CHUNK_SIZE: usize = 500;

/// Which pending results a bulk approval covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "ids", rename_all = "snake_case")]
pub enum ApprovalScope {
    /// Every pending result.
    All,
    /// Pending results of one course.
    Course(String),
    /// Pending results among these ids.
    Results(Vec<String>),
}

impl ApprovalScope {
    /// Short name for logs.
    pub fn label(&self) -> &'static str {
        match self {
            ApprovalScope::All => "all",
            ApprovalScope::Course(_) => "course",
            ApprovalScope::Results(_) => "results",
        }
    }
}

/// Repository for results.
#[derive(Debug, Clone)]
pub struct ResultRepository {
    pool: SqlitePool,
    grade_scale: Arc<GradeScale>,
}

impl ResultRepository {
    /// Creates a new ResultRepository grading with `grade_scale`.
    pub fn new(pool: SqlitePool, grade_scale: Arc<GradeScale>) -> Self {
        ResultRepository { pool, grade_scale }
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Submits a score for a registration.
    ///
    /// ## Returns
    /// - `Created` for the first submission (Pending)
    /// - `Updated` when a Pending result was overwritten
    /// - `Unchanged` when the result is already Approved
    pub async fn submit(
        &self,
        identity: &Identity,
        registration_id: &str,
        score: Score,
    ) -> DbResult<SubmissionOutcome> {
        validate_score(score)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let assigned: Option<Option<String>> = sqlx::query_scalar(
            r#"
            SELECT c.assigned_lecturer_id
            FROM course_registrations r
            JOIN courses c ON c.id = r.course_id
            WHERE r.id = ?1
            "#,
        )
        .bind(registration_id)
        .fetch_optional(&mut *tx)
        .await?;
        let assigned = assigned.ok_or_else(|| DbError::not_found("Registration", registration_id))?;

        let lecturer_id = identity.authorize_submission(assigned.as_deref())?.to_string();

        let existing = fetch_for_registration(&mut tx, registration_id).await?;
        let grade = self.grade_scale.grade_for(score);

        let outcome =
            apply_submission(&mut tx, registration_id, existing, score, grade, lecturer_id).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(outcome)
    }

    /// Parses a score typed into a form and submits it.
    ///
    /// ## Errors
    /// `InvalidScore` for non-numeric input, as well as everything `submit`
    /// returns.
    pub async fn submit_input(
        &self,
        identity: &Identity,
        registration_id: &str,
        input: &str,
    ) -> DbResult<SubmissionOutcome> {
        let score = Score::parse(input)?;
        self.submit(identity, registration_id, score).await
    }

    // =========================================================================
    // Approval
    // =========================================================================

    /// Approves one result. Already approved results are returned untouched.
    pub async fn approve(&self, identity: &Identity, result_id: &str) -> DbResult<CourseResult> {
        identity.authorize_approval()?;

        let updated = sqlx::query(
            r#"
            UPDATE results SET
                status = 'approved',
                approved_by = ?2,
                approved_at = ?3
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(result_id)
        .bind(identity.user_id())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        debug!(result_id = %result_id, changed = updated.rows_affected(), "Approve result");

        self.get(result_id)
            .await?
            .ok_or_else(|| DbError::not_found("Result", result_id))
    }

    /// Approves every pending result in `scope` in one transaction.
    ///
    /// ## Returns
    /// The number of results that moved from Pending to Approved.
    pub async fn approve_all(&self, identity: &Identity, scope: &ApprovalScope) -> DbResult<u64> {
        identity.authorize_approval()?;

        if matches!(scope, ApprovalScope::Results(ids) if ids.is_empty()) {
            return Ok(0);
        }

        let approver = identity.user_id();
        let now = Utc::now();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let approved = match scope {
            ApprovalScope::All => {
                sqlx::query(APPROVE_PENDING)
                    .bind(approver)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected()
            }
            ApprovalScope::Course(course_id) => {
                let sql = format!(
                    "{APPROVE_PENDING} AND registration_id IN (SELECT id FROM course_registrations WHERE course_id = ?3)"
                );
                sqlx::query(&sql)
                    .bind(approver)
                    .bind(now)
                    .bind(course_id)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected()
            }
            ApprovalScope::Results(ids) => {
                let mut approved = 0;
                for chunk in ids.chunks(APPROVAL_CHUNK_SIZE) {
                    let placeholders: Vec<String> =
                        (0..chunk.len()).map(|i| format!("?{}", i + 3)).collect();
                    let sql = format!("{APPROVE_PENDING} AND id IN ({})", placeholders.join(", "));

                    let mut query = sqlx::query(&sql).bind(approver).bind(now);
                    for id in chunk {
                        query = query.bind(id);
                    }
                    approved += query.execute(&mut *tx).await?.rows_affected();
                }
                approved
            }
        };

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(count = approved, scope = scope.label(), approver = %identity.user_id(), "Bulk approval");
        Ok(approved)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Gets a result by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<CourseResult>> {
        let sql = format!("SELECT {RESULT_COLUMNS} FROM results WHERE id = ?1");
        let result = sqlx::query_as::<_, CourseResult>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(result)
    }

    /// Gets the result attached to a registration.
    pub async fn get_by_registration(&self, registration_id: &str) -> DbResult<Option<CourseResult>> {
        let sql = format!("SELECT {RESULT_COLUMNS} FROM results WHERE registration_id = ?1");
        let result = sqlx::query_as::<_, CourseResult>(&sql)
            .bind(registration_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(result)
    }

    /// Lists results for administrators, newest submission first.
    pub async fn list(
        &self,
        identity: &Identity,
        status: Option<ResultStatus>,
    ) -> DbResult<Vec<ResultListing>> {
        identity.authorize_admin("view results")?;

        let results = sqlx::query_as::<_, ResultListing>(
            r#"
            SELECT
                res.id AS result_id,
                res.registration_id,
                s.matric_no,
                su.full_name AS student_name,
                c.id AS course_id,
                c.code AS course_code,
                r.session,
                r.semester,
                res.score_hundredths,
                res.grade,
                res.status,
                lu.full_name AS lecturer_name,
                res.submitted_at
            FROM results res
            JOIN course_registrations r ON r.id = res.registration_id
            JOIN students s ON s.id = r.student_id
            JOIN users su ON su.id = s.user_id
            JOIN courses c ON c.id = r.course_id
            LEFT JOIN lecturers l ON l.id = res.submitted_by
            LEFT JOIN users lu ON lu.id = l.user_id
            WHERE ?1 IS NULL OR res.status = ?1
            ORDER BY res.submitted_at DESC, res.id
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(results)
    }
}

// =============================================================================
// Submission Steps
// =============================================================================

async fn fetch_for_registration(
    tx: &mut Transaction<'_, Sqlite>,
    registration_id: &str,
) -> DbResult<Option<CourseResult>> {
    let sql = format!("SELECT {RESULT_COLUMNS} FROM results WHERE registration_id = ?1");
    let result = sqlx::query_as::<_, CourseResult>(&sql)
        .bind(registration_id)
        .fetch_optional(&mut **tx)
        .await?;

    Ok(result)
}

/// Applies a submission given the result read for the registration.
///
/// When `existing` is `None` but another submission created the row first,
/// the INSERT hits the UNIQUE key on `registration_id`; the stored row is
/// re-read and the submission is applied to it instead.
async fn apply_submission(
    tx: &mut Transaction<'_, Sqlite>,
    registration_id: &str,
    existing: Option<CourseResult>,
    score: Score,
    grade: Grade,
    lecturer_id: String,
) -> DbResult<SubmissionOutcome> {
    let now = Utc::now();

    let current = match existing {
        Some(current) => current,
        None => {
            let result = CourseResult::new_pending(
                Uuid::new_v4().to_string(),
                registration_id,
                score.hundredths(),
                grade,
                Some(lecturer_id.clone()),
                now,
            );

            debug!(
                registration_id = %registration_id,
                score = %score,
                grade = %result.grade,
                "Creating result"
            );

            match insert_result(tx, &result).await {
                Ok(()) => return Ok(SubmissionOutcome::Created(result)),
                Err(err) if err.is_unique_violation() => {
                    debug!(registration_id = %registration_id, "Result created concurrently");
                    fetch_for_registration(tx, registration_id).await?.ok_or(err)?
                }
                Err(err) => return Err(err),
            }
        }
    };

    match plan_submission(Some(&current)) {
        SubmissionPlan::Overwrite => {
            overwrite_pending(tx, current, score, grade, lecturer_id, now).await
        }
        SubmissionPlan::Create | SubmissionPlan::Ignore => {
            debug!(id = %current.id, "Result already approved; submission ignored");
            Ok(SubmissionOutcome::Unchanged(current))
        }
    }
}

async fn insert_result(tx: &mut Transaction<'_, Sqlite>, result: &CourseResult) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO results (
            id, registration_id, score_hundredths, grade, status,
            submitted_by, approved_by, submitted_at, approved_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&result.id)
    .bind(&result.registration_id)
    .bind(result.score_hundredths)
    .bind(result.grade)
    .bind(result.status)
    .bind(&result.submitted_by)
    .bind(&result.approved_by)
    .bind(result.submitted_at)
    .bind(result.approved_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn overwrite_pending(
    tx: &mut Transaction<'_, Sqlite>,
    mut result: CourseResult,
    score: Score,
    grade: Grade,
    lecturer_id: String,
    now: chrono::DateTime<Utc>,
) -> DbResult<SubmissionOutcome> {
    result.resubmit(score.hundredths(), grade, Some(lecturer_id), now);

    debug!(id = %result.id, score = %score, grade = %result.grade, "Overwriting pending result");

    let updated = sqlx::query(
        r#"
        UPDATE results SET
            score_hundredths = ?2,
            grade = ?3,
            submitted_by = ?4,
            submitted_at = ?5
        WHERE id = ?1 AND status = 'pending'
        "#,
    )
    .bind(&result.id)
    .bind(result.score_hundredths)
    .bind(result.grade)
    .bind(&result.submitted_by)
    .bind(result.submitted_at)
    .execute(&mut **tx)
    .await?;

    if updated.rows_affected() == 0 {
        // Approved after we read it; report the stored row.
        let sql = format!("SELECT {RESULT_COLUMNS} FROM results WHERE id = ?1");
        let current = sqlx::query_as::<_, CourseResult>(&sql)
            .bind(&result.id)
            .fetch_one(&mut **tx)
            .await?;
        return Ok(SubmissionOutcome::Unchanged(current));
    }

    Ok(SubmissionOutcome::Updated(result))
}

// =============================================================================
// Unit Tests
// =============================================================================
