//! # Registration Repository
//!
//! The registration lifecycle against storage, plus the history queries the
//! prerequisite validator and the transcript are built from.
//!
//! ## Register
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  register(identity, student, course, session, semester)                │
//! │     │                                                                   │
//! │     ├── 1. identity may act for student?      no → Err(Forbidden)      │
//! │     ├── 2. key valid (ids, YYYY/YYYY)?        no → Err(Validation)     │
//! │     ├── 3. course exists?                     no → Err(NotFound)       │
//! │     ├── 4. key already stored?                yes → Ok(AlreadyExists)  │
//! │     ├── 5. can_register(prereqs, history)     blocked → Ok(Blocked)    │
//! │     └── 6. INSERT                                                       │
//! │            ├── ok                     → Ok(Created)                     │
//! │            └── UNIQUE violation (race) → re-read → Ok(AlreadyExists)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Prerequisites gate new rows only: an existing key is reported as
//! `AlreadyExists` even if the course gained a prerequisite since.
//!
//! ## Drop
//! The DELETE is guarded by `NOT EXISTS (result)`, so a result submitted
//! between the check and the delete still blocks the drop.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::catalog::CatalogRepository;
use records_core::prerequisite::can_register;
use records_core::registration::check_drop;
use records_core::{
    aggregate, CourseRegistration, CourseResult, CourseSummary, CourseType, DropBlockReason,
    DropOutcome, GradeLetter, Identity, RegistrationKey, RegistrationOutcome, RegistrationRecord,
    ResultStatus, Semester, Transcript,
};

/// Column list for `CourseRegistration` rows.
const REGISTRATION_COLUMNS: &str = "id, student_id, course_id, session, semester, registered_at";

/// Repository for course registrations.
#[derive(Debug, Clone)]
pub struct RegistrationRepository {
    pool: SqlitePool,
}

impl RegistrationRepository {
    /// Creates a new RegistrationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RegistrationRepository { pool }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Registers a student for a course in a session/semester.
    ///
    /// Registering the same key twice is not an error: the second call
    /// returns `AlreadyExists` with the stored row.
    pub async fn register(
        &self,
        identity: &Identity,
        student_id: &str,
        course_id: &str,
        session: &str,
        semester: Semester,
    ) -> DbResult<RegistrationOutcome> {
        identity.authorize_enrollment(student_id)?;
        let key = RegistrationKey::new(student_id, course_id, session, semester)?;

        let catalog = CatalogRepository::new(self.pool.clone());
        if catalog.get_course(&key.course_id).await?.is_none() {
            return Err(DbError::not_found("Course", &key.course_id));
        }

        if let Some(existing) = self.find(&key).await? {
            debug!(id = %existing.id, "Registration already exists");
            return Ok(RegistrationOutcome::AlreadyExists(existing));
        }

        let prerequisites = catalog.prerequisites(&key.course_id).await?;
        if !prerequisites.is_empty() {
            let history = self.history(&key.student_id).await?;
            let check = can_register(&prerequisites, &history);
            if !check.is_eligible() {
                warn!(
                    student_id = %key.student_id,
                    course_id = %key.course_id,
                    "Registration blocked by prerequisites"
                );
                return Ok(RegistrationOutcome::Blocked(check));
            }
        }

        let registration = CourseRegistration {
            id: Uuid::new_v4().to_string(),
            student_id: key.student_id.clone(),
            course_id: key.course_id.clone(),
            session: key.session.clone(),
            semester: key.semester,
            registered_at: Utc::now(),
        };

        debug!(
            id = %registration.id,
            student_id = %registration.student_id,
            course_id = %registration.course_id,
            session = %registration.session,
            "Creating registration"
        );

        let inserted = sqlx::query(
            r#"
            INSERT INTO course_registrations (
                id, student_id, course_id, session, semester, registered_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&registration.id)
        .bind(&registration.student_id)
        .bind(&registration.course_id)
        .bind(&registration.session)
        .bind(registration.semester)
        .bind(registration.registered_at)
        .execute(&self.pool)
        .await;

        match inserted.map_err(DbError::from) {
            Ok(_) => Ok(RegistrationOutcome::Created(registration)),
            // Another request stored the same key after our pre-check.
            Err(err) if err.is_unique_violation() => match self.find(&key).await? {
                Some(existing) => Ok(RegistrationOutcome::AlreadyExists(existing)),
                None => Err(err),
            },
            Err(err) => Err(err),
        }
    }

    /// Drops a registration.
    ///
    /// ## Returns
    /// - `Dropped` when the row was deleted
    /// - `Blocked(ResultAlreadySubmitted)` when a result exists
    /// - `Blocked(CoreCourseNotDroppable)` for core courses
    pub async fn drop(&self, identity: &Identity, registration_id: &str) -> DbResult<DropOutcome> {
        let registration = self
            .get(registration_id)
            .await?
            .ok_or_else(|| DbError::not_found("Registration", registration_id))?;
        identity.authorize_enrollment(&registration.student_id)?;

        let (course_type, has_result): (CourseType, bool) = sqlx::query_as(
            r#"
            SELECT
                c.course_type,
                EXISTS (SELECT 1 FROM results WHERE registration_id = r.id)
            FROM course_registrations r
            JOIN courses c ON c.id = r.course_id
            WHERE r.id = ?1
            "#,
        )
        .bind(registration_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Registration", registration_id))?;

        if let Err(reason) = check_drop(has_result, course_type) {
            warn!(registration_id = %registration_id, ?reason, "Drop blocked");
            return Ok(DropOutcome::Blocked(reason));
        }

        let deleted = sqlx::query(
            r#"
            DELETE FROM course_registrations
            WHERE id = ?1
              AND NOT EXISTS (SELECT 1 FROM results WHERE registration_id = ?1)
            "#,
        )
        .bind(registration_id)
        .execute(&self.pool)
        .await?;

        if deleted.rows_affected() == 0 {
            warn!(registration_id = %registration_id, "Drop lost race with result submission");
            return Ok(DropOutcome::Blocked(DropBlockReason::ResultAlreadySubmitted));
        }

        debug!(registration_id = %registration_id, "Registration dropped");
        Ok(DropOutcome::Dropped)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Gets a registration by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<CourseRegistration>> {
        let sql = format!("SELECT {REGISTRATION_COLUMNS} FROM course_registrations WHERE id = ?1");
        let registration = sqlx::query_as::<_, CourseRegistration>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(registration)
    }

    /// Finds the registration stored under a key.
    pub async fn find(&self, key: &RegistrationKey) -> DbResult<Option<CourseRegistration>> {
        let sql = format!(
            r#"
            SELECT {REGISTRATION_COLUMNS} FROM course_registrations
            WHERE student_id = ?1 AND course_id = ?2 AND session = ?3 AND semester = ?4
            "#
        );
        let registration = sqlx::query_as::<_, CourseRegistration>(&sql)
            .bind(&key.student_id)
            .bind(&key.course_id)
            .bind(&key.session)
            .bind(key.semester)
            .fetch_optional(&self.pool)
            .await?;

        Ok(registration)
    }

    /// A student's full history: every registration with its course and
    /// result, ordered by session, then semester, then course code.
    pub async fn history(&self, student_id: &str) -> DbResult<Vec<RegistrationRecord>> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT
                r.id, r.student_id, r.course_id, r.session, r.semester, r.registered_at,
                c.code AS course_code, c.title AS course_title, c.credit_unit,
                c.course_type, c.pass_mark,
                res.id AS result_id, res.score_hundredths, res.grade, res.status,
                res.submitted_by, res.approved_by, res.submitted_at, res.approved_at,
                u.full_name AS lecturer_name
            FROM course_registrations r
            JOIN courses c ON c.id = r.course_id
            LEFT JOIN results res ON res.registration_id = r.id
            LEFT JOIN lecturers l ON l.id = res.submitted_by
            LEFT JOIN users u ON u.id = l.user_id
            WHERE r.student_id = ?1
            ORDER BY r.session, r.semester, c.code
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(student_id = %student_id, count = rows.len(), "Loaded history");
        Ok(rows.into_iter().map(RegistrationRecord::from).collect())
    }

    /// Registered courses for one session/semester.
    pub async fn registered_courses(
        &self,
        student_id: &str,
        session: &str,
        semester: Semester,
    ) -> DbResult<Vec<RegistrationRecord>> {
        let session = session.trim();
        let mut records = self.history(student_id).await?;
        records.retain(|record| {
            record.registration.session == session && record.registration.semester == semester
        });
        Ok(records)
    }

    /// Builds the student's transcript (term GPAs and CGPA).
    pub async fn transcript(&self, identity: &Identity, student_id: &str) -> DbResult<Transcript> {
        // Students see their own transcript; any admin sees all.
        if !matches!(identity, Identity::Admin { .. }) {
            identity.authorize_enrollment(student_id)?;
        }

        let history = self.history(student_id).await?;
        Ok(aggregate(&history))
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

/// Flat row of the history join.
#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
    id: String,
    student_id: String,
    course_id: String,
    session: String,
    semester: Semester,
    registered_at: DateTime<Utc>,
    course_code: String,
    course_title: String,
    credit_unit: i64,
    course_type: CourseType,
    pass_mark: i64,
    result_id: Option<String>,
    score_hundredths: Option<i64>,
    grade: Option<GradeLetter>,
    status: Option<ResultStatus>,
    submitted_by: Option<String>,
    approved_by: Option<String>,
    submitted_at: Option<DateTime<Utc>>,
    approved_at: Option<DateTime<Utc>>,
    lecturer_name: Option<String>,
}

impl From<HistoryRow> for RegistrationRecord {
    fn from(row: HistoryRow) -> Self {
        let result = match (row.result_id, row.score_hundredths, row.grade, row.submitted_at) {
            (Some(id), Some(score_hundredths), Some(grade), Some(submitted_at)) => {
                Some(CourseResult {
                    id,
                    registration_id: row.id.clone(),
                    score_hundredths,
                    grade,
                    status: row.status.unwrap_or_default(),
                    submitted_by: row.submitted_by,
                    approved_by: row.approved_by,
                    submitted_at,
                    approved_at: row.approved_at,
                })
            }
            _ => None,
        };

        RegistrationRecord {
            course: CourseSummary {
                id: row.course_id.clone(),
                code: row.course_code,
                title: row.course_title,
                credit_unit: row.credit_unit,
                course_type: row.course_type,
                pass_mark: row.pass_mark,
            },
            lecturer_name: result.as_ref().and(row.lecturer_name),
            result,
            registration: CourseRegistration {
                id: row.id,
                student_id: row.student_id,
                course_id: row.course_id,
                session: row.session,
                semester: row.semester,
                registered_at: row.registered_at,
            },
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{Campus, FIRST, NEXT_SESSION, SESSION};
    use records_core::{CoreError, PrerequisiteCheck, Score};

    async fn register(campus: &Campus, course_id: &str, session: &str) -> RegistrationOutcome {
        campus
            .db
            .registrations()
            .register(&campus.student, campus.student_id(), course_id, session, FIRST)
            .await
            .unwrap()
    }

    async fn submit_and_approve(campus: &Campus, registration_id: &str, score: &str) {
        campus
            .db
            .results()
            .submit_input(&campus.lecturer, registration_id, score)
            .await
            .unwrap();
        let result_id = campus
            .db
            .results()
            .get_by_registration(registration_id)
            .await
            .unwrap()
            .unwrap()
            .id;
        campus.db.results().approve(&campus.admin, &result_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_register_creates_then_reports_existing() {
        let campus = Campus::new().await;

        let first = register(&campus, &campus.csc101.id, SESSION).await;
        let created = match first {
            RegistrationOutcome::Created(registration) => registration,
            other => panic!("expected Created, got {other:?}"),
        };

        let second = register(&campus, &campus.csc101.id, SESSION).await;
        match second {
            RegistrationOutcome::AlreadyExists(existing) => assert_eq!(existing.id, created.id),
            other => panic!("expected AlreadyExists, got {other:?}"),
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM course_registrations")
            .fetch_one(campus.db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_existing_registration_survives_new_prerequisite() {
        let campus = Campus::new().await;

        let first = register(&campus, &campus.gst101.id, SESSION).await;
        let created = first.registration().unwrap().clone();

        campus
            .db
            .catalog()
            .set_prerequisites(&campus.admin, &campus.gst101.id, &[campus.csc101.id.clone()])
            .await
            .unwrap();

        match register(&campus, &campus.gst101.id, SESSION).await {
            RegistrationOutcome::AlreadyExists(existing) => assert_eq!(existing, created),
            other => panic!("expected AlreadyExists, got {other:?}"),
        }

        // A new key for the same course is gated.
        let outcome = register(&campus, &campus.gst101.id, NEXT_SESSION).await;
        assert!(matches!(outcome, RegistrationOutcome::Blocked(_)));
    }

    #[tokio::test]
    async fn test_same_course_other_session_is_a_new_registration() {
        let campus = Campus::new().await;
        register(&campus, &campus.csc101.id, SESSION).await;
        let outcome = register(&campus, &campus.csc101.id, NEXT_SESSION).await;
        assert!(matches!(outcome, RegistrationOutcome::Created(_)));
    }

    #[tokio::test]
    async fn test_unique_constraint_backs_the_key() {
        let campus = Campus::new().await;
        let created = register(&campus, &campus.csc101.id, SESSION).await;
        let created = created.registration().unwrap().clone();

        // A write that skips the pre-check still hits the UNIQUE key.
        let err = sqlx::query(
            r#"
            INSERT INTO course_registrations (id, student_id, course_id, session, semester, registered_at)
            VALUES ('dup', ?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&created.student_id)
        .bind(&created.course_id)
        .bind(&created.session)
        .bind(created.semester)
        .bind(Utc::now())
        .execute(campus.db.pool())
        .await
        .map_err(DbError::from)
        .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_register_validates_and_authorizes() {
        let campus = Campus::new().await;
        let registrations = campus.db.registrations();

        let err = registrations
            .register(&campus.student, campus.student_id(), &campus.csc101.id, "2024", FIRST)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        let err = registrations
            .register(&campus.lecturer, campus.student_id(), &campus.csc101.id, SESSION, FIRST)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Forbidden { .. })));

        // Admins with can_manage_users register on a student's behalf.
        let outcome = registrations
            .register(&campus.admin, campus.student_id(), &campus.gst101.id, SESSION, FIRST)
            .await
            .unwrap();
        assert!(matches!(outcome, RegistrationOutcome::Created(_)));
    }

    #[tokio::test]
    async fn test_prerequisite_below_and_at_pass_mark() {
        let campus = Campus::new().await;

        // No history at all.
        let outcome = register(&campus, &campus.csc201.id, NEXT_SESSION).await;
        match outcome {
            RegistrationOutcome::Blocked(PrerequisiteCheck::Blocked {
                missing,
                required_pass_mark,
            }) => {
                assert_eq!(missing.code, "CSC101");
                assert_eq!(required_pass_mark, 45);
            }
            other => panic!("expected Blocked, got {other:?}"),
        }

        // CSC101 approved at 44 (< 45): still blocked.
        let first = register(&campus, &campus.csc101.id, SESSION).await;
        let first_id = first.registration().unwrap().id.clone();
        submit_and_approve(&campus, &first_id, "44").await;
        let outcome = register(&campus, &campus.csc201.id, NEXT_SESSION).await;
        assert!(matches!(outcome, RegistrationOutcome::Blocked(_)));

        // Retake in the next session approved at exactly 45: allowed.
        let retake = register(&campus, &campus.csc101.id, NEXT_SESSION).await;
        let retake_id = retake.registration().unwrap().id.clone();
        submit_and_approve(&campus, &retake_id, "45").await;
        let outcome = register(&campus, &campus.csc201.id, NEXT_SESSION).await;
        assert!(matches!(outcome, RegistrationOutcome::Created(_)));
    }

    #[tokio::test]
    async fn test_pending_prerequisite_result_blocks() {
        let campus = Campus::new().await;
        let first = register(&campus, &campus.csc101.id, SESSION).await;
        campus
            .db
            .results()
            .submit_input(&campus.lecturer, &first.registration().unwrap().id, "90")
            .await
            .unwrap();

        let outcome = register(&campus, &campus.csc201.id, NEXT_SESSION).await;
        assert!(matches!(outcome, RegistrationOutcome::Blocked(_)));
    }

    #[tokio::test]
    async fn test_drop_rules() {
        let campus = Campus::new().await;
        let registrations = campus.db.registrations();

        // Elective without a result: dropped.
        let gst = register(&campus, &campus.gst101.id, SESSION).await;
        let gst_id = gst.registration().unwrap().id.clone();
        let outcome = registrations.drop(&campus.student, &gst_id).await.unwrap();
        assert_eq!(outcome, DropOutcome::Dropped);
        assert!(registrations.get(&gst_id).await.unwrap().is_none());

        // Core without a result: blocked, registration intact.
        let csc = register(&campus, &campus.csc101.id, SESSION).await;
        let csc_id = csc.registration().unwrap().id.clone();
        let outcome = registrations.drop(&campus.student, &csc_id).await.unwrap();
        assert_eq!(outcome, DropOutcome::Blocked(DropBlockReason::CoreCourseNotDroppable));
        assert!(registrations.get(&csc_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_drop_blocked_by_submitted_result() {
        let campus = Campus::new().await;
        let registrations = campus.db.registrations();

        let gst = register(&campus, &campus.gst101.id, SESSION).await;
        let gst_id = gst.registration().unwrap().id.clone();
        campus
            .db
            .results()
            .submit_input(&campus.other_lecturer, &gst_id, "61.5")
            .await
            .unwrap();

        let outcome = registrations.drop(&campus.student, &gst_id).await.unwrap();
        assert_eq!(outcome, DropOutcome::Blocked(DropBlockReason::ResultAlreadySubmitted));
        assert!(registrations.get(&gst_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_drop_unknown_and_foreign_registration() {
        let campus = Campus::new().await;
        let registrations = campus.db.registrations();

        let err = registrations.drop(&campus.student, "missing").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let gst = register(&campus, &campus.gst101.id, SESSION).await;
        let err = registrations
            .drop(&campus.lecturer, &gst.registration().unwrap().id)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_history_and_transcript() {
        let campus = Campus::new().await;
        let registrations = campus.db.registrations();

        let csc = register(&campus, &campus.csc101.id, SESSION).await;
        let gst = register(&campus, &campus.gst101.id, SESSION).await;
        submit_and_approve(&campus, &csc.registration().unwrap().id, "72").await;

        let history = registrations.history(campus.student_id()).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].course.code, "CSC101");
        let result = history[0].result.as_ref().unwrap();
        assert_eq!(result.score(), Score::from_whole(72));
        assert_eq!(result.grade, GradeLetter::A);
        assert_eq!(history[0].lecturer_name.as_deref(), Some("Dr. Turing"));
        assert_eq!(history[1].registration.id, gst.registration().unwrap().id);
        assert!(history[1].result.is_none());

        let transcript = registrations
            .transcript(&campus.student, campus.student_id())
            .await
            .unwrap();
        let term = transcript.term(SESSION, FIRST).unwrap();
        assert_eq!(term.entries.len(), 2);
        assert_eq!(term.total_points, 15);
        assert_eq!(term.total_credits, 3);
        assert_eq!(transcript.cgpa.to_string(), "5.00");

        let again = registrations
            .transcript(&campus.admin, campus.student_id())
            .await
            .unwrap();
        assert_eq!(again, transcript);

        let err = registrations
            .transcript(&campus.lecturer, campus.student_id())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_registered_courses_filters_term() {
        let campus = Campus::new().await;
        register(&campus, &campus.csc101.id, SESSION).await;
        register(&campus, &campus.gst101.id, NEXT_SESSION).await;

        let courses = campus
            .db
            .registrations()
            .registered_courses(campus.student_id(), SESSION, FIRST)
            .await
            .unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].course.code, "CSC101");
    }
}
