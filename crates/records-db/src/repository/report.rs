//! # Report Repository
//!
//! Admin dashboard counts and stored department snapshots.
//!
//! ```text
//! dashboard_stats()              live counts, nothing stored
//! generate_department_report()   counts for one department → department_reports
//! list_department_reports()      stored snapshots, newest first
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use records_core::{DashboardStats, DepartmentReport, Identity};

/// Repository for reports.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Headline counts for the admin dashboard.
    pub async fn dashboard_stats(&self, identity: &Identity) -> DbResult<DashboardStats> {
        identity.authorize_admin("view the dashboard")?;

        let stats = sqlx::query_as::<_, DashboardStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM lecturers) AS total_lecturers,
                (SELECT COUNT(*) FROM students) AS total_students,
                (SELECT COUNT(*) FROM courses) AS total_courses,
                (SELECT COUNT(*) FROM courses WHERE assigned_lecturer_id IS NOT NULL) AS assigned_courses,
                (SELECT COUNT(*) FROM courses WHERE assigned_lecturer_id IS NULL) AS unassigned_courses,
                (SELECT COUNT(*) FROM results WHERE status = 'pending') AS pending_results
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        debug!(?stats, "Dashboard stats");
        Ok(stats)
    }

    /// Computes and stores a snapshot of a department's headcounts.
    pub async fn generate_department_report(
        &self,
        identity: &Identity,
        department_id: &str,
    ) -> DbResult<DepartmentReport> {
        identity.authorize_admin("generate department reports")?;

        let counts: Option<(i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM students WHERE department_id = d.id),
                (SELECT COUNT(*) FROM courses WHERE department_id = d.id),
                (SELECT COUNT(*) FROM lecturers WHERE department_id = d.id)
            FROM departments d
            WHERE d.id = ?1
            "#,
        )
        .bind(department_id)
        .fetch_optional(&self.pool)
        .await?;

        let (total_students, total_courses, total_lecturers) =
            counts.ok_or_else(|| DbError::not_found("Department", department_id))?;

        let report = DepartmentReport {
            id: Uuid::new_v4().to_string(),
            department_id: department_id.to_string(),
            total_students,
            total_courses,
            total_lecturers,
            generated_on: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO department_reports (
                id, department_id, total_students, total_courses, total_lecturers, generated_on
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&report.id)
        .bind(&report.department_id)
        .bind(report.total_students)
        .bind(report.total_courses)
        .bind(report.total_lecturers)
        .bind(report.generated_on)
        .execute(&self.pool)
        .await?;

        info!(
            department_id = %department_id,
            students = total_students,
            courses = total_courses,
            lecturers = total_lecturers,
            "Department report generated"
        );

        Ok(report)
    }

    /// Stored reports, newest first, optionally for one department.
    pub async fn list_department_reports(
        &self,
        identity: &Identity,
        department_id: Option<&str>,
    ) -> DbResult<Vec<DepartmentReport>> {
        identity.authorize_admin("view department reports")?;

        let reports = sqlx::query_as::<_, DepartmentReport>(
            r#"
            SELECT id, department_id, total_students, total_courses, total_lecturers, generated_on
            FROM department_reports
            WHERE ?1 IS NULL OR department_id = ?1
            ORDER BY generated_on DESC, id
            "#,
        )
        .bind(department_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reports)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{Campus, FIRST, SESSION};
    use records_core::{CoreError, Score};

    #[tokio::test]
    async fn test_dashboard_stats() {
        let campus = Campus::new().await;
        let reports = campus.db.reports();

        let stats = reports.dashboard_stats(&campus.admin).await.unwrap();
        assert_eq!(stats.total_lecturers, 2);
        assert_eq!(stats.total_students, 1);
        assert_eq!(stats.total_courses, 3);
        assert_eq!(stats.assigned_courses, 2);
        assert_eq!(stats.unassigned_courses, 1);
        assert_eq!(stats.pending_results, 0);

        let registration = campus
            .db
            .registrations()
            .register(&campus.student, campus.student_id(), &campus.csc101.id, SESSION, FIRST)
            .await
            .unwrap();
        campus
            .db
            .results()
            .submit(
                &campus.lecturer,
                &registration.registration().unwrap().id,
                Score::from_whole(58),
            )
            .await
            .unwrap();
        let stats = reports.dashboard_stats(&campus.admin).await.unwrap();
        assert_eq!(stats.pending_results, 1);

        let err = reports.dashboard_stats(&campus.lecturer).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_department_reports() {
        let campus = Campus::new().await;
        let reports = campus.db.reports();

        let report = reports
            .generate_department_report(&campus.admin, &campus.department.id)
            .await
            .unwrap();
        assert_eq!(report.total_students, 1);
        assert_eq!(report.total_courses, 3);
        assert_eq!(report.total_lecturers, 2);

        let stored = reports
            .list_department_reports(&campus.admin, Some(&campus.department.id))
            .await
            .unwrap();
        assert_eq!(stored, vec![report]);
        assert_eq!(
            reports.list_department_reports(&campus.admin, Some("other")).await.unwrap().len(),
            0
        );

        let err = reports
            .generate_department_report(&campus.admin, "missing")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
