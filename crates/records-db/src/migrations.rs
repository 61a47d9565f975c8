//! # Records Schema Migrations
//!
//! The records schema is embedded at compile time and applied when a
//! [`crate::Database`] opens with `run_migrations` set.
//!
//! ## Tables
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Records Schema                                  │
//! │                                                                         │
//! │  faculties ──▶ departments ──┬──▶ students ─────┐                      │
//! │                              ├──▶ lecturers     │                      │
//! │                              ├──▶ courses ──────┼──▶ course_registrations
//! │                              └──▶ department_reports          │        │
//! │                                                                ▼        │
//! │  users ──▶ students / lecturers / admins                    results    │
//! │                                                                         │
//! │  course_prerequisites: (course_id, prerequisite_id) pairs on courses    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Constraints the repositories lean on
//! - `course_registrations` is UNIQUE on (student, course, session,
//!   semester). A lost insert race surfaces as a unique violation and is
//!   reported as `AlreadyExists`.
//! - `results.registration_id` is UNIQUE: one result per registration.
//! - Deleting a faculty, department, student or course CASCADEs to the rows
//!   below it. Deleting a lecturer only clears `courses.assigned_lecturer_id`
//!   and `results.submitted_by` (SET NULL), so approved results outlive staff.
//! - CHECKs pin roles, levels, semesters, grade letters, result status,
//!   `pass_mark` to 0..=100 and `score_hundredths` to 0..=10000.
//!
//! ## Adding Migrations
//! New files go in `migrations/sqlite/` as `NNN_description.sql`. Applied
//! files are checksummed in `_sqlx_migrations`; never edit one in place.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// `migrations/sqlite/`, embedded. `001_initial_schema.sql` holds the
/// catalogue, people, registrations, results and stored reports.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies any records migrations not yet recorded. Safe to repeat.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!(embedded = MIGRATOR.migrations.len(), "Applying records schema");

    MIGRATOR.run(pool).await?;

    info!("Records schema is current");
    Ok(())
}

/// `(embedded, applied)` migration counts. `applied` is 0 on a database
/// that has never been migrated.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    // Query applied migrations; the table is absent before the first run
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    const RECORD_TABLES: [&str; 11] = [
        "admins",
        "course_prerequisites",
        "course_registrations",
        "courses",
        "department_reports",
        "departments",
        "faculties",
        "lecturers",
        "results",
        "students",
        "users",
    ];

    #[tokio::test]
    async fn test_schema_creates_record_tables() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let (total, applied) = migration_status(db.pool()).await.unwrap();
        assert!(total > 0);
        assert_eq!(total, applied);

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' \
             AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();
        assert_eq!(tables, RECORD_TABLES);

        // Re-running is a no-op.
        run_migrations(db.pool()).await.unwrap();
        assert_eq!(migration_status(db.pool()).await.unwrap(), (total, applied));
    }

    #[tokio::test]
    async fn test_registration_key_is_unique() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let index_columns: Vec<String> = sqlx::query_scalar(
            "SELECT ii.name FROM pragma_index_list('course_registrations') il \
             JOIN pragma_index_info(il.name) ii \
             WHERE il.\"unique\" = 1 AND il.origin = 'u' ORDER BY ii.seqno",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();
        assert_eq!(index_columns, ["student_id", "course_id", "session", "semester"]);
    }
}
