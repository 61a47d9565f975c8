//! # People Repository
//!
//! Accounts, role profiles and identity resolution.
//!
//! ## Accounts and Profiles
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  users (username, full_name, role, is_active)                          │
//! │     │                                                                   │
//! │     ├── role = student  ──► students  (matric_no, department, level)   │
//! │     ├── role = lecturer ──► lecturers (staff_id, department, rank)     │
//! │     └── role = admin    ──► admins    (kind, can_approve_results,      │
//! │                                        can_manage_users)                │
//! │                                                                         │
//! │  Deleting a user cascades to its profile. Results keep their rows:     │
//! │  submitted_by / approved_by become NULL.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every account and its profile are written in one transaction. The first
//! administrator comes from [`PeopleRepository::bootstrap_admin`]; every
//! later account is created by an admin identity.

use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use records_core::validation::{
    validate_admission_year, validate_matric_no, validate_name, validate_staff_id,
};
use records_core::{
    AdminKind, AdminProfile, CoreError, Identity, Lecturer, Level, Role, Student, User,
};

/// Account fields shared by every role.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub full_name: String,
}

impl NewAccount {
    pub fn new(username: impl Into<String>, full_name: impl Into<String>) -> Self {
        NewAccount {
            username: username.into(),
            full_name: full_name.into(),
        }
    }
}

/// Fields for a new student.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub account: NewAccount,
    pub matric_no: String,
    pub department_id: String,
    pub level: Level,
    pub admission_year: i64,
}

/// Fields for a new lecturer.
#[derive(Debug, Clone)]
pub struct NewLecturer {
    pub account: NewAccount,
    pub staff_id: String,
    pub department_id: String,
    pub rank: Option<String>,
}

/// Fields for a new administrator.
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub account: NewAccount,
    pub kind: AdminKind,
    pub can_approve_results: bool,
    pub can_manage_users: bool,
}

impl NewAdmin {
    /// A full administrator (may approve results and manage users).
    pub fn full(account: NewAccount) -> Self {
        NewAdmin {
            account,
            kind: AdminKind::Admin,
            can_approve_results: true,
            can_manage_users: true,
        }
    }
}

/// Repository for accounts and profiles.
#[derive(Debug, Clone)]
pub struct PeopleRepository {
    pool: SqlitePool,
}

impl PeopleRepository {
    /// Creates a new PeopleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PeopleRepository { pool }
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Creates the first administrator.
    ///
    /// ## Errors
    /// `Forbidden` once any admin exists.
    pub async fn bootstrap_admin(&self, account: NewAccount) -> DbResult<AdminProfile> {
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins")
            .fetch_one(&self.pool)
            .await?;
        if existing > 0 {
            return Err(CoreError::forbidden(Role::Admin, "bootstrap a second administrator").into());
        }

        info!(username = %account.username, "Bootstrapping first administrator");
        self.insert_admin(NewAdmin::full(account)).await
    }

    /// Creates an administrator account.
    pub async fn create_admin(&self, identity: &Identity, new: NewAdmin) -> DbResult<AdminProfile> {
        authorize_user_management(identity)?;
        self.insert_admin(new).await
    }

    /// Creates a student account and profile.
    pub async fn create_student(&self, identity: &Identity, new: NewStudent) -> DbResult<Student> {
        authorize_user_management(identity)?;
        validate_matric_no(&new.matric_no)?;
        validate_admission_year(new.admission_year)?;

        let student = Student {
            id: Uuid::new_v4().to_string(),
            user_id: Uuid::new_v4().to_string(),
            matric_no: new.matric_no.trim().to_string(),
            department_id: new.department_id,
            level: new.level,
            admission_year: new.admission_year,
        };

        debug!(id = %student.id, matric_no = %student.matric_no, "Creating student");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        insert_user(&mut tx, &student.user_id, &new.account, Role::Student).await?;

        sqlx::query(
            r#"
            INSERT INTO students (id, user_id, matric_no, department_id, level, admission_year)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&student.id)
        .bind(&student.user_id)
        .bind(&student.matric_no)
        .bind(&student.department_id)
        .bind(student.level)
        .bind(student.admission_year)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("matric_no", &student.matric_no),
            other => other,
        })?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(student)
    }

    /// Creates a lecturer account and profile.
    pub async fn create_lecturer(&self, identity: &Identity, new: NewLecturer) -> DbResult<Lecturer> {
        authorize_user_management(identity)?;
        validate_staff_id(&new.staff_id)?;

        let lecturer = Lecturer {
            id: Uuid::new_v4().to_string(),
            user_id: Uuid::new_v4().to_string(),
            staff_id: new.staff_id.trim().to_string(),
            department_id: new.department_id,
            rank: new.rank,
        };

        debug!(id = %lecturer.id, staff_id = %lecturer.staff_id, "Creating lecturer");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        insert_user(&mut tx, &lecturer.user_id, &new.account, Role::Lecturer).await?;

        sqlx::query(
            r#"
            INSERT INTO lecturers (id, user_id, staff_id, department_id, rank)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&lecturer.id)
        .bind(&lecturer.user_id)
        .bind(&lecturer.staff_id)
        .bind(&lecturer.department_id)
        .bind(&lecturer.rank)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("staff_id", &lecturer.staff_id),
            other => other,
        })?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(lecturer)
    }

    async fn insert_admin(&self, new: NewAdmin) -> DbResult<AdminProfile> {
        let admin = AdminProfile {
            id: Uuid::new_v4().to_string(),
            user_id: Uuid::new_v4().to_string(),
            kind: new.kind,
            can_approve_results: new.can_approve_results,
            can_manage_users: new.can_manage_users,
        };

        debug!(id = %admin.id, kind = ?admin.kind, "Creating administrator");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        insert_user(&mut tx, &admin.user_id, &new.account, Role::Admin).await?;

        sqlx::query(
            r#"
            INSERT INTO admins (id, user_id, kind, can_approve_results, can_manage_users)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&admin.id)
        .bind(&admin.user_id)
        .bind(admin.kind)
        .bind(admin.can_approve_results)
        .bind(admin.can_manage_users)
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(admin)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Gets a user by ID.
    pub async fn get_user(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, full_name, role, is_active FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a student profile by ID.
    pub async fn get_student(&self, id: &str) -> DbResult<Option<Student>> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            SELECT id, user_id, matric_no, department_id, level, admission_year
            FROM students WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(student)
    }

    /// Gets a lecturer profile by ID.
    pub async fn get_lecturer(&self, id: &str) -> DbResult<Option<Lecturer>> {
        let lecturer = sqlx::query_as::<_, Lecturer>(
            "SELECT id, user_id, staff_id, department_id, rank FROM lecturers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(lecturer)
    }

    /// Lists lecturers, by staff id.
    pub async fn list_lecturers(&self) -> DbResult<Vec<Lecturer>> {
        let lecturers = sqlx::query_as::<_, Lecturer>(
            "SELECT id, user_id, staff_id, department_id, rank FROM lecturers ORDER BY staff_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(lecturers)
    }

    /// Resolves the acting identity for a user account.
    ///
    /// ## Errors
    /// - `NotFound` when the user or its role profile is missing
    /// - `Forbidden` when the account is inactive
    pub async fn resolve_identity(&self, user_id: &str) -> DbResult<Identity> {
        let user = self
            .get_user(user_id)
            .await?
            .ok_or_else(|| DbError::not_found("User", user_id))?;

        if !user.is_active {
            return Err(CoreError::forbidden(user.role, "act with an inactive account").into());
        }

        let identity = match user.role {
            Role::Student => {
                let student_id: String =
                    sqlx::query_scalar("SELECT id FROM students WHERE user_id = ?1")
                        .bind(user_id)
                        .fetch_optional(&self.pool)
                        .await?
                        .ok_or_else(|| DbError::not_found("Student profile", user_id))?;
                Identity::Student {
                    user_id: user.id,
                    student_id,
                }
            }
            Role::Lecturer => {
                let lecturer_id: String =
                    sqlx::query_scalar("SELECT id FROM lecturers WHERE user_id = ?1")
                        .bind(user_id)
                        .fetch_optional(&self.pool)
                        .await?
                        .ok_or_else(|| DbError::not_found("Lecturer profile", user_id))?;
                Identity::Lecturer {
                    user_id: user.id,
                    lecturer_id,
                }
            }
            Role::Admin => {
                let admin = sqlx::query_as::<_, AdminProfile>(
                    r#"
                    SELECT id, user_id, kind, can_approve_results, can_manage_users
                    FROM admins WHERE user_id = ?1
                    "#,
                )
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| DbError::not_found("Admin profile", user_id))?;
                Identity::Admin {
                    user_id: user.id,
                    admin_id: admin.id,
                    can_approve_results: admin.can_approve_results,
                    can_manage_users: admin.can_manage_users,
                }
            }
        };

        debug!(user_id = %user_id, role = ?identity.role(), "Resolved identity");
        Ok(identity)
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Activates or deactivates an account.
    pub async fn set_active(&self, identity: &Identity, user_id: &str, active: bool) -> DbResult<()> {
        authorize_user_management(identity)?;

        let result = sqlx::query("UPDATE users SET is_active = ?2 WHERE id = ?1")
            .bind(user_id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", user_id));
        }

        Ok(())
    }

    /// Deletes an account and its profile.
    ///
    /// Results the user submitted or approved are kept with the reference
    /// cleared.
    pub async fn delete_user(&self, identity: &Identity, user_id: &str) -> DbResult<()> {
        authorize_user_management(identity)?;

        info!(user_id = %user_id, "Deleting user");

        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", user_id));
        }

        Ok(())
    }
}

/// Account management needs an admin allowed to manage users.
fn authorize_user_management(identity: &Identity) -> Result<(), CoreError> {
    match identity {
        Identity::Admin {
            can_manage_users: true,
            ..
        } => Ok(()),
        _ => Err(CoreError::forbidden(identity.role(), "manage user accounts")),
    }
}

async fn insert_user(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    id: &str,
    account: &NewAccount,
    role: Role,
) -> DbResult<()> {
    validate_name("username", &account.username, 150)?;
    validate_name("full_name", &account.full_name, 200)?;
    let username = account.username.trim();

    sqlx::query(
        r#"
        INSERT INTO users (id, username, full_name, role, is_active)
        VALUES (?1, ?2, ?3, ?4, 1)
        "#,
    )
    .bind(id)
    .bind(username)
    .bind(account.full_name.trim())
    .bind(role)
    .execute(&mut **tx)
    .await
    .map_err(|e| match DbError::from(e) {
        DbError::UniqueViolation { .. } => DbError::duplicate("username", username),
        other => other,
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::Campus;

    #[tokio::test]
    async fn test_resolve_identity_per_role() {
        let campus = Campus::new().await;
        let people = campus.db.people();

        let student = people.resolve_identity(campus.student.user_id()).await.unwrap();
        assert_eq!(student, campus.student);

        let lecturer = people.resolve_identity(campus.lecturer.user_id()).await.unwrap();
        assert_eq!(lecturer.role(), Role::Lecturer);
        assert_eq!(lecturer.lecturer_id(), campus.lecturer.lecturer_id());

        let admin = people.resolve_identity(campus.admin.user_id()).await.unwrap();
        assert!(matches!(
            admin,
            Identity::Admin {
                can_approve_results: true,
                can_manage_users: true,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_resolve_unknown_and_inactive_users() {
        let campus = Campus::new().await;
        let people = campus.db.people();

        let err = people.resolve_identity("missing").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        people
            .set_active(&campus.admin, campus.student.user_id(), false)
            .await
            .unwrap();
        let err = people.resolve_identity(campus.student.user_id()).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_bootstrap_only_once() {
        let campus = Campus::new().await;
        let err = campus
            .db
            .people()
            .bootstrap_admin(NewAccount::new("root2", "Second Root"))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Core(CoreError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_restricted_admin_cannot_manage_users() {
        let campus = Campus::new().await;
        let people = campus.db.people();

        let officer = people
            .create_admin(
                &campus.admin,
                NewAdmin {
                    account: NewAccount::new("officer", "Academic Officer"),
                    kind: AdminKind::AcademicOfficer,
                    can_approve_results: true,
                    can_manage_users: false,
                },
            )
            .await
            .unwrap();
        let officer = people.resolve_identity(&officer.user_id).await.unwrap();

        let err = people
            .create_lecturer(
                &officer,
                NewLecturer {
                    account: NewAccount::new("newlect", "New Lecturer"),
                    staff_id: "STAFF-900".to_string(),
                    department_id: campus.department.id.clone(),
                    rank: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_duplicate_username_and_matric() {
        let campus = Campus::new().await;
        let people = campus.db.people();

        let err = people
            .create_student(
                &campus.admin,
                NewStudent {
                    account: NewAccount::new("ada", "Another Ada"),
                    matric_no: "U2024/CSC/999".to_string(),
                    department_id: campus.department.id.clone(),
                    level: Level::L100,
                    admission_year: 2024,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "username"));

        let err = people
            .create_student(
                &campus.admin,
                NewStudent {
                    account: NewAccount::new("grace", "Grace"),
                    matric_no: "U2024/CSC/001".to_string(),
                    department_id: campus.department.id.clone(),
                    level: Level::L100,
                    admission_year: 2024,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "matric_no"));

        // The failed transaction left no orphan account behind.
        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = 'grace'")
            .fetch_one(campus.db.pool())
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn test_delete_user_cascades_to_profile() {
        let campus = Campus::new().await;
        let people = campus.db.people();
        let lecturer_id = campus.lecturer.lecturer_id().unwrap().to_string();

        people
            .delete_user(&campus.admin, campus.lecturer.user_id())
            .await
            .unwrap();

        assert!(people.get_lecturer(&lecturer_id).await.unwrap().is_none());
        // The course assignment is cleared, not the course.
        let course = campus.db.catalog().get_course(&campus.csc101.id).await.unwrap().unwrap();
        assert!(course.assigned_lecturer_id.is_none());
    }
}
