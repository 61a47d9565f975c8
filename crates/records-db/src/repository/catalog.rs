//! # Catalogue Repository
//!
//! Database operations for faculties, departments, courses and the ordered
//! prerequisite relation.
//!
//! ## Catalogue Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  faculties ──< departments ──< courses                                 │
//! │                                   │  ▲                                  │
//! │                                   │  │ course_prerequisites             │
//! │                                   └──┘ (course_id, prerequisite_id,     │
//! │                                         position)                       │
//! │                                                                         │
//! │  courses.assigned_lecturer_id ──> lecturers   (ON DELETE SET NULL)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Prerequisites are returned in `position` order, which is the order the
//! prerequisite validator checks them in. Cycles (A needs B, B needs A) are
//! storable; nothing here walks the graph.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use records_core::validation::{
    validate_course_code, validate_credit_unit, validate_distinct_ids, validate_id,
    validate_name, validate_pass_mark,
};
use records_core::{Course, CourseType, Department, Faculty, Identity, Level, PrerequisiteRef};

/// Column list for `Course` rows.
pub(crate) const COURSE_COLUMNS: &str = r#"
    id, code, title, credit_unit, course_type, offered_level,
    pass_mark, department_id, assigned_lecturer_id
"#;

/// Fields for a new course.
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub code: String,
    pub title: String,
    pub credit_unit: i64,
    pub course_type: CourseType,
    pub offered_level: Level,
    pub pass_mark: i64,
    pub department_id: String,
}

impl NewCourse {
    /// A core 100-level course with the default pass mark.
    pub fn new(
        code: impl Into<String>,
        title: impl Into<String>,
        credit_unit: i64,
        department_id: impl Into<String>,
    ) -> Self {
        NewCourse {
            code: code.into(),
            title: title.into(),
            credit_unit,
            course_type: CourseType::Core,
            offered_level: Level::L100,
            pass_mark: records_core::DEFAULT_PASS_MARK,
            department_id: department_id.into(),
        }
    }

    /// Sets the course type.
    pub fn course_type(mut self, course_type: CourseType) -> Self {
        self.course_type = course_type;
        self
    }

    /// Sets the offered level.
    pub fn offered_level(mut self, level: Level) -> Self {
        self.offered_level = level;
        self
    }

    /// Sets the pass mark (whole marks).
    pub fn pass_mark(mut self, pass_mark: i64) -> Self {
        self.pass_mark = pass_mark;
        self
    }
}

/// Repository for catalogue database operations.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Faculties & Departments
    // =========================================================================

    /// Creates a faculty. Names are unique.
    pub async fn create_faculty(
        &self,
        identity: &Identity,
        name: &str,
        description: Option<&str>,
    ) -> DbResult<Faculty> {
        identity.authorize_admin("manage faculties")?;
        validate_name("name", name, 150)?;

        let faculty = Faculty {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            description: description.map(str::to_string),
        };

        debug!(id = %faculty.id, name = %faculty.name, "Creating faculty");

        sqlx::query("INSERT INTO faculties (id, name, description) VALUES (?1, ?2, ?3)")
            .bind(&faculty.id)
            .bind(&faculty.name)
            .bind(&faculty.description)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => DbError::duplicate("faculty name", &faculty.name),
                other => other,
            })?;

        Ok(faculty)
    }

    /// Creates a department within a faculty.
    pub async fn create_department(
        &self,
        identity: &Identity,
        faculty_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> DbResult<Department> {
        identity.authorize_admin("manage departments")?;
        validate_name("name", name, 150)?;

        let department = Department {
            id: Uuid::new_v4().to_string(),
            faculty_id: faculty_id.to_string(),
            name: name.trim().to_string(),
            description: description.map(str::to_string),
        };

        debug!(id = %department.id, faculty_id = %faculty_id, "Creating department");

        sqlx::query(
            "INSERT INTO departments (id, faculty_id, name, description) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&department.id)
        .bind(&department.faculty_id)
        .bind(&department.name)
        .bind(&department.description)
        .execute(&self.pool)
        .await?;

        Ok(department)
    }

    /// Lists all departments, by name.
    pub async fn list_departments(&self) -> DbResult<Vec<Department>> {
        let departments = sqlx::query_as::<_, Department>(
            "SELECT id, faculty_id, name, description FROM departments ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(departments)
    }

    // =========================================================================
    // Courses
    // =========================================================================

    /// Creates a course.
    ///
    /// ## Errors
    /// - `Validation` for a malformed code, title, credit unit or pass mark
    /// - `UniqueViolation` when the code is taken
    pub async fn create_course(&self, identity: &Identity, new: NewCourse) -> DbResult<Course> {
        identity.authorize_admin("manage courses")?;
        validate_course_code(&new.code)?;
        validate_name("title", &new.title, 200)?;
        validate_credit_unit(new.credit_unit)?;
        validate_pass_mark(new.pass_mark)?;

        let course = Course {
            id: Uuid::new_v4().to_string(),
            code: new.code.trim().to_string(),
            title: new.title.trim().to_string(),
            credit_unit: new.credit_unit,
            course_type: new.course_type,
            offered_level: new.offered_level,
            pass_mark: new.pass_mark,
            department_id: new.department_id,
            assigned_lecturer_id: None,
        };

        debug!(id = %course.id, code = %course.code, "Creating course");

        sqlx::query(
            r#"
            INSERT INTO courses (
                id, code, title, credit_unit, course_type,
                offered_level, pass_mark, department_id, assigned_lecturer_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&course.id)
        .bind(&course.code)
        .bind(&course.title)
        .bind(course.credit_unit)
        .bind(course.course_type)
        .bind(course.offered_level)
        .bind(course.pass_mark)
        .bind(&course.department_id)
        .bind(&course.assigned_lecturer_id)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("code", &course.code),
            other => other,
        })?;

        Ok(course)
    }

    /// Gets a course by ID.
    pub async fn get_course(&self, id: &str) -> DbResult<Option<Course>> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?1");
        let course = sqlx::query_as::<_, Course>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(course)
    }

    /// Gets a course by its code.
    pub async fn get_course_by_code(&self, code: &str) -> DbResult<Option<Course>> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE code = ?1");
        let course = sqlx::query_as::<_, Course>(&sql)
            .bind(code.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(course)
    }

    /// Lists all courses, by code.
    pub async fn list_courses(&self) -> DbResult<Vec<Course>> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY code");
        let courses = sqlx::query_as::<_, Course>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(courses)
    }

    /// Deletes a course. Its prerequisites rows, registrations and results
    /// go with it.
    pub async fn delete_course(&self, identity: &Identity, id: &str) -> DbResult<()> {
        identity.authorize_admin("manage courses")?;

        let result = sqlx::query("DELETE FROM courses WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Course", id));
        }

        Ok(())
    }

    // =========================================================================
    // Prerequisites
    // =========================================================================

    /// Replaces a course's prerequisites with `prerequisite_ids`, in order.
    ///
    /// A course may list itself or form cycles with other courses.
    pub async fn set_prerequisites(
        &self,
        identity: &Identity,
        course_id: &str,
        prerequisite_ids: &[String],
    ) -> DbResult<()> {
        identity.authorize_admin("manage prerequisites")?;
        validate_distinct_ids("prerequisites", prerequisite_ids)?;
        for id in prerequisite_ids {
            validate_id("prerequisite_id", id)?;
        }

        debug!(course_id = %course_id, count = prerequisite_ids.len(), "Setting prerequisites");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query("DELETE FROM course_prerequisites WHERE course_id = ?1")
            .bind(course_id)
            .execute(&mut *tx)
            .await?;

        for (position, prerequisite_id) in prerequisite_ids.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO course_prerequisites (course_id, prerequisite_id, position)
                VALUES (?1, ?2, ?3)
                "#,
            )
            .bind(course_id)
            .bind(prerequisite_id)
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Direct prerequisites of a course, in declared order.
    pub async fn prerequisites(&self, course_id: &str) -> DbResult<Vec<PrerequisiteRef>> {
        let prerequisites = sqlx::query_as::<_, PrerequisiteRef>(
            r#"
            SELECT c.id AS course_id, c.code, c.pass_mark
            FROM course_prerequisites cp
            JOIN courses c ON c.id = cp.prerequisite_id
            WHERE cp.course_id = ?1
            ORDER BY cp.position
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(prerequisites)
    }

    // =========================================================================
    // Lecturer Assignment
    // =========================================================================

    /// Assigns a lecturer to a course, replacing any previous assignment.
    pub async fn assign_lecturer(
        &self,
        identity: &Identity,
        course_id: &str,
        lecturer_id: &str,
    ) -> DbResult<()> {
        identity.authorize_admin("assign courses")?;

        debug!(course_id = %course_id, lecturer_id = %lecturer_id, "Assigning lecturer");

        let result = sqlx::query("UPDATE courses SET assigned_lecturer_id = ?2 WHERE id = ?1")
            .bind(course_id)
            .bind(lecturer_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Course", course_id));
        }

        Ok(())
    }

    /// Clears a course's lecturer assignment.
    pub async fn unassign_lecturer(&self, identity: &Identity, course_id: &str) -> DbResult<()> {
        identity.authorize_admin("assign courses")?;

        let result = sqlx::query("UPDATE courses SET assigned_lecturer_id = NULL WHERE id = ?1")
            .bind(course_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Course", course_id));
        }

        Ok(())
    }

    /// Courses assigned to a lecturer, by code.
    pub async fn courses_for_lecturer(&self, lecturer_id: &str) -> DbResult<Vec<Course>> {
        let sql = format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE assigned_lecturer_id = ?1 ORDER BY code"
        );
        let courses = sqlx::query_as::<_, Course>(&sql)
            .bind(lecturer_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(courses)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::Campus;
    use records_core::CoreError;

    #[tokio::test]
    async fn test_create_and_fetch_course() {
        let campus = Campus::new().await;
        let catalog = campus.db.catalog();

        let course = catalog
            .create_course(
                &campus.admin,
                NewCourse::new("MTH101", "Elementary Mathematics", 3, &campus.department.id)
                    .course_type(CourseType::Elective)
                    .pass_mark(45),
            )
            .await
            .unwrap();

        let fetched = catalog.get_course_by_code("MTH101").await.unwrap().unwrap();
        assert_eq!(fetched.id, course.id);
        assert_eq!(fetched.course_type, CourseType::Elective);
        assert_eq!(fetched.offered_level, Level::L100);
        assert_eq!(fetched.pass_mark, 45);
        assert!(fetched.assigned_lecturer_id.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_course_code_rejected() {
        let campus = Campus::new().await;
        let err = campus
            .db
            .catalog()
            .create_course(
                &campus.admin,
                NewCourse::new("CSC101", "Another Intro", 2, &campus.department.id),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "code"));
    }

    #[tokio::test]
    async fn test_invalid_course_fields_rejected() {
        let campus = Campus::new().await;
        let err = campus
            .db
            .catalog()
            .create_course(
                &campus.admin,
                NewCourse::new("CSC999", "Zero Credit", 0, &campus.department.id),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_only_admins_manage_catalogue() {
        let campus = Campus::new().await;
        let err = campus
            .db
            .catalog()
            .create_faculty(&campus.lecturer, "Arts", None)
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Core(CoreError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_prerequisites_keep_declared_order() {
        let campus = Campus::new().await;
        let catalog = campus.db.catalog();

        let mth = catalog
            .create_course(
                &campus.admin,
                NewCourse::new("MTH101", "Elementary Mathematics", 3, &campus.department.id),
            )
            .await
            .unwrap();

        catalog
            .set_prerequisites(
                &campus.admin,
                &campus.csc201.id,
                &[mth.id.clone(), campus.csc101.id.clone()],
            )
            .await
            .unwrap();

        let codes: Vec<String> = catalog
            .prerequisites(&campus.csc201.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.code)
            .collect();
        assert_eq!(codes, vec!["MTH101", "CSC101"]);

        // Replacing the list drops the old rows.
        catalog
            .set_prerequisites(&campus.admin, &campus.csc201.id, &[campus.csc101.id.clone()])
            .await
            .unwrap();
        assert_eq!(catalog.prerequisites(&campus.csc201.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cyclic_prerequisites_are_storable() {
        let campus = Campus::new().await;
        let catalog = campus.db.catalog();

        catalog
            .set_prerequisites(&campus.admin, &campus.csc101.id, &[campus.csc201.id.clone()])
            .await
            .unwrap();

        // csc201 already requires csc101 (fixture), so this closes a cycle.
        assert_eq!(catalog.prerequisites(&campus.csc101.id).await.unwrap().len(), 1);
        assert_eq!(catalog.prerequisites(&campus.csc201.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_prerequisite_rejected() {
        let campus = Campus::new().await;
        let err = campus
            .db
            .catalog()
            .set_prerequisites(
                &campus.admin,
                &campus.csc201.id,
                &[campus.csc101.id.clone(), campus.csc101.id.clone()],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_assign_and_unassign_lecturer() {
        let campus = Campus::new().await;
        let catalog = campus.db.catalog();
        let lecturer_id = campus.lecturer.lecturer_id().unwrap().to_string();

        catalog
            .assign_lecturer(&campus.admin, &campus.gst101.id, &lecturer_id)
            .await
            .unwrap();

        let codes: Vec<String> = catalog
            .courses_for_lecturer(&lecturer_id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.code)
            .collect();
        assert_eq!(codes, vec!["CSC101", "CSC201", "GST101"]);

        catalog
            .unassign_lecturer(&campus.admin, &campus.gst101.id)
            .await
            .unwrap();
        assert_eq!(catalog.courses_for_lecturer(&lecturer_id).await.unwrap().len(), 2);

        let err = catalog
            .assign_lecturer(&campus.admin, "missing-course", &lecturer_id)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
