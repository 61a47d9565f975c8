//! # Domain Types
//!
//! Core domain types used throughout the records engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Faculty ──< Department ──< Course ──< (prerequisites) ──> Course      │
//! │                   │            │                                        │
//! │                   │            └──< CourseRegistration >── Student      │
//! │                   │                        │                            │
//! │                   ├──< Student             └── CourseResult (0..1)     │
//! │                   └──< Lecturer                 submitted_by Lecturer  │
//! │                                                 approved_by  User      │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   CourseType    │   │  ResultStatus   │   │    Semester     │       │
//! │  │  Core           │   │  Pending        │   │  First          │       │
//! │  │  Elective       │   │  Approved       │   │  Second         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (course code, matric number, staff id) - human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::grading::GradeLetter;
use crate::identity::Role;
use crate::score::Score;

/// Pass mark applied when a course does not set one.
pub const DEFAULT_PASS_MARK: i64 = 40;

// =============================================================================
// Enumerations
// =============================================================================

/// Whether a course can be dropped after registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CourseType {
    /// Compulsory; never droppable.
    #[default]
    Core,
    Elective,
}

/// Academic level a course is offered at, or a student is in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum Level {
    #[default]
    #[serde(rename = "100")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "100"))]
    L100,
    #[serde(rename = "200")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "200"))]
    L200,
    #[serde(rename = "300")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "300"))]
    L300,
    #[serde(rename = "400")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "400"))]
    L400,
}

impl Level {
    /// Parses "100" / "200" / "300" / "400".
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "100" => Some(Level::L100),
            "200" => Some(Level::L200),
            "300" => Some(Level::L300),
            "400" => Some(Level::L400),
            _ => None,
        }
    }

    /// Returns the level as stored ("100" .. "400").
    pub const fn code(&self) -> &'static str {
        match self {
            Level::L100 => "100",
            Level::L200 => "200",
            Level::L300 => "300",
            Level::L400 => "400",
        }
    }
}

/// Half of an academic session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Semester {
    First,
    Second,
}

impl Semester {
    /// Parses "First" / "Second" (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "first" => Some(Semester::First),
            "second" => Some(Semester::Second),
            _ => None,
        }
    }

    /// Display name ("First" / "Second").
    pub const fn name(&self) -> &'static str {
        match self {
            Semester::First => "First",
            Semester::Second => "Second",
        }
    }
}

/// Approval state of a submitted result.
///
/// ## State Machine
/// ```text
/// submit ──► Pending ──approve──► Approved (terminal)
///              ▲  │
///              └──┘ re-submit overwrites score/grade
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    #[default]
    Pending,
    Approved,
}

/// Kind of administrative account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AdminKind {
    #[default]
    Admin,
    AcademicOfficer,
}

// =============================================================================
// Catalogue
// =============================================================================

/// A faculty (top of the academic hierarchy).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Faculty {
    pub id: String,
    /// Unique across faculties.
    pub name: String,
    pub description: Option<String>,
}

/// A department within a faculty.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Department {
    pub id: String,
    pub faculty_id: String,
    pub name: String,
    pub description: Option<String>,
}

/// A course in the catalogue.
///
/// Prerequisites are a separate ordered relation; see [`PrerequisiteRef`].
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Course {
    pub id: String,
    /// Unique course code, e.g. "CSC201".
    pub code: String,
    pub title: String,
    /// Credit weight (positive).
    pub credit_unit: i64,
    pub course_type: CourseType,
    pub offered_level: Level,
    /// Whole marks needed for this course to satisfy a prerequisite.
    pub pass_mark: i64,
    pub department_id: String,
    pub assigned_lecturer_id: Option<String>,
}

impl Course {
    /// Returns the pass mark as a Score.
    #[inline]
    pub fn pass_mark_score(&self) -> Score {
        Score::from_whole(self.pass_mark)
    }

    /// Checks if the course can ever be dropped.
    #[inline]
    pub fn is_droppable(&self) -> bool {
        self.course_type != CourseType::Core
    }
}

/// A direct prerequisite of a course, in declared order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PrerequisiteRef {
    pub course_id: String,
    pub code: String,
    /// Whole marks.
    pub pass_mark: i64,
}

impl PrerequisiteRef {
    /// Returns the pass mark as a Score.
    #[inline]
    pub fn pass_mark_score(&self) -> Score {
        Score::from_whole(self.pass_mark)
    }
}

// =============================================================================
// People
// =============================================================================

/// A login account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
}

/// Student profile.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Student {
    pub id: String,
    pub user_id: String,
    /// Unique matriculation number.
    pub matric_no: String,
    pub department_id: String,
    pub level: Level,
    pub admission_year: i64,
}

/// Lecturer profile.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Lecturer {
    pub id: String,
    pub user_id: String,
    /// Unique staff number.
    pub staff_id: String,
    pub department_id: String,
    pub rank: Option<String>,
}

/// Administrator profile.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct AdminProfile {
    pub id: String,
    pub user_id: String,
    pub kind: AdminKind,
    pub can_approve_results: bool,
    pub can_manage_users: bool,
}

// =============================================================================
// Registration & Result
// =============================================================================

/// A student's enrollment in a course for one session/semester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CourseRegistration {
    pub id: String,
    pub student_id: String,
    pub course_id: String,
    /// e.g. "2024/2025".
    pub session: String,
    pub semester: Semester,
    #[ts(as = "String")]
    pub registered_at: DateTime<Utc>,
}

/// The result attached to a registration (at most one).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CourseResult {
    pub id: String,
    pub registration_id: String,
    /// Score in hundredths (7250 = 72.50).
    pub score_hundredths: i64,
    /// Letter derived from the score at submission time.
    pub grade: GradeLetter,
    pub status: ResultStatus,
    /// Lecturer profile id; cleared if the lecturer is deleted.
    pub submitted_by: Option<String>,
    /// User id of the approver; cleared if that user is deleted.
    pub approved_by: Option<String>,
    #[ts(as = "String")]
    pub submitted_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub approved_at: Option<DateTime<Utc>>,
}

impl CourseResult {
    /// Returns the score.
    #[inline]
    pub fn score(&self) -> Score {
        Score::from_hundredths(self.score_hundredths)
    }

    /// Checks if the result is approved.
    #[inline]
    pub fn is_approved(&self) -> bool {
        self.status == ResultStatus::Approved
    }
}

/// The course facts the record rules need about a registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CourseSummary {
    pub id: String,
    pub code: String,
    pub title: String,
    pub credit_unit: i64,
    pub course_type: CourseType,
    pub pass_mark: i64,
}

impl From<&Course> for CourseSummary {
    fn from(course: &Course) -> Self {
        CourseSummary {
            id: course.id.clone(),
            code: course.code.clone(),
            title: course.title.clone(),
            credit_unit: course.credit_unit,
            course_type: course.course_type,
            pass_mark: course.pass_mark,
        }
    }
}

/// A registration joined with its course and optional result.
///
/// This is the unit of a student's academic history: the aggregation
/// engine and the prerequisite validator both read sequences of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub registration: CourseRegistration,
    pub course: CourseSummary,
    pub result: Option<CourseResult>,
    /// Display name of the submitting lecturer, when known.
    pub lecturer_name: Option<String>,
}

// =============================================================================
// Reports
// =============================================================================

/// A stored snapshot of a department's headcounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DepartmentReport {
    pub id: String,
    pub department_id: String,
    pub total_students: i64,
    pub total_courses: i64,
    pub total_lecturers: i64,
    #[ts(as = "String")]
    pub generated_on: DateTime<Utc>,
}

/// Headline counts for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DashboardStats {
    pub total_lecturers: i64,
    pub total_students: i64,
    pub total_courses: i64,
    pub assigned_courses: i64,
    pub unassigned_courses: i64,
    pub pending_results: i64,
}

/// One row of the admin result list, labelled for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ResultListing {
    pub result_id: String,
    pub registration_id: String,
    pub matric_no: String,
    pub student_name: String,
    pub course_id: String,
    pub course_code: String,
    pub session: String,
    pub semester: Semester,
    pub score_hundredths: i64,
    pub grade: GradeLetter,
    pub status: ResultStatus,
    /// None once the submitting lecturer is deleted.
    pub lecturer_name: Option<String>,
    #[ts(as = "String")]
    pub submitted_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
