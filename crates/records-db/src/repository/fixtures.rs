//! Shared test campus for repository tests.
//!
//! ```text
//! Faculty of Science
//! └── Computer Science
//!     ├── CSC101  core      3 units  pass 45   lecturer: Dr. Turing
//!     ├── CSC201  core      3 units  pass 40   lecturer: Dr. Turing   needs CSC101
//!     └── GST101  elective  2 units  pass 40   (unassigned)
//!
//! people: root (admin), turing (lecturer), hopper (lecturer), ada (student)
//! ```

use records_core::{Course, CourseType, Department, Identity, Level, Semester};

use super::catalog::NewCourse;
use super::people::{NewAccount, NewLecturer, NewStudent};
use crate::pool::{Database, DbConfig};

pub(crate) const SESSION: &str = "2024/2025";
pub(crate) const NEXT_SESSION: &str = "2025/2026";
pub(crate) const FIRST: Semester = Semester::First;

pub(crate) struct Campus {
    pub db: Database,
    pub admin: Identity,
    pub lecturer: Identity,
    pub other_lecturer: Identity,
    pub student: Identity,
    pub department: Department,
    pub csc101: Course,
    pub csc201: Course,
    pub gst101: Course,
}

impl Campus {
    pub async fn new() -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let people = db.people();
        let catalog = db.catalog();

        let root = people
            .bootstrap_admin(NewAccount::new("root", "Registry Admin"))
            .await
            .unwrap();
        let admin = people.resolve_identity(&root.user_id).await.unwrap();

        let faculty = catalog
            .create_faculty(&admin, "Faculty of Science", None)
            .await
            .unwrap();
        let department = catalog
            .create_department(&admin, &faculty.id, "Computer Science", Some("CS"))
            .await
            .unwrap();

        let turing = people
            .create_lecturer(
                &admin,
                NewLecturer {
                    account: NewAccount::new("turing", "Dr. Turing"),
                    staff_id: "STAFF-001".to_string(),
                    department_id: department.id.clone(),
                    rank: Some("Senior Lecturer".to_string()),
                },
            )
            .await
            .unwrap();
        let hopper = people
            .create_lecturer(
                &admin,
                NewLecturer {
                    account: NewAccount::new("hopper", "Dr. Hopper"),
                    staff_id: "STAFF-002".to_string(),
                    department_id: department.id.clone(),
                    rank: None,
                },
            )
            .await
            .unwrap();
        let ada = people
            .create_student(
                &admin,
                NewStudent {
                    account: NewAccount::new("ada", "Ada Lovelace"),
                    matric_no: "U2024/CSC/001".to_string(),
                    department_id: department.id.clone(),
                    level: Level::L100,
                    admission_year: 2024,
                },
            )
            .await
            .unwrap();

        let csc101 = catalog
            .create_course(
                &admin,
                NewCourse::new("CSC101", "Introduction to Computing", 3, &department.id)
                    .pass_mark(45),
            )
            .await
            .unwrap();
        let csc201 = catalog
            .create_course(
                &admin,
                NewCourse::new("CSC201", "Data Structures", 3, &department.id)
                    .offered_level(Level::L200),
            )
            .await
            .unwrap();
        let gst101 = catalog
            .create_course(
                &admin,
                NewCourse::new("GST101", "Use of English", 2, &department.id)
                    .course_type(CourseType::Elective),
            )
            .await
            .unwrap();

        catalog
            .set_prerequisites(&admin, &csc201.id, &[csc101.id.clone()])
            .await
            .unwrap();
        catalog
            .assign_lecturer(&admin, &csc101.id, &turing.id)
            .await
            .unwrap();
        catalog
            .assign_lecturer(&admin, &csc201.id, &turing.id)
            .await
            .unwrap();

        let lecturer = people.resolve_identity(&turing.user_id).await.unwrap();
        let other_lecturer = people.resolve_identity(&hopper.user_id).await.unwrap();
        let student = people.resolve_identity(&ada.user_id).await.unwrap();

        Campus {
            db,
            admin,
            lecturer,
            other_lecturer,
            student,
            department,
            csc101,
            csc201,
            gst101,
        }
    }

    /// The student's profile id.
    pub fn student_id(&self) -> &str {
        match &self.student {
            Identity::Student { student_id, .. } => student_id.as_str(),
            _ => unreachable!("campus student is a student identity"),
        }
    }
}
