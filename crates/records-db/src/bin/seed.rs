//! # Seed Data Generator
//!
//! Populates a database with a small demo campus and walks one student
//! through a full record cycle.
//!
//! ## Usage
//! ```bash
//! # Seed the database named by RECORDS_DATABASE_PATH (default records.db)
//! cargo run -p records-db --bin records-seed
//!
//! # Specify database path
//! cargo run -p records-db --bin records-seed -- --db ./data/records.db
//!
//! # More logging
//! RUST_LOG=debug,sqlx=warn cargo run -p records-db --bin records-seed
//! ```
//!
//! ## Generated Data
//! - Faculty of Science / Computer Science
//! - CSC101 (core), CSC201 (core, needs CSC101), GST101 (elective)
//! - One admin, one lecturer, one student
//! - 2024/2025 First: CSC101 + GST101 registered, scored, approved
//! - 2025/2026 First: CSC201 registered (prerequisite met)

use std::env;

use records_core::{CoreError, CourseType, Level, RegistrationOutcome, Score, Semester};
use records_db::{
    ApprovalScope, Database, DbError, NewAccount, NewCourse, NewLecturer, NewStudent,
    RecordsConfig,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = RecordsConfig::load()?;

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = args[i + 1].clone().into();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Records Seed Data Generator");
                println!();
                println!("Usage: records-seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $RECORDS_DATABASE_PATH or records.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(path = %config.database_path.display(), "Seeding records database");

    let db = Database::new(config.db_config()).await?;
    let people = db.people();
    let catalog = db.catalog();

    // People and catalogue
    let root = match people
        .bootstrap_admin(NewAccount::new("registry", "Registry Administrator"))
        .await
    {
        Ok(root) => root,
        Err(DbError::Core(CoreError::Forbidden { .. })) => {
            warn!("Database already has an administrator; skipping seed. Delete the file to regenerate.");
            db.close().await;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let admin = people.resolve_identity(&root.user_id).await?;

    let faculty = catalog
        .create_faculty(&admin, "Faculty of Science", Some("Physical and computing sciences"))
        .await?;
    let department = catalog
        .create_department(&admin, &faculty.id, "Computer Science", None)
        .await?;

    let lecturer = people
        .create_lecturer(
            &admin,
            NewLecturer {
                account: NewAccount::new("aturing", "Dr. Alan Turing"),
                staff_id: "STAFF-001".to_string(),
                department_id: department.id.clone(),
                rank: Some("Senior Lecturer".to_string()),
            },
        )
        .await?;
    let student = people
        .create_student(
            &admin,
            NewStudent {
                account: NewAccount::new("alovelace", "Ada Lovelace"),
                matric_no: "U2024/CSC/001".to_string(),
                department_id: department.id.clone(),
                level: Level::L100,
                admission_year: 2024,
            },
        )
        .await?;

    let csc101 = catalog
        .create_course(
            &admin,
            NewCourse::new("CSC101", "Introduction to Computing", 3, &department.id).pass_mark(45),
        )
        .await?;
    let csc201 = catalog
        .create_course(
            &admin,
            NewCourse::new("CSC201", "Data Structures", 3, &department.id)
                .offered_level(Level::L200),
        )
        .await?;
    let gst101 = catalog
        .create_course(
            &admin,
            NewCourse::new("GST101", "Use of English", 2, &department.id)
                .course_type(CourseType::Elective),
        )
        .await?;

    catalog
        .set_prerequisites(&admin, &csc201.id, &[csc101.id.clone()])
        .await?;
    for course in [&csc101, &csc201, &gst101] {
        catalog.assign_lecturer(&admin, &course.id, &lecturer.id).await?;
    }

    let lecturer = people.resolve_identity(&lecturer.user_id).await?;
    let student_identity = people.resolve_identity(&student.user_id).await?;

    // First session: register, score, approve
    let registrations = db.registrations();
    let results = db.results();

    for (course_id, score) in [(&csc101.id, 72), (&gst101.id, 58)] {
        let outcome = registrations
            .register(&student_identity, &student.id, course_id, "2024/2025", Semester::First)
            .await?;
        if let Some(registration) = outcome.registration() {
            results
                .submit(&lecturer, &registration.id, Score::from_whole(score))
                .await?;
        }
    }

    let approved = results.approve_all(&admin, &ApprovalScope::All).await?;
    info!(count = approved, "Approved first-session results");

    // Second session: CSC201 now passes its prerequisite check
    match registrations
        .register(&student_identity, &student.id, &csc201.id, "2025/2026", Semester::First)
        .await?
    {
        RegistrationOutcome::Created(registration) => {
            info!(id = %registration.id, "Registered CSC201")
        }
        other => warn!(?other, "CSC201 registration was not created"),
    }

    // Report
    let transcript = registrations.transcript(&admin, &student.id).await?;
    for term in &transcript.terms {
        info!(
            session = %term.session,
            semester = term.semester.name(),
            courses = term.entries.len(),
            gpa = %term.gpa,
            "Term"
        );
    }
    info!(cgpa = %transcript.cgpa, credits = transcript.total_credits, "Transcript");

    let report = db
        .reports()
        .generate_department_report(&admin, &department.id)
        .await?;
    info!(
        students = report.total_students,
        courses = report.total_courses,
        lecturers = report.total_lecturers,
        "Department report stored"
    );

    db.close().await;
    Ok(())
}
