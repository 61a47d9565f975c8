//! # records-db: Storage Layer for the Records Engine
//!
//! This crate provides database access and the stored workflows of the
//! records engine. It uses SQLite with sqlx for async operations and
//! delegates every academic rule to `records-core`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Records Data Flow                                │
//! │                                                                         │
//! │  Request handler (register, submit score, approve all, transcript)     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    records-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ Catalog        │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ People         │    │ 001_initial_ │  │   │
//! │  │   │ GradeScale    │    │ Registration   │    │   schema.sql │  │   │
//! │  │   │               │    │ Result, Report │    │              │  │   │
//! │  │   └───────────────┘    └───────┬────────┘    └──────────────┘  │   │
//! │  │                                │ rules                          │   │
//! │  │                                ▼                                │   │
//! │  │                  records-core (grading, GPA, prerequisites)    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │              RECORDS_DATABASE_PATH (default records.db)         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Environment configuration
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (catalog, results, etc.)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use records_db::{Database, RecordsConfig};
//!
//! let config = RecordsConfig::load()?;
//! let db = Database::new(config.db_config()).await?;
//!
//! let identity = db.people().resolve_identity(&user_id).await?;
//! let count = db.results().approve_all(&identity, &ApprovalScope::All).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, RecordsConfig};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::catalog::{CatalogRepository, NewCourse};
pub use repository::people::{NewAccount, NewAdmin, NewLecturer, NewStudent, PeopleRepository};
pub use repository::registration::RegistrationRepository;
pub use repository::report::ReportRepository;
pub use repository::result::{ApprovalScope, ResultRepository};
