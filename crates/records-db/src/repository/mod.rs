//! # Repository Module
//!
//! Database repository implementations for the records engine.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Request handler                                                       │
//! │       │                                                                 │
//! │       │  db.results().submit(&identity, &registration_id, score)       │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  ResultRepository                                                      │
//! │  ├── submit(&self, identity, registration_id, score)                   │
//! │  ├── approve(&self, identity, result_id)                               │
//! │  ├── approve_all(&self, identity, scope)                               │
//! │  └── list(&self, identity, status)                                     │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • Record rules stay in records-core                                   │
//! │  • SQL is isolated in one place                                        │
//! │  • Every write is checked against the caller's Identity                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`catalog::CatalogRepository`] - Faculties, departments, courses, prerequisites
//! - [`people::PeopleRepository`] - Accounts, profiles, identity resolution
//! - [`registration::RegistrationRepository`] - Register, drop, history, transcript
//! - [`result::ResultRepository`] - Submit, approve, bulk approval, listings
//! - [`report::ReportRepository`] - Dashboard stats, department reports

pub mod catalog;
pub mod people;
pub mod registration;
pub mod report;
pub mod result;

#[cfg(test)]
pub(crate) mod fixtures;
