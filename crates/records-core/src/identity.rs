//! # Acting Identity
//!
//! Who is performing an operation, resolved once at the request boundary.
//!
//! ## Explicit Identity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Request handler                                                        │
//! │       │  authenticated user id (from the web framework)                │
//! │       ▼                                                                 │
//! │  people().resolve_identity(user_id)   ← one lookup per request         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Identity::Student { .. } | Lecturer { .. } | Admin { .. }             │
//! │       │                                                                 │
//! │       ▼  passed by reference into every workflow                       │
//! │  registrations().register(&identity, ..)                               │
//! │  results().approve_all(&identity, ..)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no ambient "current user": every rule below takes the identity
//! as a parameter and answers with `Ok(())` or `CoreError::Forbidden`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Role
// =============================================================================

/// Account role stored on every user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Lecturer,
    Admin,
}

// =============================================================================
// Identity
// =============================================================================

/// The acting user together with its role-specific profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Identity {
    Student {
        user_id: String,
        student_id: String,
    },
    Lecturer {
        user_id: String,
        lecturer_id: String,
    },
    Admin {
        user_id: String,
        admin_id: String,
        can_approve_results: bool,
        can_manage_users: bool,
    },
}

impl Identity {
    /// Returns the role tag.
    pub fn role(&self) -> Role {
        match self {
            Identity::Student { .. } => Role::Student,
            Identity::Lecturer { .. } => Role::Lecturer,
            Identity::Admin { .. } => Role::Admin,
        }
    }

    /// Returns the underlying user account id.
    pub fn user_id(&self) -> &str {
        match self {
            Identity::Student { user_id, .. }
            | Identity::Lecturer { user_id, .. }
            | Identity::Admin { user_id, .. } => user_id.as_str(),
        }
    }

    /// Returns the lecturer profile id, if this is a lecturer.
    pub fn lecturer_id(&self) -> Option<&str> {
        match self {
            Identity::Lecturer { lecturer_id, .. } => Some(lecturer_id.as_str()),
            _ => None,
        }
    }

    /// Registering or dropping courses on behalf of `student_id`.
    ///
    /// Students act for themselves; admins need `can_manage_users`.
    pub fn authorize_enrollment(&self, student_id: &str) -> CoreResult<()> {
        match self {
            Identity::Student { student_id: own, .. } if own.as_str() == student_id => Ok(()),
            Identity::Admin {
                can_manage_users: true,
                ..
            } => Ok(()),
            _ => Err(CoreError::forbidden(
                self.role(),
                format!("manage registrations of student {student_id}"),
            )),
        }
    }

    /// Submitting a score for a course.
    ///
    /// Only lecturers submit; when the course has an assigned lecturer it
    /// must be this one.
    pub fn authorize_submission(&self, assigned_lecturer: Option<&str>) -> CoreResult<&str> {
        match (self, assigned_lecturer) {
            (Identity::Lecturer { lecturer_id, .. }, None) => Ok(lecturer_id.as_str()),
            (Identity::Lecturer { lecturer_id, .. }, Some(assigned)) if assigned == lecturer_id.as_str() => {
                Ok(lecturer_id.as_str())
            }
            _ => Err(CoreError::forbidden(self.role(), "submit results for this course")),
        }
    }

    /// Approving pending results.
    pub fn authorize_approval(&self) -> CoreResult<()> {
        match self {
            Identity::Admin {
                can_approve_results: true,
                ..
            } => Ok(()),
            _ => Err(CoreError::forbidden(self.role(), "approve results")),
        }
    }

    /// Managing the catalogue, people, course assignment and reports.
    pub fn authorize_admin(&self, action: &str) -> CoreResult<()> {
        match self {
            Identity::Admin { .. } => Ok(()),
            _ => Err(CoreError::forbidden(self.role(), action)),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: &str) -> Identity {
        Identity::Student {
            user_id: format!("u-{id}"),
            student_id: id.to_string(),
        }
    }

    fn lecturer(id: &str) -> Identity {
        Identity::Lecturer {
            user_id: format!("u-{id}"),
            lecturer_id: id.to_string(),
        }
    }

    fn admin(approve: bool, manage: bool) -> Identity {
        Identity::Admin {
            user_id: "u-admin".to_string(),
            admin_id: "admin".to_string(),
            can_approve_results: approve,
            can_manage_users: manage,
        }
    }

    #[test]
    fn test_role_and_user_id() {
        assert_eq!(student("s1").role(), Role::Student);
        assert_eq!(lecturer("l1").user_id(), "u-l1");
        assert_eq!(admin(true, true).role(), Role::Admin);
        assert_eq!(lecturer("l1").lecturer_id(), Some("l1"));
        assert_eq!(student("s1").lecturer_id(), None);
    }

    #[test]
    fn test_enrollment_rules() {
        assert!(student("s1").authorize_enrollment("s1").is_ok());
        assert!(student("s1").authorize_enrollment("s2").is_err());
        assert!(admin(false, true).authorize_enrollment("s2").is_ok());
        assert!(admin(true, false).authorize_enrollment("s2").is_err());
        assert!(lecturer("l1").authorize_enrollment("s1").is_err());
    }

    #[test]
    fn test_submission_rules() {
        assert_eq!(lecturer("l1").authorize_submission(None).unwrap(), "l1");
        assert_eq!(lecturer("l1").authorize_submission(Some("l1")).unwrap(), "l1");
        assert!(lecturer("l1").authorize_submission(Some("l2")).is_err());
        assert!(admin(true, true).authorize_submission(None).is_err());
        assert!(student("s1").authorize_submission(None).is_err());
    }

    #[test]
    fn test_approval_rules() {
        assert!(admin(true, false).authorize_approval().is_ok());
        assert!(admin(false, true).authorize_approval().is_err());
        let err = lecturer("l1").authorize_approval().unwrap_err();
        assert!(matches!(err, CoreError::Forbidden { role: Role::Lecturer, .. }));
    }
}
