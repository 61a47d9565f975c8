//! # Aggregation Engine
//!
//! Builds a student's transcript: registrations grouped by
//! (session, semester) with a credit-weighted GPA per term and a CGPA over
//! the whole history.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  RegistrationRecord*  (ordered by session, semester from storage)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  group by (session, semester) ── first-seen key order is kept          │
//! │       │                                                                 │
//! │       ├── display: every registration becomes a TranscriptEntry        │
//! │       │            (no result → status Pending, no score/grade)        │
//! │       │                                                                 │
//! │       └── compute: only registrations WITH a result                    │
//! │                    points  += grade.points × credit_unit               │
//! │                    credits += credit_unit                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  term gpa = round(points / credits, 2)    (0.00 when credits = 0)      │
//! │  cgpa     = round(Σpoints / Σcredits, 2)  (NOT the mean of term GPAs) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Pending Results Count
//! A result contributes as soon as it is submitted, approved or not
//! (`test_pending_results_count_towards_gpa`).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use ts_rs::TS;

use crate::grading::GradeLetter;
use crate::score::Score;
use crate::types::{CourseType, RegistrationRecord, ResultStatus, Semester};

// =============================================================================
// Grade Point Average
// =============================================================================

/// A grade point average in hundredths (433 = 4.33).
///
/// ## Rounding
/// `points / credits` is rounded to two decimals in exact integer
/// arithmetic; an exact half goes to the even neighbour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Gpa(i64);

impl Gpa {
    /// Computes `round(points / credits, 2)`, or 0.00 without credits.
    pub fn from_totals(points: i64, credits: i64) -> Self {
        if credits <= 0 {
            return Gpa(0);
        }

        let numerator = i128::from(points) * 100;
        let denominator = i128::from(credits);
        let mut quotient = numerator.div_euclid(denominator);
        let twice_remainder = numerator.rem_euclid(denominator) * 2;

        if twice_remainder > denominator || (twice_remainder == denominator && quotient % 2 != 0) {
            quotient += 1;
        }

        Gpa(quotient as i64)
    }

    /// Creates a GPA from hundredths.
    #[inline]
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Gpa(hundredths)
    }

    /// Returns the value in hundredths.
    #[inline]
    pub const fn hundredths(&self) -> i64 {
        self.0
    }

    /// Returns the GPA as a float (for display only).
    #[inline]
    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Gpa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, (self.0 % 100).abs())
    }
}

// =============================================================================
// Transcript
// =============================================================================

/// One line of a term, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TranscriptEntry {
    pub registration_id: String,
    pub course_id: String,
    pub course_code: String,
    pub course_title: String,
    pub credit_unit: i64,
    pub course_type: CourseType,
    pub score: Option<Score>,
    pub grade: Option<GradeLetter>,
    /// Pending when no result has been submitted yet.
    pub status: ResultStatus,
    pub lecturer: Option<String>,
}

/// A (session, semester) group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TermSummary {
    pub session: String,
    pub semester: Semester,
    pub entries: Vec<TranscriptEntry>,
    /// Σ grade points × credit unit over entries with a result.
    pub total_points: i64,
    /// Σ credit unit over entries with a result.
    pub total_credits: i64,
    pub gpa: Gpa,
}

/// A student's grouped history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Transcript {
    pub terms: Vec<TermSummary>,
    pub total_points: i64,
    pub total_credits: i64,
    pub cgpa: Gpa,
}

impl Transcript {
    /// Looks up one term.
    pub fn term(&self, session: &str, semester: Semester) -> Option<&TermSummary> {
        self.terms
            .iter()
            .find(|term| term.session == session && term.semester == semester)
    }
}

/// Groups registrations and computes GPA per term and CGPA overall.
///
/// Pure and deterministic: the same input always yields the same transcript.
pub fn aggregate(records: &[RegistrationRecord]) -> Transcript {
    let mut terms: Vec<TermSummary> = Vec::new();
    let mut index: HashMap<(String, Semester), usize> = HashMap::new();
    let mut total_points = 0i64;
    let mut total_credits = 0i64;

    for record in records {
        let registration = &record.registration;
        let key = (registration.session.clone(), registration.semester);
        let position = *index.entry(key).or_insert_with(|| {
            terms.push(TermSummary {
                session: registration.session.clone(),
                semester: registration.semester,
                entries: Vec::new(),
                total_points: 0,
                total_credits: 0,
                gpa: Gpa::default(),
            });
            terms.len() - 1
        });
        let term = &mut terms[position];

        let entry = match &record.result {
            Some(result) => {
                let weighted = i64::from(result.grade.points()) * record.course.credit_unit;
                term.total_points += weighted;
                term.total_credits += record.course.credit_unit;
                total_points += weighted;
                total_credits += record.course.credit_unit;

                TranscriptEntry {
                    registration_id: registration.id.clone(),
                    course_id: record.course.id.clone(),
                    course_code: record.course.code.clone(),
                    course_title: record.course.title.clone(),
                    credit_unit: record.course.credit_unit,
                    course_type: record.course.course_type,
                    score: Some(result.score()),
                    grade: Some(result.grade),
                    status: result.status,
                    lecturer: record.lecturer_name.clone(),
                }
            }
            None => TranscriptEntry {
                registration_id: registration.id.clone(),
                course_id: record.course.id.clone(),
                course_code: record.course.code.clone(),
                course_title: record.course.title.clone(),
                credit_unit: record.course.credit_unit,
                course_type: record.course.course_type,
                score: None,
                grade: None,
                status: ResultStatus::Pending,
                lecturer: None,
            },
        };
        term.entries.push(entry);
    }

    for term in &mut terms {
        term.gpa = Gpa::from_totals(term.total_points, term.total_credits);
    }

    Transcript {
        terms,
        total_points,
        total_credits,
        cgpa: Gpa::from_totals(total_points, total_credits),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::grading::grade_for;
    use crate::types::{CourseRegistration, CourseResult, CourseSummary};
    use chrono::Utc;

    pub(crate) fn record(
        id: &str,
        course_code: &str,
        credit_unit: i64,
        session: &str,
        semester: Semester,
        result: Option<(i64, ResultStatus)>,
    ) -> RegistrationRecord {
        let course_id = format!("course-{course_code}");
        RegistrationRecord {
            registration: CourseRegistration {
                id: id.to_string(),
                student_id: "student-1".to_string(),
                course_id: course_id.clone(),
                session: session.to_string(),
                semester,
                registered_at: Utc::now(),
            },
            course: CourseSummary {
                id: course_id,
                code: course_code.to_string(),
                title: format!("{course_code} title"),
                credit_unit,
                course_type: CourseType::Core,
                pass_mark: 40,
            },
            result: result.map(|(whole, status)| CourseResult {
                id: format!("result-{id}"),
                registration_id: id.to_string(),
                score_hundredths: whole * 100,
                grade: grade_for(Score::from_whole(whole)).letter,
                status,
                submitted_by: Some("lecturer-1".to_string()),
                approved_by: None,
                submitted_at: Utc::now(),
                approved_at: None,
            }),
            lecturer_name: result.map(|_| "Dr. Ada Obi".to_string()),
        }
    }

    #[test]
    fn test_gpa_rounding() {
        assert_eq!(Gpa::from_totals(13, 3).to_string(), "4.33");
        assert_eq!(Gpa::from_totals(14, 3).to_string(), "4.67");
        assert_eq!(Gpa::from_totals(0, 0).to_string(), "0.00");
        assert_eq!(Gpa::from_totals(15, 3).hundredths(), 500);
        // 1/8 = 0.125 → 0.12 ; 3/8 = 0.375 → 0.38 (half to even)
        assert_eq!(Gpa::from_totals(1, 8).hundredths(), 12);
        assert_eq!(Gpa::from_totals(3, 8).hundredths(), 38);
    }

    #[test]
    fn test_single_registration_contributes_weighted_points() {
        let records = vec![record(
            "r1",
            "CSC101",
            3,
            "2024/2025",
            Semester::First,
            Some((72, ResultStatus::Approved)),
        )];
        let transcript = aggregate(&records);

        let term = transcript.term("2024/2025", Semester::First).unwrap();
        assert_eq!(term.total_points, 15);
        assert_eq!(term.total_credits, 3);
        assert_eq!(term.gpa.to_string(), "5.00");
        assert_eq!(transcript.cgpa.to_string(), "5.00");
    }

    #[test]
    fn test_groups_keep_first_seen_order() {
        let records = vec![
            record("r1", "CSC201", 3, "2025/2026", Semester::First, None),
            record("r2", "CSC101", 3, "2024/2025", Semester::Second, None),
            record("r3", "CSC202", 2, "2025/2026", Semester::First, None),
        ];
        let transcript = aggregate(&records);

        let keys: Vec<_> = transcript
            .terms
            .iter()
            .map(|t| (t.session.as_str(), t.semester))
            .collect();
        assert_eq!(
            keys,
            vec![("2025/2026", Semester::First), ("2024/2025", Semester::Second)]
        );
        assert_eq!(transcript.terms[0].entries.len(), 2);
    }

    #[test]
    fn test_missing_result_is_displayed_but_not_computed() {
        let records = vec![
            record("r1", "CSC101", 3, "2024/2025", Semester::First, Some((65, ResultStatus::Approved))),
            record("r2", "CSC102", 4, "2024/2025", Semester::First, None),
        ];
        let transcript = aggregate(&records);
        let term = &transcript.terms[0];

        assert_eq!(term.entries.len(), 2);
        assert_eq!(term.total_credits, 3);
        assert_eq!(term.total_points, 12);
        assert_eq!(term.gpa.to_string(), "4.00");

        let pending = &term.entries[1];
        assert_eq!(pending.status, ResultStatus::Pending);
        assert_eq!(pending.score, None);
        assert_eq!(pending.grade, None);
        assert_eq!(pending.lecturer, None);
    }

    #[test]
    fn test_term_without_results_has_zero_gpa() {
        let records = vec![record("r1", "CSC101", 3, "2024/2025", Semester::First, None)];
        let transcript = aggregate(&records);
        assert_eq!(transcript.terms[0].gpa, Gpa::from_hundredths(0));
        assert_eq!(transcript.cgpa, Gpa::from_hundredths(0));
    }

    #[test]
    fn test_pending_results_count_towards_gpa() {
        let records = vec![record(
            "r1",
            "CSC101",
            2,
            "2024/2025",
            Semester::First,
            Some((55, ResultStatus::Pending)),
        )];
        let transcript = aggregate(&records);
        assert_eq!(transcript.total_credits, 2);
        assert_eq!(transcript.cgpa.to_string(), "3.00");
        assert_eq!(transcript.terms[0].entries[0].status, ResultStatus::Pending);
        assert_eq!(transcript.terms[0].entries[0].grade, Some(GradeLetter::C));
    }

    #[test]
    fn test_cgpa_is_credit_weighted_not_mean_of_gpas() {
        // Term 1: one A on 1 credit  → 5 / 1  = 5.00
        // Term 2: one C on 4 credits → 12 / 4 = 3.00
        // mean(5.00, 3.00) = 4.00, CGPA = 17 / 5 = 3.40
        let records = vec![
            record("r1", "CSC101", 1, "2024/2025", Semester::First, Some((75, ResultStatus::Approved))),
            record("r2", "CSC102", 4, "2024/2025", Semester::Second, Some((52, ResultStatus::Approved))),
        ];
        let transcript = aggregate(&records);

        let gpa1 = transcript.terms[0].gpa.hundredths();
        let gpa2 = transcript.terms[1].gpa.hundredths();
        assert_eq!((gpa1, gpa2), (500, 300));
        assert_eq!(transcript.cgpa.hundredths(), 340);
        assert_ne!(transcript.cgpa.hundredths(), (gpa1 + gpa2) / 2);
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let records = vec![
            record("r1", "CSC101", 3, "2024/2025", Semester::First, Some((72, ResultStatus::Approved))),
            record("r2", "CSC102", 2, "2024/2025", Semester::First, Some((48, ResultStatus::Pending))),
            record("r3", "CSC201", 3, "2025/2026", Semester::First, None),
        ];
        assert_eq!(aggregate(&records), aggregate(&records));
    }

    #[test]
    fn test_empty_history() {
        let transcript = aggregate(&[]);
        assert!(transcript.terms.is_empty());
        assert_eq!(transcript.cgpa.to_string(), "0.00");
    }
}
