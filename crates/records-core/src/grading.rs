//! # Grade Calculator
//!
//! Maps a score to a letter grade and grade points through an explicit,
//! ordered band table.
//!
//! ## Band Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Default five-point scale                                               │
//! │                                                                         │
//! │   lower bound   letter   points                                        │
//! │   ───────────   ──────   ──────                                        │
//! │      70.00        A        5                                           │
//! │      60.00        B        4                                           │
//! │      50.00        C        3                                           │
//! │      45.00        D        2                                           │
//! │      40.00        E        1                                           │
//! │   (anything below the last band)  F  0                                 │
//! │                                                                         │
//! │  Bands are scanned top-down; the first bound <= score wins.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Letter → points is fixed (A=5 .. F=0) because stored results keep only
//! the letter and GPA is computed from it. The cut points are configuration:
//! a deployment can load its own table with `GradeScale::new` or from JSON.
//!
//! ## Usage
//! ```rust
//! use records_core::grading::{GradeLetter, GradeScale};
//! use records_core::score::Score;
//!
//! let scale = GradeScale::default();
//! let grade = scale.grade_for(Score::from_whole(72));
//! assert_eq!(grade.letter, GradeLetter::A);
//! assert_eq!(grade.points, 5);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::score::Score;

// =============================================================================
// Grade Letter
// =============================================================================

/// Letter grade stored on a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
pub enum GradeLetter {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl GradeLetter {
    /// Grade points on the five-point scale.
    pub const fn points(&self) -> u8 {
        match self {
            GradeLetter::A => 5,
            GradeLetter::B => 4,
            GradeLetter::C => 3,
            GradeLetter::D => 2,
            GradeLetter::E => 1,
            GradeLetter::F => 0,
        }
    }

    /// Parses a stored letter; anything unknown is treated as F.
    pub fn from_stored(letter: &str) -> Self {
        match letter.trim() {
            "A" => GradeLetter::A,
            "B" => GradeLetter::B,
            "C" => GradeLetter::C,
            "D" => GradeLetter::D,
            "E" => GradeLetter::E,
            _ => GradeLetter::F,
        }
    }

    /// Returns the letter as text.
    pub const fn as_str(&self) -> &'static str {
        match self {
            GradeLetter::A => "A",
            GradeLetter::B => "B",
            GradeLetter::C => "C",
            GradeLetter::D => "D",
            GradeLetter::E => "E",
            GradeLetter::F => "F",
        }
    }
}

impl fmt::Display for GradeLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the grade calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Grade {
    pub letter: GradeLetter,
    pub points: u8,
}

impl From<GradeLetter> for Grade {
    fn from(letter: GradeLetter) -> Self {
        Grade {
            letter,
            points: letter.points(),
        }
    }
}

// =============================================================================
// Grade Scale
// =============================================================================

/// One row of the band table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GradeBand {
    /// Inclusive lower bound, in hundredths (7000 = 70.00).
    pub min_score: Score,
    pub letter: GradeLetter,
}

impl GradeBand {
    /// Creates a band from a whole-mark lower bound.
    pub const fn whole(min_marks: i64, letter: GradeLetter) -> Self {
        GradeBand {
            min_score: Score::from_whole(min_marks),
            letter,
        }
    }
}

/// Ordered band table, highest bound first.
///
/// ## Invariants (checked by `new`)
/// - at least one band
/// - bounds strictly descending
/// - points non-increasing from top to bottom
/// - no bound strictly between 0.00 and 1.00 (bounds are hundredths, so a
///   table written in whole marks like `70` is refused)
///
/// Together these make `grade_for(s).points` monotonic non-decreasing in `s`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<GradeBand>", into = "Vec<GradeBand>")]
pub struct GradeScale {
    bands: Vec<GradeBand>,
}

impl GradeScale {
    /// Builds a validated scale from bands listed highest first.
    pub fn new(bands: Vec<GradeBand>) -> CoreResult<Self> {
        if bands.is_empty() {
            return Err(CoreError::InvalidGradeScale(
                "at least one band is required".to_string(),
            ));
        }

        let one_mark = Score::from_whole(1);
        if let Some(band) = bands
            .iter()
            .find(|band| band.min_score > Score::from_hundredths(0) && band.min_score < one_mark)
        {
            return Err(CoreError::InvalidGradeScale(format!(
                "bound {} for {} is below one mark; min_score is in hundredths (7000 = 70.00)",
                band.min_score, band.letter
            )));
        }

        for pair in bands.windows(2) {
            let (upper, lower) = (pair[0], pair[1]);
            if lower.min_score >= upper.min_score {
                return Err(CoreError::InvalidGradeScale(format!(
                    "bounds must be strictly descending ({} listed after {})",
                    lower.min_score, upper.min_score
                )));
            }
            if lower.letter.points() > upper.letter.points() {
                return Err(CoreError::InvalidGradeScale(format!(
                    "{} below {} would award more points for a lower score",
                    lower.letter, upper.letter
                )));
            }
        }

        Ok(GradeScale { bands })
    }

    /// Parses a scale from a JSON array of bands.
    ///
    /// ## Example
    /// ```rust
    /// use records_core::grading::GradeScale;
    ///
    /// let scale = GradeScale::from_json(
    ///     r#"[{"min_score": 7000, "letter": "A"}, {"min_score": 5000, "letter": "C"}]"#,
    /// ).unwrap();
    /// assert_eq!(scale.bands().len(), 2);
    /// ```
    pub fn from_json(json: &str) -> CoreResult<Self> {
        serde_json::from_str(json).map_err(|e| CoreError::InvalidGradeScale(e.to_string()))
    }

    /// Returns the bands, highest first.
    pub fn bands(&self) -> &[GradeBand] {
        &self.bands
    }

    /// Maps a score to its grade.
    ///
    /// Not range-checked: 130 is an A, -5 is an F. Callers validate ranges.
    pub fn grade_for(&self, score: Score) -> Grade {
        self.bands
            .iter()
            .find(|band| score >= band.min_score)
            .map(|band| Grade::from(band.letter))
            .unwrap_or(Grade::from(GradeLetter::F))
    }

    /// Parses text input and grades it.
    ///
    /// ## Errors
    /// `CoreError::InvalidScore` when the input is not numeric.
    pub fn grade_for_input(&self, input: &str) -> CoreResult<Grade> {
        Ok(self.grade_for(Score::parse(input)?))
    }
}

impl Default for GradeScale {
    fn default() -> Self {
        GradeScale {
            bands: vec![
                GradeBand::whole(70, GradeLetter::A),
                GradeBand::whole(60, GradeLetter::B),
                GradeBand::whole(50, GradeLetter::C),
                GradeBand::whole(45, GradeLetter::D),
                GradeBand::whole(40, GradeLetter::E),
            ],
        }
    }
}

impl TryFrom<Vec<GradeBand>> for GradeScale {
    type Error = CoreError;

    fn try_from(bands: Vec<GradeBand>) -> Result<Self, Self::Error> {
        GradeScale::new(bands)
    }
}

impl From<GradeScale> for Vec<GradeBand> {
    fn from(scale: GradeScale) -> Self {
        scale.bands
    }
}

/// Grades a score with the default scale.
pub fn grade_for(score: Score) -> Grade {
    GradeScale::default().grade_for(score)
}

// =============================================================================
// Unit Tests
// =============================================================================
