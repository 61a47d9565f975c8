//! # Score Module
//!
//! Provides the `Score` type for examination scores.
//!
//! ## Why Fixed-Point Scores?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Results are stored as DECIMAL(5,2): 69.99 must stay 69.99, because    │
//! │  69.99 is a B and 70.00 is an A.                                        │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    69.995 may be stored as 69.99499999... or 69.99500000...  ❌        │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Hundredths                                       │
//! │    72.50 → 7250, compared against band bounds in hundredths            │
//! │    Grade boundaries are exact integer comparisons                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use records_core::score::Score;
//!
//! let score = Score::parse("72.5").unwrap();
//! assert_eq!(score.hundredths(), 7250);
//! assert_eq!(score.to_string(), "72.50");
//!
//! assert!(Score::parse("seventy").is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

/// Largest magnitude accepted from text or float input (in hundredths).
const MAX_ABS_HUNDREDTHS: i64 = 1_000_000_000_000;

// =============================================================================
// Score Type
// =============================================================================

/// An examination score in hundredths of a mark.
///
/// ## Design Decisions
/// - **i64 (signed)**: the grade calculator itself is not range-bound;
///   range checks (0 - 100) happen where results are submitted
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Ord**: scores compare directly against pass marks and band bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Score(i64);

impl Score {
    /// Creates a score from hundredths of a mark.
    ///
    /// ## Example
    /// ```rust
    /// use records_core::score::Score;
    ///
    /// let score = Score::from_hundredths(6999); // 69.99
    /// assert_eq!(score.whole(), 69);
    /// ```
    #[inline]
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Score(hundredths)
    }

    /// Creates a score from a whole number of marks.
    #[inline]
    pub const fn from_whole(marks: i64) -> Self {
        Score(marks * 100)
    }

    /// Returns the value in hundredths.
    #[inline]
    pub const fn hundredths(&self) -> i64 {
        self.0
    }

    /// Returns the whole-mark portion (truncated toward zero).
    #[inline]
    pub const fn whole(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the fractional portion in hundredths (always 0-99).
    #[inline]
    pub const fn fraction_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns the score as a float (for display only).
    #[inline]
    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Parses a decimal score from text input.
    ///
    /// ## Rules
    /// - Optional sign, at least one integer digit
    /// - Optional fraction with one or two digits (DECIMAL(5,2) semantics)
    /// - Surrounding whitespace is ignored
    ///
    /// ## Errors
    /// `CoreError::InvalidScore` for anything that is not such a number.
    ///
    /// ## Example
    /// ```rust
    /// use records_core::score::Score;
    ///
    /// assert_eq!(Score::parse("72").unwrap().hundredths(), 7200);
    /// assert_eq!(Score::parse(" 39.5 ").unwrap().hundredths(), 3950);
    /// assert!(Score::parse("72.125").is_err());
    /// assert!(Score::parse("").is_err());
    /// ```
    pub fn parse(input: &str) -> CoreResult<Self> {
        let text = input.trim();
        let (negative, unsigned) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };

        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (unsigned, None),
        };

        if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::invalid_score(input, "not a decimal number"));
        }

        let mut hundredths: i64 = 0;
        for digit in int_part.bytes() {
            hundredths = hundredths
                .checked_mul(10)
                .and_then(|v| v.checked_add(i64::from(digit - b'0')))
                .filter(|v| *v <= MAX_ABS_HUNDREDTHS)
                .ok_or_else(|| CoreError::invalid_score(input, "value is too large"))?;
        }
        hundredths *= 100;

        if let Some(frac) = frac_part {
            if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
                return Err(CoreError::invalid_score(input, "not a decimal number"));
            }
            if frac.len() > 2 {
                return Err(CoreError::invalid_score(
                    input,
                    "at most two decimal places are allowed",
                ));
            }
            let mut fraction: i64 = frac.bytes().map(|b| i64::from(b - b'0')).fold(0, |acc, d| acc * 10 + d);
            if frac.len() == 1 {
                fraction *= 10;
            }
            hundredths += fraction;
        }

        Ok(Score(if negative { -hundredths } else { hundredths }))
    }

    /// Converts a float score, rounding to the nearest hundredth.
    ///
    /// ## Errors
    /// `CoreError::InvalidScore` for NaN, infinities and absurd magnitudes.
    pub fn try_from_f64(value: f64) -> CoreResult<Self> {
        if !value.is_finite() {
            return Err(CoreError::invalid_score(value.to_string(), "not a finite number"));
        }

        let scaled = (value * 100.0).round();
        if scaled.abs() > MAX_ABS_HUNDREDTHS as f64 {
            return Err(CoreError::invalid_score(value.to_string(), "value is too large"));
        }

        Ok(Score(scaled as i64))
    }

    /// Checks whether the score lies within `[min, max]` inclusive.
    #[inline]
    pub fn is_within(&self, min: Score, max: Score) -> bool {
        *self >= min && *self <= max
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.whole().abs(), self.fraction_part())
    }
}

impl std::str::FromStr for Score {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Score::parse(s)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
