//! Integrity checks for raw NAV histories.
//!
//! Validates:
//! - Date order (ascending)
//! - Date uniqueness (one valuation per date)
//! - Value validity (finite and > 0)
//!
//! Under [`IntegrityPolicy::Strict`] the first violation becomes a
//! [`DataError`]. Under [`IntegrityPolicy::Tolerant`] the series is repaired:
//! stable-sorted by date, invalid values dropped, and duplicates dropped
//! keeping the first occurrence. Every repair is counted in the report.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::data::{ValuationPoint, ValuationSeries};
use crate::error::DataResult;

/// How malformed input is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityPolicy {
    /// Reject with a `DataError`.
    #[default]
    Strict,
    /// Repair and report.
    Tolerant,
}

/// Result of a single validation check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
}

impl CheckResult {
    pub fn pass(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            message: message.to_string(),
            details: None,
        }
    }

    pub fn fail(name: &str, message: &str, details: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            message: message.to_string(),
            details,
        }
    }
}

/// What the validator found and, in tolerant mode, what it dropped.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeriesIntegrityReport {
    pub input_points: usize,
    pub kept_points: usize,
    /// Points whose date was earlier than the one before them.
    pub out_of_order: usize,
    pub duplicates_dropped: usize,
    pub non_positive_dropped: usize,
    pub non_finite_dropped: usize,
    pub checks: Vec<CheckResult>,
}

impl SeriesIntegrityReport {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failed_checks(&self) -> Vec<&CheckResult> {
        self.checks.iter().filter(|c| !c.passed).collect()
    }

    pub fn dropped(&self) -> usize {
        self.duplicates_dropped + self.non_positive_dropped + self.non_finite_dropped
    }

    pub fn summary(&self) -> String {
        let passed = self.checks.iter().filter(|c| c.passed).count();
        format!(
            "{} of {} points kept ({} duplicate, {} non-positive, {} non-finite dropped; {} out of order): {}/{} checks passed",
            self.kept_points,
            self.input_points,
            self.duplicates_dropped,
            self.non_positive_dropped,
            self.non_finite_dropped,
            self.out_of_order,
            passed,
            self.checks.len()
        )
    }
}

/// A validated series plus the report from tolerant repair, if any.
#[derive(Debug, Clone)]
pub struct PreparedSeries {
    pub series: ValuationSeries,
    pub report: Option<SeriesIntegrityReport>,
}

/// Applies an [`IntegrityPolicy`] to raw valuation points.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeriesValidator {
    policy: IntegrityPolicy,
}

impl SeriesValidator {
    pub fn new(policy: IntegrityPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> IntegrityPolicy {
        self.policy
    }

    /// Validate (strict) or repair (tolerant) `points` into a series.
    pub fn prepare(&self, points: Vec<ValuationPoint>) -> DataResult<PreparedSeries> {
        match self.policy {
            IntegrityPolicy::Strict => Ok(PreparedSeries {
                series: ValuationSeries::new(points)?,
                report: None,
            }),
            IntegrityPolicy::Tolerant => {
                let (series, report) = Self::sanitize(points);
                if !report.all_passed() {
                    warn!("Sanitized valuation series: {}", report.summary());
                }
                Ok(PreparedSeries {
                    series,
                    report: Some(report),
                })
            }
        }
    }

    /// Run every check without modifying the input.
    pub fn inspect(points: &[ValuationPoint]) -> SeriesIntegrityReport {
        let out_of_order = points
            .windows(2)
            .filter(|w| w[1].date < w[0].date)
            .count();
        let non_finite = points.iter().filter(|p| !p.value.is_finite()).count();
        let non_positive = points
            .iter()
            .filter(|p| p.value.is_finite() && p.value <= 0.0)
            .count();

        let mut seen = HashSet::new();
        let duplicates = points
            .iter()
            .filter(|p| p.value.is_finite() && p.value > 0.0)
            .filter(|p| !seen.insert(p.date))
            .count();

        let kept = points.len() - non_finite - non_positive - duplicates;

        SeriesIntegrityReport {
            input_points: points.len(),
            kept_points: kept,
            out_of_order,
            duplicates_dropped: duplicates,
            non_positive_dropped: non_positive,
            non_finite_dropped: non_finite,
            checks: vec![
                Self::check_date_order(out_of_order),
                Self::check_unique_dates(duplicates),
                Self::check_positive_values(non_positive),
                Self::check_finite_values(non_finite),
            ],
        }
    }

    /// Repair `points` into a valid series.
    pub fn sanitize(points: Vec<ValuationPoint>) -> (ValuationSeries, SeriesIntegrityReport) {
        let report = Self::inspect(&points);

        let mut valid: Vec<ValuationPoint> = points
            .into_iter()
            .filter(|p| p.value.is_finite() && p.value > 0.0)
            .collect();
        // Stable sort keeps the first occurrence of each date in front.
        valid.sort_by_key(|p| p.date);
        valid.dedup_by_key(|p| p.date);

        debug_assert_eq!(valid.len(), report.kept_points);
        (ValuationSeries::from_checked(valid), report)
    }

    fn check_date_order(out_of_order: usize) -> CheckResult {
        if out_of_order == 0 {
            CheckResult::pass("date_order", "Dates ascending")
        } else {
            CheckResult::fail(
                "date_order",
                &format!("{} points out of order", out_of_order),
                None,
            )
        }
    }

    fn check_unique_dates(duplicates: usize) -> CheckResult {
        if duplicates == 0 {
            CheckResult::pass("unique_dates", "One valuation per date")
        } else {
            CheckResult::fail(
                "unique_dates",
                &format!("{} duplicate dates", duplicates),
                Some("kept first occurrence".to_string()),
            )
        }
    }

    fn check_positive_values(non_positive: usize) -> CheckResult {
        if non_positive == 0 {
            CheckResult::pass("positive_values", "All valuations > 0")
        } else {
            CheckResult::fail(
                "positive_values",
                &format!("{} non-positive valuations", non_positive),
                None,
            )
        }
    }

    fn check_finite_values(non_finite: usize) -> CheckResult {
        if non_finite == 0 {
            CheckResult::pass("finite_values", "All valuations finite")
        } else {
            CheckResult::fail(
                "finite_values",
                &format!("{} non-finite valuations", non_finite),
                None,
            )
        }
    }
}
