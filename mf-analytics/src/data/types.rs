//! Core data types for NAV analysis.
//!
//! A fund's history is a list of dated valuations. [`ValuationSeries`] is the
//! checked form: strictly increasing dates, one finite positive value per
//! date. Everything downstream of the validator works on that type only.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DataError, DataResult};

/// A single dated valuation (NAV per unit).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl ValuationPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Ordered, deduplicated valuation history.
///
/// Construction goes through [`ValuationSeries::new`], which rejects unsorted
/// dates, duplicate dates and non-positive values. Use
/// [`crate::validation::SeriesValidator`] for the tolerant path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ValuationPoint>", into = "Vec<ValuationPoint>")]
pub struct ValuationSeries {
    points: Vec<ValuationPoint>,
}

impl ValuationSeries {
    /// Build a series, rejecting anything that breaks the ordering or value invariants.
    pub fn new(points: Vec<ValuationPoint>) -> DataResult<Self> {
        for (index, point) in points.iter().enumerate() {
            if !point.value.is_finite() {
                return Err(DataError::NonFiniteValue(point.date));
            }
            if point.value <= 0.0 {
                return Err(DataError::NonPositiveValue {
                    date: point.date,
                    value: point.value,
                });
            }
            if index > 0 {
                let previous = points[index - 1].date;
                if point.date == previous {
                    return Err(DataError::DuplicateDate(point.date));
                }
                if point.date < previous {
                    return Err(DataError::Unsorted {
                        index,
                        previous,
                        current: point.date,
                    });
                }
            }
        }

        Ok(Self { points })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[ValuationPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&ValuationPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&ValuationPoint> {
        self.points.last()
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.first().map(|p| p.date)
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.last().map(|p| p.date)
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Simple period returns `v[i] / v[i-1] - 1`, one per adjacent pair.
    pub fn returns(&self) -> Vec<f64> {
        self.points
            .windows(2)
            .map(|w| w[1].value / w[0].value - 1.0)
            .collect()
    }

    /// Points with `start <= date <= end`.
    pub fn between(&self, start: Option<NaiveDate>, end: NaiveDate) -> Self {
        let points = self
            .points
            .iter()
            .filter(|p| p.date <= end && start.map_or(true, |s| p.date >= s))
            .copied()
            .collect();
        // A contiguous subrange keeps every invariant of the parent.
        Self { points }
    }

    pub(crate) fn from_checked(points: Vec<ValuationPoint>) -> Self {
        Self { points }
    }
}

impl TryFrom<Vec<ValuationPoint>> for ValuationSeries {
    type Error = DataError;

    fn try_from(points: Vec<ValuationPoint>) -> DataResult<Self> {
        Self::new(points)
    }
}

impl From<ValuationSeries> for Vec<ValuationPoint> {
    fn from(series: ValuationSeries) -> Self {
        series.points
    }
}

/// Plan variant of a fund scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    /// Gains reinvested.
    Growth,
    /// Income distribution cum capital withdrawal (payouts).
    Idcw,
    /// Name carries neither marker.
    Unclassified,
}

impl PlanType {
    /// Tag a scheme from its display name.
    ///
    /// `growth` wins over the IDCW markers when both appear, matching how
    /// scheme names such as "... Growth Option (formerly Dividend)" read.
    pub fn from_scheme_name(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.contains("growth") {
            Self::Growth
        } else if name.contains("idcw") || name.contains("dividend") {
            Self::Idcw
        } else {
            Self::Unclassified
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Growth => "growth",
            Self::Idcw => "idcw",
            Self::Unclassified => "unclassified",
        }
    }
}

/// Which plan types a screening pass keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanFilter {
    Growth,
    Idcw,
    #[default]
    Both,
}

impl PlanFilter {
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "growth" => Some(Self::Growth),
            "idcw" | "dividend" => Some(Self::Idcw),
            "both" | "all" => Some(Self::Both),
            _ => None,
        }
    }

    pub fn accepts(&self, plan: PlanType) -> bool {
        match self {
            Self::Both => true,
            Self::Growth => plan == PlanType::Growth,
            Self::Idcw => plan == PlanType::Idcw,
        }
    }
}

/// A fund offered to the screener: identity, plan tag and raw history.
///
/// The points are unvalidated; the screener applies the configured integrity
/// policy per candidate so one bad series does not abort the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundCandidate {
    /// Scheme code or any caller-chosen unique key.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    pub plan: PlanType,
    pub points: Vec<ValuationPoint>,
}

impl FundCandidate {
    pub fn new(id: impl Into<String>, plan: PlanType, points: Vec<ValuationPoint>) -> Self {
        Self {
            id: id.into(),
            name: None,
            plan,
            points,
        }
    }

    /// Candidate tagged from its scheme name.
    pub fn named(id: impl Into<String>, name: impl Into<String>, points: Vec<ValuationPoint>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            plan: PlanType::from_scheme_name(&name),
            name: Some(name),
            points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_series_accepts_sorted_positive() {
        let series = ValuationSeries::new(vec![
            ValuationPoint::new(date(1), 100.0),
            ValuationPoint::new(date(2), 110.0),
            ValuationPoint::new(date(4), 99.0),
        ])
        .unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.start_date(), Some(date(1)));
        assert_eq!(series.end_date(), Some(date(4)));
    }

    #[test]
    fn test_series_rejects_duplicate_date() {
        let err = ValuationSeries::new(vec![
            ValuationPoint::new(date(1), 100.0),
            ValuationPoint::new(date(1), 101.0),
        ])
        .unwrap_err();
        assert_eq!(err, DataError::DuplicateDate(date(1)));
    }

    #[test]
    fn test_series_rejects_unsorted() {
        let err = ValuationSeries::new(vec![
            ValuationPoint::new(date(3), 100.0),
            ValuationPoint::new(date(2), 101.0),
        ])
        .unwrap_err();
        assert!(matches!(err, DataError::Unsorted { index: 1, .. }));
    }

    #[test]
    fn test_series_rejects_non_positive() {
        let err = ValuationSeries::new(vec![ValuationPoint::new(date(1), 0.0)]).unwrap_err();
        assert!(matches!(err, DataError::NonPositiveValue { .. }));

        let err = ValuationSeries::new(vec![ValuationPoint::new(date(1), f64::NAN)]).unwrap_err();
        assert_eq!(err, DataError::NonFiniteValue(date(1)));
    }

    #[test]
    fn test_returns() {
        let series = ValuationSeries::new(vec![
            ValuationPoint::new(date(1), 100.0),
            ValuationPoint::new(date(2), 110.0),
            ValuationPoint::new(date(3), 99.0),
        ])
        .unwrap();
        let returns = series.returns();
        assert_eq!(returns.len(), 2);
        assert!((returns[0] - 0.10).abs() < 1e-12);
        assert!((returns[1] + 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_series_deserialize_validates() {
        let ok: ValuationSeries =
            serde_json::from_str(r#"[{"date":"2024-01-01","value":10.0},{"date":"2024-01-02","value":11.0}]"#)
                .unwrap();
        assert_eq!(ok.len(), 2);

        let bad = serde_json::from_str::<ValuationSeries>(
            r#"[{"date":"2024-01-02","value":10.0},{"date":"2024-01-01","value":11.0}]"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_plan_type_from_name() {
        assert_eq!(
            PlanType::from_scheme_name("Axis Bluechip Fund - Direct Plan - Growth"),
            PlanType::Growth
        );
        assert_eq!(
            PlanType::from_scheme_name("HDFC Top 100 Fund - IDCW Option"),
            PlanType::Idcw
        );
        assert_eq!(
            PlanType::from_scheme_name("SBI Bluechip Fund - Dividend"),
            PlanType::Idcw
        );
        assert_eq!(
            PlanType::from_scheme_name("Some Index Fund"),
            PlanType::Unclassified
        );
    }

    #[test]
    fn test_plan_filter_accepts() {
        assert!(PlanFilter::Both.accepts(PlanType::Unclassified));
        assert!(PlanFilter::Growth.accepts(PlanType::Growth));
        assert!(!PlanFilter::Growth.accepts(PlanType::Idcw));
        assert!(!PlanFilter::Idcw.accepts(PlanType::Unclassified));
        assert_eq!(PlanFilter::from_name("IDCW"), Some(PlanFilter::Idcw));
        assert_eq!(PlanFilter::from_name("weekly"), None);
    }
}
