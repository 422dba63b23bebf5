//! Analysis windows and resampling.
//!
//! Lookbacks use calendar arithmetic (a 5 year window ending 2024-03-15
//! starts on 2019-03-15). Month arithmetic clamps to the last valid day, so
//! 2024-02-29 minus one year is 2023-02-28.

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::types::{ValuationPoint, ValuationSeries};

/// Trailing window length ending at the analysis end date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lookback {
    /// Whole available history.
    #[default]
    Full,
    Days(u32),
    Months(u32),
    Years(u32),
}

impl Lookback {
    /// First date inside the window ending at `end`, or `None` for no lower bound.
    pub fn start_for(&self, end: NaiveDate) -> Option<NaiveDate> {
        match *self {
            Self::Full => None,
            Self::Days(days) => end.checked_sub_signed(Duration::days(days as i64)),
            Self::Months(months) => end.checked_sub_months(Months::new(months)),
            Self::Years(years) => end.checked_sub_months(Months::new(years.saturating_mul(12))),
        }
    }

    /// Truncate `series` to this window ending at `end` (inclusive on both sides).
    pub fn apply(&self, series: &ValuationSeries, end: NaiveDate) -> ValuationSeries {
        series.between(self.start_for(end), end)
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Full => "Full History".to_string(),
            Self::Days(d) => format!("{} Day(s)", d),
            Self::Months(m) => format!("{} Month(s)", m),
            Self::Years(y) => format!("{} Year(s)", y),
        }
    }
}

/// Sampling frequency fed to the metrics engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// Use every observation as given.
    #[default]
    Daily,
    /// Keep the last observation of each calendar month.
    MonthEnd,
}

impl Frequency {
    /// Parse `daily` or `month-end` (`month_end` and `monthly` also accepted).
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "daily" => Some(Self::Daily),
            "month-end" | "month_end" | "monthly" => Some(Self::MonthEnd),
            _ => None,
        }
    }

    pub fn apply(&self, series: &ValuationSeries) -> ValuationSeries {
        match self {
            Self::Daily => series.clone(),
            Self::MonthEnd => resample_month_end(series),
        }
    }

    /// Conventional annualization factor for this frequency.
    pub fn periods_per_year(&self) -> u32 {
        match self {
            Self::Daily => 252,
            Self::MonthEnd => 12,
        }
    }
}

/// Last available valuation of every calendar month.
///
/// A month with no valuation between two observed months carries the
/// previous value forward, dated at that month's last day, so it yields a
/// zero return instead of disappearing from the monthly grid.
pub fn resample_month_end(series: &ValuationSeries) -> ValuationSeries {
    let mut points: Vec<ValuationPoint> = Vec::new();

    for point in series.points() {
        let current = month_start(point.date);
        match points.last().copied() {
            Some(prev) if month_start(prev.date) == current => {
                if let Some(last) = points.last_mut() {
                    *last = *point;
                }
            }
            Some(prev) => {
                let mut month = next_month(month_start(prev.date));
                while let Some(start) = month.filter(|m| *m < current) {
                    if let Some(end) = next_month(start).and_then(|d| d.pred_opt()) {
                        points.push(ValuationPoint::new(end, prev.value));
                    }
                    month = next_month(start);
                }
                points.push(*point);
            }
            None => points.push(*point),
        }
    }

    ValuationSeries::from_checked(points)
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

fn next_month(start: NaiveDate) -> Option<NaiveDate> {
    start.checked_add_months(Months::new(1))
}

/// Latest date every series has reached: the minimum of their end dates.
///
/// Empty series are ignored. Returns `None` when no series has data.
pub fn common_end_date<'a, I>(series: I) -> Option<NaiveDate>
where
    I: IntoIterator<Item = &'a ValuationSeries>,
{
    series.into_iter().filter_map(|s| s.end_date()).min()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn series(points: &[(NaiveDate, f64)]) -> ValuationSeries {
        ValuationSeries::new(
            points
                .iter()
                .map(|(d, v)| ValuationPoint::new(*d, *v))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_lookback_start() {
        let end = ymd(2024, 3, 15);
        assert_eq!(Lookback::Full.start_for(end), None);
        assert_eq!(Lookback::Days(10).start_for(end), Some(ymd(2024, 3, 5)));
        assert_eq!(Lookback::Months(2).start_for(end), Some(ymd(2024, 1, 15)));
        assert_eq!(Lookback::Years(5).start_for(end), Some(ymd(2019, 3, 15)));
        // Leap day clamps
        assert_eq!(
            Lookback::Years(1).start_for(ymd(2024, 2, 29)),
            Some(ymd(2023, 2, 28))
        );
    }

    #[test]
    fn test_lookback_apply_inclusive() {
        let s = series(&[
            (ymd(2023, 12, 31), 9.0),
            (ymd(2024, 1, 1), 10.0),
            (ymd(2024, 6, 1), 11.0),
            (ymd(2025, 1, 1), 12.0),
            (ymd(2025, 2, 1), 13.0),
        ]);
        let window = Lookback::Years(1).apply(&s, ymd(2025, 1, 1));
        assert_eq!(window.start_date(), Some(ymd(2024, 1, 1)));
        assert_eq!(window.end_date(), Some(ymd(2025, 1, 1)));
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn test_resample_month_end_keeps_last() {
        let s = series(&[
            (ymd(2024, 1, 2), 10.0),
            (ymd(2024, 1, 31), 11.0),
            (ymd(2024, 2, 1), 12.0),
            (ymd(2024, 2, 28), 13.0),
            (ymd(2024, 4, 3), 14.0),
        ]);
        let monthly = resample_month_end(&s);
        assert_eq!(monthly.values(), vec![11.0, 13.0, 13.0, 14.0]);
        assert_eq!(monthly.points()[2].date, ymd(2024, 3, 31));
        assert_eq!(monthly.end_date(), Some(ymd(2024, 4, 3)));
    }

    #[test]
    fn test_resample_fills_several_missing_months() {
        let s = series(&[
            (ymd(2023, 11, 15), 10.0),
            (ymd(2024, 3, 1), 12.0),
        ]);
        let monthly = resample_month_end(&s);
        let dates: Vec<NaiveDate> = monthly.points().iter().map(|p| p.date).collect();
        assert_eq!(
            dates,
            vec![
                ymd(2023, 11, 15),
                ymd(2023, 12, 31),
                ymd(2024, 1, 31),
                ymd(2024, 2, 29),
                ymd(2024, 3, 1),
            ]
        );
        assert_eq!(monthly.values(), vec![10.0, 10.0, 10.0, 10.0, 12.0]);
    }

    #[test]
    fn test_frequency_names() {
        assert_eq!(Frequency::from_name("daily"), Some(Frequency::Daily));
        assert_eq!(Frequency::from_name("Month-End"), Some(Frequency::MonthEnd));
        assert_eq!(Frequency::from_name("monthly"), Some(Frequency::MonthEnd));
        assert_eq!(Frequency::from_name("weekly"), None);
    }

    #[test]
    fn test_common_end_date() {
        let a = series(&[(ymd(2024, 1, 1), 1.0), (ymd(2024, 5, 1), 1.0)]);
        let b = series(&[(ymd(2024, 1, 1), 1.0), (ymd(2024, 4, 1), 1.0)]);
        let empty = ValuationSeries::empty();
        assert_eq!(common_end_date([&a, &b, &empty]), Some(ymd(2024, 4, 1)));
        assert_eq!(common_end_date([&empty]), None);
    }
}
