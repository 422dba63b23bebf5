//! Error taxonomy shared by the metrics engine and the screener.
//!
//! `DataError` is about a single fund's input series and is recoverable by the
//! caller (skip the fund). `ConfigError` rejects a whole call before any work
//! is done. Statistically undefined results are not errors at all; they are
//! reported as [`crate::metrics::MetricValue::Undefined`].

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("Dates out of order at index {index}: {current} follows {previous}")]
    Unsorted {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("Duplicate valuation for {0}")]
    DuplicateDate(NaiveDate),

    #[error("Non-positive valuation {value} on {date}")]
    NonPositiveValue { date: NaiveDate, value: f64 },

    #[error("Non-finite valuation on {0}")]
    NonFiniteValue(NaiveDate),

    #[error("Data unavailable: {0}")]
    Unavailable(String),
}

pub type DataResult<T> = Result<T, DataError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("top_n must be at least 1")]
    InvalidTopN,

    #[error("Unknown metric name: {0}")]
    UnknownMetric(String),

    #[error("Weight for {metric} must be finite and non-negative, got {weight}")]
    InvalidWeight { metric: String, weight: f64 },

    #[error("Scoring config has no weighted metrics")]
    EmptyScoring,

    #[error("periods_per_year must be at least 1")]
    InvalidPeriodsPerYear,

    #[error("Risk-free rate must be finite, got {0}")]
    InvalidRiskFreeRate(f64),

    #[error("Duplicate candidate id: {0}")]
    DuplicateCandidate(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
