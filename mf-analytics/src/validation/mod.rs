//! Input validation for valuation histories.
//!
//! Provides:
//! - Date order and uniqueness checks
//! - Value validity checks (finite, positive)
//! - Strict rejection or tolerant repair with a per-series report

pub mod series_integrity;

pub use series_integrity::{
    CheckResult, IntegrityPolicy, PreparedSeries, SeriesIntegrityReport, SeriesValidator,
};
