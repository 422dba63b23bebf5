//! NAV history types, loading and windowing.
//!
//! Provides:
//! - Validated valuation series and fund candidates
//! - mfapi.in-style JSON document loading
//! - Lookback truncation and month-end resampling

pub mod loader;
pub mod types;
pub mod window;

pub use loader::{LoadedFund, LoaderError, NavLoader, NAV_DATE_FORMAT};
pub use types::{FundCandidate, PlanFilter, PlanType, ValuationPoint, ValuationSeries};
pub use window::{common_end_date, resample_month_end, Frequency, Lookback};
