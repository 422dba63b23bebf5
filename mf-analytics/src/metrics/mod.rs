//! Performance metrics module.
//!
//! Provides the per-series calculations used by screening and comparison:
//! - Total, annualized and cumulative return
//! - Volatility and downside deviation
//! - Sharpe, Sortino and Calmar ratios
//! - Maximum drawdown with peak, trough and recovery dates
//! - VaR, CVaR, skewness, kurtosis, stability and tail ratio

pub mod calculator;
pub mod record;
pub mod stats;

pub use calculator::{
    AnalysisConfig, DrawdownAnalysis, MetricsCalculator, DEFAULT_PERIODS_PER_YEAR,
    DEFAULT_RISK_FREE_RATE,
};
pub use record::{AnalysisWindow, MetricId, MetricUnit, MetricValue, MetricsRecord, Preference};
