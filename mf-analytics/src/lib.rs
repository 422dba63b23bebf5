pub mod analytics;
pub mod data;
pub mod error;
pub mod metrics;
pub mod validation;

// Re-export commonly used types
pub use analytics::{FundComparator, FundComparison, FundScreener, RankingResult, ScoringConfig, ScreenerConfig};
pub use data::{FundCandidate, Lookback, NavLoader, PlanFilter, PlanType, ValuationPoint, ValuationSeries};
pub use error::{ConfigError, DataError};
pub use metrics::{AnalysisConfig, MetricId, MetricValue, MetricsCalculator, MetricsRecord};
pub use validation::{IntegrityPolicy, SeriesValidator};
