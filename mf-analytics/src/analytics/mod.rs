//! Fund analytics module.
//!
//! Provides:
//! - Multi-fund screening and weighted ranking
//! - Head-to-head comparison with an efficiency score and recommendation

pub mod comparator;
pub mod screener;

pub use comparator::{
    Confidence, EfficiencyScore, FundComparator, FundComparison, InvestmentHorizon,
    MetricComparison, Recommendation, RecommendationReason, RiskProfile, TradeOff, Winner,
};
pub use screener::{
    composite_scores, CompositeScore, ExclusionReason, FundScreener, RankedEntry, RankingResult,
    ScoringConfig, ScreenerConfig, ScreeningDiagnostic, DEFAULT_SCREENING_YEARS, DEFAULT_TOP_N,
};
