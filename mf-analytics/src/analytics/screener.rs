//! Fund screening and ranking.
//!
//! Ranks a set of candidate funds by a weighted composite of their metrics:
//! - Plan filter (growth / IDCW / both)
//! - Per-fund validation under the configured integrity policy
//! - Trailing lookback aligned to the common end date
//! - Min-max normalization per weighted metric, oriented so higher is better
//! - Deterministic ordering: score descending, then fund id ascending

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::data::{common_end_date, FundCandidate, Frequency, Lookback, PlanFilter, PlanType};
use crate::error::{ConfigError, ConfigResult, DataError};
use crate::metrics::stats::is_effectively_zero;
use crate::metrics::{AnalysisConfig, MetricId, MetricValue, MetricsCalculator, MetricsRecord};
use crate::validation::SeriesValidator;

/// Trailing years screened when no lookback is configured.
pub const DEFAULT_SCREENING_YEARS: u32 = 5;

/// Number of funds returned when no limit is configured.
pub const DEFAULT_TOP_N: usize = 5;

/// Non-negative weights per metric for the composite score.
///
/// Serialized as a map from metric key to weight, e.g.
/// `{"sharpe_ratio": 0.4, "annual_return": 0.3}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct ScoringConfig {
    weights: BTreeMap<MetricId, f64>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: BTreeMap::from([
                (MetricId::SharpeRatio, 0.4),
                (MetricId::AnnualReturn, 0.3),
                (MetricId::SortinoRatio, 0.2),
                (MetricId::CalmarRatio, 0.1),
            ]),
        }
    }
}

impl ScoringConfig {
    pub fn new<I>(weights: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = (MetricId, f64)>,
    {
        let config = Self {
            weights: weights.into_iter().collect(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Build from metric names; unknown names are rejected.
    pub fn from_named<I, S>(weights: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let parsed = weights
            .into_iter()
            .map(|(name, w)| name.as_ref().parse::<MetricId>().map(|id| (id, w)))
            .collect::<ConfigResult<Vec<_>>>()?;
        Self::new(parsed)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        for (id, weight) in &self.weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    metric: id.key().to_string(),
                    weight: *weight,
                });
            }
        }
        if !self.weights.values().any(|w| *w > 0.0) {
            return Err(ConfigError::EmptyScoring);
        }
        Ok(())
    }

    pub fn weight(&self, id: MetricId) -> f64 {
        self.weights.get(&id).copied().unwrap_or(0.0)
    }

    /// Metrics with a positive weight, in key order.
    pub fn weights(&self) -> impl Iterator<Item = (MetricId, f64)> + '_ {
        self.weights
            .iter()
            .filter(|(_, w)| **w > 0.0)
            .map(|(id, w)| (*id, *w))
    }
}

impl TryFrom<BTreeMap<String, f64>> for ScoringConfig {
    type Error = ConfigError;

    fn try_from(weights: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        Self::from_named(weights)
    }
}

impl From<ScoringConfig> for BTreeMap<String, f64> {
    fn from(config: ScoringConfig) -> Self {
        config
            .weights
            .into_iter()
            .map(|(id, w)| (id.key().to_string(), w))
            .collect()
    }
}

fn default_lookback() -> Lookback {
    Lookback::Years(DEFAULT_SCREENING_YEARS)
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

/// Configuration for fund screening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenerConfig {
    /// Plan types admitted to the ranking.
    #[serde(default)]
    pub plan_filter: PlanFilter,
    /// Metric weights of the composite score.
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// Trailing window ending at the common end date.
    #[serde(default = "default_lookback")]
    pub lookback: Lookback,
    /// Maximum number of ranked entries returned.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Risk-free rate, annualization factor and integrity policy.
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Resampling applied after truncation. `month_end` also fixes the
    /// annualization factor at 12.
    #[serde(default)]
    pub frequency: Frequency,
    /// Funds with fewer return periods in the window are excluded.
    #[serde(default)]
    pub min_return_periods: Option<usize>,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            plan_filter: PlanFilter::Both,
            scoring: ScoringConfig::default(),
            lookback: default_lookback(),
            top_n: DEFAULT_TOP_N,
            analysis: AnalysisConfig::default(),
            frequency: Frequency::Daily,
            min_return_periods: None,
        }
    }
}

impl ScreenerConfig {
    /// Month-end screening over `years`, requiring at least ten months of
    /// returns per screened year.
    pub fn monthly(years: u32) -> Self {
        Self {
            lookback: Lookback::Years(years),
            analysis: AnalysisConfig {
                periods_per_year: Frequency::MonthEnd.periods_per_year(),
                ..AnalysisConfig::default()
            },
            frequency: Frequency::MonthEnd,
            min_return_periods: Some(years as usize * 10),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.top_n == 0 {
            return Err(ConfigError::InvalidTopN);
        }
        self.scoring.validate()?;
        self.analysis.validate()
    }
}

/// Why a candidate did not make it into the ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExclusionReason {
    InvalidSeries { error: String },
    NoDefinedMetrics,
    InsufficientHistory { required: usize, available: usize },
}

impl From<DataError> for ExclusionReason {
    fn from(err: DataError) -> Self {
        Self::InvalidSeries {
            error: err.to_string(),
        }
    }
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSeries { error } => write!(f, "invalid series: {}", error),
            Self::NoDefinedMetrics => f.write_str("no metric could be computed in the window"),
            Self::InsufficientHistory { required, available } => write!(
                f,
                "insufficient history: {} return periods, {} required",
                available, required
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningDiagnostic {
    pub fund_id: String,
    pub reason: ExclusionReason,
}

/// One ranked fund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    /// 1-based position.
    pub rank: usize,
    pub fund_id: String,
    pub name: Option<String>,
    pub plan: PlanType,
    pub composite_score: f64,
    /// Normalized [0, 1] value of each weighted metric.
    pub normalized: BTreeMap<MetricId, MetricValue>,
    pub metrics: MetricsRecord,
}

/// Outcome of a screening pass.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RankingResult {
    pub entries: Vec<RankedEntry>,
    pub excluded: Vec<ScreeningDiagnostic>,
    /// Candidates left after the plan filter.
    pub candidates_considered: usize,
    pub common_end_date: Option<NaiveDate>,
}

impl RankingResult {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top(&self) -> Option<&RankedEntry> {
        self.entries.first()
    }

    /// Generate a text ranking table.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Fund Ranking (as of {})\n",
            self.common_end_date
                .map_or_else(|| "-".to_string(), |d| d.to_string())
        );
        out.push_str(&format!(
            "{:<5} {:<12} {:>8} {:>10} {:>10} {:>10}  {}\n",
            "Rank", "Fund", "Score", "Return %", "Sharpe", "Max DD %", "Name"
        ));
        for entry in &self.entries {
            out.push_str(&format!(
                "{:<5} {:<12} {:>8.4} {:>10} {:>10} {:>10}  {}\n",
                entry.rank,
                entry.fund_id,
                entry.composite_score,
                entry.metrics.get(MetricId::AnnualReturn).to_string(),
                entry.metrics.get(MetricId::SharpeRatio).to_string(),
                entry.metrics.get(MetricId::MaxDrawdown).to_string(),
                entry.name.as_deref().unwrap_or("")
            ));
        }
        for diag in &self.excluded {
            out.push_str(&format!("excluded {}: {}\n", diag.fund_id, diag.reason));
        }
        out.push_str(&format!(
            "{} ranked of {} considered",
            self.entries.len(),
            self.candidates_considered
        ));
        out
    }
}

/// Composite score of one record plus its normalized components.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeScore {
    pub score: f64,
    pub normalized: BTreeMap<MetricId, MetricValue>,
}

/// Score every record against the others in the set.
///
/// Each weighted metric is oriented so higher is better, then min-max
/// normalized over the records where it is defined. When all defined values
/// are equal each defined record gets 1.0. Undefined values contribute 0.
pub fn composite_scores(scoring: &ScoringConfig, records: &[&MetricsRecord]) -> Vec<CompositeScore> {
    let mut scores: Vec<CompositeScore> = records
        .iter()
        .map(|_| CompositeScore {
            score: 0.0,
            normalized: BTreeMap::new(),
        })
        .collect();

    for (id, weight) in scoring.weights() {
        let oriented: Vec<Option<f64>> = records
            .iter()
            .map(|r| r.get(id).value().map(|v| id.preference().orient(v)))
            .collect();

        let defined = oriented.iter().flatten();
        let lo = defined.clone().copied().fold(f64::INFINITY, f64::min);
        let hi = defined.copied().fold(f64::NEG_INFINITY, f64::max);
        let range = hi - lo;

        for (slot, value) in scores.iter_mut().zip(&oriented) {
            let normalized = value.map(|v| {
                if is_effectively_zero(range) {
                    1.0
                } else {
                    (v - lo) / range
                }
            });
            slot.score += weight * normalized.unwrap_or(0.0);
            slot.normalized.insert(id, normalized.into());
        }
    }

    scores
}

/// Screens and ranks funds.
pub struct FundScreener {
    config: ScreenerConfig,
}

impl FundScreener {
    pub fn new(config: ScreenerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScreenerConfig {
        &self.config
    }

    /// Rank `candidates` by composite score.
    ///
    /// Configuration problems fail the whole call. Per-fund data problems
    /// exclude that fund and are reported in [`RankingResult::excluded`].
    pub fn rank(&self, candidates: &[FundCandidate]) -> ConfigResult<RankingResult> {
        self.config.validate()?;

        let mut seen = HashSet::new();
        for candidate in candidates {
            if !seen.insert(candidate.id.as_str()) {
                return Err(ConfigError::DuplicateCandidate(candidate.id.clone()));
            }
        }

        let filtered: Vec<&FundCandidate> = candidates
            .iter()
            .filter(|c| self.config.plan_filter.accepts(c.plan))
            .collect();
        info!(
            "Plan filter {:?}: {} of {} candidates",
            self.config.plan_filter,
            filtered.len(),
            candidates.len()
        );

        if filtered.is_empty() {
            return Ok(RankingResult::default());
        }

        let validator = SeriesValidator::new(self.config.analysis.integrity);
        let prepared: Vec<_> = filtered
            .par_iter()
            .map(|c| validator.prepare(c.points.clone()))
            .collect();

        // A single valuation has no returns, so it cannot pull the window back
        let end_date = common_end_date(
            prepared
                .iter()
                .filter_map(|p| p.as_ref().ok())
                .map(|p| &p.series)
                .filter(|s| s.len() >= 2),
        );
        info!(
            "Screening window: {} ending {}",
            self.config.lookback.describe(),
            end_date.map_or_else(|| "-".to_string(), |d| d.to_string())
        );

        let analysis = &self.config.analysis;
        let outcomes: Vec<Result<MetricsRecord, ExclusionReason>> = prepared
            .into_par_iter()
            .map(|result| {
                let record = MetricsCalculator::compute_window(
                    result?,
                    end_date,
                    self.config.lookback,
                    self.config.frequency,
                    analysis,
                );
                self.check_record(&record)?;
                Ok(record)
            })
            .collect();

        let mut excluded = Vec::new();
        let mut analyzed: Vec<(&FundCandidate, MetricsRecord)> = Vec::new();
        for (candidate, outcome) in filtered.iter().zip(outcomes) {
            match outcome {
                Ok(record) => analyzed.push((*candidate, record)),
                Err(reason) => {
                    warn!("Excluding {}: {}", candidate.id, reason);
                    excluded.push(ScreeningDiagnostic {
                        fund_id: candidate.id.clone(),
                        reason,
                    });
                }
            }
        }
        info!(
            "Analyzed {} funds, excluded {}",
            analyzed.len(),
            excluded.len()
        );

        let records: Vec<&MetricsRecord> = analyzed.iter().map(|(_, r)| r).collect();
        let scores = composite_scores(&self.config.scoring, &records);

        let mut entries: Vec<RankedEntry> = analyzed
            .into_iter()
            .zip(scores)
            .map(|((candidate, metrics), score)| RankedEntry {
                rank: 0,
                fund_id: candidate.id.clone(),
                name: candidate.name.clone(),
                plan: candidate.plan,
                composite_score: score.score,
                normalized: score.normalized,
                metrics,
            })
            .collect();

        entries.sort_by(|a, b| {
            b.composite_score
                .total_cmp(&a.composite_score)
                .then_with(|| a.fund_id.cmp(&b.fund_id))
        });
        entries.truncate(self.config.top_n);
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.rank = i + 1;
        }

        Ok(RankingResult {
            entries,
            excluded,
            candidates_considered: filtered.len(),
            common_end_date: end_date,
        })
    }

    fn check_record(&self, record: &MetricsRecord) -> Result<(), ExclusionReason> {
        if record.is_insufficient() {
            return Err(ExclusionReason::NoDefinedMetrics);
        }
        if let Some(required) = self.config.min_return_periods {
            if record.return_periods < required {
                return Err(ExclusionReason::InsufficientHistory {
                    required,
                    available: record.return_periods,
                });
            }
        }
        Ok(())
    }
}
