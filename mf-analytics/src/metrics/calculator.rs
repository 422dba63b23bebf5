//! Performance metrics calculator.
//!
//! Turns a valuation series into the full [`MetricsRecord`]. The calculator
//! is a pure function of its inputs: nothing is cached and nothing global is
//! read, so separate series can be computed concurrently.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::record::{AnalysisWindow, MetricId, MetricValue, MetricsRecord};
use super::stats;
use crate::data::{Frequency, Lookback, ValuationPoint, ValuationSeries};
use crate::error::{ConfigError, ConfigResult, DataResult};
use crate::validation::{IntegrityPolicy, PreparedSeries, SeriesValidator};

/// Annual risk-free rate used when none is configured (10-year G-Sec yield).
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.07;

/// Trading days per year.
pub const DEFAULT_PERIODS_PER_YEAR: u32 = 252;

/// Threshold below which a return counts as downside.
pub const DOWNSIDE_THRESHOLD: f64 = 0.0;

/// Tail cutoff for VaR, CVaR and the tail ratio.
pub const TAIL_CUTOFF: f64 = 0.05;

/// Parameters for a metrics computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Annual risk-free rate as a fraction (0.07 = 7%).
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,

    /// Return periods per year used for annualization (252 daily, 12 monthly).
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: u32,

    /// How malformed input series are handled.
    #[serde(default)]
    pub integrity: IntegrityPolicy,
}

fn default_risk_free_rate() -> f64 {
    DEFAULT_RISK_FREE_RATE
}

fn default_periods_per_year() -> u32 {
    DEFAULT_PERIODS_PER_YEAR
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            periods_per_year: DEFAULT_PERIODS_PER_YEAR,
            integrity: IntegrityPolicy::Strict,
        }
    }
}

impl AnalysisConfig {
    pub fn new(risk_free_rate: f64, periods_per_year: u32) -> Self {
        Self {
            risk_free_rate,
            periods_per_year,
            ..Self::default()
        }
    }

    pub fn with_integrity(mut self, integrity: IntegrityPolicy) -> Self {
        self.integrity = integrity;
        self
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.periods_per_year == 0 {
            return Err(ConfigError::InvalidPeriodsPerYear);
        }
        if !self.risk_free_rate.is_finite() {
            return Err(ConfigError::InvalidRiskFreeRate(self.risk_free_rate));
        }
        Ok(())
    }

    /// This config annualized for series sampled at `frequency`.
    ///
    /// Month-end sampling always annualizes with 12 periods per year; daily
    /// sampling keeps the configured factor.
    pub fn for_frequency(mut self, frequency: Frequency) -> Self {
        if frequency == Frequency::MonthEnd {
            self.periods_per_year = frequency.periods_per_year();
        }
        self
    }

    /// Risk-free rate per return period.
    pub fn period_risk_free_rate(&self) -> f64 {
        self.risk_free_rate / self.periods_per_year as f64
    }
}

/// Drawdown analysis details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownAnalysis {
    /// Deepest drawdown as a negative percent; 0 when the series never fell.
    pub max_drawdown_pct: f64,
    /// Running peak that preceded the deepest drawdown.
    pub peak_date: Option<NaiveDate>,
    /// Date of the deepest drawdown.
    pub trough_date: Option<NaiveDate>,
    /// First date back at or above the peak, if the series recovered.
    pub recovery_date: Option<NaiveDate>,
    /// Peak to recovery, or peak to the last observation when unrecovered.
    pub duration_days: i64,
    /// Mean drawdown over observations below their running peak (negative percent).
    pub avg_drawdown_pct: f64,
    /// Number of distinct underwater episodes.
    pub drawdown_periods: usize,
}

/// Metrics calculator.
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Validate raw points under `config.integrity`, then compute.
    pub fn compute_points(
        points: Vec<ValuationPoint>,
        config: &AnalysisConfig,
    ) -> DataResult<MetricsRecord> {
        let prepared = SeriesValidator::new(config.integrity).prepare(points)?;
        Ok(Self::compute(&prepared.series, config).with_integrity(prepared.report))
    }

    /// Compute over the trailing `lookback` ending at `end` (the series' own
    /// last date when `None`), after resampling to `frequency`.
    ///
    /// The integrity report from tolerant validation is attached to the record.
    pub fn compute_window(
        prepared: PreparedSeries,
        end: Option<NaiveDate>,
        lookback: Lookback,
        frequency: Frequency,
        config: &AnalysisConfig,
    ) -> MetricsRecord {
        let window = match end.or_else(|| prepared.series.end_date()) {
            Some(end) => lookback.apply(&prepared.series, end),
            None => prepared.series,
        };
        let sampled = frequency.apply(&window);
        Self::compute(&sampled, &config.for_frequency(frequency)).with_integrity(prepared.report)
    }

    /// Calculate all metrics for a validated series.
    ///
    /// Fewer than two observations yield a record with every metric undefined.
    pub fn compute(series: &ValuationSeries, config: &AnalysisConfig) -> MetricsRecord {
        let window = AnalysisWindow {
            start_date: series.start_date(),
            end_date: series.end_date(),
            total_days: series.len(),
        };
        let ppy = config.periods_per_year;
        let rf = config.risk_free_rate;

        if series.len() < 2 {
            debug!("Insufficient data for metrics ({} observations)", series.len());
            return MetricsRecord::undefined(window, ppy, rf);
        }

        let values = series.values();
        let returns = series.returns();
        let n = returns.len();
        let annualizer = (ppy as f64).sqrt();
        let period_rf = config.period_risk_free_rate();

        // Return metrics
        let growth = values[n] / values[0];
        let total_return = growth - 1.0;
        let annual_return = Self::calculate_cagr(growth, n, ppy);
        let cumulative_return = Self::calculate_cumulative_return(&returns);

        // Volatility
        let period_vol = stats::sample_std(&returns);
        let annual_vol = period_vol.map(|v| v * annualizer);
        let downside = stats::downside_deviation(&returns, DOWNSIDE_THRESHOLD);

        // Risk-adjusted returns
        let mean = stats::mean(&returns);
        let sharpe = Self::calculate_excess_ratio(mean, period_vol, period_rf, annualizer);
        let sortino = Self::calculate_excess_ratio(mean, downside, period_rf, annualizer);

        // Drawdown
        let drawdown = Self::analyze_drawdown(series);
        let max_dd = drawdown.max_drawdown_pct / 100.0;
        let calmar = match annual_return {
            Some(cagr) if max_dd < 0.0 => Some(cagr / max_dd.abs()),
            _ => None,
        };

        // Tail risk
        let sorted = stats::sorted(&returns);
        let var_95 = stats::quantile(&sorted, TAIL_CUTOFF);
        let cvar_95 = var_95.map(|var| Self::calculate_cvar(&sorted, var));
        let tail_ratio = Self::calculate_tail_ratio(&sorted);

        // Distribution shape
        let skewness = stats::skewness(&returns);
        let kurtosis = stats::excess_kurtosis(&returns);
        let stability = Self::calculate_stability(&returns);

        let pct = |v: Option<f64>| MetricValue::from(v.map(|x| x * 100.0));

        debug!(
            "Calculated metrics for {} to {} ({} returns)",
            window.start_date.map(|d| d.to_string()).unwrap_or_default(),
            window.end_date.map(|d| d.to_string()).unwrap_or_default(),
            n
        );

        MetricsRecord::from_values(
            window,
            ppy,
            rf,
            [
                (MetricId::TotalReturn, pct(Some(total_return))),
                (MetricId::AnnualReturn, pct(annual_return)),
                (MetricId::CumulativeReturn, pct(Some(cumulative_return))),
                (MetricId::AnnualVolatility, pct(annual_vol)),
                (MetricId::PeriodVolatility, pct(period_vol)),
                (MetricId::DownsideDeviation, pct(downside.map(|d| d * annualizer))),
                (MetricId::SharpeRatio, sharpe.into()),
                (MetricId::SortinoRatio, sortino.into()),
                (MetricId::CalmarRatio, calmar.into()),
                (MetricId::MaxDrawdown, MetricValue::from_f64(drawdown.max_drawdown_pct)),
                (MetricId::ValueAtRisk95, pct(var_95)),
                (MetricId::ConditionalValueAtRisk95, pct(cvar_95)),
                (MetricId::Skewness, skewness.into()),
                (MetricId::Kurtosis, kurtosis.into()),
                (MetricId::Stability, stability.into()),
                (MetricId::TailRatio, tail_ratio.into()),
            ],
        )
        .with_drawdown(Some(drawdown))
    }

    /// Calculate CAGR from the overall growth factor over `periods` returns.
    ///
    /// When `periods == periods_per_year` the exponent is exactly 1 and the
    /// result is bit-identical to the total return.
    fn calculate_cagr(growth: f64, periods: usize, periods_per_year: u32) -> Option<f64> {
        if periods == 0 || growth <= 0.0 {
            return None;
        }
        let exponent = periods_per_year as f64 / periods as f64;
        Some(growth.powf(exponent) - 1.0)
    }

    /// Compound every period return.
    fn calculate_cumulative_return(returns: &[f64]) -> f64 {
        returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
    }

    /// Annualized excess return over a per-period dispersion (Sharpe, Sortino).
    fn calculate_excess_ratio(
        mean: Option<f64>,
        dispersion: Option<f64>,
        period_rf: f64,
        annualizer: f64,
    ) -> Option<f64> {
        let mean = mean?;
        let dispersion = dispersion?;
        if stats::is_effectively_zero(dispersion) {
            return None;
        }
        Some((mean - period_rf) / dispersion * annualizer)
    }

    /// Mean of the returns at or below `var`; `var` itself if none qualify.
    fn calculate_cvar(sorted_returns: &[f64], var: f64) -> f64 {
        let tail: Vec<f64> = sorted_returns
            .iter()
            .copied()
            .take_while(|r| *r <= var)
            .collect();
        stats::mean(&tail).unwrap_or(var)
    }

    /// |95th percentile| / |5th percentile|.
    fn calculate_tail_ratio(sorted_returns: &[f64]) -> Option<f64> {
        let upper = stats::quantile(sorted_returns, 1.0 - TAIL_CUTOFF)?;
        let lower = stats::quantile(sorted_returns, TAIL_CUTOFF)?;
        if lower == 0.0 {
            return None;
        }
        Some(upper.abs() / lower.abs())
    }

    /// R² of log cumulative value against time.
    fn calculate_stability(returns: &[f64]) -> Option<f64> {
        if returns.len() < 3 {
            return None;
        }
        let mut cumulative = 1.0;
        let mut log_curve = Vec::with_capacity(returns.len());
        for r in returns {
            cumulative *= 1.0 + r;
            if cumulative <= 0.0 {
                return None;
            }
            log_curve.push(cumulative.ln());
        }
        stats::r_squared_against_index(&log_curve)
    }

    /// Analyze drawdown from the valuation curve.
    pub fn analyze_drawdown(series: &ValuationSeries) -> DrawdownAnalysis {
        let points = series.points();
        if points.is_empty() {
            return DrawdownAnalysis {
                max_drawdown_pct: 0.0,
                peak_date: None,
                trough_date: None,
                recovery_date: None,
                duration_days: 0,
                avg_drawdown_pct: 0.0,
                drawdown_periods: 0,
            };
        }

        let mut peak = points[0].value;
        let mut peak_date = points[0].date;
        let mut max_drawdown = 0.0_f64;
        let mut max_peak = (points[0].date, points[0].value);
        let mut trough_index = 0;
        let mut underwater = false;
        let mut periods = 0;
        let mut drawdowns = Vec::new();

        for (i, point) in points.iter().enumerate() {
            if point.value >= peak {
                underwater = false;
                peak = point.value;
                peak_date = point.date;
                continue;
            }

            let drawdown = point.value / peak - 1.0;
            if !underwater {
                underwater = true;
                periods += 1;
            }
            if drawdown < max_drawdown {
                max_drawdown = drawdown;
                max_peak = (peak_date, peak);
                trough_index = i;
            }
            drawdowns.push(drawdown);
        }

        if max_drawdown == 0.0 {
            return DrawdownAnalysis {
                max_drawdown_pct: 0.0,
                peak_date: None,
                trough_date: None,
                recovery_date: None,
                duration_days: 0,
                avg_drawdown_pct: 0.0,
                drawdown_periods: 0,
            };
        }

        let (max_peak_date, max_peak_value) = max_peak;
        let recovery_date = points[trough_index..]
            .iter()
            .find(|p| p.value >= max_peak_value)
            .map(|p| p.date);
        let last_date = points[points.len() - 1].date;
        let duration_days = (recovery_date.unwrap_or(last_date) - max_peak_date).num_days();
        let avg_drawdown_pct = stats::mean(&drawdowns).unwrap_or(0.0) * 100.0;

        DrawdownAnalysis {
            max_drawdown_pct: max_drawdown * 100.0,
            peak_date: Some(max_peak_date),
            trough_date: Some(points[trough_index].date),
            recovery_date,
            duration_days,
            avg_drawdown_pct,
            drawdown_periods: periods,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::error::DataError;

    fn series_from(values: &[f64]) -> ValuationSeries {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        ValuationSeries::new(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| ValuationPoint::new(start + Duration::days(i as i64), *v))
                .collect(),
        )
        .unwrap()
    }

    fn get(record: &MetricsRecord, id: MetricId) -> f64 {
        record
            .get(id)
            .value()
            .unwrap_or_else(|| panic!("{} undefined", id))
    }

    #[test]
    fn test_worked_example() {
        let record = MetricsCalculator::compute(
            &series_from(&[100.0, 110.0, 99.0, 121.0]),
            &AnalysisConfig::new(0.0, 252),
        );
        assert_eq!(record.return_periods, 3);
        assert!((get(&record, MetricId::TotalReturn) - 21.0).abs() < 1e-9);
        assert!((get(&record, MetricId::MaxDrawdown) + 10.0).abs() < 1e-9);
        assert!((get(&record, MetricId::CumulativeReturn) - 21.0).abs() < 1e-9);

        let dd = record.drawdown.as_ref().unwrap();
        assert_eq!(dd.peak_date, NaiveDate::from_ymd_opt(2020, 1, 2));
        assert_eq!(dd.trough_date, NaiveDate::from_ymd_opt(2020, 1, 3));
        assert_eq!(dd.recovery_date, NaiveDate::from_ymd_opt(2020, 1, 4));
        assert_eq!(dd.duration_days, 2);
        assert_eq!(dd.drawdown_periods, 1);
    }

    #[test]
    fn test_constant_series_has_no_nan() {
        let record = MetricsCalculator::compute(
            &series_from(&[10.0; 30]),
            &AnalysisConfig::default(),
        );
        assert_eq!(get(&record, MetricId::AnnualVolatility), 0.0);
        assert_eq!(get(&record, MetricId::PeriodVolatility), 0.0);
        assert_eq!(get(&record, MetricId::DownsideDeviation), 0.0);
        assert_eq!(get(&record, MetricId::MaxDrawdown), 0.0);
        assert_eq!(record.get(MetricId::SharpeRatio), MetricValue::Undefined);
        assert_eq!(record.get(MetricId::SortinoRatio), MetricValue::Undefined);
        assert_eq!(record.get(MetricId::CalmarRatio), MetricValue::Undefined);
        assert_eq!(record.get(MetricId::Skewness), MetricValue::Undefined);
        assert_eq!(record.get(MetricId::Kurtosis), MetricValue::Undefined);
        assert_eq!(record.get(MetricId::Stability), MetricValue::Undefined);
        assert_eq!(record.get(MetricId::TailRatio), MetricValue::Undefined);
        for (_, value) in record.iter() {
            if let Some(v) = value.value() {
                assert!(v.is_finite());
            }
        }
    }

    #[test]
    fn test_monotonic_series_has_zero_drawdown() {
        let values: Vec<f64> = (0..50).map(|i| 100.0 + i as f64 * 0.37).collect();
        let record = MetricsCalculator::compute(&series_from(&values), &AnalysisConfig::default());
        assert_eq!(get(&record, MetricId::MaxDrawdown), 0.0);
        assert_eq!(record.get(MetricId::CalmarRatio), MetricValue::Undefined);
        assert_eq!(get(&record, MetricId::DownsideDeviation), 0.0);
        assert_eq!(record.drawdown.as_ref().unwrap().drawdown_periods, 0);
    }

    #[test]
    fn test_total_equals_cumulative() {
        let values = [100.0, 101.3, 99.7, 104.2, 103.1, 108.9, 107.0, 111.4];
        let record = MetricsCalculator::compute(&series_from(&values), &AnalysisConfig::default());
        let total = get(&record, MetricId::TotalReturn);
        let cumulative = get(&record, MetricId::CumulativeReturn);
        assert!((total - cumulative).abs() <= 1e-9 * total.abs());
    }

    #[test]
    fn test_cagr_equals_total_over_one_year() {
        let values = [100.0, 103.0, 98.0, 105.0, 110.0, 107.0, 112.0, 115.0, 113.0, 118.0, 121.0, 119.0, 124.0];
        let record = MetricsCalculator::compute(&series_from(&values), &AnalysisConfig::new(0.07, 12));
        assert_eq!(record.return_periods, 12);
        assert_eq!(
            get(&record, MetricId::AnnualReturn),
            get(&record, MetricId::TotalReturn)
        );
    }

    #[test]
    fn test_cagr_two_years() {
        // 100 -> 121 over 24 monthly periods = 10% CAGR
        let mut values = vec![100.0; 24];
        values.push(121.0);
        let record = MetricsCalculator::compute(&series_from(&values), &AnalysisConfig::new(0.0, 12));
        assert!((get(&record, MetricId::AnnualReturn) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_insufficient_data() {
        let empty = MetricsCalculator::compute(&ValuationSeries::empty(), &AnalysisConfig::default());
        assert!(empty.is_insufficient());
        assert_eq!(empty.window.start_date, None);
        assert_eq!(empty.window.total_days, 0);

        let single = MetricsCalculator::compute(&series_from(&[10.0]), &AnalysisConfig::default());
        assert!(single.is_insufficient());
        assert_eq!(single.window.start_date, single.window.end_date);
        assert_eq!(single.window.start_date, NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(single.window.total_days, 1);
    }

    #[test]
    fn test_sharpe_and_sortino() {
        let values = [100.0, 102.0, 101.0, 104.0, 103.0, 107.0];
        let series = series_from(&values);
        let config = AnalysisConfig::new(0.12, 12);
        let record = MetricsCalculator::compute(&series, &config);

        let returns = series.returns();
        let mean = returns.iter().sum::<f64>() / returns.len() as f64;
        let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (returns.len() - 1) as f64;
        let expected_sharpe = (mean - 0.01) / var.sqrt() * 12.0_f64.sqrt();
        assert!((get(&record, MetricId::SharpeRatio) - expected_sharpe).abs() < 1e-9);

        // Two negative returns: -1/102 and -1/104
        let downs: [f64; 2] = [-1.0 / 102.0, -1.0 / 104.0];
        let dmean = (downs[0] + downs[1]) / 2.0;
        let dstd = (((downs[0] - dmean).powi(2) + (downs[1] - dmean).powi(2)) / 1.0).sqrt();
        let expected_sortino = (mean - 0.01) / dstd * 12.0_f64.sqrt();
        assert!((get(&record, MetricId::SortinoRatio) - expected_sortino).abs() < 1e-6);
        assert!(
            (get(&record, MetricId::DownsideDeviation) - dstd * 12.0_f64.sqrt() * 100.0).abs() < 1e-9
        );
    }

    #[test]
    fn test_var_and_cvar() {
        // Returns: +10%, -10%, +10%, -20%, +25%
        let values = [100.0, 110.0, 99.0, 108.9, 87.12, 108.9];
        let record = MetricsCalculator::compute(&series_from(&values), &AnalysisConfig::default());
        let var = get(&record, MetricId::ValueAtRisk95);
        let cvar = get(&record, MetricId::ConditionalValueAtRisk95);
        // sorted: -20, -10, 10, 10, 25; h = 0.2 -> -20 + 0.2 * 10 = -18
        assert!((var + 18.0).abs() < 1e-6);
        // only -20 is at or below -18
        assert!((cvar + 20.0).abs() < 1e-6);
        assert!(cvar <= var);
        // p95: h = 3.8 -> 10 + 0.8 * 15 = 22; 22 / 18
        assert!((get(&record, MetricId::TailRatio) - 22.0 / 18.0).abs() < 1e-6);
    }

    #[test]
    fn test_calmar() {
        let values = [100.0, 110.0, 99.0, 121.0];
        let record = MetricsCalculator::compute(&series_from(&values), &AnalysisConfig::new(0.0, 3));
        // N == ppy so CAGR = 21%; |MDD| = 10%
        assert!((get(&record, MetricId::CalmarRatio) - 2.1).abs() < 1e-9);
    }

    #[test]
    fn test_stability_of_steady_growth() {
        let values: Vec<f64> = (0..20).map(|i| 100.0 * 1.01_f64.powi(i)).collect();
        let record = MetricsCalculator::compute(&series_from(&values), &AnalysisConfig::default());
        assert!((get(&record, MetricId::Stability) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_compute_points_strict_and_tolerant() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let points = vec![
            ValuationPoint::new(d(1), 100.0),
            ValuationPoint::new(d(2), 0.0),
            ValuationPoint::new(d(3), 110.0),
            ValuationPoint::new(d(3), 111.0),
        ];

        let err = MetricsCalculator::compute_points(points.clone(), &AnalysisConfig::default())
            .unwrap_err();
        assert!(matches!(err, DataError::NonPositiveValue { .. }));

        let config = AnalysisConfig::default().with_integrity(IntegrityPolicy::Tolerant);
        let record = MetricsCalculator::compute_points(points, &config).unwrap();
        assert_eq!(record.window.total_days, 2);
        assert!((get(&record, MetricId::TotalReturn) - 10.0).abs() < 1e-9);
        let report = record.integrity.as_ref().unwrap();
        assert_eq!(report.non_positive_dropped, 1);
        assert_eq!(report.duplicates_dropped, 1);
    }

    #[test]
    fn test_month_end_annualizes_monthly() {
        let config = AnalysisConfig::default().for_frequency(Frequency::MonthEnd);
        assert_eq!(config.periods_per_year, 12);
        let daily = AnalysisConfig::new(0.07, 365).for_frequency(Frequency::Daily);
        assert_eq!(daily.periods_per_year, 365);
    }

    #[test]
    fn test_compute_window_monthly_with_gap() {
        // Month ends of 2023 plus January 2024, +1% a month, July missing
        let mut points = Vec::new();
        for k in 0..13u32 {
            let (year, month) = if k < 12 { (2023, k + 1) } else { (2024, 1) };
            if (year, month) == (2023, 7) {
                continue;
            }
            let date = NaiveDate::from_ymd_opt(year, month, 28).unwrap();
            points.push(ValuationPoint::new(date, 100.0 * 1.01_f64.powi(k as i32)));
        }
        let config = AnalysisConfig::default().with_integrity(IntegrityPolicy::Tolerant);
        let prepared = SeriesValidator::new(config.integrity).prepare(points).unwrap();
        let record = MetricsCalculator::compute_window(
            prepared,
            None,
            Lookback::Full,
            Frequency::MonthEnd,
            &config,
        );

        assert_eq!(record.periods_per_year, 12);
        assert_eq!(record.return_periods, 12);
        let total = get(&record, MetricId::TotalReturn);
        assert!((total - 12.682503).abs() < 1e-4);
        assert!((get(&record, MetricId::AnnualReturn) - total).abs() < 1e-9);
        assert!(record.integrity.is_some());
    }

    #[test]
    fn test_analysis_config_validate() {
        assert!(AnalysisConfig::default().validate().is_ok());
        assert_eq!(
            AnalysisConfig::new(0.07, 0).validate(),
            Err(ConfigError::InvalidPeriodsPerYear)
        );
        assert!(matches!(
            AnalysisConfig::new(f64::NAN, 12).validate(),
            Err(ConfigError::InvalidRiskFreeRate(_))
        ));
    }

    #[test]
    fn test_drawdown_analysis_empty() {
        let analysis = MetricsCalculator::analyze_drawdown(&ValuationSeries::empty());
        assert_eq!(analysis.max_drawdown_pct, 0.0);
        assert_eq!(analysis.peak_date, None);
    }

    #[test]
    fn test_drawdown_unrecovered() {
        let analysis = MetricsCalculator::analyze_drawdown(&series_from(&[100.0, 120.0, 90.0, 95.0, 110.0]));
        assert!((analysis.max_drawdown_pct + 25.0).abs() < 1e-9);
        assert_eq!(analysis.recovery_date, None);
        // peak on day 1, last observation day 4
        assert_eq!(analysis.duration_days, 3);
        assert_eq!(analysis.drawdown_periods, 1);
    }
}
