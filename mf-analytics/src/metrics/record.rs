//! Metric identifiers, values and the per-series metrics record.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::calculator::DrawdownAnalysis;
use crate::error::ConfigError;
use crate::validation::SeriesIntegrityReport;

/// Closed set of metrics produced by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum MetricId {
    TotalReturn,
    AnnualReturn,
    CumulativeReturn,
    AnnualVolatility,
    PeriodVolatility,
    DownsideDeviation,
    SharpeRatio,
    SortinoRatio,
    CalmarRatio,
    MaxDrawdown,
    ValueAtRisk95,
    ConditionalValueAtRisk95,
    Skewness,
    Kurtosis,
    Stability,
    TailRatio,
}

/// Unit a metric is reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricUnit {
    /// Fraction × 100.
    Percent,
    Ratio,
    Unitless,
}

/// Which direction of a metric is desirable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preference {
    HigherIsBetter,
    LowerIsBetter,
}

impl Preference {
    /// Map a raw value onto a scale where larger is always better.
    pub fn orient(&self, value: f64) -> f64 {
        match self {
            Self::HigherIsBetter => value,
            Self::LowerIsBetter => -value,
        }
    }
}

impl MetricId {
    pub const ALL: [MetricId; 16] = [
        Self::TotalReturn,
        Self::AnnualReturn,
        Self::CumulativeReturn,
        Self::AnnualVolatility,
        Self::PeriodVolatility,
        Self::DownsideDeviation,
        Self::SharpeRatio,
        Self::SortinoRatio,
        Self::CalmarRatio,
        Self::MaxDrawdown,
        Self::ValueAtRisk95,
        Self::ConditionalValueAtRisk95,
        Self::Skewness,
        Self::Kurtosis,
        Self::Stability,
        Self::TailRatio,
    ];

    /// Stable snake_case key used in configs and serialized output.
    pub fn key(&self) -> &'static str {
        match self {
            Self::TotalReturn => "total_return",
            Self::AnnualReturn => "annual_return",
            Self::CumulativeReturn => "cumulative_return",
            Self::AnnualVolatility => "annual_volatility",
            Self::PeriodVolatility => "period_volatility",
            Self::DownsideDeviation => "downside_deviation",
            Self::SharpeRatio => "sharpe_ratio",
            Self::SortinoRatio => "sortino_ratio",
            Self::CalmarRatio => "calmar_ratio",
            Self::MaxDrawdown => "max_drawdown",
            Self::ValueAtRisk95 => "value_at_risk_95",
            Self::ConditionalValueAtRisk95 => "conditional_var_95",
            Self::Skewness => "skewness",
            Self::Kurtosis => "kurtosis",
            Self::Stability => "stability",
            Self::TailRatio => "tail_ratio",
        }
    }

    /// Human-readable label including the unit.
    pub fn label(&self) -> &'static str {
        match self {
            Self::TotalReturn => "Total Return (%)",
            Self::AnnualReturn => "Annual Return (%)",
            Self::CumulativeReturn => "Cumulative Return (%)",
            Self::AnnualVolatility => "Annual Volatility (%)",
            Self::PeriodVolatility => "Period Volatility (%)",
            Self::DownsideDeviation => "Downside Deviation (%)",
            Self::SharpeRatio => "Sharpe Ratio",
            Self::SortinoRatio => "Sortino Ratio",
            Self::CalmarRatio => "Calmar Ratio",
            Self::MaxDrawdown => "Max Drawdown (%)",
            Self::ValueAtRisk95 => "Value at Risk 95% (%)",
            Self::ConditionalValueAtRisk95 => "Conditional VaR 95% (%)",
            Self::Skewness => "Skewness",
            Self::Kurtosis => "Kurtosis",
            Self::Stability => "Stability",
            Self::TailRatio => "Tail Ratio",
        }
    }

    pub fn unit(&self) -> MetricUnit {
        match self {
            Self::TotalReturn
            | Self::AnnualReturn
            | Self::CumulativeReturn
            | Self::AnnualVolatility
            | Self::PeriodVolatility
            | Self::DownsideDeviation
            | Self::MaxDrawdown
            | Self::ValueAtRisk95
            | Self::ConditionalValueAtRisk95 => MetricUnit::Percent,
            Self::SharpeRatio | Self::SortinoRatio | Self::CalmarRatio | Self::TailRatio => {
                MetricUnit::Ratio
            }
            Self::Skewness | Self::Kurtosis | Self::Stability => MetricUnit::Unitless,
        }
    }

    /// Desirable direction for ranking.
    ///
    /// Max drawdown, VaR and CVaR are negative percents, so a higher value is
    /// already a smaller loss. Dispersion measures and fat tails are penalized.
    pub fn preference(&self) -> Preference {
        match self {
            Self::AnnualVolatility
            | Self::PeriodVolatility
            | Self::DownsideDeviation
            | Self::Kurtosis => Preference::LowerIsBetter,
            _ => Preference::HigherIsBetter,
        }
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for MetricId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        if let Some(id) = Self::ALL.iter().find(|id| id.key() == normalized) {
            return Ok(*id);
        }
        // Short aliases.
        match normalized.as_str() {
            "cagr" => Ok(Self::AnnualReturn),
            "volatility" => Ok(Self::AnnualVolatility),
            "var_95" => Ok(Self::ValueAtRisk95),
            "cvar_95" => Ok(Self::ConditionalValueAtRisk95),
            _ => Err(ConfigError::UnknownMetric(s.to_string())),
        }
    }
}

impl From<MetricId> for &'static str {
    fn from(id: MetricId) -> Self {
        id.key()
    }
}

impl TryFrom<String> for MetricId {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A metric result, or the explicit marker that it does not exist for the input.
///
/// Serialized as a number or `null`. Non-finite numbers never become `Value`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum MetricValue {
    Value(f64),
    #[default]
    Undefined,
}

impl MetricValue {
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            Self::Value(value)
        } else {
            Self::Undefined
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            Self::Undefined => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Self::Value(_))
    }
}

impl From<Option<f64>> for MetricValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Undefined, Self::from_f64)
    }
}

impl From<MetricValue> for Option<f64> {
    fn from(value: MetricValue) -> Self {
        value.value()
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{:.2}", v),
            Self::Undefined => f.write_str("N/A"),
        }
    }
}

/// Date range a record was computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnalysisWindow {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Number of valuation observations in the window.
    pub total_days: usize,
}

impl AnalysisWindow {
    /// Calendar days from start to end.
    pub fn calendar_days(&self) -> Option<i64> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some((end - start).num_days()),
            _ => None,
        }
    }
}

/// Every metric for one valuation series, plus the context it was computed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub window: AnalysisWindow,
    /// Number of derived returns (observations - 1).
    pub return_periods: usize,
    pub periods_per_year: u32,
    pub risk_free_rate: f64,
    values: BTreeMap<MetricId, MetricValue>,
    pub drawdown: Option<DrawdownAnalysis>,
    /// Present when tolerant validation inspected the input.
    #[serde(default)]
    pub integrity: Option<SeriesIntegrityReport>,
}

impl MetricsRecord {
    /// Record with every metric undefined.
    pub fn undefined(window: AnalysisWindow, periods_per_year: u32, risk_free_rate: f64) -> Self {
        Self {
            window,
            return_periods: window.total_days.saturating_sub(1),
            periods_per_year,
            risk_free_rate,
            values: MetricId::ALL
                .iter()
                .map(|id| (*id, MetricValue::Undefined))
                .collect(),
            drawdown: None,
            integrity: None,
        }
    }

    /// Rebuild a record from known values; metrics not listed are undefined.
    pub fn from_values<I>(
        window: AnalysisWindow,
        periods_per_year: u32,
        risk_free_rate: f64,
        values: I,
    ) -> Self
    where
        I: IntoIterator<Item = (MetricId, MetricValue)>,
    {
        let mut record = Self::undefined(window, periods_per_year, risk_free_rate);
        record.values.extend(values);
        record
    }

    pub fn get(&self, id: MetricId) -> MetricValue {
        self.values.get(&id).copied().unwrap_or_default()
    }

    /// All metrics in [`MetricId::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (MetricId, MetricValue)> + '_ {
        MetricId::ALL.iter().map(move |id| (*id, self.get(*id)))
    }

    pub fn defined_count(&self) -> usize {
        self.values.values().filter(|v| v.is_defined()).count()
    }

    pub fn is_insufficient(&self) -> bool {
        self.defined_count() == 0
    }

    pub(crate) fn with_drawdown(mut self, drawdown: Option<DrawdownAnalysis>) -> Self {
        self.drawdown = drawdown;
        self
    }

    pub(crate) fn with_integrity(mut self, integrity: Option<SeriesIntegrityReport>) -> Self {
        self.integrity = integrity;
        self
    }

    /// Generate a summary report.
    pub fn summary(&self) -> String {
        let mut out = String::from("Risk Metrics\n============\n");
        for (id, value) in self.iter() {
            out.push_str(&format!("{:<26} {:>10}\n", id.label(), value.to_string()));
        }
        out.push_str(&format!(
            "\nPeriod: {} to {} ({} observations, {} returns)\nRisk-Free Rate: {:.2}%",
            self.window
                .start_date
                .map_or_else(|| "-".to_string(), |d| d.to_string()),
            self.window
                .end_date
                .map_or_else(|| "-".to_string(), |d| d.to_string()),
            self.window.total_days,
            self.return_periods,
            self.risk_free_rate * 100.0
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_id_parse() {
        assert_eq!("sharpe_ratio".parse::<MetricId>().unwrap(), MetricId::SharpeRatio);
        assert_eq!("Max Drawdown".parse::<MetricId>().unwrap(), MetricId::MaxDrawdown);
        assert_eq!("volatility".parse::<MetricId>().unwrap(), MetricId::AnnualVolatility);
        assert_eq!(
            "alpha".parse::<MetricId>().unwrap_err(),
            ConfigError::UnknownMetric("alpha".to_string())
        );
    }

    #[test]
    fn test_metric_keys_round_trip() {
        for id in MetricId::ALL {
            assert_eq!(id.key().parse::<MetricId>().unwrap(), id);
        }
    }

    #[test]
    fn test_metric_value_never_nan() {
        assert_eq!(MetricValue::from_f64(f64::NAN), MetricValue::Undefined);
        assert_eq!(MetricValue::from_f64(f64::INFINITY), MetricValue::Undefined);
        assert_eq!(MetricValue::from_f64(0.0), MetricValue::Value(0.0));
        assert_ne!(MetricValue::Value(0.0), MetricValue::Undefined);
    }

    #[test]
    fn test_metric_value_json() {
        let json = serde_json::to_string(&[MetricValue::Value(1.5), MetricValue::Undefined]).unwrap();
        assert_eq!(json, "[1.5,null]");
    }

    #[test]
    fn test_undefined_record() {
        let record = MetricsRecord::undefined(AnalysisWindow::default(), 252, 0.07);
        assert!(record.is_insufficient());
        assert_eq!(record.iter().count(), 16);
        assert_eq!(record.return_periods, 0);
    }

    #[test]
    fn test_record_json_uses_keys() {
        let record = MetricsRecord::from_values(
            AnalysisWindow::default(),
            12,
            0.0,
            [(MetricId::SharpeRatio, MetricValue::Value(1.25))],
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["values"]["sharpe_ratio"], 1.25);
        assert!(json["values"]["sortino_ratio"].is_null());

        let back: MetricsRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_preference_orient() {
        assert_eq!(MetricId::AnnualVolatility.preference().orient(12.0), -12.0);
        assert_eq!(MetricId::MaxDrawdown.preference().orient(-10.0), -10.0);
    }
}
