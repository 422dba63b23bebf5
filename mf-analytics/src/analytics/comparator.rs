//! Head-to-head fund comparison.
//!
//! Compares two metrics records metric by metric, scores each fund's
//! risk/return efficiency and turns the gap into a recommendation with a
//! confidence level, a risk profile and a suggested holding horizon.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::metrics::stats::is_effectively_zero;
use crate::metrics::{MetricId, MetricsRecord, Preference};

/// Point gap below which the comparison is a tie.
pub const TIE_THRESHOLD_POINTS: f64 = 5.0;

/// Metrics compared head to head, in report order.
pub const HEAD_TO_HEAD_METRICS: [MetricId; 8] = [
    MetricId::AnnualReturn,
    MetricId::SharpeRatio,
    MetricId::SortinoRatio,
    MetricId::CalmarRatio,
    MetricId::MaxDrawdown,
    MetricId::AnnualVolatility,
    MetricId::ValueAtRisk95,
    MetricId::DownsideDeviation,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Left,
    Right,
    Tie,
}

impl Winner {
    fn from_advantage(advantage: f64) -> Self {
        if is_effectively_zero(advantage) {
            Self::Tie
        } else if advantage > 0.0 {
            Self::Left
        } else {
            Self::Right
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Confidence {
    pub fn from_gap(gap: f64) -> Self {
        if gap > 25.0 {
            Self::VeryHigh
        } else if gap > 15.0 {
            Self::High
        } else if gap > 8.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskProfile {
    Conservative,
    Balanced,
    Growth,
    Aggressive,
}

impl RiskProfile {
    /// Classify from annual volatility and drawdown magnitude, both in percent.
    pub fn classify(volatility_pct: f64, drawdown_pct: f64) -> Self {
        let dd = drawdown_pct.abs();
        if volatility_pct < 12.0 && dd < 15.0 {
            Self::Conservative
        } else if volatility_pct < 18.0 && dd < 25.0 {
            Self::Balanced
        } else if volatility_pct < 25.0 && dd < 35.0 {
            Self::Growth
        } else {
            Self::Aggressive
        }
    }
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Conservative => "Conservative",
            Self::Balanced => "Balanced",
            Self::Growth => "Growth",
            Self::Aggressive => "Aggressive",
        })
    }
}

/// Minimum suggested holding period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentHorizon {
    ThreeYears,
    FiveYears,
    SevenYears,
    TenYears,
}

impl InvestmentHorizon {
    pub fn suggest(sharpe: f64, drawdown_pct: f64) -> Self {
        let dd = drawdown_pct.abs();
        if sharpe > 1.8 && dd < 20.0 {
            Self::ThreeYears
        } else if sharpe > 1.2 && dd < 30.0 {
            Self::FiveYears
        } else if sharpe > 0.8 {
            Self::SevenYears
        } else {
            Self::TenYears
        }
    }
}

impl fmt::Display for InvestmentHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ThreeYears => "3+ years",
            Self::FiveYears => "5+ years",
            Self::SevenYears => "7+ years",
            Self::TenYears => "10+ years",
        })
    }
}

/// Main reason behind a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecommendationReason {
    /// Sharpe lead above 0.3.
    SuperiorRiskAdjusted { sharpe_edge: f64 },
    /// Return lead above 3 points with a Sharpe that is not worse.
    BetterReturns { return_edge: f64 },
    OverallEfficiency,
    EvenlyMatched,
}

impl RecommendationReason {
    /// Classify from the winner's Sharpe and annual return leads over the loser.
    pub fn from_leads(sharpe_edge: f64, return_edge: f64) -> Self {
        if sharpe_edge > 0.3 {
            Self::SuperiorRiskAdjusted { sharpe_edge }
        } else if return_edge > 3.0 && sharpe_edge > 0.0 {
            Self::BetterReturns { return_edge }
        } else {
            Self::OverallEfficiency
        }
    }
}

impl fmt::Display for RecommendationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SuperiorRiskAdjusted { sharpe_edge } => write!(
                f,
                "superior risk-adjusted returns (Sharpe +{:.2})",
                sharpe_edge
            ),
            Self::BetterReturns { return_edge } => write!(
                f,
                "better returns (+{:.1}%) with comparable or lower risk",
                return_edge
            ),
            Self::OverallEfficiency => f.write_str("better overall risk-return efficiency"),
            Self::EvenlyMatched => f.write_str("efficiency points within the tie threshold"),
        }
    }
}

/// What the winner gives up, or doesn't, relative to the loser.
///
/// Gaps and edges are magnitudes in the metric's own unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TradeOff {
    Balanced,
    /// Slightly lower return for a clearly better Sharpe.
    SacrificesReturn { return_gap: f64, sharpe_edge: f64 },
    /// Lower return offset by lower volatility or shallower drawdown.
    LowerRisk {
        volatility_edge: f64,
        drawdown_edge: f64,
        return_gap: f64,
    },
    /// Higher return and better risk metrics.
    Dominates { return_edge: f64 },
    /// Much higher return for a marginally weaker Sharpe.
    ReturnForRisk { return_edge: f64, sharpe_gap: f64 },
    OverallEfficiency,
}

impl TradeOff {
    /// Classify from the winner's head-to-head advantages. Positive favors
    /// the winner; a metric missing on either side counts as 0.
    pub fn from_edges(
        return_edge: f64,
        sharpe_edge: f64,
        volatility_edge: f64,
        drawdown_edge: f64,
    ) -> Self {
        let won = |edge: f64| edge > 0.0 && !is_effectively_zero(edge);
        let return_gap = return_edge.abs();
        let sharpe_gap = sharpe_edge.abs();

        if !won(return_edge) && won(sharpe_edge) {
            if return_gap < 3.0 && sharpe_gap > 0.3 {
                return Self::SacrificesReturn {
                    return_gap,
                    sharpe_edge: sharpe_gap,
                };
            }
            if volatility_edge.abs() > 3.0 || drawdown_edge.abs() > 5.0 {
                return Self::LowerRisk {
                    volatility_edge: volatility_edge.abs(),
                    drawdown_edge: drawdown_edge.abs(),
                    return_gap,
                };
            }
        }

        if won(return_edge) {
            if won(sharpe_edge) || won(volatility_edge) {
                return Self::Dominates {
                    return_edge: return_gap,
                };
            }
            if return_gap > 5.0 && sharpe_gap < 0.2 {
                return Self::ReturnForRisk {
                    return_edge: return_gap,
                    sharpe_gap,
                };
            }
        }

        Self::OverallEfficiency
    }
}

impl fmt::Display for TradeOff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Balanced => f.write_str("no significant trade-off, the funds are evenly balanced"),
            Self::SacrificesReturn {
                return_gap,
                sharpe_edge,
            } => write!(
                f,
                "gives up {:.1}% return for a clearly better Sharpe (+{:.2})",
                return_gap, sharpe_edge
            ),
            Self::LowerRisk {
                volatility_edge,
                drawdown_edge,
                return_gap,
            } => write!(
                f,
                "{:.1}% lower volatility and {:.1}% better drawdown control for {:.1}% less return",
                volatility_edge, drawdown_edge, return_gap
            ),
            Self::Dominates { return_edge } => write!(
                f,
                "higher return (+{:.1}%) and better risk metrics, no trade-off needed",
                return_edge
            ),
            Self::ReturnForRisk {
                return_edge,
                sharpe_gap,
            } => write!(
                f,
                "{:.1}% higher return for marginally higher risk (Sharpe gap {:.2})",
                return_edge, sharpe_gap
            ),
            Self::OverallEfficiency => f.write_str("better overall risk-return efficiency"),
        }
    }
}

/// One metric compared across both funds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub metric: MetricId,
    pub left: f64,
    pub right: f64,
    /// Positive favors the left fund. Loss metrics compare by magnitude.
    pub advantage: f64,
    pub winner: Winner,
}

/// Composite risk/return efficiency of one fund.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyScore {
    pub risk_adjusted: f64,
    pub return_component: f64,
    pub risk_penalty: f64,
    /// Never negative.
    pub total: f64,
}

impl EfficiencyScore {
    /// Score a record. Undefined inputs contribute nothing.
    pub fn from_record(record: &MetricsRecord) -> Self {
        let get = |id| record.get(id).value().unwrap_or(0.0);
        let capped = |value: f64, scale: f64| {
            if value > 0.0 {
                (value / scale).min(1.0)
            } else {
                0.0
            }
        };

        let risk_adjusted = 100.0
            * (0.40 * capped(get(MetricId::SharpeRatio), 2.0)
                + 0.35 * capped(get(MetricId::SortinoRatio), 2.5)
                + 0.25 * capped(get(MetricId::CalmarRatio), 2.0));

        let annual_return = get(MetricId::AnnualReturn);
        let return_component = if annual_return > 0.0 {
            (1.0 + annual_return / 10.0).ln() / 5.0_f64.ln() * 100.0
        } else {
            0.0
        };

        let volatility = get(MetricId::AnnualVolatility).abs();
        let drawdown = get(MetricId::MaxDrawdown).abs();
        let volatility_penalty = ((volatility / 20.0).powf(1.5) * 50.0).min(50.0);
        let drawdown_penalty = ((drawdown / 30.0).powf(1.5) * 50.0).min(50.0);
        let risk_penalty = 0.4 * volatility_penalty + 0.6 * drawdown_penalty;

        let total = (0.60 * risk_adjusted + 0.25 * return_component - 0.15 * risk_penalty).max(0.0);

        Self {
            risk_adjusted,
            return_component,
            risk_penalty,
            total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub winner: Winner,
    pub confidence: Confidence,
    pub reason: RecommendationReason,
    pub trade_off: TradeOff,
    /// Profile and horizon of the winning fund; absent on a tie.
    pub risk_profile: Option<RiskProfile>,
    pub horizon: Option<InvestmentHorizon>,
    /// Metrics the winner leads on, largest lead first (at most three).
    pub strengths: Vec<MetricId>,
    /// Metrics the winner trails on, largest gap first (at most three).
    pub weaknesses: Vec<MetricId>,
}

/// Full result of comparing two funds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundComparison {
    pub left_name: String,
    pub right_name: String,
    pub metrics: Vec<MetricComparison>,
    pub left_efficiency: EfficiencyScore,
    pub right_efficiency: EfficiencyScore,
    /// Efficiency shares out of 100.
    pub left_points: f64,
    pub right_points: f64,
    pub recommendation: Recommendation,
}

impl FundComparison {
    pub fn winner_name(&self) -> Option<&str> {
        match self.recommendation.winner {
            Winner::Left => Some(&self.left_name),
            Winner::Right => Some(&self.right_name),
            Winner::Tie => None,
        }
    }

    /// Generate a text report.
    pub fn summary(&self) -> String {
        let mut out = format!("{} vs {}\n", self.left_name, self.right_name);
        for m in &self.metrics {
            let mark = match m.winner {
                Winner::Left => "<",
                Winner::Right => ">",
                Winner::Tie => "=",
            };
            out.push_str(&format!(
                "{:<26} {:>10.2} {} {:<10.2}\n",
                m.metric.label(),
                m.left,
                mark,
                m.right
            ));
        }
        out.push_str(&format!(
            "Efficiency points: {:.1} vs {:.1}\n",
            self.left_points, self.right_points
        ));

        let rec = &self.recommendation;
        match self.winner_name() {
            Some(name) => {
                out.push_str(&format!("Winner: {} (confidence: {})\n", name, rec.confidence));
                out.push_str(&format!("Reason: {}\n", rec.reason));
                out.push_str(&format!("Trade-off: {}\n", rec.trade_off));
                if let (Some(profile), Some(horizon)) = (rec.risk_profile, rec.horizon) {
                    out.push_str(&format!(
                        "Risk profile: {}, horizon: {}\n",
                        profile, horizon
                    ));
                }
                let labels = |ids: &[MetricId]| {
                    ids.iter().map(|id| id.label()).collect::<Vec<_>>().join(", ")
                };
                if !rec.strengths.is_empty() {
                    out.push_str(&format!("Strengths: {}\n", labels(&rec.strengths)));
                }
                if !rec.weaknesses.is_empty() {
                    out.push_str(&format!("Weaknesses: {}\n", labels(&rec.weaknesses)));
                }
            }
            None => {
                out.push_str("Result: tie\n");
                out.push_str(&format!("Trade-off: {}\n", rec.trade_off));
            }
        }
        out
    }
}

/// Compares two funds' metrics.
pub struct FundComparator;

impl FundComparator {
    pub fn compare(
        left_name: &str,
        left: &MetricsRecord,
        right_name: &str,
        right: &MetricsRecord,
    ) -> FundComparison {
        let metrics = Self::head_to_head(left, right);

        let left_efficiency = EfficiencyScore::from_record(left);
        let right_efficiency = EfficiencyScore::from_record(right);
        let (left_points, right_points) =
            Self::split_points(left_efficiency.total, right_efficiency.total);

        let gap = (left_points - right_points).abs();
        let winner = if gap < TIE_THRESHOLD_POINTS {
            Winner::Tie
        } else if left_points > right_points {
            Winner::Left
        } else {
            Winner::Right
        };

        let recommendation = Self::recommend(winner, gap, &metrics, left, right);

        FundComparison {
            left_name: left_name.to_string(),
            right_name: right_name.to_string(),
            metrics,
            left_efficiency,
            right_efficiency,
            left_points,
            right_points,
            recommendation,
        }
    }

    /// Compare every head-to-head metric defined on both sides.
    fn head_to_head(left: &MetricsRecord, right: &MetricsRecord) -> Vec<MetricComparison> {
        HEAD_TO_HEAD_METRICS
            .iter()
            .filter_map(|&id| {
                let l = left.get(id).value()?;
                let r = right.get(id).value()?;
                let advantage = match Self::direction(id) {
                    Preference::HigherIsBetter => l - r,
                    Preference::LowerIsBetter => r.abs() - l.abs(),
                };
                Some(MetricComparison {
                    metric: id,
                    left: l,
                    right: r,
                    advantage,
                    winner: Winner::from_advantage(advantage),
                })
            })
            .collect()
    }

    /// Loss measures compare by magnitude here, unlike in ranking.
    fn direction(id: MetricId) -> Preference {
        match id {
            MetricId::MaxDrawdown | MetricId::ValueAtRisk95 => Preference::LowerIsBetter,
            other => other.preference(),
        }
    }

    fn split_points(left: f64, right: f64) -> (f64, f64) {
        let total = left + right;
        if is_effectively_zero(total) {
            return (50.0, 50.0);
        }
        let left_points = left / total * 100.0;
        (left_points, 100.0 - left_points)
    }

    fn recommend(
        winner: Winner,
        gap: f64,
        metrics: &[MetricComparison],
        left: &MetricsRecord,
        right: &MetricsRecord,
    ) -> Recommendation {
        let (chosen, other) = match winner {
            Winner::Left => (left, right),
            Winner::Right => (right, left),
            Winner::Tie => {
                return Recommendation {
                    winner,
                    confidence: Confidence::Low,
                    reason: RecommendationReason::EvenlyMatched,
                    trade_off: TradeOff::Balanced,
                    risk_profile: None,
                    horizon: None,
                    strengths: vec![],
                    weaknesses: vec![],
                }
            }
        };

        let get = |id| chosen.get(id).value().unwrap_or(0.0);
        let lead = |id| get(id) - other.get(id).value().unwrap_or(0.0);
        let volatility = get(MetricId::AnnualVolatility);
        let drawdown = get(MetricId::MaxDrawdown);

        // Advantage from the winner's side.
        let sign = if winner == Winner::Left { 1.0 } else { -1.0 };
        let mut edges: Vec<(MetricId, f64)> = metrics
            .iter()
            .map(|m| (m.metric, m.advantage * sign))
            .collect();
        edges.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));

        let edge = |id| {
            edges
                .iter()
                .find(|(metric, _)| *metric == id)
                .map_or(0.0, |(_, e)| *e)
        };
        let trade_off = TradeOff::from_edges(
            edge(MetricId::AnnualReturn),
            edge(MetricId::SharpeRatio),
            edge(MetricId::AnnualVolatility),
            edge(MetricId::MaxDrawdown),
        );

        let pick = |keep: fn(f64) -> bool| {
            edges
                .iter()
                .filter(|(_, edge)| keep(*edge) && !is_effectively_zero(*edge))
                .take(3)
                .map(|(id, _)| *id)
                .collect::<Vec<_>>()
        };

        Recommendation {
            winner,
            confidence: Confidence::from_gap(gap),
            reason: RecommendationReason::from_leads(
                lead(MetricId::SharpeRatio),
                lead(MetricId::AnnualReturn),
            ),
            trade_off,
            risk_profile: Some(RiskProfile::classify(volatility, drawdown)),
            horizon: Some(InvestmentHorizon::suggest(get(MetricId::SharpeRatio), drawdown)),
            strengths: pick(|edge| edge > 0.0),
            weaknesses: pick(|edge| edge < 0.0),
        }
    }
}
