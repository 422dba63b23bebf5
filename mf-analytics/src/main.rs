//! Mutual fund NAV analytics CLI.
//!
//! # Usage
//!
//! ```bash
//! # Metrics for one scheme
//! mf-analytics metrics --nav data/nav/120465.json
//!
//! # Month-end metrics over the trailing 5 years
//! mf-analytics metrics --nav data/nav/120465.json --lookback-years 5 --frequency month-end
//!
//! # Rank growth plans over the trailing 3 years
//! mf-analytics screen --nav data/nav/*.json --plan growth --top 5 --lookback-years 3
//!
//! # Head-to-head comparison
//! mf-analytics compare --nav data/nav/120465.json --nav data/nav/118834.json
//! ```
//!
//! NAV files use the mfapi.in JSON layout. `--config` takes a JSON file:
//! an analysis config for `metrics` and `compare`, a screener config for
//! `screen`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use mf_analytics::analytics::{FundComparator, FundComparison, FundScreener, ScreenerConfig};
use mf_analytics::data::{
    common_end_date, Frequency, FundCandidate, Lookback, NavLoader, PlanFilter, PlanType,
};
use mf_analytics::metrics::{AnalysisConfig, MetricsCalculator, MetricsRecord};
use mf_analytics::validation::{SeriesIntegrityReport, SeriesValidator};

const SEPARATOR: &str = "============================================================";

#[derive(Parser)]
#[command(name = "mf-analytics")]
#[command(about = "Mutual fund NAV metrics, screening and comparison")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute every metric for one NAV history
    Metrics {
        /// Path to NAV document
        #[arg(long)]
        nav: PathBuf,

        /// Trailing years to analyze (default: full history)
        #[arg(long)]
        lookback_years: Option<u32>,

        /// Sampling frequency: daily or month-end
        #[arg(long, value_parser = parse_frequency, default_value = "daily")]
        frequency: Frequency,

        /// Analysis config (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Rank several funds by weighted composite score
    Screen {
        /// Paths to NAV documents
        #[arg(long, required = true, num_args = 1..)]
        nav: Vec<PathBuf>,

        /// Plan filter: growth, idcw or both
        #[arg(long, value_parser = parse_plan_filter)]
        plan: Option<PlanFilter>,

        /// Number of funds to return
        #[arg(long)]
        top: Option<usize>,

        /// Trailing years to analyze
        #[arg(long)]
        lookback_years: Option<u32>,

        /// Sampling frequency: daily or month-end (overrides the config)
        #[arg(long, value_parser = parse_frequency)]
        frequency: Option<Frequency>,

        /// Screener config (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Compare two funds head to head
    Compare {
        /// Paths to exactly two NAV documents
        #[arg(long, required = true, num_args = 1..)]
        nav: Vec<PathBuf>,

        /// Trailing years to analyze (default: full common history)
        #[arg(long)]
        lookback_years: Option<u32>,

        /// Sampling frequency: daily or month-end
        #[arg(long, value_parser = parse_frequency, default_value = "daily")]
        frequency: Frequency,

        /// Analysis config (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print JSON instead of a report
        #[arg(long)]
        json: bool,
    },
}

fn parse_plan_filter(s: &str) -> Result<PlanFilter, String> {
    PlanFilter::from_name(s).ok_or_else(|| format!("unknown plan filter '{}' (growth, idcw, both)", s))
}

fn parse_frequency(s: &str) -> Result<Frequency, String> {
    Frequency::from_name(s).ok_or_else(|| format!("unknown frequency '{}' (daily, month-end)", s))
}

#[derive(Serialize)]
struct FundReport<'a> {
    fund_id: &'a str,
    name: Option<&'a str>,
    plan: PlanType,
    metrics: &'a MetricsRecord,
}

#[derive(Serialize)]
struct CompareReport<'a> {
    #[serde(flatten)]
    comparison: &'a FundComparison,
    left_integrity: Option<&'a SeriesIntegrityReport>,
    right_integrity: Option<&'a SeriesIntegrityReport>,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mf_analytics=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Metrics {
            nav,
            lookback_years,
            frequency,
            config,
            json,
        } => {
            let config: AnalysisConfig = read_config(config.as_deref())?;
            let lookback = lookback_years.map_or(Lookback::Full, Lookback::Years);
            cmd_metrics(&nav, &config, lookback, frequency, json)
        }
        Commands::Screen {
            nav,
            plan,
            top,
            lookback_years,
            frequency,
            config,
            json,
        } => {
            let mut config: ScreenerConfig = read_config(config.as_deref())?;
            if let Some(plan) = plan {
                config.plan_filter = plan;
            }
            if let Some(top) = top {
                config.top_n = top;
            }
            if let Some(years) = lookback_years {
                config.lookback = Lookback::Years(years);
            }
            if let Some(frequency) = frequency {
                config.frequency = frequency;
            }
            cmd_screen(&nav, config, json)
        }
        Commands::Compare {
            nav,
            lookback_years,
            frequency,
            config,
            json,
        } => {
            if nav.len() != 2 {
                bail!("compare takes exactly two --nav files, got {}", nav.len());
            }
            let config: AnalysisConfig = read_config(config.as_deref())?;
            let lookback = lookback_years.map_or(Lookback::Full, Lookback::Years);
            cmd_compare(&nav[0], &nav[1], &config, lookback, frequency, json)
        }
    }
}

/// Read a JSON config, or the type's default when no path is given.
fn read_config<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    let Some(path) = path else {
        return Ok(T::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid config {}", path.display()))
}

fn load_candidate(path: &Path) -> Result<FundCandidate> {
    let fund = NavLoader::load_file(path)
        .with_context(|| format!("Failed to load NAV file {}", path.display()))?;
    let fallback = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(fund.into_candidate(&fallback))
}

fn display_name(candidate: &FundCandidate) -> &str {
    candidate.name.as_deref().unwrap_or(&candidate.id)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_metrics(
    nav: &Path,
    config: &AnalysisConfig,
    lookback: Lookback,
    frequency: Frequency,
    json: bool,
) -> Result<()> {
    config.validate()?;
    let candidate = load_candidate(nav)?;
    let prepared = SeriesValidator::new(config.integrity)
        .prepare(candidate.points.clone())
        .with_context(|| format!("Invalid NAV history for {}", candidate.id))?;
    info!("Analyzing {} at {:?} frequency", lookback.describe(), frequency);
    let record = MetricsCalculator::compute_window(prepared, None, lookback, frequency, config);

    if json {
        return print_json(&FundReport {
            fund_id: &candidate.id,
            name: candidate.name.as_deref(),
            plan: candidate.plan,
            metrics: &record,
        });
    }

    println!("{}", SEPARATOR);
    println!("{} ({})", display_name(&candidate), candidate.plan.as_str());
    println!("{}", SEPARATOR);
    println!("{}", record.summary());
    if let Some(dd) = &record.drawdown {
        if let (Some(peak), Some(trough)) = (dd.peak_date, dd.trough_date) {
            println!(
                "Worst drawdown: {:.2}% from {} to {}, {}",
                dd.max_drawdown_pct,
                peak,
                trough,
                dd.recovery_date
                    .map_or_else(|| "not recovered".to_string(), |d| format!("recovered {}", d))
            );
        }
    }
    if let Some(report) = &record.integrity {
        println!("Integrity: {}", report.summary());
    }
    Ok(())
}

fn cmd_screen(navs: &[PathBuf], config: ScreenerConfig, json: bool) -> Result<()> {
    let candidates = navs
        .iter()
        .map(|p| load_candidate(p))
        .collect::<Result<Vec<_>>>()?;
    info!("Loaded {} candidates", candidates.len());

    let result = FundScreener::new(config).rank(&candidates)?;

    if json {
        return print_json(&result);
    }
    println!("{}", SEPARATOR);
    println!("{}", result.summary());
    Ok(())
}

fn cmd_compare(
    left_path: &Path,
    right_path: &Path,
    config: &AnalysisConfig,
    lookback: Lookback,
    frequency: Frequency,
    json: bool,
) -> Result<()> {
    config.validate()?;
    let left = load_candidate(left_path)?;
    let right = load_candidate(right_path)?;

    let validator = SeriesValidator::new(config.integrity);
    let left_series = validator
        .prepare(left.points.clone())
        .with_context(|| format!("Invalid NAV history for {}", left.id))?;
    let right_series = validator
        .prepare(right.points.clone())
        .with_context(|| format!("Invalid NAV history for {}", right.id))?;

    let Some(end) = common_end_date([&left_series.series, &right_series.series]) else {
        bail!("No NAV data to compare");
    };
    info!("Comparing over {} ending {}", lookback.describe(), end);

    let left_record =
        MetricsCalculator::compute_window(left_series, Some(end), lookback, frequency, config);
    let right_record =
        MetricsCalculator::compute_window(right_series, Some(end), lookback, frequency, config);

    let comparison = FundComparator::compare(
        display_name(&left),
        &left_record,
        display_name(&right),
        &right_record,
    );

    if json {
        return print_json(&CompareReport {
            comparison: &comparison,
            left_integrity: left_record.integrity.as_ref(),
            right_integrity: right_record.integrity.as_ref(),
        });
    }
    println!("{}", SEPARATOR);
    println!("{}", comparison.summary());
    let sides = [
        (&comparison.left_name, &left_record),
        (&comparison.right_name, &right_record),
    ];
    for (name, record) in sides {
        if let Some(report) = &record.integrity {
            println!("Integrity ({}): {}", name, report.summary());
        }
    }
    Ok(())
}
