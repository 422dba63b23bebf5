//! Loader for NAV history documents.
//!
//! Reads the JSON layout served by mfapi.in and cached to disk by the fetch
//! tooling, one file per scheme:
//!
//! ```json
//! {
//!   "meta": { "scheme_code": 119551, "scheme_name": "... - Direct Plan - Growth" },
//!   "data": [ { "date": "15-03-2024", "nav": "123.45670" }, ... ]
//! }
//! ```
//!
//! Rows arrive newest first; the loader returns them in ascending date order
//! but does not otherwise validate them, so the caller's integrity policy
//! decides what happens to duplicates or zero NAVs.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::types::{FundCandidate, PlanType, ValuationPoint};
use crate::error::DataError;

/// Date format used by the NAV documents.
pub const NAV_DATE_FORMAT: &str = "%d-%m-%Y";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid date '{0}'")]
    InvalidDate(String),

    #[error("Invalid NAV '{raw}' on {date}")]
    InvalidNav { date: NaiveDate, raw: String },

    #[error(transparent)]
    Data(#[from] DataError),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(f64),
}

impl TextOrNumber {
    fn as_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawMeta {
    #[serde(default)]
    scheme_code: Option<TextOrNumber>,
    #[serde(default)]
    scheme_name: Option<String>,
    #[serde(default)]
    fund_house: Option<String>,
    #[serde(default)]
    scheme_category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawNavRow {
    date: String,
    nav: TextOrNumber,
}

#[derive(Debug, Deserialize)]
struct RawNavDocument {
    #[serde(default)]
    meta: RawMeta,
    #[serde(default)]
    data: Vec<RawNavRow>,
}

/// A parsed NAV history with its scheme metadata.
#[derive(Debug, Clone)]
pub struct LoadedFund {
    pub scheme_code: Option<String>,
    pub scheme_name: Option<String>,
    pub fund_house: Option<String>,
    pub category: Option<String>,
    /// Ascending by date, unvalidated.
    pub points: Vec<ValuationPoint>,
}

impl LoadedFund {
    /// Convert into a screening candidate, tagging the plan from the scheme name.
    ///
    /// `fallback_id` is used when the document carries no scheme code.
    pub fn into_candidate(self, fallback_id: &str) -> FundCandidate {
        let id = self
            .scheme_code
            .clone()
            .unwrap_or_else(|| fallback_id.to_string());
        let plan = self
            .scheme_name
            .as_deref()
            .map(PlanType::from_scheme_name)
            .unwrap_or(PlanType::Unclassified);

        FundCandidate {
            id,
            name: self.scheme_name,
            plan,
            points: self.points,
        }
    }
}

/// Reads cached NAV documents from a directory, one `<scheme_code>.json` per scheme.
pub struct NavLoader {
    data_dir: PathBuf,
}

impl NavLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn scheme_path(&self, scheme_code: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", scheme_code))
    }

    /// List scheme codes with a cached document.
    pub fn available_schemes(&self) -> Result<Vec<String>, LoaderError> {
        if !self.data_dir.exists() {
            return Ok(vec![]);
        }

        let mut codes = Vec::new();
        for entry in std::fs::read_dir(&self.data_dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();
            if let Some(code) = name.strip_suffix(".json") {
                codes.push(code.to_string());
            }
        }
        codes.sort();
        Ok(codes)
    }

    /// Load one scheme's cached document.
    pub fn load_scheme(&self, scheme_code: &str) -> Result<LoadedFund, LoaderError> {
        Self::load_file(self.scheme_path(scheme_code))
    }

    /// Load a NAV document from an explicit path.
    pub fn load_file(path: impl AsRef<Path>) -> Result<LoadedFund, LoaderError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LoaderError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let fund = Self::parse_document(&content)?;
        debug!(
            "Loaded {} NAV records from {}",
            fund.points.len(),
            path.display()
        );
        Ok(fund)
    }

    /// Parse a NAV document from a JSON string.
    pub fn parse_document(content: &str) -> Result<LoadedFund, LoaderError> {
        let raw: RawNavDocument = serde_json::from_str(content)?;

        if raw.data.is_empty() {
            let label = raw
                .meta
                .scheme_code
                .as_ref()
                .map(|c| c.as_text())
                .unwrap_or_else(|| "unknown scheme".to_string());
            return Err(DataError::Unavailable(format!("no NAV rows for {}", label)).into());
        }

        let mut points = raw
            .data
            .iter()
            .map(parse_row)
            .collect::<Result<Vec<_>, _>>()?;
        // Stable, so same-date rows keep their document order for the validator.
        points.sort_by_key(|p| p.date);

        Ok(LoadedFund {
            scheme_code: raw.meta.scheme_code.map(|c| c.as_text()),
            scheme_name: raw.meta.scheme_name,
            fund_house: raw.meta.fund_house,
            category: raw.meta.scheme_category,
            points,
        })
    }
}

fn parse_row(row: &RawNavRow) -> Result<ValuationPoint, LoaderError> {
    let date = NaiveDate::parse_from_str(row.date.trim(), NAV_DATE_FORMAT)
        .map_err(|_| LoaderError::InvalidDate(row.date.clone()))?;

    let value = match &row.nav {
        TextOrNumber::Number(n) => *n,
        TextOrNumber::Text(s) => s.trim().parse::<f64>().map_err(|_| LoaderError::InvalidNav {
            date,
            raw: s.clone(),
        })?,
    };

    Ok(ValuationPoint::new(date, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "meta": {
            "fund_house": "Axis Mutual Fund",
            "scheme_category": "Equity Scheme - Large Cap Fund",
            "scheme_code": 120465,
            "scheme_name": "Axis Bluechip Fund - Direct Plan - Growth"
        },
        "data": [
            {"date": "03-01-2024", "nav": "52.10000"},
            {"date": "02-01-2024", "nav": "51.50000"},
            {"date": "01-01-2024", "nav": 50.0}
        ],
        "status": "SUCCESS"
    }"#;

    #[test]
    fn test_parse_document_sorts_ascending() {
        let fund = NavLoader::parse_document(DOC).unwrap();
        assert_eq!(fund.scheme_code.as_deref(), Some("120465"));
        assert_eq!(fund.points.len(), 3);
        assert_eq!(
            fund.points[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert_eq!(fund.points[0].value, 50.0);
        assert_eq!(fund.points[2].value, 52.1);
    }

    #[test]
    fn test_into_candidate_tags_plan() {
        let candidate = NavLoader::parse_document(DOC)
            .unwrap()
            .into_candidate("fallback");
        assert_eq!(candidate.id, "120465");
        assert_eq!(candidate.plan, PlanType::Growth);
    }

    #[test]
    fn test_empty_document_is_unavailable() {
        let err = NavLoader::parse_document(r#"{"meta": {"scheme_code": "1"}, "data": []}"#)
            .unwrap_err();
        assert!(matches!(err, LoaderError::Data(DataError::Unavailable(_))));
    }

    #[test]
    fn test_bad_rows() {
        let err = NavLoader::parse_document(r#"{"data": [{"date": "2024-01-01", "nav": "1"}]}"#)
            .unwrap_err();
        assert!(matches!(err, LoaderError::InvalidDate(_)));

        let err = NavLoader::parse_document(r#"{"data": [{"date": "01-01-2024", "nav": "n/a"}]}"#)
            .unwrap_err();
        assert!(matches!(err, LoaderError::InvalidNav { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = NavLoader::load_file("/nonexistent/nav.json").unwrap_err();
        assert!(matches!(err, LoaderError::FileNotFound(_)));
    }
}
