//! Observation sources
//!
//! A source is either a local export (`.csv` or `.xlsx`) or a Google Sheet
//! downloaded as `.xlsx`. Sources are written as a path or `gsheet:<ID>`.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use tokio::task;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::import::{parse_csv, parse_workbook, parse_workbook_bytes};
use crate::models::Observation;

/// Download timeout for remote sheets
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

const GSHEET_PREFIX: &str = "gsheet:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    GoogleSheet { sheet_id: String },
}

impl DataSource {
    /// Parse a source spec: `gsheet:<ID>` or a file path
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(Error::InvalidData("Empty source".into()));
        }
        match spec.strip_prefix(GSHEET_PREFIX) {
            Some(id) if id.trim().is_empty() => {
                Err(Error::InvalidData("Missing Google Sheet ID after gsheet:".into()))
            }
            Some(id) => Ok(Self::GoogleSheet {
                sheet_id: id.trim().to_string(),
            }),
            None => Ok(Self::File(PathBuf::from(spec))),
        }
    }

    /// Resolve the source from `CADENCE_SOURCE`, falling back to `GOOGLE_SHEET_ID`
    pub fn from_env() -> Result<Option<Self>> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Option<Self>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(spec) = get("CADENCE_SOURCE") {
            return Self::parse(&spec).map(Some);
        }
        Ok(get("GOOGLE_SHEET_ID").map(|id| Self::GoogleSheet {
            sheet_id: id.trim().to_string(),
        }))
    }

    /// Export URL for a Google Sheet
    pub fn export_url(sheet_id: &str) -> String {
        format!(
            "https://docs.google.com/spreadsheets/d/{}/export?format=xlsx",
            sheet_id
        )
    }

    /// Load every observation the source holds
    ///
    /// File reads and workbook parsing run on the blocking pool.
    pub async fn load(&self) -> Result<Vec<Observation>> {
        let observations = match self {
            Self::File(path) => {
                let path = path.clone();
                task::spawn_blocking(move || load_file(&path)).await??
            }
            Self::GoogleSheet { sheet_id } => {
                let bytes = fetch_google_sheet(sheet_id).await?;
                task::spawn_blocking(move || parse_workbook_bytes(bytes)).await??
            }
        };
        info!(source = %self, count = observations.len(), "Loaded observations");
        Ok(observations)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::GoogleSheet { sheet_id } => write!(f, "{}{}", GSHEET_PREFIX, sheet_id),
        }
    }
}

fn load_file(path: &Path) -> Result<Vec<Observation>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("csv") => parse_csv(File::open(path)?, None),
        Some("xlsx") => parse_workbook(path),
        _ => Err(Error::Import(format!(
            "Unsupported source file: {} (expected .csv or .xlsx)",
            path.display()
        ))),
    }
}

/// Download the workbook export; parsing happens on a blocking thread
async fn fetch_google_sheet(sheet_id: &str) -> Result<Vec<u8>> {
    let url = DataSource::export_url(sheet_id);
    debug!(url = %url, "Fetching Google Sheet export");

    let client = Client::builder().timeout(FETCH_TIMEOUT).build()?;
    let response = client.get(&url).send().await?.error_for_status()?;

    let bytes = response.bytes().await?;
    debug!(bytes = bytes.len(), "Downloaded workbook");
    Ok(bytes.to_vec())
}
