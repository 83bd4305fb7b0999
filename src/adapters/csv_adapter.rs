//! CSV bar-file acquisition adapter.
//!
//! Reads `<source_dir>/<SYMBOL>.csv` with a header row. Required columns are
//! `date` (or `timestamp`), `open`, `high`, `low`, `close`; `vwap` is optional
//! and any other column is ignored. Dates may be `YYYY-MM-DD` or RFC 3339.

use crate::domain::bar::RawBar;
use crate::domain::error::QuantError;
use crate::ports::acquisition_port::AcquisitionPort;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct SourceRow {
    #[serde(alias = "date", alias = "Date", alias = "Timestamp")]
    timestamp: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(default, alias = "VWAP", alias = "Vwap")]
    vwap: Option<f64>,
}

pub struct CsvAcquisitionAdapter {
    source_dir: PathBuf,
}

impl CsvAcquisitionAdapter {
    pub fn new(source_dir: PathBuf) -> Self {
        Self { source_dir }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.source_dir.join(format!("{}.csv", symbol))
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("invalid date '{}'", raw))
}

impl AcquisitionPort for CsvAcquisitionAdapter {
    fn fetch(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<RawBar>, QuantError> {
        let path = self.csv_path(symbol);
        let failed = |reason: String| QuantError::AcquisitionFailed {
            symbol: symbol.to_string(),
            reason,
        };

        let mut rdr = csv::Reader::from_path(&path)
            .map_err(|e| failed(format!("failed to open {}: {}", path.display(), e)))?;

        let mut bars = Vec::new();
        for (line, result) in rdr.deserialize::<SourceRow>().enumerate() {
            let row = result.map_err(|e| failed(format!("CSV parse error: {}", e)))?;
            let timestamp = parse_timestamp(&row.timestamp)
                .map_err(|e| failed(format!("row {}: {}", line + 1, e)))?;

            let date = timestamp.date_naive();
            if date < start_date || date > end_date {
                continue;
            }

            bars.push(RawBar {
                symbol: symbol.to_string(),
                timestamp,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                vwap: row.vwap,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        debug!(path = %path.display(), "read bar file");
        info!(symbol, rows = bars.len(), %start_date, %end_date, "acquired bars");
        Ok(bars)
    }
}
