//! CSV/JSON artifact store rooted at a run workspace.

use crate::domain::bar::{BarTable, RawBar};
use crate::domain::dataset::TrainingSet;
use crate::domain::error::QuantError;
use crate::domain::features::{FeatureRow, FeatureTable};
use crate::domain::labels::{LabelRow, LabelSeries};
use crate::domain::search::{BestConfig, CandidateResult};
use crate::domain::workspace::RunWorkspace;
use crate::ports::artifact_port::ArtifactPort;
use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use tracing::debug;

const FEATURE_KEY_COLUMNS: [&str; 2] = ["date", "symbol"];

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvArtifactStore;

impl CsvArtifactStore {
    pub fn new() -> Self {
        Self
    }
}

fn malformed(path: &Path, reason: impl ToString) -> QuantError {
    QuantError::Artifact {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn require(path: &Path, artifact: &str) -> Result<(), QuantError> {
    if !path.is_file() {
        return Err(QuantError::MissingArtifact {
            artifact: artifact.to_string(),
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), QuantError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| malformed(path, e))?;
    for row in rows {
        wtr.serialize(row).map_err(|e| malformed(path, e))?;
    }
    wtr.flush()?;
    debug!(path = %path.display(), rows = rows.len(), "wrote artifact");
    Ok(())
}

fn read_rows<T: DeserializeOwned>(path: &Path, artifact: &str) -> Result<Vec<T>, QuantError> {
    require(path, artifact)?;
    let mut rdr = csv::Reader::from_path(path).map_err(|e| malformed(path, e))?;
    rdr.deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| malformed(path, e))
}

fn parse_f64(path: &Path, raw: &str) -> Result<f64, QuantError> {
    raw.trim()
        .parse()
        .map_err(|_| malformed(path, format!("invalid number '{}'", raw)))
}

/// Writes a joined training table: `date`, the rank columns, then `position`.
pub fn write_training_set(path: &Path, set: &TrainingSet) -> Result<(), QuantError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| malformed(path, e))?;

    let mut header = vec!["date"];
    header.extend(set.columns.iter().map(String::as_str));
    header.push("position");
    wtr.write_record(&header).map_err(|e| malformed(path, e))?;

    for row in &set.rows {
        let mut record = vec![row.date.to_string()];
        record.extend(row.features.iter().map(f64::to_string));
        record.push(row.position.to_string());
        wtr.write_record(&record).map_err(|e| malformed(path, e))?;
    }
    wtr.flush()?;
    debug!(path = %path.display(), rows = set.len(), "wrote training set");
    Ok(())
}

impl ArtifactPort for CsvArtifactStore {
    fn write_raw(&self, workspace: &RunWorkspace, table: &BarTable) -> Result<(), QuantError> {
        write_rows(&workspace.raw_path(), table.bars())
    }

    fn read_raw(&self, workspace: &RunWorkspace) -> Result<BarTable, QuantError> {
        let bars: Vec<RawBar> = read_rows(&workspace.raw_path(), "raw market data")?;
        Ok(BarTable::new(bars))
    }

    fn write_results(
        &self,
        workspace: &RunWorkspace,
        results: &[CandidateResult],
    ) -> Result<(), QuantError> {
        write_rows(&workspace.results_path(), results)
    }

    fn read_results(&self, workspace: &RunWorkspace) -> Result<Vec<CandidateResult>, QuantError> {
        read_rows(&workspace.results_path(), "results")
    }

    fn write_best_config(
        &self,
        workspace: &RunWorkspace,
        best: &BestConfig,
    ) -> Result<(), QuantError> {
        let path = workspace.best_config_path();
        let json = serde_json::to_string_pretty(best).map_err(|e| malformed(&path, e))?;
        fs::write(&path, json)?;
        debug!(path = %path.display(), "wrote best config");
        Ok(())
    }

    fn read_best_config(&self, workspace: &RunWorkspace) -> Result<BestConfig, QuantError> {
        let path = workspace.best_config_path();
        if !path.is_file() {
            return Err(QuantError::missing_config(path));
        }
        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|e| malformed(&path, e))
    }

    fn write_features(
        &self,
        workspace: &RunWorkspace,
        features: &FeatureTable,
    ) -> Result<(), QuantError> {
        let path = workspace.features_path();
        let mut wtr = csv::Writer::from_path(&path).map_err(|e| malformed(&path, e))?;

        let mut header: Vec<&str> = FEATURE_KEY_COLUMNS.to_vec();
        if features.has_vwap {
            header.push("vwap");
        }
        header.extend(features.columns.iter().map(String::as_str));
        wtr.write_record(&header).map_err(|e| malformed(&path, e))?;

        for row in &features.rows {
            let mut record = vec![row.date.to_string(), row.symbol.clone()];
            if features.has_vwap {
                record.push(row.vwap.map(|v| v.to_string()).unwrap_or_default());
            }
            record.extend(row.values.iter().map(f64::to_string));
            wtr.write_record(&record).map_err(|e| malformed(&path, e))?;
        }
        wtr.flush()?;
        debug!(path = %path.display(), rows = features.len(), "wrote features");
        Ok(())
    }

    fn read_features(&self, workspace: &RunWorkspace) -> Result<FeatureTable, QuantError> {
        let path = workspace.features_path();
        require(&path, "features")?;
        let mut rdr = csv::Reader::from_path(&path).map_err(|e| malformed(&path, e))?;

        let headers = rdr.headers().map_err(|e| malformed(&path, e))?.clone();
        if headers.iter().take(2).ne(FEATURE_KEY_COLUMNS) {
            return Err(malformed(&path, "expected leading date,symbol columns"));
        }
        let has_vwap = headers.get(2) == Some("vwap");
        let first_value = if has_vwap { 3 } else { 2 };
        let columns: Vec<String> = headers.iter().skip(first_value).map(String::from).collect();

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record.map_err(|e| malformed(&path, e))?;
            let date_raw = record.get(0).unwrap_or_default();
            let date = NaiveDate::parse_from_str(date_raw, "%Y-%m-%d")
                .map_err(|_| malformed(&path, format!("invalid date '{}'", date_raw)))?;
            let vwap = match record.get(2) {
                Some(raw) if has_vwap && !raw.is_empty() => Some(parse_f64(&path, raw)?),
                _ => None,
            };
            let values = record
                .iter()
                .skip(first_value)
                .map(|raw| parse_f64(&path, raw))
                .collect::<Result<Vec<f64>, _>>()?;
            rows.push(FeatureRow {
                date,
                symbol: record.get(1).unwrap_or_default().to_string(),
                vwap,
                values,
            });
        }

        let symbol = rows.first().map(|r| r.symbol.clone()).unwrap_or_default();
        Ok(FeatureTable {
            symbol,
            columns,
            has_vwap,
            rows,
        })
    }

    fn write_labels(
        &self,
        workspace: &RunWorkspace,
        labels: &LabelSeries,
    ) -> Result<(), QuantError> {
        write_rows(&workspace.labels_path(), &labels.rows)
    }

    fn read_labels(&self, workspace: &RunWorkspace) -> Result<LabelSeries, QuantError> {
        let rows: Vec<LabelRow> = read_rows(&workspace.labels_path(), "labels")?;
        Ok(LabelSeries { rows })
    }
}
