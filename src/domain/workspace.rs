//! Per-run workspace paths and the context threaded through stages.

use crate::domain::error::QuantError;
use crate::domain::task::RunState;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const RAW_FILE: &str = "raw_market_data_.csv";
pub const RESULTS_FILE: &str = "results.csv";
pub const BEST_CONFIG_FILE: &str = "best_config.json";
pub const FEATURES_FILE: &str = "features.csv";
pub const LABELS_FILE: &str = "labels.csv";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.6f%z";

/// Rejects anything that is not a single market symbol.
pub fn validate_symbol(symbol: &str) -> Result<(), QuantError> {
    let invalid = symbol.is_empty()
        || symbol
            .chars()
            .any(|c| c == ',' || c == ';' || c.is_whitespace());
    if invalid {
        return Err(QuantError::InvalidSymbol {
            symbol: symbol.to_string(),
        });
    }
    Ok(())
}

/// Directory owned by exactly one run, plus its fixed artifact paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunWorkspace {
    root: PathBuf,
}

impl RunWorkspace {
    /// Creates `<data_dir>/<SYMBOL>_<timestamp>`. Fails if the directory already exists.
    pub fn create(
        data_dir: &Path,
        symbol: &str,
        created_at: DateTime<Tz>,
    ) -> Result<Self, QuantError> {
        let name = format!(
            "{}_{}",
            symbol.to_uppercase(),
            created_at.format(TIMESTAMP_FORMAT)
        );
        let root = data_dir.join(name);

        fs::create_dir_all(data_dir)?;
        match fs::create_dir(&root) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(QuantError::WorkspaceExists { path: root });
            }
            Err(e) => return Err(e.into()),
        }

        info!(path = %root.display(), "created run workspace");
        Ok(Self { root })
    }

    /// Opens an existing workspace directory, e.g. for the dataset join.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, QuantError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(QuantError::MissingArtifact {
                artifact: "workspace".into(),
                path: root,
            });
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn raw_path(&self) -> PathBuf {
        self.root.join(RAW_FILE)
    }

    pub fn results_path(&self) -> PathBuf {
        self.root.join(RESULTS_FILE)
    }

    pub fn best_config_path(&self) -> PathBuf {
        self.root.join(BEST_CONFIG_FILE)
    }

    pub fn features_path(&self) -> PathBuf {
        self.root.join(FEATURES_FILE)
    }

    pub fn labels_path(&self) -> PathBuf {
        self.root.join(LABELS_FILE)
    }
}

/// Run identity and progress, built once and passed by reference into each stage.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub symbol: String,
    pub workspace: RunWorkspace,
    pub created_at: DateTime<Utc>,
    pub state: RunState,
    /// Candidates evaluated by a search in this run that selected nothing.
    pub no_viable: Option<usize>,
}

impl RunContext {
    pub fn new(symbol: impl Into<String>, workspace: RunWorkspace, created_at: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            workspace,
            created_at,
            state: RunState::Created,
            no_viable: None,
        }
    }

    /// Records a completed stage. State never moves backwards.
    pub fn advance(&mut self, state: RunState) {
        if state > self.state {
            self.state = state;
        }
    }
}
