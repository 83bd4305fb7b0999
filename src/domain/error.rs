//! Domain error types.

use std::path::PathBuf;

/// Top-level error type for lightquant.
#[derive(Debug, thiserror::Error)]
pub enum QuantError {
    #[error("invalid task set: {reason}")]
    InvalidTaskSet { reason: String },

    #[error("please pass a single market symbol, got {symbol:?}")]
    InvalidSymbol { symbol: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("acquisition failed for {symbol}: {reason}")]
    AcquisitionFailed { symbol: String, reason: String },

    #[error("missing {artifact} artifact at {}", path.display())]
    MissingArtifact { artifact: String, path: PathBuf },

    #[error("no best config at {}; {hint}", path.display())]
    MissingConfig { path: PathBuf, hint: String },

    #[error("no candidate survived filtering ({evaluated} evaluated)")]
    NoViableCandidate { evaluated: usize },

    #[error("run workspace already exists: {}", path.display())]
    WorkspaceExists { path: PathBuf },

    #[error("malformed artifact {}: {reason}", path.display())]
    Artifact { path: PathBuf, reason: String },

    #[error("insufficient data: have {have} rows, need {need}")]
    InsufficientData { have: usize, need: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl QuantError {
    pub fn missing_config(path: PathBuf) -> Self {
        QuantError::MissingConfig {
            path,
            hint: "run the optimize task first".into(),
        }
    }

    /// True for errors raised before any stage touches the filesystem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            QuantError::InvalidTaskSet { .. }
                | QuantError::InvalidSymbol { .. }
                | QuantError::ConfigParse { .. }
                | QuantError::ConfigMissing { .. }
                | QuantError::ConfigInvalid { .. }
        )
    }
}

impl From<&QuantError> for std::process::ExitCode {
    fn from(err: &QuantError) -> Self {
        let code: u8 = match err {
            QuantError::Io(_) | QuantError::WorkspaceExists { .. } => 1,
            QuantError::InvalidTaskSet { .. }
            | QuantError::InvalidSymbol { .. }
            | QuantError::ConfigParse { .. }
            | QuantError::ConfigMissing { .. }
            | QuantError::ConfigInvalid { .. } => 2,
            QuantError::AcquisitionFailed { .. } => 3,
            QuantError::MissingArtifact { .. }
            | QuantError::MissingConfig { .. }
            | QuantError::Artifact { .. } => 4,
            QuantError::NoViableCandidate { .. } | QuantError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
