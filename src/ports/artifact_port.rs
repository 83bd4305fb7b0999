//! Persistence port for run artifacts.
//!
//! Every call names the workspace explicitly; an implementation holds no
//! per-run state of its own.

use crate::domain::bar::BarTable;
use crate::domain::error::QuantError;
use crate::domain::features::FeatureTable;
use crate::domain::labels::LabelSeries;
use crate::domain::search::{BestConfig, CandidateResult};
use crate::domain::workspace::RunWorkspace;

pub trait ArtifactPort {
    fn write_raw(&self, workspace: &RunWorkspace, table: &BarTable) -> Result<(), QuantError>;

    /// Fails with `MissingArtifact` when acquisition has not run.
    fn read_raw(&self, workspace: &RunWorkspace) -> Result<BarTable, QuantError>;

    fn write_results(
        &self,
        workspace: &RunWorkspace,
        results: &[CandidateResult],
    ) -> Result<(), QuantError>;

    fn read_results(&self, workspace: &RunWorkspace) -> Result<Vec<CandidateResult>, QuantError>;

    fn write_best_config(
        &self,
        workspace: &RunWorkspace,
        best: &BestConfig,
    ) -> Result<(), QuantError>;

    /// Fails with `MissingConfig` when no search has selected a configuration.
    fn read_best_config(&self, workspace: &RunWorkspace) -> Result<BestConfig, QuantError>;

    fn write_features(
        &self,
        workspace: &RunWorkspace,
        features: &FeatureTable,
    ) -> Result<(), QuantError>;

    fn read_features(&self, workspace: &RunWorkspace) -> Result<FeatureTable, QuantError>;

    fn write_labels(&self, workspace: &RunWorkspace, labels: &LabelSeries)
    -> Result<(), QuantError>;

    fn read_labels(&self, workspace: &RunWorkspace) -> Result<LabelSeries, QuantError>;
}
