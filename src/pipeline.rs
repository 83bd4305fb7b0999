//! Stage sequencing for one research run.
//!
//! A [`Pipeline`] owns one instance of each stage component and a
//! [`RunContext`]. Stages run in the fixed order acquire, optimize, features,
//! labels and exchange data only through artifacts in the run workspace.

use crate::domain::bar::{BarTable, PriceField};
use crate::domain::config::PipelineConfig;
use crate::domain::config_validation::validate_drawdown;
use crate::domain::error::QuantError;
use crate::domain::features::FeatureEngineer;
use crate::domain::labels::LabelEngineer;
use crate::domain::search::{BestConfig, CandidateResult, SearchEngine};
use crate::domain::task::{RunState, Task, TaskSet};
use crate::domain::workspace::{RunContext, RunWorkspace, validate_symbol};
use crate::ports::acquisition_port::AcquisitionPort;
use crate::ports::artifact_port::ArtifactPort;
use chrono::{DateTime, Duration, Utc};
use std::path::PathBuf;
use tracing::{info, warn};

type Progress<'a> = Box<dyn Fn(&CandidateResult) + Sync + 'a>;

/// What one stage produced.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    Acquired { rows: usize },
    Searched { evaluated: usize, best: BestConfig },
    /// The search ran but nothing passed the filters; no best config was written.
    NoViableCandidate { evaluated: usize },
    FeaturesBuilt { rows: usize, columns: usize },
    LabelsBuilt { rows: usize, long: usize },
}

impl StageOutcome {
    pub fn task(&self) -> Task {
        match self {
            StageOutcome::Acquired { .. } => Task::Acquire,
            StageOutcome::Searched { .. } | StageOutcome::NoViableCandidate { .. } => {
                Task::Optimize
            }
            StageOutcome::FeaturesBuilt { .. } => Task::Features,
            StageOutcome::LabelsBuilt { .. } => Task::Labels,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub workspace: PathBuf,
    pub outcomes: Vec<StageOutcome>,
    pub state: RunState,
}

impl RunReport {
    pub fn best(&self) -> Option<&BestConfig> {
        self.outcomes.iter().find_map(|o| match o {
            StageOutcome::Searched { best, .. } => Some(best),
            _ => None,
        })
    }
}

pub struct Pipeline<'a> {
    search: SearchEngine,
    features: FeatureEngineer,
    labels: LabelEngineer,
    close_col: PriceField,
    lookback_days: i64,
    acquisition: &'a dyn AcquisitionPort,
    artifacts: &'a dyn ArtifactPort,
    progress: Option<Progress<'a>>,
    context: RunContext,
}

impl<'a> Pipeline<'a> {
    /// Validates the request and creates a fresh run workspace stamped with the current time.
    pub fn new(
        config: &PipelineConfig,
        acquisition: &'a dyn AcquisitionPort,
        artifacts: &'a dyn ArtifactPort,
    ) -> Result<Self, QuantError> {
        Self::new_at(config, acquisition, artifacts, Utc::now())
    }

    /// As [`Pipeline::new`] with an explicit creation instant.
    pub fn new_at(
        config: &PipelineConfig,
        acquisition: &'a dyn AcquisitionPort,
        artifacts: &'a dyn ArtifactPort,
        created_at: DateTime<Utc>,
    ) -> Result<Self, QuantError> {
        validate_symbol(&config.symbol)?;
        validate_drawdown(config.max_drawdown)?;

        let local = created_at.with_timezone(&config.timezone);
        let workspace = RunWorkspace::create(&config.data_dir, &config.symbol, local)?;
        let context = RunContext::new(config.symbol.clone(), workspace, created_at);

        Ok(Self {
            search: SearchEngine::new(config.search.clone(), config.max_drawdown)
                .with_parallelism(config.parallel),
            features: FeatureEngineer::new(config.features),
            labels: LabelEngineer::new(config.close_col),
            close_col: config.close_col,
            lookback_days: config.lookback_days,
            acquisition,
            artifacts,
            progress: None,
            context,
        })
    }

    /// Installs a callback invoked once per evaluated search candidate.
    pub fn with_progress(mut self, hook: impl Fn(&CandidateResult) + Sync + 'a) -> Self {
        self.progress = Some(Box::new(hook));
        self
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    pub fn workspace(&self) -> &RunWorkspace {
        &self.context.workspace
    }

    /// Runs the requested stages in execution order, stopping at the first error.
    pub fn run(&mut self, tasks: &TaskSet) -> Result<RunReport, QuantError> {
        info!(
            symbol = %self.context.symbol,
            tasks = %tasks,
            workspace = %self.workspace().root().display(),
            "starting run"
        );

        let mut outcomes = Vec::with_capacity(tasks.len());
        for task in tasks.iter() {
            let outcome = match task {
                Task::Acquire => self.acquire()?,
                Task::Optimize => self.optimize()?,
                Task::Features => self.build_features()?,
                Task::Labels => self.build_labels()?,
            };
            self.context.advance(RunState::after(task));
            info!(stage = %task, state = ?self.context.state, "stage complete");
            outcomes.push(outcome);
        }

        Ok(RunReport {
            workspace: self.workspace().root().to_path_buf(),
            outcomes,
            state: self.context.state,
        })
    }

    fn acquire(&self) -> Result<StageOutcome, QuantError> {
        let symbol = &self.context.symbol;
        let end = self.context.created_at.date_naive();
        let start = Duration::try_days(self.lookback_days)
            .and_then(|lookback| end.checked_sub_signed(lookback))
            .ok_or_else(|| QuantError::ConfigInvalid {
                section: "pipeline".into(),
                key: "lookback_days".into(),
                reason: format!(
                    "{} days before {end} is outside the supported date range",
                    self.lookback_days
                ),
            })?;
        info!(symbol = %symbol, %start, %end, "acquiring daily bars");

        let bars = self.acquisition.fetch(symbol, start, end)?;
        if bars.is_empty() {
            return Err(QuantError::AcquisitionFailed {
                symbol: symbol.clone(),
                reason: format!("no bars between {start} and {end}"),
            });
        }

        let table = BarTable::new(bars);
        self.artifacts.write_raw(self.workspace(), &table)?;
        Ok(StageOutcome::Acquired { rows: table.len() })
    }

    fn optimize(&mut self) -> Result<StageOutcome, QuantError> {
        let table = self.artifacts.read_raw(self.workspace())?;
        let outcome = self
            .search
            .run(&table, self.close_col, self.progress.as_deref())?;

        self.artifacts
            .write_results(self.workspace(), &outcome.ranked())?;

        match outcome.best {
            Some(best) => {
                self.artifacts.write_best_config(self.workspace(), &best)?;
                self.context.no_viable = None;
                Ok(StageOutcome::Searched {
                    evaluated: outcome.evaluated(),
                    best,
                })
            }
            None => {
                let err = QuantError::NoViableCandidate {
                    evaluated: outcome.evaluated(),
                };
                warn!(%err, "search finished without a best config");
                self.context.no_viable = Some(outcome.evaluated());
                Ok(StageOutcome::NoViableCandidate {
                    evaluated: outcome.evaluated(),
                })
            }
        }
    }

    fn build_features(&self) -> Result<StageOutcome, QuantError> {
        let table = self.artifacts.read_raw(self.workspace())?;
        let tables = self.features.engineer(&table);

        let mut rows = 0;
        let mut columns = 0;
        // One path per run: with several symbols the last table written wins.
        for features in &tables {
            self.artifacts.write_features(self.workspace(), features)?;
            rows = features.len();
            columns = features.columns.len();
        }
        Ok(StageOutcome::FeaturesBuilt { rows, columns })
    }

    fn build_labels(&self) -> Result<StageOutcome, QuantError> {
        let best = self
            .artifacts
            .read_best_config(self.workspace())
            .map_err(|err| match (err, self.context.no_viable) {
                (QuantError::MissingConfig { path, .. }, Some(evaluated)) => {
                    QuantError::MissingConfig {
                        path,
                        hint: format!(
                            "the search in this run found no viable candidate ({evaluated} evaluated)"
                        ),
                    }
                }
                (err, _) => err,
            })?;
        let table = self.artifacts.read_raw(self.workspace())?;
        let labels = self.labels.engineer(&table, &best);
        self.artifacts.write_labels(self.workspace(), &labels)?;
        Ok(StageOutcome::LabelsBuilt {
            rows: labels.len(),
            long: labels.long_count(),
        })
    }
}
