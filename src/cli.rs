//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::adapters::artifact_store::{CsvArtifactStore, write_training_set};
use crate::adapters::csv_adapter::CsvAcquisitionAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::bar::PriceField;
use crate::domain::config::PipelineConfig;
use crate::domain::config_validation::{
    load_pipeline_config, validate_drawdown, validate_pipeline_config,
};
use crate::domain::dataset::build_training_set;
use crate::domain::error::QuantError;
use crate::domain::search::{CandidateResult, enumerate_candidates};
use crate::domain::task::{Task, TaskSet};
use crate::domain::workspace::{RunWorkspace, validate_symbol};
use crate::pipeline::{Pipeline, RunReport, StageOutcome};
use crate::ports::artifact_port::ArtifactPort;
use crate::ports::config_port::ConfigPort;

const PROGRESS_EVERY: usize = 500;

#[derive(Parser, Debug)]
#[command(name = "lightquant", about = "Dual moving-average research pipeline")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run pipeline stages for one symbol
    Run {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        symbol: Option<String>,
        /// acquire, optimize, features, labels or all (repeatable)
        #[arg(short = 't', long = "task")]
        tasks: Vec<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        source_dir: Option<PathBuf>,
        #[arg(long, allow_hyphen_values = true)]
        max_drawdown: Option<f64>,
        #[arg(long)]
        close_col: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Join a run's features and labels into a training table
    Dataset {
        #[arg(short, long)]
        workspace: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub symbol: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub max_drawdown: Option<f64>,
    pub close_col: Option<String>,
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn execute(cli: Cli) -> Result<(), QuantError> {
    match cli.command {
        Command::Run {
            config,
            symbol,
            tasks,
            data_dir,
            source_dir,
            max_drawdown,
            close_col,
        } => {
            let overrides = Overrides {
                symbol,
                data_dir,
                max_drawdown,
                close_col,
            };
            run_pipeline(config.as_deref(), &tasks, &overrides, source_dir)
        }
        Command::Validate { config } => run_validate(&config),
        Command::Dataset { workspace, output } => run_dataset(&workspace, &output),
    }
}

pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, QuantError> {
    match path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            FileConfigAdapter::from_file(path)
        }
        None => FileConfigAdapter::from_string(""),
    }
}

/// File values, then command-line overrides, validated before any I/O.
pub fn build_pipeline_config(
    adapter: &dyn ConfigPort,
    overrides: &Overrides,
) -> Result<PipelineConfig, QuantError> {
    let mut config = load_pipeline_config(adapter)?;
    if let Some(symbol) = &overrides.symbol {
        config.symbol = symbol.trim().to_string();
    }
    if let Some(dir) = &overrides.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(floor) = overrides.max_drawdown {
        config.max_drawdown = floor;
    }
    if let Some(col) = &overrides.close_col {
        config.close_col = PriceField::from_str(col).map_err(|reason| QuantError::ConfigInvalid {
            section: "pipeline".into(),
            key: "close_col".into(),
            reason,
        })?;
    }
    validate_symbol(&config.symbol)?;
    validate_drawdown(config.max_drawdown)?;
    Ok(config)
}

/// `--source-dir`, then `[acquisition] source_dir`; required only when acquiring.
pub fn resolve_source_dir(
    adapter: &dyn ConfigPort,
    cli_value: Option<PathBuf>,
    tasks: &TaskSet,
) -> Result<PathBuf, QuantError> {
    if let Some(dir) = cli_value {
        return Ok(dir);
    }
    match adapter
        .get_string("acquisition", "source_dir")
        .filter(|s| !s.trim().is_empty())
    {
        Some(dir) => Ok(PathBuf::from(dir.trim())),
        None if tasks.contains(Task::Acquire) => Err(QuantError::ConfigMissing {
            section: "acquisition".into(),
            key: "source_dir".into(),
        }),
        None => Ok(PathBuf::from(".")),
    }
}

fn run_pipeline(
    config_path: Option<&Path>,
    task_tokens: &[String],
    overrides: &Overrides,
    source_dir: Option<PathBuf>,
) -> Result<(), QuantError> {
    let tasks = if task_tokens.is_empty() {
        TaskSet::all()
    } else {
        TaskSet::parse(task_tokens)?
    };

    let adapter = load_config(config_path)?;
    let config = build_pipeline_config(&adapter, overrides)?;
    let source_dir = resolve_source_dir(&adapter, source_dir, &tasks)?;

    let acquisition = CsvAcquisitionAdapter::new(source_dir);
    let artifacts = CsvArtifactStore::new();

    let total = enumerate_candidates(&config.search).len();
    let done = AtomicUsize::new(0);
    let progress = |_: &CandidateResult| {
        let n = done.fetch_add(1, Ordering::Relaxed) + 1;
        if n % PROGRESS_EVERY == 0 || n == total {
            eprintln!("  evaluated {n}/{total} candidates");
        }
    };

    let mut pipeline = Pipeline::new(&config, &acquisition, &artifacts)?.with_progress(progress);
    eprintln!(
        "Running {} for {} in {}",
        tasks,
        config.symbol,
        pipeline.workspace().root().display()
    );

    let report = pipeline.run(&tasks)?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("Workspace: {}", report.workspace.display());
    for outcome in &report.outcomes {
        match outcome {
            StageOutcome::Acquired { rows } => println!("acquire:  {rows} bars"),
            StageOutcome::Searched { evaluated, best } => println!(
                "optimize: {evaluated} candidates, best fast={} slow={} returns={:.4} cagr={:.4} sharpe={:.4} drawdown={:.4}",
                best.fast, best.slow, best.returns, best.cagr, best.sharpe, best.drawdown
            ),
            StageOutcome::NoViableCandidate { evaluated } => println!(
                "optimize: {evaluated} candidates, none within the drawdown floor; no best config written"
            ),
            StageOutcome::FeaturesBuilt { rows, columns } => {
                println!("features: {rows} rows x {columns} rank columns")
            }
            StageOutcome::LabelsBuilt { rows, long } => {
                println!("labels:   {rows} rows, {long} long")
            }
        }
    }
    println!("State: {:?}", report.state);
}

fn run_validate(config_path: &Path) -> Result<(), QuantError> {
    let adapter = load_config(Some(config_path))?;
    validate_pipeline_config(&adapter)?;
    println!("Configuration valid: {}", config_path.display());
    Ok(())
}

fn run_dataset(workspace: &Path, output: &Path) -> Result<(), QuantError> {
    let workspace = RunWorkspace::open(workspace)?;
    let store = CsvArtifactStore::new();
    let features = store.read_features(&workspace)?;
    let labels = store.read_labels(&workspace)?;

    let set = build_training_set(&features, &labels);
    write_training_set(output, &set)?;

    let (flat, long) = set.class_counts();
    println!(
        "Wrote {} rows x {} features to {} (flat {flat}, long {long})",
        set.len(),
        set.columns.len(),
        output.display()
    );
    Ok(())
}
