mod config;
mod engine;
mod errors;
mod jobs;
mod ledger;
mod llm_client;
mod models;
mod optimizer;
mod runner;
mod submission;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::engine::{Engine, RunState};
use crate::jobs::{resolve_job_query, FileJobSource, JobSource, MockJobSource};
use crate::ledger::{MemorySink, ResultStore, RunSink};
use crate::llm_client::LlmClient;
use crate::models::cv::load_cv;
use crate::models::profile::load_profile;
use crate::models::{Cv, JobQueue, UserProfile};
use crate::optimizer::{LlmOptimizer, Optimizer, PassthroughOptimizer};
use crate::submission::{DryRunExecutor, FormExecutor, GreenhouseExecutor};

#[derive(Parser, Debug)]
#[command(name = "autoapply")]
#[command(version)]
#[command(about = "Tailors a CV to each job in a queue and submits the application forms.",
          long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find jobs and apply to each of them
    Run {
        #[command(flatten)]
        inputs: Inputs,

        /// JSON file with job postings (mock postings when omitted)
        #[arg(short, long)]
        jobs: Option<PathBuf>,

        /// Job search query (inferred from the CV when omitted)
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Re-apply to the jobs that failed in an earlier run
    Retry {
        /// Ledger file written by an earlier run
        ledger: PathBuf,

        #[command(flatten)]
        inputs: Inputs,
    },
}

#[derive(Args, Debug)]
struct Inputs {
    /// CV JSON file
    #[arg(long)]
    cv: PathBuf,

    /// Applicant profile JSON file
    #[arg(short, long)]
    profile: Option<PathBuf>,

    /// No LLM calls, no network, nothing written to disk
    #[arg(long, action)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting AutoApply v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Run {
            inputs,
            jobs,
            query,
        } => {
            let (cv, profile) = load_inputs(&inputs)?;
            let query = resolve_job_query(query.as_deref(), &cv);
            info!("Job query: {query}");

            let source: Box<dyn JobSource> = match jobs {
                Some(path) => Box::new(FileJobSource::new(path)),
                None => Box::new(MockJobSource),
            };
            let queue = source.find_matching_jobs(&query, &cv).await?;
            apply(&config, &inputs, cv, profile, queue).await
        }
        Commands::Retry { ledger, inputs } => {
            let previous = ResultStore::load(&ledger)
                .await
                .with_context(|| format!("Failed to load ledger '{}'", ledger.display()))?;
            let queue = previous.failed_jobs();
            info!(
                "Retrying failed jobs | run_id={} | jobs={}",
                previous.run_id,
                queue.len()
            );
            if queue.is_empty() {
                info!("No failed jobs to retry");
                return Ok(());
            }

            let (cv, profile) = load_inputs(&inputs)?;
            apply(&config, &inputs, cv, profile, queue).await
        }
    }
}

fn load_inputs(inputs: &Inputs) -> Result<(Arc<Cv>, Option<UserProfile>)> {
    let cv = load_cv(&inputs.cv)?;
    let profile = inputs.profile.as_deref().map(load_profile).transpose()?;
    Ok((Arc::new(cv), profile))
}

/// Wires the collaborators for this run and drives the engine over `queue`.
async fn apply(
    config: &Config,
    inputs: &Inputs,
    cv: Arc<Cv>,
    profile: Option<UserProfile>,
    queue: JobQueue,
) -> Result<()> {
    let optimizer = build_optimizer(config, inputs.dry_run)?;

    let executor: Arc<dyn FormExecutor> = if inputs.dry_run {
        Arc::new(DryRunExecutor::default())
    } else {
        Arc::new(GreenhouseExecutor::new(config.greenhouse_api_base.clone())?)
    };

    let mut sink: Box<dyn RunSink> = if inputs.dry_run {
        Box::new(MemorySink::new(cv.full_name.clone()))
    } else {
        let store = ResultStore::new(&config.results_dir, cv.full_name.clone());
        info!("Ledger: {}", store.path().display());
        Box::new(store)
    };

    let engine = Engine::new(optimizer, executor.clone(), config.engine_settings());
    let mut state = RunState::new(cv, profile, queue);

    let report =
        runner::execute_run(&engine, executor.as_ref(), &mut state, sink.as_mut()).await?;

    if let Some(summary) = &sink.ledger().summary {
        info!(
            "Done | total={} | submitted={} | failed={} | transitions={}",
            summary.total_jobs, summary.submitted, summary.failed, report.transitions
        );
    }
    Ok(())
}

fn build_optimizer(config: &Config, dry_run: bool) -> Result<Arc<dyn Optimizer>> {
    match (&config.anthropic_api_key, dry_run) {
        (Some(key), false) => {
            let llm = LlmClient::new(key.clone(), config.llm_model.clone())?;
            info!("LLM optimizer initialized (model: {})", llm.model());
            Ok(Arc::new(LlmOptimizer::new(llm, config.optimizer_retry())))
        }
        (None, false) => {
            warn!("ANTHROPIC_API_KEY not set, CVs will be submitted untailored");
            Ok(Arc::new(PassthroughOptimizer))
        }
        (_, true) => Ok(Arc::new(PassthroughOptimizer)),
    }
}
