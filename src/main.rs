mod assertions;
mod auth;
mod cases;
mod environment;
mod error;
mod history;
mod http;
mod payload;
mod report;
mod runner;
mod store;

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cases::Registry;
use environment::{ApiSettings, EnvironmentManager};
use error::IntakeError;
use history::History;
use http::client::ApiClient;
use report::{OutputFormat, RunReport};
use runner::{RunMode, SuiteRunner};
use store::RunStore;

#[derive(Parser)]
#[command(
    name = "intakeman",
    version,
    about = "API test runner for the intelligent-builder-intake service"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the suite against the configured deployment.
    Run(RunArgs),
    /// List the registered case ids.
    List {
        /// Load the case registry from a JSON file instead of the built-in set.
        #[arg(long)]
        registry: Option<PathBuf>,
    },
    /// Show recent persisted runs.
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Named environment to target (dev / staging / prod).
    #[arg(long = "env")]
    environment: Option<String>,
    /// Run only these case ids (repeatable).
    #[arg(long = "case")]
    cases: Vec<String>,
    /// Execute cases concurrently.
    #[arg(long)]
    parallel: bool,
    /// Report output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Also write the report to this file.
    #[arg(long)]
    report: Option<PathBuf>,
    /// Skip persisting outcomes to the run-history database.
    #[arg(long)]
    no_history: bool,
    /// Load the case registry from a JSON file instead of the built-in set.
    #[arg(long)]
    registry: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match dispatch(cli.command).await {
        Ok(code) => code,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(command: Command) -> Result<ExitCode, IntakeError> {
    match command {
        Command::Run(args) => run_suite(args).await,
        Command::List { registry } => list_cases(registry.as_deref()),
        Command::History { limit } => show_history(limit),
    }
}

fn load_registry(path: Option<&Path>) -> Result<Registry, IntakeError> {
    match path {
        Some(path) => Registry::load_from_file(path),
        None => Ok(Registry::builtin()),
    }
}

async fn run_suite(args: RunArgs) -> Result<ExitCode, IntakeError> {
    let manager = EnvironmentManager::builtin();
    let environment = match args.environment.as_deref() {
        Some(name) => Some(manager.find(name)?.clone()),
        None => None,
    };
    let settings = ApiSettings::from_env(environment.as_ref())?;
    let registry = load_registry(args.registry.as_deref())?;
    info!(
        base_url = %settings.base_url,
        endpoint = %settings.endpoint,
        cases = registry.len(),
        "starting suite run"
    );

    let mut client = ApiClient::new(&settings)?;
    if let (Ok(user), Ok(password)) = (env::var("INTAKE_USERNAME"), env::var("INTAKE_PASSWORD")) {
        client
            .authenticate(&settings.auth_path, &user, &password)
            .await?;
        info!("authenticated, bearer token installed");
    }

    let runner = SuiteRunner::new(registry, client, settings);
    let mode = if args.parallel {
        RunMode::Parallel
    } else {
        RunMode::Serial
    };

    let started_at = unix_timestamp();
    let started = Instant::now();
    let outcomes = if args.cases.is_empty() {
        runner.run_all(mode).await
    } else {
        runner.run_selected(&args.cases, mode).await?
    };
    let report = RunReport::from_outcomes(outcomes, started.elapsed().as_millis() as u64);

    println!("{}", report.render(args.format)?);
    if let Some(path) = args.report.as_deref() {
        report.write_to(path, args.format)?;
        info!(path = %path.display(), "report written");
    }

    if !args.no_history {
        match RunStore::open_default() {
            Ok(store) => store.record_all(started_at, &report.outcomes)?,
            Err(err) => warn!(error = %err, "run history not persisted"),
        }
    }

    Ok(if report.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn list_cases(registry_path: Option<&Path>) -> Result<ExitCode, IntakeError> {
    let registry = load_registry(registry_path)?;
    for case in registry.cases() {
        println!(
            "{:<16} {:<10} {}",
            case.file_id, case.file_type, case.description
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn show_history(limit: usize) -> Result<ExitCode, IntakeError> {
    let store = RunStore::open_default()?;
    let records = store.recent(limit)?;

    let mut history = History::new();
    for record in records.into_iter().rev() {
        history.push(record);
    }

    if history.entries().is_empty() {
        println!("no recorded runs");
        return Ok(ExitCode::SUCCESS);
    }

    for record in history.entries() {
        let marker = if record.passed { "PASS" } else { "FAIL" };
        let status = match record.status_code {
            Some(code) => code.to_string(),
            None => "---".to_string(),
        };
        println!(
            "{:>12}  [{marker}] {:<22} {status:>4}  {:>6}ms",
            record.timestamp, record.label, record.duration_ms
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
