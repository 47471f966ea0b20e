use std::path::PathBuf;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use rankscope::application::config::AppConfig;
use rankscope::application::services::advise::AdviseService;
use rankscope::application::services::import::ImportService;
use rankscope::application::services::topology::load_topology;
use rankscope::domain::advisors::{AdvisorEngine, default_advisors};
use rankscope::domain::value_objects::AdvisorSettings;
use rankscope::infrastructure::persistence::sqlite_store::SqliteStore;
use rankscope::infrastructure::sinks::create_metric_sink;
use rankscope::presentation::cli::app::{Cli, Commands};
use rankscope::presentation::cli::commands::advise::{AdviseOptions, run_advise, run_list_advisors};
use rankscope::presentation::cli::commands::clean::run_clean;
use rankscope::presentation::cli::commands::import::run_import;
use rankscope::presentation::cli::commands::query::{run_metrics, run_stats, run_values};
use rankscope::presentation::cli::commands::record::run_record;
use rankscope::presentation::cli::commands::serve::run_serve;

fn setup_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::resolve(cli.config.as_deref())?;
    config
        .apply_env_overrides(std::env::vars())
        .context("Invalid RANKSCOPE_* environment override")?;
    if let Some(ref path) = cli.database {
        config.database.path.clone_from(path);
    }
    Ok(config)
}

fn open_store(config: &AppConfig) -> anyhow::Result<SqliteStore> {
    SqliteStore::new(&config.database.path)
        .with_context(|| format!("Failed to open metric cache {}", config.database.path))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose);

    let config = load_config(&cli)?;

    // Manual DI: main.rs is the only place that knows concrete types
    let settings = AdvisorSettings::from(&config.advisors);
    let engine = AdvisorEngine::new(
        default_advisors(&settings),
        config.advisors.abort_on_failure,
    );

    match cli.command {
        Some(Commands::Import {
            files,
            compact,
            json,
        }) => {
            let store = open_store(&config)?;
            let service = ImportService::new(&store, compact || config.import.compact);
            run_import(&service, &files, json)?;
            store.close()?;
        }
        Some(Commands::Advise {
            topology,
            dump,
            output,
            from,
            to,
            json,
        }) => {
            let app = load_topology(&topology)?;
            let store = match dump {
                Some(ref path) => {
                    let store = SqliteStore::open_in_memory()?;
                    ImportService::new(&store, config.import.compact)
                        .import_files(std::slice::from_ref(path))?;
                    store
                }
                None => open_store(&config)?,
            };
            let service = AdviseService::new(&store, &engine);
            let options = AdviseOptions {
                from,
                to,
                output: output.as_deref(),
                json,
            };
            run_advise(&service, &app, &options)?;
            store.close()?;
        }
        Some(Commands::Advisors) => run_list_advisors(&engine),
        Some(Commands::Metrics { json }) => {
            let store = open_store(&config)?;
            run_metrics(&store, json)?;
        }
        Some(Commands::Values {
            name,
            condition,
            json,
        }) => {
            let store = open_store(&config)?;
            run_values(&store, &name, condition.as_deref(), json)?;
        }
        Some(Commands::Stats {
            name,
            from,
            to,
            json,
        }) => {
            let store = open_store(&config)?;
            run_stats(&store, &name, from, to, json)?;
        }
        Some(Commands::Clean { drop }) => {
            let store = open_store(&config)?;
            run_clean(store, drop)?;
        }
        Some(Commands::Serve { spool, interval }) => {
            let store = open_store(&config)?;
            let spool = spool.unwrap_or_else(|| {
                PathBuf::from(shellexpand::tilde(&config.server.spool_dir).as_ref())
            });
            let interval_secs = interval.unwrap_or(config.server.interval_secs);
            let service = ImportService::new(&store, config.import.compact);
            run_serve(&service, &spool, interval_secs).await?;
            store.close()?;
        }
        Some(Commands::Record {
            hostname,
            record_type,
            timestamp,
            metrics,
        }) => {
            let sink = create_metric_sink(&config.sink, &config.database)?;
            run_record(
                &*sink,
                &hostname,
                record_type.as_deref(),
                timestamp,
                &metrics,
            )?;
        }
        None => {
            Cli::command().print_help()?;
        }
    }

    Ok(())
}
