use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rankscope: performance advice for MPI-style deployments
///
/// Imports metric dumps into a local cache and runs statistical advisors
/// over them against a deployment topology.
#[derive(Parser, Debug)]
#[command(name = "rankscope")]
#[command(version, about, long_about)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to custom config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Metric cache to use instead of the configured one
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import metric dump files into the cache
    #[command(alias = "i")]
    Import {
        /// Dump files, imported in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Remove superseded ProgramRuntime records afterwards
        #[arg(long)]
        compact: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the enabled advisors and write an advice report
    #[command(alias = "a")]
    Advise {
        /// Topology description (TOML, or JSON with a .json extension)
        #[arg(short, long)]
        topology: PathBuf,

        /// Analyse this dump in memory instead of the cache
        #[arg(long)]
        dump: Option<PathBuf>,

        /// Write the JSON report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Window start, in epoch seconds
        #[arg(long, allow_negative_numbers = true)]
        from: Option<f64>,

        /// Window end, in epoch seconds
        #[arg(long, allow_negative_numbers = true)]
        to: Option<f64>,

        /// Print the JSON report instead of text
        #[arg(long)]
        json: bool,
    },

    /// List advisors and whether they are enabled
    Advisors,

    /// List distinct metric names in the cache
    #[command(alias = "m")]
    Metrics {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print raw values of a metric
    #[command(alias = "v")]
    Values {
        /// Metric name
        name: String,

        /// Only records where KEY=VALUE (a metric, timestamp, type or hostname)
        #[arg(long = "where", value_name = "KEY=VALUE")]
        condition: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Aggregate statistics of a metric
    Stats {
        /// Metric name
        name: String,

        /// Window start, in epoch seconds
        #[arg(long, allow_negative_numbers = true)]
        from: Option<f64>,

        /// Window end, in epoch seconds
        #[arg(long, allow_negative_numbers = true)]
        to: Option<f64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete every cached record
    Clean {
        /// Drop the tables instead
        #[arg(long)]
        drop: bool,
    },

    /// Import dumps from a spool directory until interrupted
    Serve {
        /// Spool directory (default: config)
        #[arg(short, long)]
        spool: Option<PathBuf>,

        /// Poll interval in seconds (default: config)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Send one sample through the configured sink
    Record {
        /// Host that produced the sample
        #[arg(long)]
        hostname: String,

        /// Record type
        #[arg(long = "type")]
        record_type: Option<String>,

        /// Sample time in epoch seconds (default: now)
        #[arg(long)]
        timestamp: Option<f64>,

        /// Metric values as NAME=VALUE
        #[arg(value_name = "NAME=VALUE", required = true)]
        metrics: Vec<String>,
    },
}
