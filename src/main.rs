//! Grid engine - main entry point
//!
//! This binary provides four subcommands:
//! - preview: Generate and validate a grid ladder
//! - simulate: Run a grid simulation over synthetic or historical prices
//! - sweep: Rank parameter combinations by simulated performance
//! - pressure: Stress a ladder against a hypothetical decline

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "grid-engine")]
#[command(about = "Grid trading strategy configuration, simulation and analysis", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a ladder and validate it against available funds
    Preview {
        /// Path to configuration file
        #[arg(short, long, default_value = "configs/default.json")]
        config: String,

        /// Available funds (overrides config file)
        #[arg(long)]
        funds: Option<f64>,
    },

    /// Run a grid simulation
    Simulate {
        /// Path to configuration file
        #[arg(short, long, default_value = "configs/default.json")]
        config: String,

        /// Number of trading days (overrides config file)
        #[arg(short, long)]
        days: Option<usize>,

        /// Seed for the synthetic price generator
        #[arg(long)]
        seed: Option<u64>,

        /// CSV file of historical closes (date,close) to replay
        #[arg(long)]
        history: Option<String>,
    },

    /// Sweep parameter combinations and rank by Sharpe
    Sweep {
        /// Path to configuration file with a sweep section
        #[arg(short, long, default_value = "configs/default.json")]
        config: String,

        /// Number of top results to show
        #[arg(short, long, default_value = "10")]
        top: usize,
    },

    /// Stress the ladder against a hypothetical decline from base
    Pressure {
        /// Path to configuration file
        #[arg(short, long, default_value = "configs/default.json")]
        config: String,

        /// Assumed decline from base, in percent
        #[arg(short, long, default_value = "20.0")]
        drawdown: f64,
    },
}

fn setup_logging(verbose: bool, command_name: &str, file_only: bool) -> Result<()> {
    std::fs::create_dir_all("logs")?;

    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    let level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    if file_only {
        // For sweeps: only log to file, keep console clean for progress bar
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .init();
    } else {
        let console_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(true);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        info!("Logging initialized");
        info!("Log file: {}", log_path.display());
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (command_name, file_only) = match &cli.command {
        Commands::Preview { .. } => ("preview", false),
        Commands::Simulate { .. } => ("simulate", false),
        Commands::Sweep { .. } => ("sweep", true), // File-only for clean progress bar
        Commands::Pressure { .. } => ("pressure", false),
    };

    setup_logging(cli.verbose, command_name, file_only)?;

    match cli.command {
        Commands::Preview { config, funds } => commands::preview::run(config, funds),

        Commands::Simulate {
            config,
            days,
            seed,
            history,
        } => commands::simulate::run(config, days, seed, history),

        Commands::Sweep { config, top } => commands::sweep::run(config, top),

        Commands::Pressure { config, drawdown } => commands::pressure::run(config, drawdown),
    }
}
