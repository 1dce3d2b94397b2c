//! Delivery SMA CLI
//!
//! Calculates the simple moving average of translation delivery times for
//! the last X minutes.

use anyhow::Context;
use clap::Parser;
use delivery_sma::{run_files, Config, RunOptions, RunStats, SmaError, TimeZonePolicy, VERSION};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "delivery-sma")]
#[command(version = VERSION)]
#[command(
    about = "Calculates the SMA of the translation delivery time for the last X minutes",
    long_about = None
)]
struct Cli {
    /// Input events file, one JSON object per line
    #[arg(long = "input_file", visible_alias = "input-file")]
    input_file: PathBuf,

    /// SMA window size in minutes (non-negative integer)
    #[arg(
        long = "window_size",
        visible_alias = "window-size",
        allow_negative_numbers = true
    )]
    window_size: u64,

    /// Output file (defaults to the configured file, `output.json`)
    #[arg(long = "output_file", visible_alias = "output-file")]
    output_file: Option<PathBuf>,

    /// Time zone for naive timestamps and output dates: local, utc, or an IANA name
    #[arg(long)]
    timezone: Option<TimeZonePolicy>,

    /// Configuration file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print run statistics to stderr when done
    #[arg(long)]
    stats: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match execute(&cli) {
        Ok(stats) => {
            if cli.stats {
                eprintln!("{}", stats.summary());
            }
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

/// Set up the stderr logger. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn execute(cli: &Cli) -> anyhow::Result<RunStats> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::load().unwrap_or_else(|e| {
            tracing::warn!("Could not load configuration, using defaults: {}", e);
            Config::default()
        }),
    };

    let timezone = match cli.timezone {
        Some(policy) => policy,
        None => config
            .timezone_policy()
            .map_err(|e| SmaError::InvalidArgument(e.to_string()))?,
    };

    let options = RunOptions {
        input_file: cli.input_file.clone(),
        output_file: cli.output_file.clone().unwrap_or(config.output_file),
        window_size: cli.window_size,
        timezone,
    };

    run_files(&options).with_context(|| {
        format!(
            "computing moving average of {}",
            options.input_file.display()
        )
    })
}
