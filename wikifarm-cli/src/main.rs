//! wikifarm CLI - tenant resolution and cache inspection for wiki farms.
//!
//! # Commands
//!
//! - `wikifarm resolve [host]` - Show which wiki a host or `--db` resolves to
//! - `wikifarm show [host]` - Dump a wiki's materialized settings as JSON
//! - `wikifarm tenants` - List every wiki on the farm, deleted ones included
//! - `wikifarm check` - Audit the cache directory for missing or corrupt documents
//!
//! The CLI always runs in administrative (CLI) execution mode.

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use wikifarm_config::{ExecutionMode, FarmConfig};

mod commands;
mod error;
mod logging;

use commands::{check, resolve, show, tenants};
use error::CliResult;
use logging::{LogFormat, LogLevel};

/// wikifarm CLI - Wiki Farm Tenant Tools
#[derive(Parser)]
#[command(name = "wikifarm")]
#[command(author, version)]
#[command(about = "Resolve wikis and inspect their cached configuration")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Farm configuration file (JSON or TOML)
    #[arg(short, long, global = true, env = "WIKIFARM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cache directory, overriding the configuration
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Operate on this wiki instead of resolving a host
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which wiki a host resolves to
    #[command(alias = "r")]
    Resolve {
        /// Request hostname, e.g. alpha.example.net
        host: Option<String>,
    },

    /// Dump materialized settings for a wiki as JSON
    #[command(alias = "s")]
    Show {
        /// Request hostname, e.g. alpha.example.net
        host: Option<String>,

        /// Print a single setting
        #[arg(short, long)]
        setting: Option<String>,
    },

    /// List every wiki on the farm
    #[command(alias = "ls")]
    Tenants {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Audit cache documents
    Check,
}

/// Load the farm configuration for administrative use
fn load_config(args: &GlobalArgs) -> CliResult<FarmConfig> {
    let mut builder = FarmConfig::builder().load_dotenv(None).load_env();
    if let Some(path) = &args.config {
        builder = builder.add_file(path);
    }

    let mut config = builder.build()?;
    if let Some(dir) = &args.cache_dir {
        config.cache_dir = dir.clone();
    }

    Ok(config.with_mode(ExecutionMode::Cli))
}

fn run(cli: Cli) -> CliResult<ExitCode> {
    let config = load_config(&cli.global)?;
    tracing::debug!(cache_dir = %config.cache_dir.display(), "Loaded farm configuration");

    match cli.command {
        Commands::Resolve { host } => {
            resolve::run(&config, host.as_deref(), cli.global.db.as_deref())?;
        }
        Commands::Show { host, setting } => {
            show::run(
                &config,
                host.as_deref(),
                cli.global.db.as_deref(),
                setting.as_deref(),
            )?;
        }
        Commands::Tenants { json } => {
            tenants::run(&config, json)?;
        }
        Commands::Check => {
            if !check::run(&config)? {
                return Ok(ExitCode::from(2));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.global.no_color {
        colored::control::set_override(false);
    }
    logging::init(cli.global.log_level, cli.global.log_format);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\n  {} {}\n", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
