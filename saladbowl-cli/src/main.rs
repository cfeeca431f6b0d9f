//! SaladBowl - resolve workload catalogs into launchable plugin definitions

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod resolve_cli;

use resolve_cli::{OutputArgs, SourceArgs};

/// Trace modules for resolution tracing
#[derive(Debug, Clone, ValueEnum)]
enum TraceModule {
    Resolve,
    Supervision,
    Config,
    All,
}

impl TraceModule {
    /// Library targets traced for this module
    fn directives(&self) -> &'static [&'static str] {
        match self {
            TraceModule::Resolve => &[
                "saladbowl_core::manifest=trace",
                "saladbowl_core::assembler=trace",
            ],
            TraceModule::Supervision => &["saladbowl_core::supervision=trace"],
            TraceModule::Config => &["saladbowl_core::config=trace"],
            TraceModule::All => &["saladbowl_core=trace"],
        }
    }
}

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "saladbowl",
    about = "Resolve workload catalogs into launchable plugin definitions",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Enable structured tracing (comma-separated: resolve,supervision,config,all)
    #[clap(long, value_delimiter = ',', global = true)]
    trace: Vec<TraceModule>,

    /// Set log level
    #[clap(long, default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Override the configuration directory
    #[clap(long, global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
enum Command {
    /// Resolve the manifest into plugin definitions for a platform
    Resolve {
        #[clap(flatten)]
        source: SourceArgs,

        #[clap(flatten)]
        output: OutputArgs,

        /// Also list catalog entries that were skipped and why
        #[clap(long)]
        show_skipped: bool,
    },

    /// Check resolved definitions against a hardware capability report
    Check {
        #[clap(flatten)]
        source: SourceArgs,

        /// Capability report (JSON or YAML)
        #[clap(long)]
        capabilities: PathBuf,

        #[clap(flatten)]
        output: OutputArgs,
    },

    /// Validate a manifest
    Lint {
        /// Manifest file (defaults to the built-in manifest plus config overlay)
        #[clap(long)]
        manifest: Option<PathBuf>,
    },

    /// List the standard error patterns applied to every definition
    Errors {
        #[clap(flatten)]
        output: OutputArgs,
    },
}

/// Initialize tracing with CLI flags
///
/// When --trace is set, enables JSON output for structured tracing.
fn initialize_tracing(log_level: &LogLevel, trace_modules: &[TraceModule]) {
    let mut filter = EnvFilter::new(log_level.to_filter_directive());

    for directive in trace_modules.iter().flat_map(TraceModule::directives) {
        if let Ok(parsed) = directive.parse() {
            filter = filter.add_directive(parsed);
        }
    }

    // Logs go to stderr; stdout carries definitions
    if !trace_modules.is_empty() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .init();

        tracing::info!(trace_modules = ?trace_modules, "SaladBowl tracing enabled");
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level, &cli.trace);

    let config_dir = cli.config_dir;
    match cli.command {
        Command::Resolve {
            source,
            output,
            show_skipped,
        } => resolve_cli::resolve_command(config_dir, source, output, show_skipped),
        Command::Check {
            source,
            capabilities,
            output,
        } => resolve_cli::check_command(config_dir, source, capabilities, output),
        Command::Lint { manifest } => resolve_cli::lint_command(config_dir, manifest),
        Command::Errors { output } => resolve_cli::errors_command(output),
    }
}
