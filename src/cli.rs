//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// simreport - aggregate traffic-simulation results and chart them
///
/// Loads `<prefix>-<index>.json` run files from result directories,
/// drops failed or degenerate runs, and renders the chart catalogue
/// as SVG images.
///
/// Examples:
///   simreport --results ./results --output ./report
///   simreport --chart road,lanes
///   simreport --summarize ./results/road ./results/lanes --format json
///   simreport --dry-run
///   simreport --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Root directory holding one sub-directory per experiment
    ///
    /// Chart series directories are resolved against it.
    /// Can also be set via SIMREPORT_RESULTS env var or .simreport.toml config.
    #[arg(short, long, value_name = "DIR", env = "SIMREPORT_RESULTS")]
    pub results: Option<PathBuf>,

    /// Directory chart images are written to
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Charts to render (comma-separated names)
    ///
    /// Example: --chart road,lanes,density_bias_3d
    /// All charts are rendered when omitted.
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub chart: Vec<String>,

    /// Summarize result directories instead of rendering charts
    #[arg(long, value_name = "DIR", num_args = 1.., conflicts_with = "chart")]
    pub summarize: Vec<PathBuf>,

    /// Output file path for the summary report
    #[arg(long, default_value = "simreport_summary.md", value_name = "FILE")]
    pub report: PathBuf,

    /// Output format for the summary report (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .simreport.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: list result files per chart without rendering
    #[arg(long)]
    pub dry_run: bool,

    /// Print the configured chart catalogue and exit
    #[arg(long)]
    pub list_charts: bool,

    /// Generate a default .simreport.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the summary report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.chart.iter().any(|name| name.trim().is_empty()) {
            return Err("Chart names must not be empty".to_string());
        }

        for dir in &self.summarize {
            if !dir.is_dir() {
                return Err(format!(
                    "Results directory does not exist: {}",
                    dir.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

/// Build the log filter for `level`.
///
/// Non-empty `RUST_LOG`-style directives replace the level entirely; invalid
/// ones are ignored.
pub fn log_filter(level: tracing::Level, directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::default().add_directive(level.into()))
}
