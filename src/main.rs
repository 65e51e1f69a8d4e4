//! simreport - traffic-simulation result aggregator
//!
//! Loads per-run result files, filters failed and degenerate runs, and
//! renders comparison charts or a summary report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any error (config, missing directory, malformed result file, etc.)

use anyhow::{Context, Result};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use simreport::analysis::ResultAggregator;
use simreport::chart::ChartRenderer;
use simreport::cli::{self, Args, OutputFormat};
use simreport::config::{Config, CONFIG_FILE_NAME};
use simreport::models::{DirectorySummary, Report, ReportMetadata};
use simreport::report;
use simreport::scanner::{FileScanner, ScanConfig};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    // Load configuration before logging so the config can raise verbosity
    let (mut config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    if let Err(e) = init_logging(&args, &config) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    info!("simreport v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match config_source {
        Some(path) => info!("Loaded config from: {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    if let Err(e) = run(&args, &config) {
        error!("simreport failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Handle --init-config: generate a default .simreport.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
    }

    let content = Config::default_toml()?;
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to change directories, file naming, and the chart catalogue.");
    Ok(())
}

/// Initialize logging based on verbosity settings. `RUST_LOG` overrides them.
fn init_logging(args: &Args, config: &Config) -> Result<()> {
    let level = if !args.quiet && config.general.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(cli::log_filter(level, directives.as_deref()))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Load configuration from file or use defaults.
///
/// Also returns the file the configuration came from, if any.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, Some(config_path.clone())));
    }

    // Try default location
    match Config::load_default()? {
        Some(config) => Ok((config, Some(PathBuf::from(CONFIG_FILE_NAME)))),
        None => Ok((Config::default(), None)),
    }
}

/// Dispatch to the selected mode.
fn run(args: &Args, config: &Config) -> Result<()> {
    if args.list_charts {
        return handle_list_charts(args, config);
    }

    let scan_config = ScanConfig::from(&config.loader);

    if !args.summarize.is_empty() {
        return handle_summarize(args, scan_config);
    }

    if args.dry_run {
        return handle_dry_run(args, config, scan_config);
    }

    render_charts(args, config, scan_config)
}

/// Handle --list-charts: print the catalogue and exit.
fn handle_list_charts(args: &Args, config: &Config) -> Result<()> {
    let charts = config.select_charts(&args.chart)?;

    println!("📈 {} charts configured:\n", charts.len());
    for chart in charts {
        println!(
            "   {:<22} {:?}  {} vs {}  ({} series)",
            chart.name,
            chart.kind,
            chart.y_label(),
            chart.x_label(),
            chart.series.len()
        );
    }
    Ok(())
}

/// Handle --dry-run: list candidate result files per chart without rendering.
fn handle_dry_run(args: &Args, config: &Config, scan_config: ScanConfig) -> Result<()> {
    let charts = config.select_charts(&args.chart)?;

    println!("\n🔍 Dry run: resolving {} charts (nothing is rendered)...\n", charts.len());

    for chart in charts {
        let target = config.general.output_dir.join(chart.file_name());
        println!("   📈 {} -> {}", chart.name, target.display());
        for series in &chart.series {
            let dir = series.resolve(&config.general.results_dir);
            let scanner = FileScanner::new(dir.clone(), scan_config.clone());
            match scanner.scan() {
                Ok(files) => println!("     📁 {} ({} result files)", dir.display(), files.len()),
                Err(e) => println!("     ⚠️  {} ({})", dir.display(), e),
            }
        }
    }

    println!("\n✅ Dry run complete. No charts were written.");
    Ok(())
}

/// Handle --summarize: load each directory and write a summary report.
fn handle_summarize(args: &Args, scan_config: ScanConfig) -> Result<()> {
    let start_time = Instant::now();
    let aggregator = ResultAggregator::new(scan_config);

    println!("📥 Loading {} result directories...", args.summarize.len());

    let mut directories = Vec::with_capacity(args.summarize.len());
    for dir in &args.summarize {
        let (dataset, load) = aggregator
            .load_with_summary(dir)
            .with_context(|| format!("Failed to load results from {}", dir.display()))?;
        println!(
            "   {}: {} of {} runs accepted",
            dir.display(),
            load.accepted,
            load.candidates
        );
        directories.push(DirectorySummary::new(load, &dataset));
    }

    let report = Report {
        metadata: ReportMetadata {
            generated_at: Utc::now(),
            directories: directories.len(),
            total_runs: directories.iter().map(|d| d.load.accepted).sum(),
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        directories,
    };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    std::fs::write(&args.report, &output)
        .with_context(|| format!("Failed to write report to {}", args.report.display()))?;

    println!(
        "\n✅ Summary complete! Report saved to: {}",
        args.report.display()
    );
    Ok(())
}

/// Render the selected charts.
fn render_charts(args: &Args, config: &Config, scan_config: ScanConfig) -> Result<()> {
    let start_time = Instant::now();
    let charts = config.select_charts(&args.chart)?;

    println!(
        "📊 Rendering {} charts from {} into {}",
        charts.len(),
        config.general.results_dir.display(),
        config.general.output_dir.display()
    );

    let renderer = ChartRenderer::new(
        ResultAggregator::new(scan_config),
        config.general.results_dir.clone(),
        config.general.output_dir.clone(),
        config.render.clone(),
    );

    let progress = config.render.show_progress.then(|| {
        let pb = ProgressBar::new(charts.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|style| style.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb
    });

    let mut written = 0;
    let mut skipped = 0;
    for chart in &charts {
        if let Some(ref pb) = progress {
            pb.set_message(chart.name.clone());
        }

        match renderer.render(chart) {
            Ok(Some(_)) => written += 1,
            Ok(None) => skipped += 1,
            Err(e) => {
                if let Some(ref pb) = progress {
                    pb.abandon();
                }
                return Err(e);
            }
        }

        if let Some(ref pb) = progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    println!("\n📊 Render Summary:");
    println!("   Charts written: {}", written);
    if skipped > 0 {
        println!("   Charts skipped (no plottable points): {}", skipped);
    }
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    println!(
        "\n✅ Done! Charts saved to: {}",
        config.general.output_dir.display()
    );
    Ok(())
}
