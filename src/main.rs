use analytics::{
    AggregationEngine, AggregationParams, AnalyticsError, DashboardReport, EngineSettings,
};
use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use configuration::{Config, OutputFormat};
use core_types::Dataset;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod params;
mod render;

use params::{Action, FilterState};

/// The main entry point for the order analytics dashboard.
fn main() {
    // A missing .env file is fine; it only carries optional overrides.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => configuration::load_config_from(path),
        None => configuration::load_config(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(2);
        }
    };

    let _log_guard = match configuration::init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error initialising logging: {e}");
            std::process::exit(2);
        }
    };

    let result = match cli.command {
        Commands::Report(args) => handle_report(args, &config),
        Commands::Export(args) => handle_export(args, &config),
        Commands::Interactive(args) => handle_interactive(args, &config),
    };

    if let Err(e) = result {
        tracing::error!(error = ?e, "Command failed.");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Sales, product, seller, review and RFM analytics for an e-commerce order export.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file. Defaults to an optional `dashboard.toml` in the working directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute and print the dashboard.
    Report(ReportArgs),
    /// Compute the dashboard and write it to a JSON file.
    Export(ExportArgs),
    /// Keep the dataset loaded and recompute the dashboard as filters change.
    Interactive(InteractiveArgs),
}

#[derive(Parser)]
struct FilterArgs {
    /// The first purchase date to include (format: YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,

    /// The last purchase date to include (format: YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,

    /// How many products and sellers to rank.
    #[arg(long)]
    top_n: Option<usize>,

    /// Only use the first N rows after the date filter.
    #[arg(long)]
    rows: Option<usize>,

    /// The order CSV. Overrides `data.path` from the configuration.
    #[arg(long)]
    data: Option<PathBuf>,
}

impl FilterArgs {
    fn state(&self, config: &Config) -> FilterState {
        FilterState {
            from: self.from,
            to: self.to,
            top_n: self.top_n.unwrap_or(config.dashboard.default_top_n),
            rows: self.rows,
        }
    }

    fn data_path<'a>(&'a self, config: &'a Config) -> &'a Path {
        self.data.as_deref().unwrap_or(&config.data.path)
    }
}

#[derive(Parser)]
struct ReportArgs {
    #[command(flatten)]
    filters: FilterArgs,

    /// Output format. Overrides `dashboard.format` from the configuration.
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
}

#[derive(Parser)]
struct ExportArgs {
    #[command(flatten)]
    filters: FilterArgs,

    /// Where to write the JSON report.
    #[arg(long, short)]
    output: PathBuf,
}

#[derive(Parser)]
struct InteractiveArgs {
    /// The order CSV. Overrides `data.path` from the configuration.
    #[arg(long)]
    data: Option<PathBuf>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn handle_report(args: ReportArgs, config: &Config) -> anyhow::Result<()> {
    let dataset = load_dataset(args.filters.data_path(config))?;
    let engine = build_engine(config);
    let params = args.filters.state(config).to_params(dataset.span());

    let (report, banner) = compute(&engine, dataset, &params)?;

    match args.format.unwrap_or(config.dashboard.format) {
        OutputFormat::Table => {
            let short_id_len = config.dashboard.short_id_len;
            print!("{}", render::render_report(&report, banner.as_deref(), short_id_len));
        }
        OutputFormat::Json => {
            if let Some(message) = &banner {
                eprintln!("{message}");
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn handle_export(args: ExportArgs, config: &Config) -> anyhow::Result<()> {
    let dataset = load_dataset(args.filters.data_path(config))?;
    let engine = build_engine(config);
    let params = args.filters.state(config).to_params(dataset.span());

    let (report, banner) = compute(&engine, dataset, &params)?;
    if let Some(message) = &banner {
        eprintln!("{message}");
    }

    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(&args.output, json)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    tracing::info!(path = %args.output.display(), "Report exported.");
    println!("Report written to {}", args.output.display());
    Ok(())
}

fn handle_interactive(args: InteractiveArgs, config: &Config) -> anyhow::Result<()> {
    let path = args.data.as_deref().unwrap_or(&config.data.path);
    let engine = build_engine(config);
    let mut state = FilterState::new(config.dashboard.default_top_n);

    print_help(config);
    refresh(&engine, path, &state, config)?;

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match params::apply_command(&mut state, &line, &config.dashboard) {
            Ok(Action::Render) => {
                if let Err(e) = refresh(&engine, path, &state, config) {
                    eprintln!("Error: {e:#}");
                }
            }
            Ok(Action::Help) => print_help(config),
            Ok(Action::Quit) => break,
            Ok(Action::Nothing) => {}
            Err(e) => eprintln!("Error: {e:#}"),
        }
    }
    Ok(())
}

/// Recomputes and prints the dashboard for the current filters.
///
/// The dataset comes from the process-wide cell, so only the first refresh
/// reads the file.
fn refresh(
    engine: &AggregationEngine,
    path: &Path,
    state: &FilterState,
    config: &Config,
) -> anyhow::Result<()> {
    let dataset = load_dataset(path)?;
    let params = state.to_params(dataset.span());
    let (report, banner) = compute(engine, dataset, &params)?;
    let short_id_len = config.dashboard.short_id_len;
    print!("{}", render::render_report(&report, banner.as_deref(), short_id_len));
    Ok(())
}

fn print_help(config: &Config) {
    println!(
        "Controls: from=YYYY-MM-DD to=YYYY-MM-DD top=N ({}-{}) rows=N|all, \
         or: show, reset, help, quit",
        config.dashboard.top_n_min, config.dashboard.top_n_max
    );
}

fn build_engine(config: &Config) -> AggregationEngine {
    AggregationEngine::new(EngineSettings {
        top_n_min: config.dashboard.top_n_min,
        top_n_max: config.dashboard.top_n_max,
        rfm_display_count: config.dashboard.rfm_display_count,
    })
}

/// Returns the process-wide dataset, reading it from `path` on first use.
fn load_dataset(path: &Path) -> anyhow::Result<&'static Dataset> {
    let cell = dataset::shared();
    if let Some(dataset) = cell.get() {
        return Ok(dataset);
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.set_message(format!("Loading {}...", path.display()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = cell.get_or_load(path);
    spinner.finish_and_clear();

    result.with_context(|| format!("failed to load dataset from {}", path.display()))
}

/// Runs the engine, replacing an invalid date range with the whole dataset.
///
/// Returns the report and, if the range was replaced, the message to show.
fn compute(
    engine: &AggregationEngine,
    dataset: &Dataset,
    params: &AggregationParams,
) -> anyhow::Result<(DashboardReport, Option<String>)> {
    match engine.run(dataset, params) {
        Ok(report) => Ok((report, None)),
        Err(AnalyticsError::InvalidRange { start, end }) => {
            tracing::warn!(
                %start,
                %end,
                "Invalid date range, showing the whole dataset instead."
            );
            let message = format!(
                "The start date ({start}) is after the end date ({end}). \
                 Showing the whole dataset instead."
            );
            let unfiltered = AggregationParams {
                range: None,
                ..params.clone()
            };
            let report = engine.run(dataset, &unfiltered)?;
            Ok((report, Some(message)))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_types::{DateRange, OrderRecord, Schema};
    use rust_decimal_macros::dec;

    fn dataset() -> Dataset {
        let row = |order: &str, month: u32| OrderRecord {
            order_id: order.to_string(),
            customer_id: "C1".to_string(),
            product_id: "P1".to_string(),
            seller_id: "S1".to_string(),
            payment_value: dec!(10),
            order_purchase_timestamp: NaiveDate::from_ymd_opt(2024, month, 15)
                .and_then(|d| d.and_hms_opt(12, 0, 0)),
            review_score: Some(5),
            review_creation_date: None,
        };
        Dataset::new(vec![row("A", 1), row("B", 2), row("C", 3)], Schema::full())
    }

    fn reversed_range() -> Option<DateRange> {
        Some(DateRange {
            start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        })
    }

    #[test]
    fn reversed_range_falls_back_to_whole_dataset_with_banner() {
        let dataset = dataset();
        let params = AggregationParams::new(5).with_range(reversed_range());

        let (report, banner) = compute(&AggregationEngine::default(), &dataset, &params).unwrap();

        assert_eq!(report.range, None);
        assert_eq!(report.rows_considered, dataset.len());
        assert_eq!(report.overview.total_orders, 3);
        let banner = banner.unwrap();
        assert!(banner.contains("2024-03-01"));
        assert!(banner.contains("whole dataset"));
    }

    #[test]
    fn valid_range_has_no_banner() {
        let dataset = dataset();
        let range = Some(DateRange {
            start: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        });
        let params = AggregationParams::new(5).with_range(range);

        let (report, banner) = compute(&AggregationEngine::default(), &dataset, &params).unwrap();

        assert!(banner.is_none());
        assert_eq!(report.rows_considered, 1);
    }

    #[test]
    fn other_engine_errors_still_fail() {
        let dataset = dataset();
        let params = AggregationParams::new(50).with_range(reversed_range());

        let err = compute(&AggregationEngine::default(), &dataset, &params).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<AnalyticsError>(),
            Some(AnalyticsError::TopNOutOfRange { value: 50, .. })
        ));
    }
}
