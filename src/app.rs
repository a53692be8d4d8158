//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - sets up logging for the chosen front-end
//! - merges environment configuration with CLI overrides
//! - queries the provider and prints reports/plots
//! - writes optional exports

use std::time::Duration;

use clap::Parser;
use tracing::info;

use crate::cli::{Command, CommonArgs, HistoryArgs, ReportArgs, StatsArgs};
use crate::config::ProviderConfig;
use crate::dashboard::{DashboardData, region_results};
use crate::data::ElectionProvider;
use crate::error::AppError;
use crate::logging::LogSettings;

/// Entry point for the `indicium` binary.
pub fn run() -> Result<(), AppError> {
    // We want `indicium` and `indicium --year 2017` to behave like `indicium tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    // `.env` may set RUST_LOG / INDICIUM_LOG_FILE, so it is loaded before logging.
    dotenvy::dotenv().ok();
    let log = LogSettings::from_env();
    match &cli.command {
        Command::Tui(_) => crate::logging::init_tui(&log)?,
        _ => crate::logging::init_cli(&log),
    }

    match cli.command {
        Command::Stats(args) => handle_stats(args),
        Command::History(args) => handle_history(args),
        Command::Regions(args) => handle_regions(args),
        Command::Report(args) => handle_report(args),
        Command::Tui(args) => handle_tui(args),
    }
}

fn handle_stats(args: StatsArgs) -> Result<(), AppError> {
    let provider = provider_from_args(&args.common)?;
    let filters = args.common.filters();
    let stats = provider.fetch_election_data(filters);

    if args.json {
        let json = serde_json::to_string_pretty(&stats)
            .map_err(|e| AppError::new(4, format!("Failed to serialize stats: {e}")))?;
        println!("{json}");
    } else {
        println!("{}", crate::report::format_stats(&stats, filters));
    }
    Ok(())
}

fn handle_history(args: HistoryArgs) -> Result<(), AppError> {
    let provider = provider_from_args(&args.common)?;
    let history = provider.fetch_participation_history(args.common.filters());

    println!("{}", crate::report::format_history(&history));
    if args.plot {
        println!(
            "{}",
            crate::plot::render_history_plot(&history, args.width, args.height)
        );
    }
    Ok(())
}

fn handle_regions(args: CommonArgs) -> Result<(), AppError> {
    let provider = provider_from_args(&args)?;
    let filters = args.filters();
    let stats = provider.fetch_election_data(filters);

    print!("{}", crate::report::format_banner(stats.data_source));
    println!("{}", crate::report::format_regions(&region_results(&stats, filters)));
    Ok(())
}

fn handle_report(args: ReportArgs) -> Result<(), AppError> {
    let provider = provider_from_args(&args.common)?;
    let data = DashboardData::load(&provider, args.common.filters());

    if args.stdout {
        println!("{}", crate::report::format_dashboard(&data));
        return Ok(());
    }

    let today = chrono::Local::now().date_naive();
    let path = crate::io::write_report(&args.out, &data, today, args.format)?;
    info!(path = %path.display(), "report written");
    println!("Wrote {}", path.display());
    Ok(())
}

fn handle_tui(args: CommonArgs) -> Result<(), AppError> {
    let config = provider_config_from_args(&args, ProviderConfig::from_env()?)?;
    crate::tui::run(args.filters(), &config)
}

fn provider_from_args(args: &CommonArgs) -> Result<ElectionProvider, AppError> {
    let config = provider_config_from_args(args, ProviderConfig::from_env()?)?;
    ElectionProvider::new(&config)
}

/// Apply CLI overrides on top of the environment configuration.
pub fn provider_config_from_args(
    args: &CommonArgs,
    mut config: ProviderConfig,
) -> Result<ProviderConfig, AppError> {
    if args.offline {
        config.sources.clear();
    } else if !args.sources.is_empty() {
        config.sources = args.sources.clone();
    }

    if let Some(ms) = args.timeout_ms {
        if ms == 0 {
            return Err(AppError::new(2, "--timeout-ms must be > 0."));
        }
        config.timeout = Duration::from_millis(ms);
    }

    // The flag can only switch parallel mode on; the environment may already have.
    config.parallel |= args.parallel;

    if args.seed.is_some() {
        config.seed = args.seed;
    }

    Ok(config)
}

/// Rewrite argv so `indicium` defaults to `indicium tui`.
///
/// Rules:
/// - `indicium`                      -> `indicium tui`
/// - `indicium --year 2017 ...`      -> `indicium tui --year 2017 ...`
/// - `indicium --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(
        arg1.as_str(),
        "stats" | "history" | "regions" | "report" | "tui"
    );
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
