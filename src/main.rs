use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ratingscope::config::Config;
use ratingscope::engine::outcome::outcome_breakdown;
use ratingscope::engine::rating_timeline_both;
use ratingscope::game::filter::{ColorFilter, DateRange, GameFilter};
use ratingscope::game::{GameRecord, group_by_control};
use ratingscope::store::json_store::{JsonStore, load_games};
use ratingscope::store::schema::ReportData;

#[derive(Parser)]
#[command(name = "ratingscope", version, about = "Rating history analytics for game archives")]
struct Cli {
    #[arg(short, long, global = true, help = "Config file (defaults to the user config dir)")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Smoothed ratings, trends, forecasts and milestones per time control
    Timeline(TimelineArgs),
    /// Win/draw/loss counts overall and by color
    Outcomes(InputArgs),
    /// List reports saved with `timeline --save`
    Reports,
    /// Write a config file with every default spelled out
    InitConfig,
}

#[derive(Args)]
struct InputArgs {
    #[arg(short, long, help = "Game file: normalized records or a raw archive")]
    input: PathBuf,

    #[arg(short, long, help = "Player name, required for raw archives")]
    user: Option<String>,

    #[arg(long, default_value = "all", help = "Color filter (all, white, black)")]
    color: ColorFilter,

    #[arg(long, default_value = "all", help = "Date range (all, 1y, 6m, 3m)")]
    range: DateRange,

    #[arg(
        long,
        value_delimiter = ',',
        help = "Time controls to include (comma separated, `all` for every control)"
    )]
    controls: Option<Vec<String>>,
}

#[derive(Args)]
struct TimelineArgs {
    #[command(flatten)]
    input: InputArgs,

    #[arg(short, long, help = "Write the report to this file instead of stdout")]
    output: Option<PathBuf>,

    #[arg(long, help = "Also keep the report in the configured report directory")]
    save: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let mut config = Config::load_from(&config_path)?;
    config.normalize_controls();
    config.engine.normalize();

    match cli.command {
        Command::Timeline(args) => run_timeline(&config, args),
        Command::Outcomes(args) => run_outcomes(&config, args),
        Command::Reports => {
            let store = JsonStore::with_base_dir(PathBuf::from(&config.report_dir))?;
            for name in store.list_reports()? {
                println!("{name}");
            }
            Ok(())
        }
        Command::InitConfig => {
            config.save_to(&config_path)?;
            println!("{}", config_path.display());
            Ok(())
        }
    }
}

/// Load, filter and restrict games to the requested controls.
fn select_games(config: &Config, args: &InputArgs) -> Result<(Option<String>, Vec<GameRecord>)> {
    let user = args.user.clone().or_else(|| config.default_user.clone());
    let games = load_games(&args.input, user.as_deref())?;
    let loaded = games.len();

    let filter = GameFilter::new(args.color, args.range);
    let mut games = filter.apply(&games, Utc::now());

    let controls: Vec<String> = args
        .controls
        .clone()
        .unwrap_or_else(|| config.default_controls.clone())
        .into_iter()
        .map(|c| c.trim().to_lowercase())
        .collect();
    if !controls.iter().any(|c| c == "all") {
        games.retain(|g| controls.contains(&g.control.to_lowercase()));
    }

    tracing::info!(loaded, selected = games.len(), "games loaded from {}", args.input.display());
    Ok((user, games))
}

fn run_timeline(config: &Config, args: TimelineArgs) -> Result<()> {
    let (user, games) = select_games(config, &args.input)?;
    let by_control: BTreeMap<String, Vec<GameRecord>> = group_by_control(&games);
    let timeline = rating_timeline_both(&by_control, &config.engine);
    let report = ReportData::new(user, outcome_breakdown(&games), timeline);

    if args.save {
        let store = JsonStore::with_base_dir(PathBuf::from(&config.report_dir))?;
        let name = format!(
            "{}-{}.json",
            report.user.as_deref().unwrap_or("report"),
            report.generated_at.format("%Y%m%dT%H%M%S")
        );
        let path = store.save_report(&name, &report)?;
        tracing::info!("report saved to {}", path.display());
    }

    match &args.output {
        Some(path) => {
            let written = write_report(path, &report)?;
            tracing::info!("report written to {}", written.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

fn write_report(path: &Path, report: &ReportData) -> Result<PathBuf> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("invalid output path {}", path.display()))?;
    JsonStore::with_base_dir(dir)?.save_report(name, report)
}

fn run_outcomes(config: &Config, args: InputArgs) -> Result<()> {
    let (_, games) = select_games(config, &args)?;
    println!("{}", serde_json::to_string_pretty(&outcome_breakdown(&games))?);
    Ok(())
}
