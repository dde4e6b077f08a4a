//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report;
use crate::domain::config_validation::{
    criteria_from_config, screener_settings, screener_settings_with_dir, ScreenerSettings,
};
use crate::domain::criteria::ScreeningCriteria;
use crate::domain::error::EdgeFinderError;
use crate::domain::screener;
use crate::domain::sizing::{self, Direction, RiskBudget, SizingError, SizingInput};
use crate::domain::universe::{parse_symbol, resolve_symbols, StaticUniverse};
use crate::ports::config_port::ConfigPort;
use crate::ports::universe_port::UniversePort;

#[derive(Parser, Debug)]
#[command(name = "edgefinder", about = "Stock screener and option position sizer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Size an option position from a risk budget and an underlying stop
    Size(SizeArgs),
    /// Screen symbols against fundamental and technical criteria
    Screen(ScreenArgs),
    /// Show fundamentals and indicators for one symbol
    Snapshot {
        #[arg(long)]
        symbol: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Print the default symbol universe
    Universe {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Start the web API
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct SizeArgs {
    /// Account size in dollars
    #[arg(long)]
    pub account: Option<f64>,
    /// Risk per trade as a fraction (0.02 = 2%)
    #[arg(long)]
    pub risk_pct: Option<f64>,
    /// Fixed dollar risk per trade; overrides --risk-pct
    #[arg(long)]
    pub risk_fixed: Option<f64>,
    /// call or put
    #[arg(long)]
    pub direction: Option<String>,
    #[arg(long)]
    pub entry_low: Option<f64>,
    #[arg(long)]
    pub entry_high: Option<f64>,
    /// Stop level on the underlying
    #[arg(long)]
    pub stop: Option<f64>,
    /// Expected option delta at entry
    #[arg(long)]
    pub delta: Option<f64>,
    /// Multiplier for gamma, vega and slippage
    #[arg(long, default_value_t = 1.10)]
    pub buffer: f64,
    /// Max premium per contract (price per share)
    #[arg(long)]
    pub max_premium: Option<f64>,
    /// Estimated entry premium (price per share)
    #[arg(long)]
    pub est_premium: Option<f64>,
    /// Max drawdown at the stop as a fraction of premium (0.10 = 10%)
    #[arg(long)]
    pub pct_cap: Option<f64>,
    /// Size the built-in example trade
    #[arg(long)]
    pub example: bool,
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ScreenArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Comma-separated symbols; defaults to config, then the universe
    #[arg(long)]
    pub symbols: Option<String>,
    #[arg(long)]
    pub pe_max: Option<f64>,
    #[arg(long)]
    pub pe_min: Option<f64>,
    #[arg(long)]
    pub de_max: Option<f64>,
    #[arg(long)]
    pub de_min: Option<f64>,
    #[arg(long)]
    pub rsi_upper: Option<f64>,
    #[arg(long)]
    pub rsi_lower: Option<f64>,
    /// Require the close above its 200-day SMA
    #[arg(long)]
    pub sma_above: bool,
    /// Require the close below its 200-day SMA
    #[arg(long)]
    pub sma_below: bool,
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    #[arg(long)]
    pub json: bool,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Size(args) => run_size(&args),
        Command::Screen(args) => run_screen(&args),
        Command::Snapshot {
            symbol,
            config,
            data_dir,
            json,
        } => run_snapshot(&symbol, config.as_ref(), data_dir.as_ref(), json),
        Command::Universe { config } => run_universe(config.as_ref()),
        Command::Serve { config } => run_serve(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(&err)
        }
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, EdgeFinderError> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path).map_err(|e| EdgeFinderError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn load_optional_config(path: Option<&PathBuf>) -> Result<Option<FileConfigAdapter>, EdgeFinderError> {
    path.map(load_config).transpose()
}

fn print_json<T: Serialize>(value: &T) -> Result<(), EdgeFinderError> {
    let text = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{text}");
    Ok(())
}

fn required(value: Option<f64>, flag: &'static str) -> Result<f64, SizingError> {
    value.ok_or(SizingError::MissingParameter { field: flag })
}

/// Builds the sizing input from flags; `--example` ignores every other input flag.
pub fn build_sizing_input(args: &SizeArgs) -> Result<SizingInput, SizingError> {
    if args.example {
        return Ok(SizingInput::example());
    }

    let risk = RiskBudget::from_options(args.risk_pct, args.risk_fixed).ok_or(
        SizingError::MissingParameter {
            field: "--risk-pct or --risk-fixed",
        },
    )?;
    let direction = args
        .direction
        .as_deref()
        .ok_or(SizingError::MissingParameter {
            field: "--direction",
        })?
        .parse::<Direction>()?;

    Ok(SizingInput {
        account_size: required(args.account, "--account")?,
        risk,
        direction,
        entry_low: required(args.entry_low, "--entry-low")?,
        entry_high: required(args.entry_high, "--entry-high")?,
        stop: required(args.stop, "--stop")?,
        delta: required(args.delta, "--delta")?,
        buffer: args.buffer,
        max_premium_per_contract: args.max_premium,
        est_entry_premium: args.est_premium,
        pct_drawdown_cap: args.pct_cap,
    })
}

fn run_size(args: &SizeArgs) -> Result<(), EdgeFinderError> {
    let input = build_sizing_input(args)?;
    let result = sizing::size_contracts(&input)?;
    info!(contracts = result.contracts, "position sized");

    if args.json {
        print_json(&result)
    } else {
        print!("{}", text_report::render_sizing(&result));
        Ok(())
    }
}

/// `[criteria]` from config when present, with command-line flags taking precedence.
pub fn build_criteria(
    config: Option<&dyn ConfigPort>,
    args: &ScreenArgs,
) -> Result<ScreeningCriteria, EdgeFinderError> {
    let base = match config {
        Some(config) => criteria_from_config(config)?,
        None => ScreeningCriteria::default(),
    };
    let flag = |set: bool, fallback: Option<bool>| if set { Some(true) } else { fallback };

    Ok(ScreeningCriteria {
        pe_max: args.pe_max.or(base.pe_max),
        pe_min: args.pe_min.or(base.pe_min),
        debt_to_equity_max: args.de_max.or(base.debt_to_equity_max),
        debt_to_equity_min: args.de_min.or(base.debt_to_equity_min),
        rsi_upper: args.rsi_upper.or(base.rsi_upper),
        rsi_lower: args.rsi_lower.or(base.rsi_lower),
        sma_above: flag(args.sma_above, base.sma_above),
        sma_below: flag(args.sma_below, base.sma_below),
    })
}

/// Resolves where market data lives. `data_dir` beats `[data] dir`.
pub fn resolve_settings(
    config: Option<&dyn ConfigPort>,
    data_dir: Option<&Path>,
) -> Result<ScreenerSettings, EdgeFinderError> {
    match (config, data_dir) {
        (Some(config), Some(dir)) => screener_settings_with_dir(config, dir),
        (Some(config), None) => screener_settings(config),
        (None, Some(dir)) => Ok(ScreenerSettings::new(dir.to_path_buf())),
        (None, None) => Err(EdgeFinderError::ConfigMissing {
            section: "data".to_string(),
            key: "dir".to_string(),
        }),
    }
}

fn market_data(settings: &ScreenerSettings) -> CsvAdapter {
    let adapter = CsvAdapter::new(settings.data_dir.clone());
    match settings.as_of {
        Some(as_of) => adapter.with_as_of(as_of),
        None => adapter,
    }
}

fn universe_from(config: Option<&dyn ConfigPort>) -> Result<StaticUniverse, EdgeFinderError> {
    match config {
        Some(config) => Ok(StaticUniverse::from_config(config)?),
        None => Ok(StaticUniverse::default()),
    }
}

fn run_screen(args: &ScreenArgs) -> Result<(), EdgeFinderError> {
    let config = load_optional_config(args.config.as_ref())?;
    let config = config.as_ref().map(|c| c as &dyn ConfigPort);

    let settings = resolve_settings(config, args.data_dir.as_deref())?;
    let criteria = build_criteria(config, args)?;
    let universe = universe_from(config)?;
    let symbols = resolve_symbols(args.symbols.as_deref(), config, &universe)?;

    info!(
        symbols = symbols.len(),
        workers = settings.max_workers,
        data_dir = %settings.data_dir.display(),
        "screening"
    );
    let adapter = market_data(&settings);
    let result = screener::screen_parallel(&adapter, &symbols, &criteria, settings.max_workers)?;

    if args.json {
        print_json(&result)
    } else {
        print!("{}", text_report::render_screening(&result));
        Ok(())
    }
}

fn run_snapshot(
    symbol: &str,
    config_path: Option<&PathBuf>,
    data_dir: Option<&PathBuf>,
    json: bool,
) -> Result<(), EdgeFinderError> {
    let config = load_optional_config(config_path)?;
    let config = config.as_ref().map(|c| c as &dyn ConfigPort);
    let settings = resolve_settings(config, data_dir.map(PathBuf::as_path))?;

    let symbol = parse_symbol(symbol)?;
    let snapshot = screener::snapshot(&market_data(&settings), &symbol)?;
    if snapshot.current_price.is_none() {
        return Err(EdgeFinderError::NoData { symbol });
    }

    if json {
        print_json(&snapshot)
    } else {
        print!("{}", text_report::render_snapshot(&snapshot));
        Ok(())
    }
}

fn run_universe(config_path: Option<&PathBuf>) -> Result<(), EdgeFinderError> {
    let config = load_optional_config(config_path)?;
    let universe = universe_from(config.as_ref().map(|c| c as &dyn ConfigPort))?;

    let symbols = universe.default_universe()?;
    for symbol in &symbols {
        println!("{}", symbol);
    }
    eprintln!("{} symbols", symbols.len());
    Ok(())
}

fn run_serve(config_path: &PathBuf) -> Result<(), EdgeFinderError> {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{serve, AppState, DEFAULT_LISTEN};
        use crate::domain::config_validation::validate_screener_config;
        use std::sync::Arc;

        let config = load_config(config_path)?;
        validate_screener_config(&config)?;
        let settings = screener_settings(&config)?;

        let listen = config
            .get_string("web", "listen")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LISTEN.to_string());

        let state = AppState {
            market_data: Arc::new(market_data(&settings)),
            universe: Arc::new(universe_from(Some(&config as &dyn ConfigPort))?),
            max_workers: settings.max_workers,
        };

        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(serve(state, listen.trim()))
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = config_path;
        Err(EdgeFinderError::ConfigInvalid {
            section: "web".to_string(),
            key: "listen".to_string(),
            reason: "edgefinder was built without the web feature".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("edgefinder").chain(args.iter().copied())).unwrap()
    }

    fn size_args(args: &[&str]) -> SizeArgs {
        let mut full = vec!["size"];
        full.extend_from_slice(args);
        match parse(&full).command {
            Command::Size(args) => args,
            other => panic!("expected size, got {other:?}"),
        }
    }

    #[test]
    fn buffer_defaults_to_ten_percent() {
        let args = size_args(&["--example"]);
        assert_eq!(args.buffer, 1.10);
        assert!(args.example);
    }

    #[test]
    fn snapshot_requires_symbol() {
        assert!(Cli::try_parse_from(["edgefinder", "snapshot"]).is_err());
    }

    #[test]
    fn unknown_direction_is_a_sizing_error() {
        let args = size_args(&[
            "--account", "5000", "--risk-pct", "0.02", "--direction", "straddle",
            "--entry-low", "100", "--entry-high", "101", "--stop", "99", "--delta", "0.5",
        ]);
        assert!(matches!(
            build_sizing_input(&args),
            Err(SizingError::InvalidDirection { .. })
        ));
    }

    #[test]
    fn settings_need_a_data_dir() {
        assert!(matches!(
            resolve_settings(None, None),
            Err(EdgeFinderError::ConfigMissing { .. })
        ));
        let settings = resolve_settings(None, Some(Path::new("./data"))).unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("./data"));
        assert_eq!(settings.as_of, None);
    }
}
