//! CLI definition and dispatch.

use chrono::{Days, Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::market_data::{CacheTtls, MarketData};
use crate::adapters::portfolio_file::load_portfolio;
use crate::domain::allocation::{aggregate_by_label, label_holdings, sorted_allocation, LabelKind};
use crate::domain::analysis::{parse_references, AnalysisConfig, ProviderKind};
use crate::domain::calendar::common_bounds;
use crate::domain::config_validation::{parse_optional_date, validate_config};
use crate::domain::error::{InsufficientData, KomorebiError};
use crate::domain::normalizer::{normalize_and_aggregate, PortfolioPerformance};
use crate::domain::performance::{holding_performance, top_contributors, ytd_change};
use crate::domain::portfolio::Portfolio;
use crate::domain::price_series::PriceSeries;
use crate::domain::simulator::{simulate, SimulationResult, DEFAULT_CAPITAL};
use crate::domain::universe::parse_tickers;
use crate::ports::config_port::ConfigPort;
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::report_port::ReportPort;

/// Calendar days fetched before the grid start so forward-fill has an
/// anchor across holidays.
const LOOKBACK_DAYS: u64 = 10;

#[derive(Parser, Debug)]
#[command(name = "komorebi", about = "Portfolio performance and buy-and-hold simulation")]
pub struct Cli {
    /// Log output format on stderr
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Breakdown {
    Sector,
    Country,
}

impl From<Breakdown> for LabelKind {
    fn from(b: Breakdown) -> Self {
        match b {
            Breakdown::Sector => LabelKind::Sector,
            Breakdown::Country => LabelKind::Country,
        }
    }
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct Window {
    /// Grid start (YYYY-MM-DD), overrides [portfolio] start_date
    #[arg(long)]
    pub start: Option<NaiveDate>,
    /// Grid end (YYYY-MM-DD), overrides [portfolio] end_date
    #[arg(long)]
    pub end: Option<NaiveDate>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Base-100 portfolio index against reference indices
    Performance {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        window: Window,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replay an equal-weight buy-and-hold investment
    Simulate {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        window: Window,
        #[arg(long)]
        capital: Option<f64>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Sector or country breakdown of the holdings
    Allocation {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long, value_enum, default_value_t = Breakdown::Sector)]
        by: Breakdown,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Latest price and day change per holding
    Quotes {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated tickers to quote instead of the holdings
        #[arg(long)]
        tickers: Option<String>,
    },
    /// Period performance, top movers and fundamentals per holding
    Stats {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        window: Window,
        #[arg(long, default_value_t = 3)]
        top: usize,
    },
    /// Check a config file and its holdings file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Installs the global subscriber. `RUST_LOG` filters, default `info`.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    let _ = match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false).with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init(),
    };
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn execute(cli: Cli) -> Result<(), KomorebiError> {
    match cli.command {
        Command::Performance {
            config,
            window,
            output,
        } => run_performance(&config, &window, output.as_deref()),
        Command::Simulate {
            config,
            window,
            capital,
            output,
        } => run_simulate(&config, &window, capital, output.as_deref()),
        Command::Allocation { config, by, output } => {
            run_allocation(&config, by.into(), output.as_deref())
        }
        Command::Quotes { config, tickers } => run_quotes(&config, tickers.as_deref()),
        Command::Stats {
            config,
            window,
            top,
        } => run_stats(&config, &window, top),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, KomorebiError> {
    info!(path = %path.display(), "loading config");
    let adapter = FileConfigAdapter::from_file(path)?;
    validate_config(&adapter)?;
    Ok(adapter)
}

pub fn build_analysis_config(config: &dyn ConfigPort) -> Result<AnalysisConfig, KomorebiError> {
    let file = config
        .get_string("portfolio", "file")
        .ok_or_else(|| KomorebiError::ConfigMissing {
            section: "portfolio".into(),
            key: "file".into(),
        })?;
    let references = match config.get_string("references", "indices") {
        Some(list) => parse_references(&list)
            .map_err(|e| KomorebiError::invalid("references", "indices", e))?,
        None => Vec::new(),
    };
    let provider = match config.get_string("data", "provider") {
        Some(p) => p
            .parse::<ProviderKind>()
            .map_err(|e| KomorebiError::invalid("data", "provider", e))?,
        None => ProviderKind::Csv,
    };

    let mut analysis = AnalysisConfig::new(PathBuf::from(file.trim()));
    analysis.start_date = parse_optional_date(config, "start_date")?;
    analysis.end_date = parse_optional_date(config, "end_date")?;
    analysis.capital = config
        .get_double("portfolio", "capital")?
        .unwrap_or(DEFAULT_CAPITAL);
    analysis.references = references;
    analysis.provider = provider;
    if let Some(dir) = config.get_string("data", "csv_dir") {
        analysis.csv_dir = PathBuf::from(dir.trim());
    }
    if let Some(dir) = config.get_string("report", "output_dir") {
        analysis.output_dir = PathBuf::from(dir.trim());
    }
    Ok(analysis)
}

fn ttl(config: &dyn ConfigPort, key: &str, default: Duration) -> Result<Duration, KomorebiError> {
    Ok(match config.get_int("cache", key)? {
        Some(secs) => Duration::from_secs(secs.max(1) as u64),
        None => default,
    })
}

pub fn build_cache_ttls(config: &dyn ConfigPort) -> Result<CacheTtls, KomorebiError> {
    let defaults = CacheTtls::default();
    Ok(CacheTtls {
        quote: ttl(config, "quote_ttl_secs", defaults.quote)?,
        history: ttl(config, "history_ttl_secs", defaults.history)?,
        profile: ttl(config, "profile_ttl_secs", defaults.profile)?,
    })
}

pub fn build_provider(
    analysis: &AnalysisConfig,
    config: &dyn ConfigPort,
) -> Result<Box<dyn MarketDataPort>, KomorebiError> {
    match analysis.provider {
        ProviderKind::Csv => Ok(Box::new(CsvAdapter::new(analysis.csv_dir.clone()))),
        #[cfg(feature = "yahoo")]
        ProviderKind::Yahoo => {
            let timeout = config.get_int("data", "timeout_secs")?.unwrap_or(10).max(1) as u64;
            let adapter =
                crate::adapters::yahoo_adapter::YahooAdapter::new(Duration::from_secs(timeout))?;
            Ok(Box::new(adapter))
        }
        #[cfg(not(feature = "yahoo"))]
        ProviderKind::Yahoo => {
            let _ = config;
            Err(KomorebiError::invalid(
                "data",
                "provider",
                "yahoo provider requires the `yahoo` feature",
            ))
        }
    }
}

/// Everything a command needs: resolved settings, holdings and data access.
pub struct Session<P> {
    pub analysis: AnalysisConfig,
    pub portfolio: Portfolio,
    pub market: MarketData<P>,
}

impl<P: MarketDataPort> Session<P> {
    pub fn new(
        analysis: AnalysisConfig,
        portfolio: Portfolio,
        provider: P,
        ttls: CacheTtls,
    ) -> Self {
        Session {
            analysis,
            portfolio,
            market: MarketData::new(provider, ttls),
        }
    }

    pub fn with_window(mut self, window: &Window) -> Result<Self, KomorebiError> {
        if window.start.is_some() {
            self.analysis.start_date = window.start;
        }
        if window.end.is_some() {
            self.analysis.end_date = window.end;
        }
        if let (Some(s), Some(e)) = (self.analysis.start_date, self.analysis.end_date) {
            if s >= e {
                return Err(KomorebiError::invalid(
                    "portfolio",
                    "start_date",
                    "start must be before end",
                ));
            }
        }
        Ok(self)
    }

    fn fetch_end(&self) -> NaiveDate {
        self.analysis
            .end_date
            .unwrap_or_else(|| Local::now().date_naive())
    }

    fn fetch_start(&self) -> Option<NaiveDate> {
        self.analysis
            .start_date
            .and_then(|s| s.checked_sub_days(Days::new(LOOKBACK_DAYS)))
    }

    pub fn holding_histories(&self) -> BTreeMap<String, PriceSeries> {
        self.market
            .get_histories(&self.portfolio.tickers(), self.fetch_start(), self.fetch_end())
    }

    pub fn reference_histories(&self) -> BTreeMap<String, PriceSeries> {
        self.analysis
            .references
            .iter()
            .map(|r| {
                let series = self
                    .market
                    .get_price_history(&r.ticker, self.fetch_start(), self.fetch_end());
                (r.name.clone(), series)
            })
            .collect()
    }

    pub fn performance(&self) -> Result<PortfolioPerformance, KomorebiError> {
        let histories = self.holding_histories();
        let references = self.reference_histories();
        let weights = self.portfolio.weights();
        info!(
            holdings = histories.len(),
            references = references.len(),
            "normalising portfolio"
        );
        let perf = normalize_and_aggregate(
            &histories,
            Some(&weights),
            &references,
            self.analysis.start_date,
            self.analysis.end_date,
        )?;
        Ok(perf)
    }

    pub fn simulation(&self, capital: f64) -> SimulationResult {
        let histories = self.holding_histories();
        info!(holdings = histories.len(), capital, "simulating buy-and-hold");
        simulate(
            &histories,
            capital,
            self.analysis.start_date,
            self.analysis.end_date,
        )
    }

    /// Label weights; labels from the holdings file win over profile data.
    pub fn allocation(&self, kind: LabelKind) -> BTreeMap<String, f64> {
        let rows = label_holdings(&self.portfolio, |ticker| {
            let manual = self.portfolio.get(ticker).and_then(|h| match kind {
                LabelKind::Sector => h.sector.clone(),
                LabelKind::Country => h.country.clone(),
            });
            manual.or_else(|| {
                let profile = self.market.get_profile(ticker);
                Some(match kind {
                    LabelKind::Sector => profile.sector,
                    LabelKind::Country => profile.country,
                })
            })
        });
        aggregate_by_label(&rows)
    }
}

fn open_session(
    config_path: &Path,
) -> Result<Session<Box<dyn MarketDataPort>>, KomorebiError> {
    let adapter = load_config(config_path)?;
    let analysis = build_analysis_config(&adapter)?;
    let portfolio = load_portfolio(&analysis.portfolio_file)?;
    info!(
        holdings = portfolio.len(),
        file = %analysis.portfolio_file.display(),
        "loaded portfolio"
    );
    let provider = build_provider(&analysis, &adapter)?;
    let ttls = build_cache_ttls(&adapter)?;
    Ok(Session::new(analysis, portfolio, provider, ttls))
}

fn output_path(session_dir: &Path, output: Option<&Path>, default: &str) -> PathBuf {
    output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| session_dir.join(default))
}

fn run_performance(
    config: &Path,
    window: &Window,
    output: Option<&Path>,
) -> Result<(), KomorebiError> {
    let session = open_session(config)?.with_window(window)?;
    let perf = session.performance()?;

    println!("Portfolio index ({} business days)", perf.grid.len());
    if let (Some(first), Some(last)) = (perf.grid.first(), perf.grid.last()) {
        println!("  Period:    {first} to {last}");
    }
    if let Some(v) = perf.final_index() {
        println!("  Portfolio: {v:.2}");
    }
    for (name, series) in &perf.references {
        if let Some(p) = series.last() {
            println!("  {name}: {:.2}", p.value);
        }
    }
    for s in &perf.skipped {
        println!("  skipped {}: {}", s.ticker, s.reason);
    }

    let path = output_path(&session.analysis.output_dir, output, "performance.csv");
    CsvReportAdapter::new().write_performance(&perf, &path)?;
    println!("Report written to: {}", path.display());
    Ok(())
}

fn run_simulate(
    config: &Path,
    window: &Window,
    capital: Option<f64>,
    output: Option<&Path>,
) -> Result<(), KomorebiError> {
    let session = open_session(config)?.with_window(window)?;
    let capital = capital.unwrap_or(session.analysis.capital);
    if capital <= 0.0 || !capital.is_finite() {
        return Err(KomorebiError::invalid("portfolio", "capital", "capital must be positive"));
    }
    let result = session.simulation(capital);

    if result.is_degenerate() {
        println!("Not enough data to simulate; capital unchanged.");
    }
    for a in &result.allocations {
        println!(
            "  {:<12} {:>14.4} shares at {:>10.2} = {:>14.2}",
            a.ticker, a.shares, a.start_price, a.invested
        );
    }
    let s = &result.summary;
    let sign = if s.is_gain() { "+" } else { "" };
    println!("Initial capital: {:.2}", s.initial_capital);
    println!("Final value:     {:.2}", s.final_value);
    println!("Gain/loss:       {sign}{:.2} ({sign}{:.2}%)", s.gain_loss, s.percent);

    let path = output_path(&session.analysis.output_dir, output, "simulation.csv");
    CsvReportAdapter::new().write_simulation(&result, &path)?;
    println!("Report written to: {}", path.display());
    Ok(())
}

fn run_allocation(
    config: &Path,
    kind: LabelKind,
    output: Option<&Path>,
) -> Result<(), KomorebiError> {
    let session = open_session(config)?;
    let allocation = session.allocation(kind);
    for (label, weight) in sorted_allocation(&allocation).iter().rev() {
        println!("  {label:<28} {:>6.2}%", weight * 100.0);
    }
    let path = output_path(&session.analysis.output_dir, output, &format!("{kind}.csv"));
    CsvReportAdapter::new().write_allocation(kind, &allocation, &path)?;
    println!("Report written to: {}", path.display());
    Ok(())
}

fn run_quotes(config: &Path, tickers: Option<&str>) -> Result<(), KomorebiError> {
    let session = open_session(config)?;
    let tickers = match tickers {
        Some(list) => parse_tickers(list)
            .map_err(|e| KomorebiError::invalid("quotes", "tickers", e.to_string()))?,
        None => session.portfolio.tickers(),
    };
    for ticker in &tickers {
        let quote = session.market.get_quote(ticker);
        let arrow = if quote.is_up() { "▲" } else { "▼" };
        println!(
            "{} ({ticker}) {}{:.2} {arrow} {:+.2}%",
            session.portfolio.display_name(ticker),
            session.portfolio.currency_of(ticker),
            quote.current_price,
            quote.percent_change()
        );
    }
    Ok(())
}

fn run_stats(config: &Path, window: &Window, top: usize) -> Result<(), KomorebiError> {
    let session = open_session(config)?.with_window(window)?;
    let histories = session.holding_histories();
    let Some((start, end)) = common_bounds(
        histories.values(),
        session.analysis.start_date,
        session.analysis.end_date,
    ) else {
        return Err(InsufficientData {
            requested: histories.len(),
        }
        .into());
    };

    let rows = holding_performance(&histories, &session.portfolio.names(), start);
    println!("Performance {start} to {end}");
    for r in &rows {
        let profile = session
            .market
            .get_profile(&r.ticker)
            .with_dividend_override(
                session
                    .portfolio
                    .get(&r.ticker)
                    .and_then(|h| h.dividend_yield),
            );
        println!(
            "  {:<28} {:>10.2} -> {:>10.2} {:>+8.2}%  P/E {}  EPS {}  Cap {}  Yield {}",
            r.name,
            r.start_price,
            r.end_price,
            r.pct_change,
            fmt_opt(profile.pe_ratio, ""),
            fmt_opt(profile.eps, ""),
            fmt_opt(profile.market_cap_billions(), "B"),
            fmt_opt(profile.dividend_yield, "%"),
        );
    }

    let (best, worst) = top_contributors(&rows, top);
    println!("Top performers:");
    for r in &best {
        println!("  {:<28} {:>+8.2}%", r.name, r.pct_change);
    }
    println!("Worst performers:");
    for r in &worst {
        println!("  {:<28} {:>+8.2}%", r.name, r.pct_change);
    }

    let references = session.reference_histories();
    if !references.is_empty() {
        println!("Year to date:");
        for (name, series) in &references {
            println!("  {name:<28} {:>+8.2}%", ytd_change(series, end));
        }
    }
    Ok(())
}

fn fmt_opt(value: Option<f64>, suffix: &str) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}{suffix}"))
}

fn run_validate(config: &Path) -> Result<(), KomorebiError> {
    let adapter = load_config(config)?;
    let analysis = build_analysis_config(&adapter)?;
    let portfolio = load_portfolio(&analysis.portfolio_file)?;
    println!("Configuration OK");
    println!("  Holdings:   {}", portfolio.len());
    println!("  References: {}", analysis.references.len());
    println!("  Provider:   {:?}", analysis.provider);
    Ok(())
}
