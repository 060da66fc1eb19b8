//! histfetch CLI — download a symbol's daily history to CSV.
//!
//! Commands:
//! - `fetch` — download, normalize, and save `{save_path}/{SYMBOL}_historical.csv`
//! - `show` — print the first rows of a saved artifact

mod obs;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use histfetch_core::data::{read_artifact, NormalizedSeries, YahooProvider};
use histfetch_core::{ConsoleObserver, FetchConfig, Fetcher};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "histfetch",
    about = "histfetch — daily price history to CSV"
)]
struct Cli {
    /// Log level when HISTFETCH_LOG is unset (e.g. warn, info, histfetch_core=debug).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format: text or json.
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download daily history for one symbol and save it as CSV.
    Fetch {
        /// Ticker symbol.
        #[arg(default_value = "AAPL")]
        symbol: String,

        /// Start date (YYYY-MM-DD), inclusive.
        #[arg(long, default_value = "2018-01-01")]
        start: String,

        /// End date (YYYY-MM-DD), exclusive.
        #[arg(long, default_value = "2025-01-01")]
        end: String,

        /// TOML file with save_path / retries / delay_secs.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory. Overrides the config file.
        #[arg(long)]
        save_path: Option<PathBuf>,

        /// Number of attempts. Overrides the config file.
        #[arg(long)]
        retries: Option<u32>,

        /// Seconds to wait between attempts. Overrides the config file.
        #[arg(long)]
        delay: Option<u64>,
    },
    /// Print the first rows of a saved artifact.
    Show {
        /// Path to a `{SYMBOL}_historical.csv` file.
        path: PathBuf,

        /// Number of rows to print.
        #[arg(long, default_value_t = 5)]
        rows: usize,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    obs::init_tracing(&cli.log_level, &cli.log_format).map_err(|e| anyhow!(e))?;

    match cli.command {
        Commands::Fetch {
            symbol,
            start,
            end,
            config,
            save_path,
            retries,
            delay,
        } => run_fetch(symbol, &start, &end, config, save_path, retries, delay),
        Commands::Show { path, rows } => {
            let series = read_artifact(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            print_head(&series, rows);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_fetch(
    symbol: String,
    start: &str,
    end: &str,
    config_path: Option<PathBuf>,
    save_path: Option<PathBuf>,
    retries: Option<u32>,
    delay: Option<u64>,
) -> Result<ExitCode> {
    let start_date = NaiveDate::parse_from_str(start, "%Y-%m-%d")
        .with_context(|| format!("invalid --start '{start}'"))?;
    let end_date = NaiveDate::parse_from_str(end, "%Y-%m-%d")
        .with_context(|| format!("invalid --end '{end}'"))?;

    let mut config = match config_path {
        Some(path) => FetchConfig::from_file(&path)?,
        None => FetchConfig::default(),
    };
    if let Some(save_path) = save_path {
        config.save_path = save_path;
    }
    if let Some(retries) = retries {
        config.retries = retries;
    }
    if let Some(delay) = delay {
        config.delay_secs = delay;
    }
    config.validate()?;

    let request = config.request(&symbol, start_date, end_date);
    let provider = YahooProvider::new()?;
    let observer = ConsoleObserver;

    let Some(series) = Fetcher::new(&provider)
        .with_observer(&observer)
        .fetch(&request)
    else {
        return Ok(ExitCode::FAILURE);
    };

    print_head(&series, 5);
    Ok(ExitCode::SUCCESS)
}

fn print_head(series: &NormalizedSeries, n: usize) {
    let headers = series.headers();
    let line: Vec<String> = headers.iter().map(|h| format!("{h:>12}")).collect();
    println!("{}", line.join(" "));

    for row in series.head(n) {
        let mut cells = vec![format!("{:>12}", row.date.format("%Y-%m-%d").to_string())];
        for value in &row.values {
            let cell = match value {
                Some(v) => v.to_string(),
                None => "NaN".to_string(),
            };
            cells.push(format!("{cell:>12}"));
        }
        println!("{}", cells.join(" "));
    }

    if series.len() > n {
        println!("... ({} rows total)", series.len());
    }
}
