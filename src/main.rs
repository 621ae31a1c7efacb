use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use covid_series::{
    cache::{write_dataset, CacheKey, DerivationCache},
    config::Config,
    derivation::{CacheLevel, ZeroBlockPolicy},
    models::{Dataset, Metric},
    repository::SeriesRepository,
    sources::{create_adapter, load_raw_table},
};
use serde_json::json;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use validator::Validate;

#[derive(Parser)]
#[command(name = "covid-series", version)]
#[command(about = "Derive per-region COVID-19 time series", long_about = None)]
struct Cli {
    /// Configuration file overriding the built-in defaults
    #[arg(short, long, env = "COVID_SERIES_CONFIG")]
    config: Option<PathBuf>,

    /// Raw snapshot table, overrides `source.data_file`
    #[arg(short, long)]
    data_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the regions of the snapshot
    Regions {
        /// Only regions of this continent
        #[arg(short, long)]
        continent: Option<String>,
    },

    /// Print the derived series of some regions
    Show {
        #[arg(value_name = "REGION_ID", required = true)]
        ids: Vec<String>,

        /// Keep only the trailing N days
        #[arg(short, long, default_value = "0")]
        last_days: usize,

        /// Start at the first day cumulative cases reach N
        #[arg(short, long, default_value = "0")]
        since_cases: u64,

        /// Add rolling averages of daily cases and deaths over this many days
        #[arg(short, long)]
        rolling: Option<usize>,

        /// Add the reproduction estimate, `nan` or `zero` for an all-zero prior block
        #[arg(short = 'R', long)]
        reproduction: Option<ZeroBlockPolicy>,

        /// Also add the rolling average of the reproduction estimate
        #[arg(long, requires = "reproduction")]
        smoothed: bool,

        /// Add the 7 day incidence per 100,000 inhabitants
        #[arg(short, long)]
        incidence: bool,

        #[arg(short, long, value_enum, default_value = "csv")]
        format: OutputFormat,
    },

    /// Build the cache entry of a day
    BuildCache {
        /// Enrichment level 1-4, defaults to `cache.level`
        #[arg(short, long)]
        level: Option<u8>,

        /// Generation date, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Print the effective configuration
    ShowConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(path) = cli.data_file {
        config.source.data_file = path;
    }
    config.validate().context("Invalid configuration")?;

    init_tracing(&config);

    tracing::debug!("Starting covid-series v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Regions { continent } => {
            let repository = open_repository(&config)?;
            let mut out = BufWriter::new(io::stdout().lock());
            match continent {
                Some(continent) => {
                    for info in repository.regions_in_continent(&continent) {
                        writeln!(out, "{}\t{}", info.id, info.name)?;
                    }
                }
                None => {
                    for (id, name) in repository.list_available_regions() {
                        writeln!(out, "{}\t{}", id, name)?;
                    }
                }
            }
            out.flush()?;
        }
        Commands::Show {
            ids,
            last_days,
            since_cases,
            rolling,
            reproduction,
            smoothed,
            incidence,
            format,
        } => {
            let repository = open_repository(&config)?;
            let mut dataset = repository.get_by_region_ids(&ids, last_days, since_cases)?;

            if let Some(window) = rolling {
                dataset = repository.add_rolling_average(dataset, Metric::DailyCases, window)?;
                dataset = repository.add_rolling_average(dataset, Metric::DailyDeaths, window)?;
            }
            if let Some(policy) = reproduction {
                dataset = if smoothed {
                    repository.add_smoothed_reproduction_estimate(dataset, policy)?
                } else {
                    repository.add_reproduction_estimate(dataset, policy)?
                };
            }
            if incidence {
                dataset = repository.add_incidence(dataset)?;
            }

            // smoothed R always uses the configured window
            let smoothing = repository.chain().rolling_window();
            let window = rolling.unwrap_or(smoothing);
            print_dataset(&dataset, format, window, smoothing)?;
        }
        Commands::BuildCache { level, date } => {
            let level = CacheLevel::try_from(level.unwrap_or(config.cache.level))?;
            if level == CacheLevel::None {
                bail!("Cache level 0 does not build an entry");
            }

            let repository = load_repository(&config)?;
            let cache = DerivationCache::new(&config.cache)?;
            let generated = date.unwrap_or_else(|| Local::now().date_naive());
            let key = CacheKey::new(generated, repository.source_info().short_name, level);

            let dataset = cache.build(&repository, &key)?;
            println!(
                "{}: {} regions, {} rows",
                cache.path_for(&key).display(),
                dataset.len(),
                dataset.total_rows()
            );
        }
        Commands::ShowConfig => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("covid_series={}", config.observability.log_level).into());

    // Logs go to stderr so stdout stays parseable
    if config.observability.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

/// Repository over the raw snapshot
fn load_repository(config: &Config) -> anyhow::Result<SeriesRepository> {
    let adapter = create_adapter(config.source.kind);
    let rows = load_raw_table(&config.source.data_file, adapter.as_ref())
        .with_context(|| format!("Failed to load {}", config.source.data_file.display()))?;

    Ok(SeriesRepository::from_rows(rows, adapter, &config.engine)?)
}

/// Repository over today's cache entry when one is available, the raw snapshot otherwise
fn open_repository(config: &Config) -> anyhow::Result<SeriesRepository> {
    let level = CacheLevel::try_from(config.cache.level)?;
    if !config.cache.enabled || level == CacheLevel::None {
        return load_repository(config);
    }

    let adapter = create_adapter(config.source.kind);
    let cache = DerivationCache::new(&config.cache)?;
    let today = Local::now().date_naive();
    let key = CacheKey::new(today, adapter.info().short_name, level);

    let dataset = match cache.load(&key, today)? {
        Some(dataset) => dataset,
        None => cache.build(&load_repository(config)?, &key)?,
    };

    Ok(SeriesRepository::from_dataset(
        Dataset::clone(&dataset),
        adapter,
        &config.engine,
    ))
}

fn print_dataset(
    dataset: &Dataset,
    format: OutputFormat,
    window: usize,
    reproduction_window: usize,
) -> anyhow::Result<()> {
    let mut out = BufWriter::new(io::stdout().lock());

    match format {
        OutputFormat::Csv => write_dataset(dataset, &mut out)?,
        OutputFormat::Json => {
            let regions: Vec<_> = dataset
                .iter()
                .map(|series| {
                    let rows: Vec<_> = (0..series.len())
                        .filter_map(|i| series.row_with_windows(i, window, reproduction_window))
                        .collect();
                    json!({
                        "id": series.info().id,
                        "name": series.info().name,
                        "continent": series.info().continent,
                        "population": series.series().population(),
                        "records": rows,
                    })
                })
                .collect();
            serde_json::to_writer_pretty(&mut out, &regions)?;
            writeln!(out)?;
        }
    }

    out.flush()?;
    Ok(())
}
