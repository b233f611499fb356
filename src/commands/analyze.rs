use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use std::path::{Path, PathBuf};

use crate::api::nbrb::NbrbClient;
use crate::charts::{ChartRenderer, ChartStyle, parse_size};
use crate::errors::RateError;
use crate::models::rate::CacheKey;
use crate::utils::cache::{get_or_fetch, read_rates_csv};
use crate::utils::config::Config;
use crate::utils::date::{format_day, valid_date};

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Currency code to collect rates for (USD, EUR, RUB)
    #[arg(short = 'c', long)]
    pub currency: String,

    /// First day of the analysed period, DD-MM-YYYY
    #[arg(long = "start_date", value_parser = valid_date)]
    pub start_date: NaiveDate,

    /// Last day of the analysed period, DD-MM-YYYY
    #[arg(long = "end_date", value_parser = valid_date)]
    pub end_date: NaiveDate,

    /// Output directory for chart images
    #[arg(short, long, default_value = "charts")]
    pub output: PathBuf,

    /// Cache directory (overrides NBRB_RATES_BASE_DIR)
    #[arg(long)]
    pub base_dir: Option<PathBuf>,

    /// Image size (WIDTHxHEIGHT)
    #[arg(long, default_value = "2000x1000")]
    pub size: String,
}

impl AnalyzeArgs {
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.currency.clone(), self.start_date, self.end_date)
    }
}

pub async fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    validate_period(args.start_date, args.end_date)?;
    let size = parse_size(&args.size)?;

    let config = Config::from_env();
    let base_dir = args.base_dir.clone().unwrap_or_else(|| config.base_dir.clone());
    let client = NbrbClient::from_config(&config)?;
    let key = args.cache_key();

    println!(
        "📈 BYN/{} rates from {} to {}",
        key.currency,
        format_day(key.start_date),
        format_day(key.end_date)
    );

    let csv_path = prepare_rates(&client, &base_dir, &key).await?;
    let records = read_rates_csv(&csv_path).await?;

    let style = ChartStyle::default().with_size(size);
    let renderer = ChartRenderer::new(style, &args.output, &key.stem())?;
    let written = renderer
        .render(&records, &key.label())
        .context("Failed to render charts")?;

    for path in &written {
        println!("  📊 {}", path.display());
    }
    println!("✅ {} charts generated in {}", written.len(), args.output.display());

    Ok(())
}

/// Returns the cached CSV for `key`, fetching it from the API on a cache miss.
pub async fn prepare_rates(client: &NbrbClient, base_dir: &Path, key: &CacheKey) -> Result<PathBuf> {
    get_or_fetch(base_dir, key, || {
        client.fetch_rates(&key.currency, key.start_date, key.end_date)
    })
    .await
}

pub fn validate_period(start_date: NaiveDate, end_date: NaiveDate) -> Result<(), RateError> {
    if start_date > end_date {
        return Err(RateError::Configuration(format!(
            "start date {} is after end date {}",
            format_day(start_date),
            format_day(end_date)
        )));
    }
    Ok(())
}
