use anyhow::{Context, Result};
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::errors::RateError;
use crate::models::rate::{CacheKey, RateRecord, RateRow};
use crate::utils::date::{format_day, parse_day};
use crate::utils::file::{ensure_directory_exists, file_exists, write_atomic};

pub const CSV_DELIMITER: u8 = b',';

/// Get the path of the cached CSV for `key`
pub fn cache_path(base_dir: &Path, key: &CacheKey) -> PathBuf {
    base_dir.join(key.filename())
}

/// Serialize records into the cache CSV layout (`day,rate`)
pub fn rates_to_csv(records: &[RateRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(CSV_DELIMITER)
        .from_writer(Vec::new());

    for record in records {
        writer
            .serialize(RateRow {
                day: format_day(record.date),
                rate: record.official_rate,
            })
            .context("Failed to serialize rate row")?;
    }

    // An empty series still gets its header row.
    if records.is_empty() {
        writer
            .write_record(["day", "rate"])
            .context("Failed to write CSV header")?;
    }

    writer.into_inner().context("Failed to flush CSV buffer")
}

/// Parse the cache CSV layout back into records
pub fn rates_from_csv(content: &str) -> Result<Vec<RateRecord>, RateError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(CSV_DELIMITER)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    for column in ["day", "rate"] {
        if !headers.iter().any(|h| h == column) {
            return Err(RateError::DataFormat(format!(
                "Key '{}' does not exist in cached data",
                column
            )));
        }
    }

    reader
        .deserialize::<RateRow>()
        .map(|row| -> Result<RateRecord, RateError> {
            let row = row?;
            let date = parse_day(&row.day).map_err(|e| RateError::DataFormat(format!("{:#}", e)))?;
            Ok(RateRecord::new(date, row.rate))
        })
        .collect()
}

/// Save records to `path`, replacing the file atomically
pub async fn write_rates_csv(path: &Path, records: &[RateRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_directory_exists(parent)?;
    }
    let content = rates_to_csv(records)?;
    write_atomic(path, &content).await
}

/// Load records from a cached CSV file. A file that exists but cannot be
/// read as text is reported as malformed data.
pub async fn read_rates_csv(path: &Path) -> Result<Vec<RateRecord>> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(e)
                .with_context(|| format!("Failed to read rates file: {}", path.display()));
        }
        Err(e) => {
            return Err(RateError::DataFormat(format!(
                "Failed to read rates file {}: {}",
                path.display(),
                e
            ))
            .into());
        }
    };
    let content = String::from_utf8(bytes).map_err(|e| {
        RateError::DataFormat(format!(
            "Rates file {} is not valid UTF-8: {}",
            path.display(),
            e
        ))
    })?;

    Ok(rates_from_csv(&content)?)
}

/// Return the cached CSV for `key`, fetching and saving it first when absent.
/// An existing file is trusted as-is.
pub async fn get_or_fetch<F, Fut>(base_dir: &Path, key: &CacheKey, fetch: F) -> Result<PathBuf>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<RateRecord>, RateError>>,
{
    let path = cache_path(base_dir, key);

    if file_exists(&path).await {
        debug!(path = %path.display(), "cache hit");
        println!("  ✅ Using cached data: {}", path.display());
        return Ok(path);
    }

    println!("  🌐 Fetching {} rates from NBRB API", key.currency);
    let records = fetch().await?;

    write_rates_csv(&path, &records).await?;
    info!(path = %path.display(), count = records.len(), "cache written");
    println!(
        "  💾 Cached {} data points to {}",
        records.len(),
        path.display()
    );

    Ok(path)
}
