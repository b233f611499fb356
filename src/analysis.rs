//! Descriptive statistics over a daily rate series.
//!
//! Every function here is pure: the chart layer feeds it the loaded
//! records and draws whatever comes back. Missing periods and
//! undefined statistics are represented as `NaN`.

pub mod decompose;

use chrono::{Datelike, Days, Months, NaiveDate};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::models::rate::RateRecord;

pub use decompose::{DEFAULT_PERIOD, Decomposition, seasonal_decompose};

/// A dated value.
pub type Point = (NaiveDate, f64);

pub const HISTOGRAM_BINS: usize = 12;
pub const ROLLING_WINDOW: usize = 5;
/// Series longer than this get every 5th x label only.
pub const MAX_FULL_TICKS: usize = 31;
const TICK_STEP: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("Not enough observations: {required} required, {actual} available")]
    InsufficientData { required: usize, actual: usize },
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub fn points(records: &[RateRecord]) -> Vec<Point> {
    records.iter().map(|r| (r.date, r.official_rate)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Month,
    Quarter,
}

impl Period {
    fn months(&self) -> u32 {
        match self {
            Period::Month => 1,
            Period::Quarter => 3,
        }
    }

    /// Last calendar day of the period containing `date`.
    pub fn period_end(&self, date: NaiveDate) -> NaiveDate {
        let m = self.months();
        let end_month = (date.month0() / m + 1) * m;
        NaiveDate::from_ymd_opt(date.year(), end_month, 1)
            .and_then(|d| d.checked_add_months(Months::new(1)))
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    fn next_period_end(&self, end: NaiveDate) -> NaiveDate {
        let next_start = end.checked_add_days(Days::new(1)).unwrap_or(end);
        self.period_end(next_start)
    }
}

/// Mean of the values in each calendar period, labelled with the period end.
/// Periods between the first and last sample without any data yield `NaN`.
pub fn resample_mean(series: &[Point], period: Period) -> Vec<Point> {
    let mut buckets: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for &(date, value) in series {
        if value.is_nan() {
            continue;
        }
        let entry = buckets.entry(period.period_end(date)).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    let (Some(first), Some(last)) = (
        series.iter().map(|p| p.0).min(),
        series.iter().map(|p| p.0).max(),
    ) else {
        return Vec::new();
    };

    let last_end = period.period_end(last);
    let mut end = period.period_end(first);
    let mut result = Vec::new();
    loop {
        let mean = match buckets.get(&end) {
            Some(&(sum, count)) if count > 0 => sum / count as f64,
            _ => f64::NAN,
        };
        result.push((end, mean));
        if end >= last_end {
            break;
        }
        end = period.next_period_end(end);
    }
    result
}

/// `rate[t] - rate[t-1]`, dated at `t`. The first sample has no change.
pub fn day_over_day(series: &[Point]) -> Vec<Point> {
    series
        .windows(2)
        .map(|w| (w[1].0, w[1].1 - w[0].1))
        .collect()
}

/// Sample standard deviation (`n - 1` denominator), `NaN` below 2 samples.
pub fn sample_std(values: &[f64]) -> f64 {
    let values: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    var.sqrt()
}

/// Standard deviation over non-overlapping windows `[i*w, i*w + w)`,
/// dated at the first sample of each window.
pub fn rolling_std(series: &[Point], window: usize) -> Result<Vec<Point>, AnalysisError> {
    if window == 0 {
        return Err(AnalysisError::InvalidParameter(
            "window must be positive".to_string(),
        ));
    }
    Ok(series
        .chunks(window)
        .map(|chunk| {
            let values: Vec<f64> = chunk.iter().map(|p| p.1).collect();
            (chunk[0].0, sample_std(&values))
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `bins + 1` equally spaced edges.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Points joining each bin's right edge to its count.
    pub fn right_edge_points(&self) -> Vec<(f64, f64)> {
        self.edges[1..]
            .iter()
            .zip(&self.counts)
            .map(|(edge, count)| (*edge, *count as f64))
            .collect()
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// Equal-width histogram over `[min, max]`; the last bin includes its right edge.
/// Non-finite values are ignored.
pub fn histogram(values: &[f64], bins: usize) -> Result<Histogram, AnalysisError> {
    if bins == 0 {
        return Err(AnalysisError::InvalidParameter(
            "bin count must be positive".to_string(),
        ));
    }

    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let (mut lo, mut hi) = finite
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    if finite.is_empty() {
        (lo, hi) = (0.0, 1.0);
    } else if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins)
        .map(|i| if i == bins { hi } else { lo + width * i as f64 })
        .collect();

    let mut counts = vec![0usize; bins];
    for v in finite {
        let mut idx = (((v - lo) / (hi - lo)) * bins as f64) as usize;
        if idx >= bins {
            idx = bins - 1;
        }
        // Float rounding can land a value just outside its computed bin.
        if idx > 0 && v < edges[idx] {
            idx -= 1;
        } else if idx < bins - 1 && v >= edges[idx + 1] {
            idx += 1;
        }
        counts[idx] += 1;
    }

    Ok(Histogram { edges, counts })
}

/// Number of x labels for a series of `len` dates: all of them when short,
/// otherwise every 5th.
pub fn tick_count(len: usize) -> usize {
    if len > MAX_FULL_TICKS {
        len.div_ceil(TICK_STEP)
    } else {
        len
    }
}
