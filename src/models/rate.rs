use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::RateError;
use crate::utils::date::format_day;
use crate::utils::file::sanitize_filename;

/// Currencies supported by the NBRB dynamics endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Currency {
    Usd,
    Eur,
    Rub,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Usd, Currency::Eur, Currency::Rub];

    /// Provider-specific numeric id (`Cur_ID`).
    pub fn nbrb_id(&self) -> u32 {
        match self {
            Currency::Usd => 145,
            Currency::Eur => 19,
            Currency::Rub => 190,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Rub => "RUB",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = RateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        Currency::ALL
            .into_iter()
            .find(|c| c.code() == upper)
            .ok_or_else(|| RateError::unknown_currency(s))
    }
}

/// One official rate for one day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateRecord {
    pub date: NaiveDate,
    pub official_rate: f64,
}

impl RateRecord {
    pub fn new(date: NaiveDate, official_rate: f64) -> Self {
        Self {
            date,
            official_rate,
        }
    }
}

/// Raw element of the dynamics endpoint response.
#[derive(Debug, Deserialize)]
pub struct RateDto {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Cur_OfficialRate")]
    pub official_rate: f64,
}

/// Row of the cache CSV (`day,rate`).
#[derive(Debug, Serialize, Deserialize)]
pub struct RateRow {
    pub day: String,
    pub rate: f64,
}

/// Identifies one cached series. The filename is the only index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub currency: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl CacheKey {
    pub fn new(currency: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            currency: currency.into(),
            start_date,
            end_date,
        }
    }

    /// `{currency}_{start}_{end}`, shared by the cache file and chart files.
    pub fn stem(&self) -> String {
        format!(
            "{}_{}_{}",
            sanitize_filename(&self.currency),
            format_day(self.start_date),
            format_day(self.end_date)
        )
    }

    pub fn filename(&self) -> String {
        format!("{}.csv", self.stem())
    }

    /// Legend label used on every chart, e.g. `BYN/USD 01-01-2020 - 31-03-2020`.
    pub fn label(&self) -> String {
        format!(
            "BYN/{} {} - {}",
            self.currency,
            format_day(self.start_date),
            format_day(self.end_date)
        )
    }
}
