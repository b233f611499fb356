use chrono::NaiveDate;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::api::retry::{MaybeRetry, RetryPolicy, is_retryable_status};
use crate::errors::RateError;
use crate::models::rate::{Currency, RateDto, RateRecord};
use crate::utils::config::{Config, DEFAULT_API_URL};
use crate::utils::date::{format_api_date, parse_api_datetime};

pub struct NbrbClient {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl Default for NbrbClient {
    fn default() -> Self {
        Self::new()
    }
}

impl NbrbClient {
    pub fn new() -> Self {
        Self::new_with_url(DEFAULT_API_URL.to_string())
    }

    pub fn new_with_url(base_url: String) -> Self {
        Self::with_policy(base_url, RetryPolicy::default())
    }

    pub fn with_policy(base_url: String, retry: RetryPolicy) -> Self {
        Self {
            client: Client::new(),
            base_url,
            retry,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, RateError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| RateError::Configuration(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.api_url.clone(),
            retry: config.retry.clone(),
        })
    }

    /// Fetches the official rate history of `currency_code` for `[start_date, end_date]`.
    pub async fn fetch_rates(
        &self,
        currency_code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<RateRecord>, RateError> {
        let currency: Currency = currency_code.parse()?;

        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            currency.nbrb_id()
        );
        let params = [
            ("startDate", format_api_date(start_date)),
            ("endDate", format_api_date(end_date)),
        ];
        info!(%url, %currency, start = %params[0].1, end = %params[1].1, "fetching rates");

        let body = self.get_with_retry(&url, &params).await?;
        let records = parse_rates(&body)?;

        info!(count = records.len(), "rates fetched");
        Ok(records)
    }

    async fn get_with_retry(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<String, RateError> {
        let retry_limit = self.retry.retry_limit;
        let mut retry_count = 0;
        loop {
            debug!(retry_count, retry_limit, "calling");
            match self.get_maybe_retry(url, params).await {
                MaybeRetry::Through(res) => return res,
                MaybeRetry::Retry { err, msg } => {
                    retry_count += 1;
                    if retry_limit < retry_count {
                        warn!(reason = %msg, "retry limit reached");
                        return Err(err);
                    }

                    let delay = self.retry.delay_for(retry_count);
                    info!(reason = %msg, ?delay, retry_count, "retrying");
                    if delay > Duration::ZERO {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }

    async fn get_maybe_retry(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> MaybeRetry<Result<String, RateError>, RateError> {
        let response = match self.client.get(url).query(params).send().await {
            Ok(response) => response,
            Err(e) => {
                let msg = format!("connection error: {}", e);
                return MaybeRetry::Retry {
                    err: RateError::Network(format!(
                        "Connection errors after several retries! ({})",
                        e
                    )),
                    msg,
                };
            }
        };

        let status = response.status().as_u16();
        if is_retryable_status(status) {
            return MaybeRetry::Retry {
                err: RateError::Network(format!(
                    "NBRB API kept returning {} http status code after several retries",
                    status
                )),
                msg: format!("status {}", status),
            };
        }
        if status != 200 {
            return MaybeRetry::Through(Err(RateError::Remote { status }));
        }

        match response.text().await {
            Ok(body) => MaybeRetry::Through(Ok(body)),
            Err(e) => MaybeRetry::Retry {
                err: RateError::Network(format!("Failed to read response body: {}", e)),
                msg: format!("body read error: {}", e),
            },
        }
    }
}

/// Parses the dynamics endpoint body into records, keeping the server's order.
pub fn parse_rates(body: &str) -> Result<Vec<RateRecord>, RateError> {
    let items: Vec<RateDto> = serde_json::from_str(body)
        .map_err(|e| RateError::DataFormat(format!("Unexpected API response: {}", e)))?;

    items
        .into_iter()
        .map(|item| -> Result<RateRecord, RateError> {
            let date = parse_api_datetime(&item.date)
                .map_err(|e| RateError::DataFormat(format!("{:#}", e)))?;
            Ok(RateRecord::new(date, item.official_rate))
        })
        .collect()
}

#[cfg(test)]
mod tests;
