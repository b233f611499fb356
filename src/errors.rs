use thiserror::Error;

/// Failures of the rate pipeline. Every variant is terminal for a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("NBRB API returned {status} http status code")]
    Remote { status: u16 },
    #[error("Data format error: {0}")]
    DataFormat(String),
}

impl RateError {
    pub fn unknown_currency(code: &str) -> Self {
        RateError::Configuration(format!("Can't find currency code for currency {code}"))
    }

    /// Data-shape failures are reported on stdout, everything else on stderr.
    pub fn is_data_format(&self) -> bool {
        matches!(self, RateError::DataFormat(_))
    }
}

impl From<csv::Error> for RateError {
    fn from(e: csv::Error) -> RateError {
        RateError::DataFormat(e.to_string())
    }
}
