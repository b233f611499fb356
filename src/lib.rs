pub mod analysis;
pub mod api;
pub mod charts;
pub mod commands;
pub mod errors;
pub mod models;
pub mod utils;


use anyhow::Result;
use clap::Parser;

use crate::errors::RateError;

#[derive(Parser)]
#[clap(name = "nbrb_rates")]
#[clap(about = "Fetch NBRB exchange rate history, cache it as CSV and chart it")]
#[clap(version)]
pub struct Cli {
    #[command(flatten)]
    pub args: commands::analyze::AnalyzeArgs,
}

pub async fn run(cli: Cli) -> Result<()> {
    commands::analyze::run_analyze(cli.args).await
}

/// Malformed API or cached data is reported on stdout; every other failure on stderr.
pub fn is_data_format_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<RateError>()
        .is_some_and(RateError::is_data_format)
}
