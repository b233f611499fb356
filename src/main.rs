use clap::Parser;
use nbrb_rates::Cli;
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(err) = nbrb_rates::run(cli).await {
        if nbrb_rates::is_data_format_error(&err) {
            println!("Error: {:#}", err);
        } else {
            eprintln!("Error: {:#}", err);
        }
        process::exit(1);
    }
}
