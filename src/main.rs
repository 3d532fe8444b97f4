use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod accumulator;
mod error;
mod loader;
mod models;
mod pipeline;
mod report;
mod scoring;

#[derive(Parser)]
#[command(name = "wallet-credit-score")]
#[command(about = "Heuristic credit scores for lending-protocol wallets", long_about = None)]
struct Cli {
    /// Transaction log: a JSON array, possibly truncated after its last `]`
    #[arg(long, default_value = "user-wallet-transactions.json")]
    input: PathBuf,
    /// CSV table of wallet scores
    #[arg(long, default_value = "aave_wallet_scores.csv")]
    scores_out: PathBuf,
    /// SVG histogram of the score distribution
    #[arg(long, default_value = "wallet_score_histogram.svg")]
    plot_out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let records = loader::load_transactions(&cli.input)
        .with_context(|| format!("failed to load transactions from {}", cli.input.display()))?;
    let outcome = pipeline::score_transactions(&records);

    report::write_scores(&cli.scores_out, &outcome.scores)?;
    report::render_histogram(&cli.plot_out, &outcome.scores)?;

    print!("{}", report::build_summary(&outcome));
    Ok(())
}
