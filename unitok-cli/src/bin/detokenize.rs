//! `detokenize`: re-joins tokenized text line by line.

use clap::Parser;
use unitok_cli::args::DetokenizeArgs;
use unitok_cli::run::run_detokenize;

/// Detokenizes a given text
#[derive(Parser)]
#[command(name = "detokenize", version, about)]
struct Cli {
    #[command(flatten)]
    args: DetokenizeArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_detokenize(&cli.args)
}
