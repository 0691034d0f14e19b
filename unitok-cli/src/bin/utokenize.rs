//! `utokenize`: tokenizes text line by line.

use clap::Parser;
use unitok_cli::args::TokenizeArgs;
use unitok_cli::run::run_tokenize;

/// Tokenizes a given text
#[derive(Parser)]
#[command(name = "utokenize", version, about)]
struct Cli {
    #[command(flatten)]
    args: TokenizeArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_tokenize(&cli.args)
}
