//! lexcore CLI — builds a store of lexical core units.
//!
//! Mines pre-parsed syntax-tree corpora for code vocabulary and merges
//! letter-sharded word lists with a lexical knowledge base.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
