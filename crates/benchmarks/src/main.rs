//! Command-line harness for gemmsel kernel selection.

use anyhow::Result;
use clap::Parser;
use gemmsel_frontend::cli::{run_cli, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    run_cli(cli)
}
