//! azul-board: command-line front end for the rules core
//!
//! Usage: azul-board apply '<notation>' --source F0 --color R --dest L3

use clap::Parser;
use tracing_subscriber::EnvFilter;

use azul_board::cli::{run, Cli};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = run(&cli)?;
    println!("{output}");
    Ok(())
}
