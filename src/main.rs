//! DiskTally: multi-root disk usage tally.
//!
//! Thin binary entry point. All logic lives in the `disktally-core`
//! and `disktally-cli` crates.

use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = disktally_cli::Cli::parse();

    // Initialise structured logging. Logs go to stderr so the printed
    // tree on stdout stays clean.
    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("DiskTally starting");
    disktally_cli::run(&cli)
}
