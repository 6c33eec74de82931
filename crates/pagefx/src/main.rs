//! pagefx CLI - page enhancement post-processor.
//!
//! Provides commands for:
//! - `enhance`: Transform diagram blocks, inject heading anchors and
//!   library activation scripts into rendered HTML pages
//! - `slugs`: Print the heading anchors a page would receive

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{EnhanceArgs, SlugsArgs};
use output::Output;

/// pagefx - page enhancement post-processor.
#[derive(Parser)]
#[command(name = "pagefx", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enhance HTML pages in place or into an output directory.
    Enhance(EnhanceArgs),
    /// Print the heading anchors of a page without modifying it.
    Slugs(SlugsArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let verbose = matches!(&cli.command, Commands::Enhance(args) if args.verbose);
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Enhance(args) => args.execute(),
        Commands::Slugs(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
