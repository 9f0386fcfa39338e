//! tracontent CLI - multi-site page tree and menu engine.
//!
//! Provides commands for:
//! - `serve`: Start the content API server
//! - `menu`: Print a site's navigation menu
//! - `copy`: Copy a page into another site
//! - `check`: Find (and optionally repair) stale page paths
//! - `slugify`: Convert a title into a URL slug

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CheckArgs, CopyArgs, MenuArgs, ServeArgs, SlugifyArgs};
use error::CliError;
use output::Output;

/// Application version from Cargo.toml.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// tracontent - multi-site page tree and menu engine.
#[derive(Parser)]
#[command(name = "tc", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the content API server.
    Serve(ServeArgs),
    /// Print the navigation menu of a site.
    Menu(MenuArgs),
    /// Copy a page into another site.
    Copy(CopyArgs),
    /// Check that stored page paths match their parents.
    Check(CheckArgs),
    /// Convert a title into a URL slug.
    Slugify(SlugifyArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let verbose = matches!(&cli.command, Commands::Serve(args) if args.verbose);
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
        Commands::Serve(args) => tokio::runtime::Runtime::new()
            .map_err(CliError::from)
            .and_then(|rt| rt.block_on(args.execute(VERSION))),
        Commands::Menu(args) => args.execute(),
        Commands::Copy(args) => args.execute(),
        Commands::Check(args) => args.execute(),
        Commands::Slugify(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
