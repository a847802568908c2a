//! kvload
//!
//! Loads dump-format text into a kvdump environment, creating it and any
//! sub-databases the dump names.
//!
//! ```text
//! kvload [-f FILE] [-n] [-s NAME] [-N] [-T] [-v] [--json] PATH
//! ```
//!
//! Exits 0 on success. On failure the diagnostic, with the input line it
//! was detected on, goes to stderr and the exit status is 1.

mod commands;
mod error;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Load dump-format text into a kvdump environment.
#[derive(Parser, Debug)]
#[command(name = "kvload")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the environment (a directory unless -n is given)
    pub path: PathBuf,

    /// Read the dump from FILE instead of standard input
    #[arg(short = 'f', value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// The environment is a single file, not a directory
    #[arg(short = 'n')]
    pub no_subdir: bool,

    /// Load into the named sub-database
    #[arg(short = 's', value_name = "NAME")]
    pub subdb: Option<String>,

    /// Skip keys that already exist instead of overwriting them
    #[arg(short = 'N')]
    pub no_overwrite: bool,

    /// Raw input: no headers, no line framing, hex-pair payloads
    #[arg(short = 'T')]
    pub raw: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Print a JSON summary of the load on stdout
    #[arg(long)]
    pub json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match commands::load::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("kvload: {err}");
            ExitCode::FAILURE
        }
    }
}
