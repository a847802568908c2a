//! The load command.

use crate::error::CliError;
use crate::Cli;
use kvdump_load::{load, LoadOptions, LoadStats};
use kvdump_store::{EnvConfig, Environment};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader};
use tracing::info;

/// Summary printed with `--json`.
#[derive(Debug, Serialize)]
pub struct LoadSummary {
    /// Environment path.
    pub path: String,
    /// Dump file, or `None` for standard input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    /// Counters from the run.
    #[serde(flatten)]
    pub stats: LoadStats,
}

/// Builds loader options from the command line.
pub fn options(cli: &Cli) -> LoadOptions {
    let options = LoadOptions::new()
        .no_overwrite(cli.no_overwrite)
        .raw(cli.raw);
    match &cli.subdb {
        Some(name) => options.database(name.as_str()),
        None => options,
    }
}

/// Runs a load as described by `cli`.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    let env_error = |source| CliError::Environment {
        path: cli.path.clone(),
        source,
    };

    let config = EnvConfig::new().no_subdir(cli.no_subdir);
    let env = Environment::open(&cli.path, config).map_err(env_error)?;

    let stats = match &cli.file {
        Some(path) => {
            let file = File::open(path).map_err(|source| CliError::Input {
                path: path.clone(),
                source,
            })?;
            load(&env, BufReader::new(file), options(cli))?
        }
        None => load(&env, io::stdin().lock(), options(cli))?,
    };

    env.close().map_err(env_error)?;
    info!(path = %cli.path.display(), records = stats.records, "done");

    if cli.json {
        let summary = LoadSummary {
            path: cli.path.display().to_string(),
            input: cli.file.as_ref().map(|p| p.display().to_string()),
            stats,
        };
        println!("{}", serde_json::to_string(&summary)?);
    }
    Ok(())
}
