//! Command-line interface for the foodscout restaurant finder.
//!
//! `find` answers a search from the SQLite discovery cache or, on a miss,
//! from Nearby Search (live or a recorded fixture). `inspect` prints what the
//! cache already holds around a point. Options layer CLI flags over
//! `FOODSCOUT_*` environment variables and configuration files.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod find;
mod inspect;
mod sources;

pub use error::CliError;

pub(crate) const ARG_LAT: &str = "lat";
pub(crate) const ARG_LNG: &str = "lng";
pub(crate) const ARG_RADIUS: &str = "radius";
pub(crate) const ARG_DATABASE: &str = "database";
pub(crate) const ARG_DB_NAME: &str = "db-name";
pub(crate) const ARG_DB_USER: &str = "db-user";
pub(crate) const ARG_DB_PASSWORD: &str = "db-password";
pub(crate) const ARG_MAX_SESSIONS: &str = "max-sessions";
pub(crate) const ARG_PLACES_FIXTURE: &str = "places-fixture";
pub(crate) const ARG_API_KEY: &str = "api-key";
pub(crate) const ARG_LANGUAGE: &str = "language";
pub(crate) const ARG_MAX_PAGES: &str = "max-pages";
pub(crate) const ARG_PAGE_DELAY_MS: &str = "page-delay-ms";
pub(crate) const ARG_RANKING_MODE: &str = "ranking-mode";

pub(crate) const ENV_FIND_LAT: &str = "FOODSCOUT_CMDS_FIND_LAT";
pub(crate) const ENV_FIND_LNG: &str = "FOODSCOUT_CMDS_FIND_LNG";
pub(crate) const ENV_FIND_RADIUS: &str = "FOODSCOUT_CMDS_FIND_RADIUS";
pub(crate) const ENV_INSPECT_LAT: &str = "FOODSCOUT_CMDS_INSPECT_LAT";
pub(crate) const ENV_INSPECT_LNG: &str = "FOODSCOUT_CMDS_INSPECT_LNG";

/// Database file used when `--database` is not given.
pub(crate) const DEFAULT_DATABASE: &str = "foodscout.sqlite";

/// Run the CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns [`CliError`] when arguments or configuration are invalid, or the
/// selected command fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse()?;
    match cli.command {
        Command::Find(args) => find::run_find(args),
        Command::Inspect(args) => inspect::run_inspect(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "foodscout",
    about = "Find restaurants near a point, caching every region already searched",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search for restaurants around a point.
    Find(find::FindArgs),
    /// Show cached areas and restaurants around a point.
    Inspect(inspect::InspectArgs),
}

#[cfg(test)]
mod tests;
