//! `inspect` command: list cached areas and restaurants around a point.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use foodscout_core::{
    AreaDiscoveryIndex, ChoiceRecord, ChoiceStore, Credentials, DiscoveredArea, GeoBounds,
    RegionError, SessionPool, StoreBackend,
};
use foodscout_data::sqlite::SqliteBackend;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::sources;
use crate::{
    ARG_DATABASE, ARG_DB_NAME, ARG_DB_PASSWORD, ARG_DB_USER, ARG_LAT, ARG_LNG, ARG_RADIUS,
    CliError, DEFAULT_DATABASE, ENV_INSPECT_LAT, ENV_INSPECT_LNG,
};

/// Radius used when `--radius` is not given.
const DEFAULT_INSPECT_RADIUS: f64 = 1000.0;

/// CLI arguments for the `inspect` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Print the discovered areas centred near a point and the \
                 cached restaurants within a radius of it. Nothing is fetched.",
    about = "Show what the discovery cache holds around a point"
)]
#[ortho_config(prefix = "FOODSCOUT")]
pub(crate) struct InspectArgs {
    /// Latitude in degrees.
    #[arg(long = ARG_LAT, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lat: Option<f64>,
    /// Longitude in degrees.
    #[arg(long = ARG_LNG, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lng: Option<f64>,
    /// Radius in meters (default: 1000).
    #[arg(long = ARG_RADIUS, value_name = "meters")]
    #[serde(default)]
    pub(crate) radius: Option<f64>,
    /// SQLite discovery cache (default: `foodscout.sqlite`).
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    #[arg(long = ARG_DB_NAME, value_name = "name")]
    #[serde(default)]
    pub(crate) db_name: Option<String>,
    #[arg(long = ARG_DB_USER, value_name = "user")]
    #[serde(default)]
    pub(crate) db_user: Option<String>,
    #[arg(long = ARG_DB_PASSWORD, value_name = "password")]
    #[serde(default)]
    pub(crate) db_password: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct InspectConfig {
    pub(crate) lat: f64,
    pub(crate) lng: f64,
    pub(crate) radius: f64,
    pub(crate) database: Utf8PathBuf,
    pub(crate) credentials: Credentials,
}

impl TryFrom<InspectArgs> for InspectConfig {
    type Error = CliError;

    fn try_from(args: InspectArgs) -> Result<Self, Self::Error> {
        let lat = args.lat.ok_or(CliError::MissingArgument {
            field: ARG_LAT,
            env: ENV_INSPECT_LAT,
        })?;
        let lng = args.lng.ok_or(CliError::MissingArgument {
            field: ARG_LNG,
            env: ENV_INSPECT_LNG,
        })?;
        let radius = args.radius.unwrap_or(DEFAULT_INSPECT_RADIUS);
        foodscout_core::validate_region(lat, lng, radius).map_err(|err| {
            let field = match err {
                RegionError::Latitude(_) => ARG_LAT,
                RegionError::Longitude(_) => ARG_LNG,
                RegionError::Radius(_) | RegionError::Extent { .. } => ARG_RADIUS,
            };
            CliError::InvalidArgument {
                field,
                reason: err.to_string(),
            }
        })?;
        Ok(Self {
            lat,
            lng,
            radius,
            database: args
                .database
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE)),
            credentials: sources::credentials(args.db_name, args.db_user, args.db_password),
        })
    }
}

/// JSON printed by `inspect`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct InspectReport {
    pub(crate) areas: Vec<DiscoveredArea>,
    pub(crate) choices: Vec<ChoiceRecord>,
}

pub(crate) fn run_inspect(args: InspectArgs) -> Result<(), CliError> {
    let config = InspectConfig::try_from(args.load_and_merge()?)?;
    sources::require_existing(&config.database, ARG_DATABASE)?;
    let backend = SqliteBackend::new(config.database.clone());
    let mut stdout = std::io::stdout().lock();
    run_inspect_with(&config, backend, &mut stdout)
}

/// Read both collections around the configured point through one pooled
/// session.
pub(crate) fn run_inspect_with<B: StoreBackend>(
    config: &InspectConfig,
    backend: B,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let pool = SessionPool::new(backend, 1);
    let mut session = pool.acquire(&config.credentials)?;
    let bounds = GeoBounds::around(config.lat, config.lng, config.radius);
    let areas = AreaDiscoveryIndex::new().areas_near(&mut session, &bounds)?;
    let choices =
        ChoiceStore::new().find_by_location(&mut session, config.lat, config.lng, config.radius)?;
    drop(session);
    sources::write_json(writer, &InspectReport { areas, choices })
}
