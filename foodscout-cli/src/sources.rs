//! Helpers shared by the CLI commands: input validation, places sources and
//! JSON output.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use foodscout_core::{Credentials, NearbySearchProvider};
use foodscout_data::places::{FixturePlacesProvider, HttpPlacesProvider};
use serde::Serialize;

use crate::{ARG_API_KEY, ARG_PLACES_FIXTURE, CliError};

/// Where cache misses are answered from.
#[derive(Clone, PartialEq, Eq)]
pub(crate) enum PlacesSource {
    /// Recorded Nearby Search responses on disk.
    Fixture(Utf8PathBuf),
    /// The live service, authenticated with this API key.
    Api(String),
}

impl std::fmt::Debug for PlacesSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixture(path) => f.debug_tuple("Fixture").field(path).finish(),
            Self::Api(_) => f.debug_tuple("Api").field(&"<redacted>").finish(),
        }
    }
}

impl PlacesSource {
    /// Pick a source; a fixture wins over an API key so offline runs never
    /// reach the network by accident.
    pub(crate) fn resolve(
        fixture: Option<Utf8PathBuf>,
        api_key: Option<String>,
    ) -> Result<Self, CliError> {
        match (fixture, api_key.filter(|key| !key.trim().is_empty())) {
            (Some(path), _) => Ok(Self::Fixture(path)),
            (None, Some(key)) => Ok(Self::Api(key)),
            (None, None) => Err(CliError::MissingPlacesSource {
                fixture: ARG_PLACES_FIXTURE,
                api_key: ARG_API_KEY,
            }),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), CliError> {
        match self {
            Self::Fixture(path) => require_existing(path, ARG_PLACES_FIXTURE),
            Self::Api(_) => Ok(()),
        }
    }

    pub(crate) fn provider(&self) -> Result<Box<dyn NearbySearchProvider>, CliError> {
        Ok(match self {
            Self::Fixture(path) => Box::new(FixturePlacesProvider::from_path(path)?),
            Self::Api(key) => Box::new(HttpPlacesProvider::new(key.clone())?),
        })
    }
}

/// Credentials from the optional `--db-*` flags; absent values are empty.
pub(crate) fn credentials(
    database: Option<String>,
    username: Option<String>,
    password: Option<String>,
) -> Credentials {
    Credentials::new(
        database.unwrap_or_default(),
        username.unwrap_or_default(),
        password.unwrap_or_default(),
    )
}

pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    let inspect_error = |source| CliError::InspectSourcePath {
        field,
        path: path.to_path_buf(),
        source,
    };
    if foodscout_fs::is_regular_file(path).map_err(inspect_error)? {
        return Ok(());
    }
    if foodscout_fs::path_exists(path).map_err(inspect_error)? {
        return Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        });
    }
    Err(CliError::MissingSourceFile {
        field,
        path: path.to_path_buf(),
    })
}

pub(crate) fn write_json<T: Serialize>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}
