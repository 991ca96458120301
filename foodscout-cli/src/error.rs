//! Error type for the foodscout CLI.
//!
//! Variants stay small; most carry a path or a boxed library error so
//! `Result<_, CliError>` remains cheap to move.

use std::sync::Arc;

use camino::Utf8PathBuf;
use foodscout_core::{PoolError, SearchError, StoreError};
use foodscout_data::places::{FixtureError, ProviderBuildError};
use thiserror::Error;

/// Errors emitted by the foodscout CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// Neither a places fixture nor an API key was supplied.
    #[error("no places source configured (set --{fixture} or --{api_key})")]
    MissingPlacesSource {
        fixture: &'static str,
        api_key: &'static str,
    },
    /// A numeric option is out of range.
    #[error("invalid {field}: {reason}")]
    InvalidArgument {
        field: &'static str,
        reason: String,
    },
    /// A referenced input path does not exist.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Loading the recorded places fixture failed.
    #[error(transparent)]
    LoadPlacesFixture(#[from] FixtureError),
    /// Constructing the Nearby Search client failed.
    #[error("failed to build Nearby Search client: {0}")]
    BuildPlacesProvider(#[from] ProviderBuildError),
    /// The search itself failed.
    #[error("search failed: {0}")]
    Search(#[from] SearchError),
    /// Opening a store session for inspection failed.
    #[error("failed to open the discovery cache: {0}")]
    OpenStore(#[from] PoolError),
    /// Reading the discovery cache failed.
    #[error("failed to read the discovery cache: {0}")]
    ReadStore(#[from] StoreError),
    /// Serialising the command output failed.
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing the command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
