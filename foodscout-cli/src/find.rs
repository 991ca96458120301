//! `find` command: answer a restaurant search through the discovery cache.

use std::io::Write;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;
use foodscout_core::{
    ChoiceRecord, FinderConfig, NearbySearchProvider, PaginationPolicy, RankingMode, SearchError,
    SearchOrchestrator, SearchOutcome, SearchQuery, SearchSource, StoreBackend,
};
use foodscout_data::sqlite::SqliteBackend;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::sources::{self, PlacesSource};
use crate::{
    ARG_API_KEY, ARG_DATABASE, ARG_DB_NAME, ARG_DB_PASSWORD, ARG_DB_USER, ARG_LANGUAGE, ARG_LAT,
    ARG_LNG, ARG_MAX_PAGES, ARG_MAX_SESSIONS, ARG_PAGE_DELAY_MS, ARG_PLACES_FIXTURE, ARG_RADIUS,
    ARG_RANKING_MODE, CliError, DEFAULT_DATABASE, ENV_FIND_LAT, ENV_FIND_LNG, ENV_FIND_RADIUS,
};

/// CLI arguments for the `find` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Search for restaurants within a radius of a point. Regions \
                 already covered by an earlier search are answered from the \
                 SQLite cache; anything else is fetched from Nearby Search \
                 (or a recorded fixture) and cached.",
    about = "Search for restaurants around a point"
)]
#[ortho_config(prefix = "FOODSCOUT")]
pub(crate) struct FindArgs {
    /// Latitude of the search centre in degrees.
    #[arg(long = ARG_LAT, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lat: Option<f64>,
    /// Longitude of the search centre in degrees.
    #[arg(long = ARG_LNG, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lng: Option<f64>,
    /// Search radius in meters.
    #[arg(long = ARG_RADIUS, value_name = "meters")]
    #[serde(default)]
    pub(crate) radius: Option<f64>,
    /// SQLite discovery cache (default: `foodscout.sqlite`).
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Database name presented when opening sessions.
    #[arg(long = ARG_DB_NAME, value_name = "name")]
    #[serde(default)]
    pub(crate) db_name: Option<String>,
    /// User presented when opening sessions.
    #[arg(long = ARG_DB_USER, value_name = "user")]
    #[serde(default)]
    pub(crate) db_user: Option<String>,
    /// Password presented when opening sessions.
    #[arg(long = ARG_DB_PASSWORD, value_name = "password")]
    #[serde(default)]
    pub(crate) db_password: Option<String>,
    /// Maximum concurrently open store sessions.
    #[arg(long = ARG_MAX_SESSIONS, value_name = "count")]
    #[serde(default)]
    pub(crate) max_sessions: Option<usize>,
    /// JSON file of recorded Nearby Search responses to use instead of the
    /// live service.
    #[arg(long = ARG_PLACES_FIXTURE, value_name = "path")]
    #[serde(default)]
    pub(crate) places_fixture: Option<Utf8PathBuf>,
    /// Google Places API key.
    #[arg(long = ARG_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) api_key: Option<String>,
    /// Response language, e.g. `en` or `zh-TW`.
    #[arg(long = ARG_LANGUAGE, value_name = "code")]
    #[serde(default)]
    pub(crate) language: Option<String>,
    /// Maximum result pages fetched per search.
    #[arg(long = ARG_MAX_PAGES, value_name = "count")]
    #[serde(default)]
    pub(crate) max_pages: Option<usize>,
    /// Wait between result pages, in milliseconds.
    #[arg(long = ARG_PAGE_DELAY_MS, value_name = "ms")]
    #[serde(default)]
    pub(crate) page_delay_ms: Option<u64>,
    /// `highest-rate` or `highest-select`.
    #[arg(long = ARG_RANKING_MODE, value_name = "mode")]
    #[serde(default)]
    pub(crate) ranking_mode: Option<RankingMode>,
}

impl FindArgs {
    pub(crate) fn into_config(self) -> Result<FindConfig, CliError> {
        let merged = self.load_and_merge()?;
        FindConfig::try_from(merged)
    }
}

/// Resolved `find` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FindConfig {
    pub(crate) query: SearchQuery,
    pub(crate) database: Utf8PathBuf,
    pub(crate) places: PlacesSource,
    pub(crate) finder: FinderConfig,
}

impl TryFrom<FindArgs> for FindConfig {
    type Error = CliError;

    fn try_from(args: FindArgs) -> Result<Self, Self::Error> {
        let lat = args.lat.ok_or(CliError::MissingArgument {
            field: ARG_LAT,
            env: ENV_FIND_LAT,
        })?;
        let lng = args.lng.ok_or(CliError::MissingArgument {
            field: ARG_LNG,
            env: ENV_FIND_LNG,
        })?;
        let radius = args.radius.ok_or(CliError::MissingArgument {
            field: ARG_RADIUS,
            env: ENV_FIND_RADIUS,
        })?;
        let places = PlacesSource::resolve(args.places_fixture, args.api_key)?;
        let database = args
            .database
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE));

        let mut finder = FinderConfig::default()
            .with_location(database.as_str())
            .with_credentials(sources::credentials(
                args.db_name,
                args.db_user,
                args.db_password,
            ));
        if let Some(max_sessions) = args.max_sessions {
            if max_sessions == 0 {
                return Err(CliError::InvalidArgument {
                    field: ARG_MAX_SESSIONS,
                    reason: "at least one session is required".to_owned(),
                });
            }
            finder = finder.with_max_sessions(max_sessions);
        }
        if let Some(language) = args.language {
            finder = finder.with_language(language);
        }
        if let Some(mode) = args.ranking_mode {
            finder = finder.with_ranking_mode(mode);
        }
        let mut pagination = PaginationPolicy::default();
        if let Some(max_pages) = args.max_pages {
            pagination = pagination.with_max_pages(max_pages);
        }
        if let Some(delay) = args.page_delay_ms {
            pagination = pagination.with_page_delay(Duration::from_millis(delay));
        }
        finder = finder.with_pagination(pagination);

        Ok(Self {
            query: SearchQuery::new(lat, lng, radius),
            database,
            places,
            finder,
        })
    }
}

impl FindConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        self.places.validate()
    }
}

/// Something that can answer a search; the seam the CLI tests stub out.
pub(crate) trait Finder {
    fn find(&self, query: &SearchQuery) -> Result<SearchOutcome, SearchError>;
}

impl<B: StoreBackend, P: NearbySearchProvider> Finder for SearchOrchestrator<B, P> {
    fn find(&self, query: &SearchQuery) -> Result<SearchOutcome, SearchError> {
        SearchOrchestrator::find(self, query)
    }
}

/// Builds the finder for one `find` invocation.
pub(crate) trait FinderBuilder {
    fn build(&self, config: &FindConfig) -> Result<Box<dyn Finder>, CliError>;
}

pub(crate) struct DefaultFinderBuilder;

impl FinderBuilder for DefaultFinderBuilder {
    fn build(&self, config: &FindConfig) -> Result<Box<dyn Finder>, CliError> {
        let backend = SqliteBackend::new(config.database.clone());
        let provider = config.places.provider()?;
        Ok(Box::new(SearchOrchestrator::new(
            &config.finder,
            backend,
            provider,
        )))
    }
}

/// JSON printed by `find`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct FindReport {
    pub(crate) source: SearchSource,
    pub(crate) count: usize,
    pub(crate) records: Vec<ChoiceRecord>,
}

impl From<SearchOutcome> for FindReport {
    fn from(outcome: SearchOutcome) -> Self {
        Self {
            source: outcome.source,
            count: outcome.records.len(),
            records: outcome.records,
        }
    }
}

pub(crate) fn run_find(args: FindArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_find_with(args, &DefaultFinderBuilder, &mut stdout)
}

pub(crate) fn run_find_with(
    args: FindArgs,
    builder: &dyn FinderBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let finder = builder.build(&config)?;
    let outcome = finder.find(&config.query)?;
    info!(
        "{} restaurants from {:?} for ({}, {}, {})",
        outcome.records.len(),
        outcome.source,
        config.query.lat,
        config.query.lng,
        config.query.size
    );
    sources::write_json(writer, &FindReport::from(outcome))
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<FindConfig, CliError> {
    let merged = FindArgs::merge_from_layers(layers)?;
    FindConfig::try_from(merged)
}
