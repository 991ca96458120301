//! Cache-or-fetch coordination for restaurant searches.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cancel::CancellationToken;
use super::pagination::fetch_all_pages;
use super::provider::{NearbyRequest, NearbySearchProvider, ProviderError, WeatherSource};
use super::transform::{ParseError, choices_from_pages};
use crate::config::{FinderConfig, SearchConfig};
use crate::geometry::{RegionError, validate_region};
use crate::store::{
    AreaDiscoveryIndex, ChoiceStore, Credentials, PoolError, SessionPool, StoreBackend,
    StoreError,
};
use crate::{ChoiceRecord, WeatherSnapshot};

/// How fresh remote results are selected for persistence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RankingMode {
    /// Persist every result, ranked by its position in the provider page.
    #[default]
    HighestRate,
    /// Reserved; always rejected with [`SearchError::NotImplemented`].
    HighestSelect,
}

impl RankingMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HighestRate => "highest-rate",
            Self::HighestSelect => "highest-select",
        }
    }
}

impl fmt::Display for RankingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unrecognised [`RankingMode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown ranking mode {0:?}; expected highest-rate or highest-select")]
pub struct UnknownRankingMode(pub String);

impl FromStr for RankingMode {
    type Err = UnknownRankingMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "highest-rate" => Ok(Self::HighestRate),
            "highest-select" => Ok(Self::HighestSelect),
            _ => Err(UnknownRankingMode(value.to_owned())),
        }
    }
}

/// A request for restaurants within `size` meters of `(lat, lng)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchQuery {
    pub lat: f64,
    pub lng: f64,
    /// Half-width of the search box in meters.
    pub size: f64,
}

impl SearchQuery {
    #[must_use]
    pub const fn new(lat: f64, lng: f64, size: f64) -> Self {
        Self { lat, lng, size }
    }

    /// Reject coordinates outside the WGS84 domain and non-positive sizes.
    pub fn validate(&self) -> Result<(), RegionError> {
        validate_region(self.lat, self.lng, self.size)
    }
}

/// Where the records of a [`SearchOutcome`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchSource {
    /// The region was already discovered; records were read from the store.
    Cache,
    /// The region was fetched from the remote provider and persisted.
    Remote,
}

/// Records produced by one search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub source: SearchSource,
    pub records: Vec<ChoiceRecord>,
}

/// Errors returned by [`SearchOrchestrator::find`].
///
/// A failed search returns no records. Records inserted before a persistence
/// failure stay in the store.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Every session slot was in use.
    #[error("session pool exhausted ({max_sessions} sessions active)")]
    PoolExhausted { max_sessions: usize },
    /// A store connection could not be opened or authenticated.
    #[error("could not connect to the backing store")]
    ConnectionFailure(#[source] StoreError),
    /// A read or write against the store failed.
    #[error("backing store query failed")]
    QueryFailure(#[source] StoreError),
    /// The remote provider failed or the fetch was cancelled.
    #[error("remote search failed")]
    RemoteFetchFailure(#[source] ProviderError),
    /// A remote result could not be transformed; nothing was persisted.
    #[error("remote result could not be parsed")]
    ParseFailure(#[source] ParseError),
    /// The requested ranking mode is not available.
    #[error("ranking mode {mode} is not implemented")]
    NotImplemented { mode: RankingMode },
    /// The query failed validation.
    #[error("invalid search query")]
    InvalidQuery(#[source] RegionError),
}

impl From<PoolError> for SearchError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Exhausted { max_sessions } => Self::PoolExhausted { max_sessions },
            PoolError::Connection(source) => Self::ConnectionFailure(source),
        }
    }
}

impl From<StoreError> for SearchError {
    fn from(err: StoreError) -> Self {
        if err.is_connection_failure() {
            Self::ConnectionFailure(err)
        } else {
            Self::QueryFailure(err)
        }
    }
}

impl From<ProviderError> for SearchError {
    fn from(err: ProviderError) -> Self {
        Self::RemoteFetchFailure(err)
    }
}

impl From<ParseError> for SearchError {
    fn from(err: ParseError) -> Self {
        Self::ParseFailure(err)
    }
}

impl From<RegionError> for SearchError {
    fn from(err: RegionError) -> Self {
        Self::InvalidQuery(err)
    }
}

/// Answers restaurant searches from the discovery cache when possible and
/// from the remote provider otherwise.
///
/// Each call to [`Self::find`] holds exactly one pooled session for its whole
/// duration and releases it on every exit path. Concurrent calls share the
/// pool and are otherwise independent.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use foodscout_core::test_support::{MemoryBackend, StubSearchProvider, raw_place};
/// use foodscout_core::{FinderConfig, PaginationPolicy, SearchOrchestrator, SearchQuery, SearchSource};
///
/// let provider = StubSearchProvider::with_pages(vec![vec![
///     raw_place(25.0501, 121.5301, "Noodle Bar"),
/// ]]);
/// let config = FinderConfig::default()
///     .with_pagination(PaginationPolicy::default().with_page_delay(Duration::ZERO));
/// let finder = SearchOrchestrator::new(&config, MemoryBackend::new(), provider);
///
/// let first = finder.find(&SearchQuery::new(25.05, 121.53, 200.0))?;
/// assert_eq!(first.source, SearchSource::Remote);
///
/// let second = finder.find(&SearchQuery::new(25.05, 121.53, 150.0))?;
/// assert_eq!(second.source, SearchSource::Cache);
/// assert_eq!(second.records.len(), 1);
/// # Ok::<(), foodscout_core::SearchError>(())
/// ```
pub struct SearchOrchestrator<B: StoreBackend, P: NearbySearchProvider> {
    pool: SessionPool<B>,
    provider: P,
    weather: Option<Box<dyn WeatherSource>>,
    credentials: Credentials,
    search: SearchConfig,
    index: AreaDiscoveryIndex,
    choices: ChoiceStore,
    cancel: CancellationToken,
}

impl<B: StoreBackend, P: NearbySearchProvider> fmt::Debug for SearchOrchestrator<B, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchOrchestrator")
            .field("pool", &self.pool)
            .field("search", &self.search)
            .field("weather", &self.weather.is_some())
            .finish_non_exhaustive()
    }
}

impl<B: StoreBackend, P: NearbySearchProvider> SearchOrchestrator<B, P> {
    /// Build an orchestrator whose pool dials `backend` and whose misses are
    /// served by `provider`.
    pub fn new(config: &FinderConfig, backend: B, provider: P) -> Self {
        Self {
            pool: SessionPool::new(backend, config.store.max_sessions),
            provider,
            weather: None,
            credentials: config.store.credentials.clone(),
            search: config.search.clone(),
            index: AreaDiscoveryIndex::new(),
            choices: ChoiceStore::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Attach weather snapshots to records ingested on a cache miss.
    #[must_use]
    pub fn with_weather_source(mut self, source: impl WeatherSource + 'static) -> Self {
        self.weather = Some(Box::new(source));
        self
    }

    /// Use `cancel` to interrupt remote pagination.
    ///
    /// Once cancelled, every later cache miss fails with
    /// [`ProviderError::Cancelled`].
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub const fn pool(&self) -> &SessionPool<B> {
        &self.pool
    }

    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    #[must_use]
    pub const fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Search using the configured ranking mode.
    pub fn find(&self, query: &SearchQuery) -> Result<SearchOutcome, SearchError> {
        self.find_with_mode(query, self.search.ranking_mode)
    }

    /// Search with an explicit ranking mode.
    ///
    /// Validation and mode checks happen before a session is acquired, so a
    /// rejected query never touches the store or the provider. The ranking
    /// mode only affects cache misses; cached records are returned as stored.
    pub fn find_with_mode(
        &self,
        query: &SearchQuery,
        mode: RankingMode,
    ) -> Result<SearchOutcome, SearchError> {
        query.validate()?;
        if mode == RankingMode::HighestSelect {
            return Err(SearchError::NotImplemented { mode });
        }

        let mut session = self.pool.acquire(&self.credentials)?;
        let SearchQuery { lat, lng, size } = *query;

        if self.index.is_discovered(&mut session, lat, lng, size)? {
            let records = self
                .choices
                .find_by_location(&mut session, lat, lng, size)?;
            info!(
                "cache hit for ({lat}, {lng}, {size}): {} records",
                records.len()
            );
            return Ok(SearchOutcome {
                source: SearchSource::Cache,
                records,
            });
        }

        debug!("cache miss for ({lat}, {lng}, {size})");
        let request = NearbyRequest {
            lat,
            lng,
            radius: size,
            language: self.search.language.clone(),
        };
        let pages = fetch_all_pages(&self.provider, &request, &self.search.pagination, &self.cancel)?;
        let weather = self.weather_at(lat, lng);
        let records = choices_from_pages(&pages, Utc::now(), weather.as_ref())?;

        for (inserted, record) in records.iter().enumerate() {
            if let Err(err) = self.choices.insert(&mut session, record) {
                warn!(
                    "persisting choices for ({lat}, {lng}) failed after {inserted} of {} inserts: {err}",
                    records.len()
                );
                return Err(SearchError::QueryFailure(err));
            }
        }
        self.index
            .record_discovered(&mut session, lat, lng, size)
            .map_err(|err| {
                warn!("recording discovered area ({lat}, {lng}, {size}) failed: {err}");
                SearchError::QueryFailure(err)
            })?;

        info!(
            "ingested {} records for ({lat}, {lng}, {size})",
            records.len()
        );
        Ok(SearchOutcome {
            source: SearchSource::Remote,
            records,
        })
    }

    fn weather_at(&self, lat: f64, lng: f64) -> Option<WeatherSnapshot> {
        let source = self.weather.as_ref()?;
        match source.snapshot(lat, lng) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!("weather unavailable for ({lat}, {lng}): {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryBackend, StubSearchProvider, StubWeatherSource, raw_place};
    use crate::{PaginationPolicy, RawPlace};
    use rstest::{fixture, rstest};
    use std::time::Duration;

    #[fixture]
    fn config() -> FinderConfig {
        FinderConfig::default()
            .with_max_sessions(2)
            .with_pagination(PaginationPolicy::default().with_page_delay(Duration::ZERO))
    }

    fn three_results() -> Vec<RawPlace> {
        vec![
            raw_place(25.0501, 121.5301, "First"),
            raw_place(25.0502, 121.5302, "Second"),
            raw_place(25.0503, 121.5303, "Third"),
        ]
    }

    #[rstest]
    #[case("highest-rate", RankingMode::HighestRate)]
    #[case("HIGHEST_SELECT", RankingMode::HighestSelect)]
    fn ranking_modes_parse(#[case] input: &str, #[case] expected: RankingMode) {
        assert_eq!(input.parse::<RankingMode>(), Ok(expected));
    }

    #[rstest]
    fn unknown_ranking_mode_is_rejected() {
        assert!("cheapest".parse::<RankingMode>().is_err());
    }

    #[rstest]
    fn miss_fetches_persists_and_records(config: FinderConfig) {
        let backend = MemoryBackend::new();
        let provider = StubSearchProvider::with_pages(vec![three_results()]);
        let finder = SearchOrchestrator::new(&config, backend.clone(), provider);

        let outcome = finder
            .find(&SearchQuery::new(25.05, 121.53, 200.0))
            .expect("search");

        assert_eq!(outcome.source, SearchSource::Remote);
        let ranks: Vec<u32> = outcome.records.iter().map(|r| r.restaurant.rank).collect();
        assert_eq!(ranks, vec![0, 1, 2]);
        assert_eq!(backend.choices().len(), 3);
        assert_eq!(backend.discovered_areas().len(), 1);
        assert_eq!(finder.pool().active(), 0);
    }

    #[rstest]
    fn highest_select_is_rejected_before_any_work(config: FinderConfig) {
        let backend = MemoryBackend::new();
        let provider = StubSearchProvider::with_pages(vec![three_results()]);
        let finder = SearchOrchestrator::new(&config, backend.clone(), provider);

        let err = finder
            .find_with_mode(
                &SearchQuery::new(25.05, 121.53, 200.0),
                RankingMode::HighestSelect,
            )
            .expect_err("mode must be rejected");

        assert!(matches!(
            err,
            SearchError::NotImplemented {
                mode: RankingMode::HighestSelect
            }
        ));
        assert_eq!(backend.dial_count(), 0);
        assert_eq!(finder.provider().calls(), 0);
    }

    #[rstest]
    #[case(SearchQuery::new(95.0, 0.0, 100.0))]
    #[case(SearchQuery::new(0.0, 200.0, 100.0))]
    #[case(SearchQuery::new(0.0, 0.0, 0.0))]
    fn invalid_queries_are_rejected(config: FinderConfig, #[case] query: SearchQuery) {
        let backend = MemoryBackend::new();
        let finder = SearchOrchestrator::new(&config, backend.clone(), StubSearchProvider::endless());
        assert!(matches!(
            finder.find(&query),
            Err(SearchError::InvalidQuery(_))
        ));
        assert_eq!(backend.dial_count(), 0);
    }

    #[rstest]
    fn parse_failure_persists_nothing(config: FinderConfig) {
        let mut results = three_results();
        results.push(RawPlace::new());
        let backend = MemoryBackend::new();
        let finder = SearchOrchestrator::new(
            &config,
            backend.clone(),
            StubSearchProvider::with_pages(vec![results]),
        );

        let err = finder
            .find(&SearchQuery::new(25.05, 121.53, 200.0))
            .expect_err("parse must fail");

        assert!(matches!(err, SearchError::ParseFailure(ParseError::MissingLocation)));
        assert!(backend.choices().is_empty());
        assert!(backend.discovered_areas().is_empty());
        assert_eq!(backend.open_connections(), 0);
    }

    #[rstest]
    fn write_failure_is_a_query_failure(config: FinderConfig) {
        let backend = MemoryBackend::new().failing_writes();
        let finder = SearchOrchestrator::new(
            &config,
            backend.clone(),
            StubSearchProvider::with_pages(vec![three_results()]),
        );
        let err = finder
            .find(&SearchQuery::new(25.05, 121.53, 200.0))
            .expect_err("write must fail");
        assert!(matches!(err, SearchError::QueryFailure(_)));
        assert!(backend.discovered_areas().is_empty());
        assert_eq!(finder.pool().active(), 0);
    }

    #[rstest]
    fn weather_is_attached_to_fresh_records(config: FinderConfig) {
        let snapshot = WeatherSnapshot {
            summary: "light rain".into(),
            max_temp_c: 24,
            min_temp_c: 19,
            precipitation_chance: 70,
        };
        let finder = SearchOrchestrator::new(
            &config,
            MemoryBackend::new(),
            StubSearchProvider::with_pages(vec![three_results()]),
        )
        .with_weather_source(StubWeatherSource::with_snapshot(snapshot.clone()));

        let outcome = finder
            .find(&SearchQuery::new(25.05, 121.53, 200.0))
            .expect("search");
        assert!(
            outcome
                .records
                .iter()
                .all(|record| record.weather.as_ref() == Some(&snapshot))
        );
    }

    #[rstest]
    fn failing_weather_source_does_not_fail_the_search(config: FinderConfig) {
        let finder = SearchOrchestrator::new(
            &config,
            MemoryBackend::new(),
            StubSearchProvider::with_pages(vec![three_results()]),
        )
        .with_weather_source(StubWeatherSource::with_error(ProviderError::Timeout {
            url: "weather".into(),
            timeout_secs: 1,
        }));

        let outcome = finder
            .find(&SearchQuery::new(25.05, 121.53, 200.0))
            .expect("search");
        assert!(outcome.records.iter().all(|record| record.weather.is_none()));
    }

    #[rstest]
    fn store_errors_map_by_kind() {
        let dial = StoreError::Authentication {
            database: "db".into(),
            username: "user".into(),
        };
        assert!(matches!(
            SearchError::from(dial),
            SearchError::ConnectionFailure(_)
        ));
        let query = StoreError::query(
            crate::store::Collection::Choices,
            "insert into",
            "disk full",
        );
        assert!(matches!(
            SearchError::from(query),
            SearchError::QueryFailure(_)
        ));
    }
}
