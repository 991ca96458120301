//! Facade crate for the foodscout restaurant finder.
//!
//! Re-exports the search pipeline from `foodscout-core` and, behind feature
//! flags, the SQLite store and Nearby Search providers from
//! `foodscout-data`.

#![forbid(unsafe_code)]

pub use foodscout_core::{
    AreaDiscoveryIndex, ChoiceRecord, ChoiceStore, Credentials, DiscoveredArea, FinderConfig,
    GeoBounds, NearbySearchProvider, PaginationPolicy, PoolError, ProviderError, RankingMode,
    Restaurant, SearchConfig, SearchError, SearchOrchestrator, SearchOutcome, SearchQuery,
    SearchSource, Session, SessionPool, StoreBackend, StoreConfig, StoreConnection, StoreError,
    WeatherSnapshot, WeatherSource,
};

#[cfg(any(feature = "store-sqlite", feature = "places-http"))]
pub use foodscout_data::places::{FixtureError, FixturePlacesProvider};

#[cfg(feature = "places-http")]
pub use foodscout_data::places::{HttpPlacesProvider, HttpPlacesProviderConfig, ProviderBuildError};

#[cfg(feature = "store-sqlite")]
pub use foodscout_data::sqlite::{SqliteBackend, SqliteConnection};
