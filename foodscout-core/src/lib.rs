//! Core domain types and the geo-discovery cache for restaurant search.
//!
//! A search for restaurants around a point is answered from the local store
//! when the region has already been searched remotely, and from a remote
//! nearby-search provider otherwise. Regions searched remotely are recorded as
//! [`DiscoveredArea`]s; results are persisted as [`ChoiceRecord`]s. All store
//! access runs through a bounded [`SessionPool`].
//!
//! Production backends and providers live in `foodscout-data`; this crate
//! only defines the seams ([`StoreBackend`], [`NearbySearchProvider`],
//! [`WeatherSource`]) and ships in-memory doubles in [`test_support`].

mod area;
mod choice;
pub mod config;
mod geometry;
pub mod search;
pub mod store;

#[doc(hidden)]
pub mod test_support;

pub use area::DiscoveredArea;
pub use choice::{ChoiceRecord, Restaurant, WeatherSnapshot};
pub use config::{FinderConfig, SearchConfig, StoreConfig};
pub use geometry::{GeoBounds, RegionError, validate_region};
pub use search::{
    CancellationToken, NearbyRequest, NearbySearchProvider, PaginationPolicy, ParseError,
    ProviderError, RankingMode, RawPage, RawPlace, SearchError, SearchOrchestrator, SearchOutcome,
    SearchQuery, SearchSource, WeatherSource,
};
pub use store::{
    AreaDiscoveryIndex, BoxError, ChoiceStore, Collection, Credentials, Document, PoolError,
    Session, SessionId, SessionPool, StoreBackend, StoreConnection, StoreError,
};
