//! Remote search: providers, pagination, result transformation and the
//! orchestrator that decides between the cache and the provider.

mod cancel;
mod orchestrator;
mod pagination;
mod provider;
mod transform;

pub use cancel::CancellationToken;
pub use orchestrator::{
    RankingMode, SearchError, SearchOrchestrator, SearchOutcome, SearchQuery, SearchSource,
    UnknownRankingMode,
};
pub use pagination::{DEFAULT_MAX_PAGES, DEFAULT_PAGE_DELAY, PaginationPolicy, fetch_all_pages};
pub use provider::{
    NearbyRequest, NearbySearchProvider, ProviderError, RawPage, RawPlace, WeatherSource,
};
pub use transform::{ParseError, choice_from_raw, choices_from_pages, parse_location};
