//! Nearby-search providers backed by the Google Places Nearby Search API.
//!
//! [`HttpPlacesProvider`] talks to the live service; [`FixturePlacesProvider`]
//! replays recorded responses from disk. Both flatten each result into the
//! loosely typed [`RawPlace`](foodscout_core::RawPlace) the core expects, so
//! swapping one for the other never changes what gets persisted.

mod fixture;
#[cfg(feature = "places-http")]
mod http;
mod response;

pub use fixture::{FixtureError, FixturePlacesProvider};
#[cfg(feature = "places-http")]
pub use http::{
    DEFAULT_BASE_URL, DEFAULT_PLACE_TYPE, DEFAULT_USER_AGENT, HttpPlacesProvider,
    HttpPlacesProviderConfig, ProviderBuildError,
};
pub use response::{Geometry, LatLng, NearbySearchResponse, OpeningHours, PlaceResult};
