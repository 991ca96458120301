//! Remote collaborators consulted on a cache miss.
//!
//! [`NearbySearchProvider`] fetches one page of raw results at a time; the
//! pagination loop in [`super::pagination`] drives it. Providers are
//! synchronous so the core stays embeddable in non-async callers. HTTP
//! implementations bridge to their own runtime internally.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::WeatherSnapshot;

/// One raw provider result: a loosely typed key/value record.
///
/// Expected keys are `Location` (formatted `"lat: <f>, lng: <f>"`), `name`,
/// `vicinity`, `place_id`, `rating` and `open_now`.
pub type RawPlace = Map<String, Value>;

/// Parameters for one nearby-search request.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyRequest {
    pub lat: f64,
    pub lng: f64,
    /// Search radius in meters.
    pub radius: f64,
    /// Response language, e.g. `"en"`.
    pub language: String,
}

/// A single page of provider results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPage {
    pub results: Vec<RawPlace>,
    /// Continuation token for the next page; `None` on the last page.
    pub next_page_token: Option<String>,
}

/// Errors from [`NearbySearchProvider::fetch_page`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The request never produced a response.
    #[error("network error requesting {url}: {message}")]
    Network { url: String, message: String },

    /// The request exceeded the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// The server answered with a non-success HTTP status.
    #[error("HTTP {status} from {url}: {message}")]
    HttpStatus {
        url: String,
        status: u16,
        message: String,
    },

    /// The service answered but reported a failure in its payload.
    #[error("search service returned {status}: {message}")]
    ServiceStatus { status: String, message: String },

    /// The response body could not be interpreted.
    #[error("malformed search response: {message}")]
    MalformedResponse { message: String },

    /// The fetch was cancelled while waiting for the next page.
    #[error("search cancelled")]
    Cancelled,
}

/// Fetches pages of nearby places.
pub trait NearbySearchProvider: Send + Sync {
    /// Fetch the first page when `page_token` is `None`, otherwise the page
    /// the token refers to.
    fn fetch_page(
        &self,
        request: &NearbyRequest,
        page_token: Option<&str>,
    ) -> Result<RawPage, ProviderError>;
}

impl<P: NearbySearchProvider + ?Sized> NearbySearchProvider for &P {
    fn fetch_page(
        &self,
        request: &NearbyRequest,
        page_token: Option<&str>,
    ) -> Result<RawPage, ProviderError> {
        (**self).fetch_page(request, page_token)
    }
}

impl<P: NearbySearchProvider + ?Sized> NearbySearchProvider for Box<P> {
    fn fetch_page(
        &self,
        request: &NearbyRequest,
        page_token: Option<&str>,
    ) -> Result<RawPage, ProviderError> {
        (**self).fetch_page(request, page_token)
    }
}

/// Supplies the weather attached to freshly ingested records.
///
/// Weather is best-effort decoration: a failing source never fails the search.
pub trait WeatherSource: Send + Sync {
    /// Weather at `(lat, lng)` right now.
    fn snapshot(&self, lat: f64, lng: f64) -> Result<WeatherSnapshot, ProviderError>;
}
