//! Live Nearby Search client.
//!
//! [`NearbySearchProvider`] is synchronous so the core stays embeddable in
//! non-async callers. [`HttpPlacesProvider`] bridges to `reqwest` by blocking
//! on a Tokio runtime it owns, or on the caller's multi-threaded runtime when
//! there is one.
//!
//! # Example
//!
//! ```no_run
//! use foodscout_core::{NearbyRequest, NearbySearchProvider};
//! use foodscout_data::places::HttpPlacesProvider;
//!
//! let provider = HttpPlacesProvider::new("my-api-key")?;
//! let request = NearbyRequest {
//!     lat: 25.0478,
//!     lng: 121.5318,
//!     radius: 200.0,
//!     language: "en".to_owned(),
//! };
//! let page = provider.fetch_page(&request, None)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::time::Duration;

use foodscout_core::{NearbyRequest, NearbySearchProvider, ProviderError, RawPage};
use log::debug;
use reqwest::Client;
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use url::Url;

use super::response::NearbySearchResponse;

/// Nearby Search endpoint.
pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place/nearbysearch/json";

/// Place type requested from the service.
pub const DEFAULT_PLACE_TYPE: &str = "restaurant";

/// User agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "foodscout/0.1";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors raised while constructing an [`HttpPlacesProvider`].
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("invalid Nearby Search base URL {url:?}: {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("a Places API key is required")]
    MissingApiKey,
}

/// Configuration for [`HttpPlacesProvider`].
#[derive(Clone)]
pub struct HttpPlacesProviderConfig {
    /// Places API key. Sent as the `key` query parameter and never logged.
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
    /// Value of the `type` filter, `"restaurant"` by default.
    pub place_type: String,
}

impl std::fmt::Debug for HttpPlacesProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPlacesProviderConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("place_type", &self.place_type)
            .finish()
    }
}

impl HttpPlacesProviderConfig {
    /// Defaults for the public endpoint with the given key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            place_type: DEFAULT_PLACE_TYPE.to_owned(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn with_place_type(mut self, place_type: impl Into<String>) -> Self {
        self.place_type = place_type.into();
        self
    }
}

/// Nearby Search client implementing [`NearbySearchProvider`].
///
/// # Runtime behaviour
///
/// Outside any Tokio runtime the provider blocks on its own current-thread
/// runtime. Inside a multi-threaded runtime it blocks on the caller's handle
/// through [`tokio::task::block_in_place`]. Inside a current-thread runtime
/// it falls back to its own runtime, which stalls the caller's runtime for
/// the duration of the request.
pub struct HttpPlacesProvider {
    client: Client,
    config: HttpPlacesProviderConfig,
    base_url: Url,
    runtime: Runtime,
}

impl std::fmt::Debug for HttpPlacesProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPlacesProvider")
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish_non_exhaustive()
    }
}

impl HttpPlacesProvider {
    /// Provider for the public endpoint using `api_key`.
    ///
    /// # Errors
    ///
    /// Fails when the key is blank or the HTTP client or runtime cannot be
    /// built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(HttpPlacesProviderConfig::new(api_key))
    }

    /// Provider with explicit configuration.
    ///
    /// # Errors
    ///
    /// Fails when the key is blank, the base URL does not parse, or the HTTP
    /// client or runtime cannot be built.
    pub fn with_config(config: HttpPlacesProviderConfig) -> Result<Self, ProviderBuildError> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderBuildError::MissingApiKey);
        }
        let base_url =
            Url::parse(&config.base_url).map_err(|source| ProviderBuildError::BaseUrl {
                url: config.base_url.clone(),
                source,
            })?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ProviderBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ProviderBuildError::Runtime)?;
        Ok(Self {
            client,
            config,
            base_url,
            runtime,
        })
    }

    /// Request URL for one page.
    ///
    /// Follow-up pages carry only the continuation token; the service
    /// rejects them when the original search parameters are repeated.
    fn page_url(&self, request: &NearbyRequest, page_token: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            match page_token {
                Some(token) => {
                    query.append_pair("pagetoken", token);
                }
                None => {
                    query
                        .append_pair("location", &format!("{},{}", request.lat, request.lng))
                        .append_pair("radius", &request.radius.to_string())
                        .append_pair("type", &self.config.place_type)
                        .append_pair("language", &request.language);
                }
            }
            query.append_pair("key", &self.config.api_key);
        }
        url
    }

    async fn fetch_page_async(
        &self,
        request: &NearbyRequest,
        page_token: Option<&str>,
    ) -> Result<RawPage, ProviderError> {
        let url = self.page_url(request, page_token);
        debug!(
            "requesting Nearby Search page (continuation: {})",
            page_token.is_some()
        );

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err))?;

        let body: NearbySearchResponse =
            response
                .json()
                .await
                .map_err(|err| ProviderError::MalformedResponse {
                    message: err.without_url().to_string(),
                })?;
        body.into_page()
    }

    /// Map a transport failure, reporting the base URL so the key never
    /// reaches an error message.
    fn convert_reqwest_error(&self, error: &reqwest::Error) -> ProviderError {
        let url = self.config.base_url.clone();
        if error.is_timeout() {
            return ProviderError::Timeout {
                url,
                timeout_secs: self.config.timeout.as_secs(),
            };
        }
        let message = redacted_message(error);
        if let Some(status) = error.status() {
            return ProviderError::HttpStatus {
                url,
                status: status.as_u16(),
                message,
            };
        }
        ProviderError::Network { url, message }
    }
}

fn redacted_message(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    if let Some(url) = error.url() {
        message = message.replace(url.as_str(), "<request URL>");
    }
    message
}

impl NearbySearchProvider for HttpPlacesProvider {
    fn fetch_page(
        &self,
        request: &NearbyRequest,
        page_token: Option<&str>,
    ) -> Result<RawPage, ProviderError> {
        let future = self.fetch_page_async(request, page_token);
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            _ => self.runtime.block_on(future),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn request() -> NearbyRequest {
        NearbyRequest {
            lat: 25.0478,
            lng: 121.5318,
            radius: 200.0,
            language: "zh-TW".to_owned(),
        }
    }

    fn query(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    #[rstest]
    fn first_page_carries_search_parameters(request: NearbyRequest) {
        let provider = HttpPlacesProvider::new("test-key").expect("provider should build");
        let url = provider.page_url(&request, None);

        assert!(url.as_str().starts_with(DEFAULT_BASE_URL));
        assert_eq!(
            query(&url),
            vec![
                ("location".to_owned(), "25.0478,121.5318".to_owned()),
                ("radius".to_owned(), "200".to_owned()),
                ("type".to_owned(), "restaurant".to_owned()),
                ("language".to_owned(), "zh-TW".to_owned()),
                ("key".to_owned(), "test-key".to_owned()),
            ]
        );
    }

    #[rstest]
    fn follow_up_page_sends_only_the_token(request: NearbyRequest) {
        let provider = HttpPlacesProvider::new("test-key").expect("provider should build");
        let url = provider.page_url(&request, Some("next token"));

        assert_eq!(
            query(&url),
            vec![
                ("pagetoken".to_owned(), "next token".to_owned()),
                ("key".to_owned(), "test-key".to_owned()),
            ]
        );
    }

    #[rstest]
    fn custom_place_type_is_sent(request: NearbyRequest) {
        let config = HttpPlacesProviderConfig::new("k")
            .with_base_url("http://localhost:8080/nearby")
            .with_place_type("cafe");
        let provider = HttpPlacesProvider::with_config(config).expect("provider should build");
        let url = provider.page_url(&request, None);

        assert_eq!(url.host_str(), Some("localhost"));
        assert!(query(&url).contains(&("type".to_owned(), "cafe".to_owned())));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_api_key_is_rejected(#[case] key: &str) {
        let err = HttpPlacesProvider::new(key).expect_err("blank key");
        assert!(matches!(err, ProviderBuildError::MissingApiKey));
    }

    #[rstest]
    fn unparsable_base_url_is_rejected() {
        let config = HttpPlacesProviderConfig::new("k").with_base_url("not a url");
        let err = HttpPlacesProvider::with_config(config).expect_err("bad URL");
        assert!(matches!(err, ProviderBuildError::BaseUrl { .. }));
    }

    #[rstest]
    fn debug_output_hides_the_key() {
        let provider = HttpPlacesProvider::new("super-secret").expect("provider should build");
        assert!(!format!("{provider:?}").contains("super-secret"));
    }

    #[rstest]
    fn unreachable_service_is_a_network_error(request: NearbyRequest) {
        let config = HttpPlacesProviderConfig::new("super-secret")
            .with_base_url("http://127.0.0.1:9/nearby")
            .with_timeout(Duration::from_secs(2));
        let provider = HttpPlacesProvider::with_config(config).expect("provider should build");

        let err = provider
            .fetch_page(&request, None)
            .expect_err("nothing listens on the discard port");
        assert!(matches!(
            err,
            ProviderError::Network { .. } | ProviderError::Timeout { .. }
        ));
        assert!(!err.to_string().contains("super-secret"));
    }
}
