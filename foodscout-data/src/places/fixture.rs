//! Replays recorded Nearby Search responses.

use std::sync::atomic::{AtomicUsize, Ordering};

use camino::Utf8Path;
use foodscout_core::{NearbyRequest, NearbySearchProvider, ProviderError, RawPage};
use log::debug;
use serde::Deserialize;
use thiserror::Error;

use super::response::NearbySearchResponse;

const TOKEN_PREFIX: &str = "fixture-page-";

/// Errors raised while loading a fixture file.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read places fixture {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("places fixture {path} is not a Nearby Search response or list of responses")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FixtureFile {
    Pages(Vec<NearbySearchResponse>),
    Single(NearbySearchResponse),
}

/// Offline [`NearbySearchProvider`] serving recorded response pages.
///
/// The same pages are returned whatever the request location. Recorded
/// continuation tokens are replaced with synthetic ones so the pages chain
/// in file order; a recorded failure status is returned as the service
/// error it describes.
#[derive(Debug)]
pub struct FixturePlacesProvider {
    pages: Vec<NearbySearchResponse>,
    fetches: AtomicUsize,
}

impl FixturePlacesProvider {
    /// Serve `pages` in order.
    #[must_use]
    pub fn from_responses(pages: Vec<NearbySearchResponse>) -> Self {
        Self {
            pages,
            fetches: AtomicUsize::new(0),
        }
    }

    /// Load a JSON file holding either one response or an array of them.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError`] when the file cannot be read or parsed.
    pub fn from_path(path: &Utf8Path) -> Result<Self, FixtureError> {
        let text = foodscout_fs::read_to_string(path).map_err(|source| FixtureError::Read {
            path: path.to_string(),
            source,
        })?;
        let file: FixtureFile =
            serde_json::from_str(&text).map_err(|source| FixtureError::Parse {
                path: path.to_string(),
                source,
            })?;
        let pages = match file {
            FixtureFile::Pages(pages) => pages,
            FixtureFile::Single(page) => vec![page],
        };
        debug!("loaded {} fixture page(s) from {path}", pages.len());
        Ok(Self::from_responses(pages))
    }

    /// Number of pages recorded in the fixture.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of `fetch_page` calls served so far.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn page_index(page_token: Option<&str>) -> Result<usize, ProviderError> {
        let Some(token) = page_token else {
            return Ok(0);
        };
        token
            .strip_prefix(TOKEN_PREFIX)
            .and_then(|index| index.parse().ok())
            .ok_or_else(|| ProviderError::MalformedResponse {
                message: format!("unknown page token {token:?}"),
            })
    }
}

impl NearbySearchProvider for FixturePlacesProvider {
    fn fetch_page(
        &self,
        _request: &NearbyRequest,
        page_token: Option<&str>,
    ) -> Result<RawPage, ProviderError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let index = Self::page_index(page_token)?;
        let Some(response) = self.pages.get(index) else {
            if index == 0 {
                return Ok(RawPage::default());
            }
            return Err(ProviderError::MalformedResponse {
                message: format!("fixture has no page {index}"),
            });
        };
        let mut page = response.clone().into_page()?;
        page.next_page_token =
            (index + 1 < self.pages.len()).then(|| format!("{TOKEN_PREFIX}{}", index + 1));
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn request() -> NearbyRequest {
        NearbyRequest {
            lat: 0.0,
            lng: 0.0,
            radius: 100.0,
            language: "en".to_owned(),
        }
    }

    fn write_fixture(dir: &TempDir, contents: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::from_path_buf(dir.path().join("places.json"))
            .expect("temp path is UTF-8");
        std::fs::write(&path, contents).expect("write fixture");
        path
    }

    fn place(name: &str) -> String {
        format!(
            r#"{{"geometry": {{"location": {{"lat": 1.0, "lng": 2.0}}}}, "name": "{name}"}}"#
        )
    }

    #[rstest]
    fn pages_chain_in_file_order(request: NearbyRequest) {
        let dir = TempDir::new().expect("temp dir");
        let path = write_fixture(
            &dir,
            &format!(
                r#"[{{"status": "OK", "results": [{}], "next_page_token": "recorded"}},
                    {{"status": "OK", "results": [{}]}}]"#,
                place("first"),
                place("second")
            ),
        );
        let provider = FixturePlacesProvider::from_path(&path).expect("load fixture");
        assert_eq!(provider.page_count(), 2);

        let first = provider.fetch_page(&request, None).expect("first page");
        assert_eq!(first.results[0]["name"], "first");
        let token = first.next_page_token.expect("continuation");

        let second = provider
            .fetch_page(&request, Some(&token))
            .expect("second page");
        assert_eq!(second.results[0]["name"], "second");
        assert!(second.next_page_token.is_none());
        assert_eq!(provider.fetch_count(), 2);
    }

    #[rstest]
    fn single_response_file_is_one_page(request: NearbyRequest) {
        let dir = TempDir::new().expect("temp dir");
        let path = write_fixture(
            &dir,
            &format!(r#"{{"status": "OK", "results": [{}]}}"#, place("only")),
        );
        let provider = FixturePlacesProvider::from_path(&path).expect("load fixture");
        let page = provider.fetch_page(&request, None).expect("page");
        assert_eq!(page.results.len(), 1);
        assert!(page.next_page_token.is_none());
    }

    #[rstest]
    fn recorded_failure_status_is_replayed(request: NearbyRequest) {
        let provider = FixturePlacesProvider::from_responses(vec![NearbySearchResponse {
            status: "REQUEST_DENIED".to_owned(),
            error_message: Some("The provided API key is invalid.".to_owned()),
            ..NearbySearchResponse::default()
        }]);
        let err = provider.fetch_page(&request, None).expect_err("denied");
        assert!(matches!(err, ProviderError::ServiceStatus { status, .. } if status == "REQUEST_DENIED"));
    }

    #[rstest]
    fn empty_fixture_yields_an_empty_page(request: NearbyRequest) {
        let provider = FixturePlacesProvider::from_responses(Vec::new());
        assert_eq!(
            provider.fetch_page(&request, None).expect("page"),
            RawPage::default()
        );
    }

    #[rstest]
    #[case("recorded-token")]
    #[case("fixture-page-7")]
    fn unknown_tokens_are_rejected(request: NearbyRequest, #[case] token: &str) {
        let provider = FixturePlacesProvider::from_responses(vec![NearbySearchResponse {
            status: "OK".to_owned(),
            ..NearbySearchResponse::default()
        }]);
        let err = provider
            .fetch_page(&request, Some(token))
            .expect_err("unknown token");
        assert!(matches!(err, ProviderError::MalformedResponse { .. }));
    }

    #[rstest]
    fn missing_file_is_a_read_error() {
        let err = FixturePlacesProvider::from_path(Utf8Path::new("/nonexistent/places.json"))
            .expect_err("missing file");
        assert!(matches!(err, FixtureError::Read { .. }));
    }

    #[rstest]
    fn malformed_file_is_a_parse_error() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_fixture(&dir, r#"{"results": "nope"}"#);
        let err = FixturePlacesProvider::from_path(&path).expect_err("bad JSON shape");
        assert!(matches!(err, FixtureError::Parse { .. }));
    }
}
