use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::cancel::CancellationToken;
use super::provider::{NearbyRequest, NearbySearchProvider, ProviderError, RawPage};

/// Default number of pages fetched per search.
pub const DEFAULT_MAX_PAGES: usize = 3;

/// Default wait between consecutive page requests.
///
/// Continuation tokens from nearby-search services only become valid a short
/// while after they are issued.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_secs(3);

/// Bounds applied when following continuation tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationPolicy {
    /// Maximum pages fetched per search. Zero is treated as one.
    pub max_pages: usize,
    /// Wait before each follow-up request.
    pub page_delay: Duration,
}

impl Default for PaginationPolicy {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            page_delay: DEFAULT_PAGE_DELAY,
        }
    }
}

impl PaginationPolicy {
    #[must_use]
    pub const fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    #[must_use]
    pub const fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }
}

/// Fetch the first page and follow continuation tokens within `policy`.
///
/// Stops when a page carries no token or `policy.max_pages` pages have been
/// collected; hitting the bound with a token still pending is logged and the
/// pages gathered so far are returned. Any page error aborts the whole fetch,
/// discarding earlier pages. A cancelled `token` aborts with
/// [`ProviderError::Cancelled`].
pub fn fetch_all_pages<P>(
    provider: &P,
    request: &NearbyRequest,
    policy: &PaginationPolicy,
    cancel: &CancellationToken,
) -> Result<Vec<RawPage>, ProviderError>
where
    P: NearbySearchProvider + ?Sized,
{
    if cancel.is_cancelled() {
        return Err(ProviderError::Cancelled);
    }
    let max_pages = policy.max_pages.max(1);
    info!(
        "fetching nearby places around ({}, {}) within {} m",
        request.lat, request.lng, request.radius
    );

    let first = provider.fetch_page(request, None)?;
    let mut next_token = first.next_page_token.clone();
    let mut pages = vec![first];

    while let Some(token) = next_token.take() {
        if pages.len() >= max_pages {
            warn!(
                "stopping after {max_pages} pages around ({}, {}); further results dropped",
                request.lat, request.lng
            );
            break;
        }
        if cancel.wait_timeout(policy.page_delay) {
            debug!("page fetch cancelled after {} pages", pages.len());
            return Err(ProviderError::Cancelled);
        }
        let page = provider.fetch_page(request, Some(&token))?;
        next_token = page.next_page_token.clone();
        pages.push(page);
    }

    debug!(
        "fetched {} pages with {} results",
        pages.len(),
        pages.iter().map(|page| page.results.len()).sum::<usize>()
    );
    Ok(pages)
}
