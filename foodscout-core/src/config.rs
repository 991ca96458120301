//! Construction-time configuration for the search pipeline.
//!
//! Everything a [`SearchOrchestrator`](crate::SearchOrchestrator) needs is
//! passed in a [`FinderConfig`]; there is no process-wide state.

use serde::{Deserialize, Serialize};

use crate::search::{PaginationPolicy, RankingMode};
use crate::store::Credentials;

/// Default ceiling on concurrently open store sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 10;

/// Default response language for remote searches.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Backing-store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of simultaneously open sessions.
    pub max_sessions: usize,
    /// Backend-specific location, e.g. a database path.
    pub location: String,
    /// Login presented when each session is opened.
    pub credentials: Credentials,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_sessions: DEFAULT_MAX_SESSIONS,
            location: String::new(),
            credentials: Credentials::default(),
        }
    }
}

/// Remote search settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub language: String,
    pub ranking_mode: RankingMode,
    pub pagination: PaginationPolicy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_owned(),
            ranking_mode: RankingMode::default(),
            pagination: PaginationPolicy::default(),
        }
    }
}

/// Complete configuration for a finder instance.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use foodscout_core::{Credentials, FinderConfig, PaginationPolicy};
///
/// let config = FinderConfig::default()
///     .with_max_sessions(4)
///     .with_credentials(Credentials::new("finder", "reader", "secret"))
///     .with_pagination(PaginationPolicy::default().with_page_delay(Duration::ZERO));
/// assert_eq!(config.store.max_sessions, 4);
/// assert_eq!(config.search.language, "en");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderConfig {
    pub store: StoreConfig,
    pub search: SearchConfig,
}

impl FinderConfig {
    #[must_use]
    pub const fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.store.max_sessions = max_sessions;
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.store.location = location.into();
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.store.credentials = credentials;
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.search.language = language.into();
        self
    }

    #[must_use]
    pub const fn with_ranking_mode(mut self, ranking_mode: RankingMode) -> Self {
        self.search.ranking_mode = ranking_mode;
        self
    }

    #[must_use]
    pub const fn with_pagination(mut self, pagination: PaginationPolicy) -> Self {
        self.search.pagination = pagination;
        self
    }
}
