//! In-memory doubles for the backing store, the search provider and the
//! weather source, shared by unit, integration and doc tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{TimeZone, Utc};
use serde_json::Value;

use crate::search::{
    NearbyRequest, NearbySearchProvider, ProviderError, RawPage, RawPlace, WeatherSource,
};
use crate::store::{Collection, Credentials, Document, StoreBackend, StoreConnection, StoreError};
use crate::{ChoiceRecord, DiscoveredArea, GeoBounds, Restaurant, WeatherSnapshot};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct MemoryState {
    documents: HashMap<Collection, Vec<Document>>,
    dial_count: usize,
    open_connections: usize,
    accepted: Option<(String, String)>,
    fail_dial: bool,
    fail_writes: bool,
}

/// Document store held in memory.
///
/// Clones share the same documents and counters, so a test can keep one
/// handle for assertions while the pool owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    /// An empty store that accepts any credentials.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept logins with this user name and password.
    #[must_use]
    pub fn requiring_credentials(self, username: &str, password: &str) -> Self {
        lock(&self.state).accepted = Some((username.to_owned(), password.to_owned()));
        self
    }

    /// Fail every dial.
    #[must_use]
    pub fn failing_dial(self) -> Self {
        lock(&self.state).fail_dial = true;
        self
    }

    /// Fail every insert.
    #[must_use]
    pub fn failing_writes(self) -> Self {
        lock(&self.state).fail_writes = true;
        self
    }

    /// Store `document` directly, bypassing sessions.
    pub fn seed(&self, collection: Collection, document: Document) {
        lock(&self.state)
            .documents
            .entry(collection)
            .or_default()
            .push(document);
    }

    /// Every document in `collection`, in insertion order.
    #[must_use]
    pub fn documents(&self, collection: Collection) -> Vec<Document> {
        lock(&self.state)
            .documents
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Stored discovered areas that decode cleanly.
    #[must_use]
    pub fn discovered_areas(&self) -> Vec<DiscoveredArea> {
        self.decoded(Collection::DiscoveredAreas)
    }

    /// Stored choice records that decode cleanly.
    #[must_use]
    pub fn choices(&self) -> Vec<ChoiceRecord> {
        self.decoded(Collection::Choices)
    }

    /// Number of connections dialled so far.
    #[must_use]
    pub fn dial_count(&self) -> usize {
        lock(&self.state).dial_count
    }

    /// Number of dialled connections not yet closed.
    #[must_use]
    pub fn open_connections(&self) -> usize {
        lock(&self.state).open_connections
    }

    fn decoded<T: serde::de::DeserializeOwned>(&self, collection: Collection) -> Vec<T> {
        self.documents(collection)
            .iter()
            .filter_map(|document| document.decode().ok())
            .collect()
    }
}

impl StoreBackend for MemoryBackend {
    type Connection = MemoryConnection;

    fn dial(&self) -> Result<Self::Connection, StoreError> {
        let mut state = lock(&self.state);
        if state.fail_dial {
            return Err(StoreError::Dial {
                location: "memory".to_owned(),
                source: "dialling disabled".into(),
            });
        }
        state.dial_count += 1;
        state.open_connections += 1;
        Ok(MemoryConnection {
            state: Arc::clone(&self.state),
            open: true,
        })
    }
}

/// Connection produced by [`MemoryBackend`].
#[derive(Debug)]
pub struct MemoryConnection {
    state: Arc<Mutex<MemoryState>>,
    open: bool,
}

impl StoreConnection for MemoryConnection {
    fn authenticate(&mut self, credentials: &Credentials) -> Result<(), StoreError> {
        let state = lock(&self.state);
        match &state.accepted {
            Some((username, password))
                if *username != credentials.username || *password != credentials.password =>
            {
                Err(StoreError::Authentication {
                    database: credentials.database.clone(),
                    username: credentials.username.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    fn insert_one(&mut self, collection: Collection, document: Document) -> Result<(), StoreError> {
        let mut state = lock(&self.state);
        if state.fail_writes {
            return Err(StoreError::query(collection, "insert into", "writes disabled"));
        }
        state.documents.entry(collection).or_default().push(document);
        Ok(())
    }

    fn find_in_range(
        &mut self,
        collection: Collection,
        bounds: &GeoBounds,
    ) -> Result<Vec<Document>, StoreError> {
        Ok(lock(&self.state)
            .documents
            .get(&collection)
            .into_iter()
            .flatten()
            .filter(|document| bounds.contains_point(document.lat, document.lng))
            .cloned()
            .collect())
    }

    fn close(&mut self) {
        if std::mem::take(&mut self.open) {
            let mut state = lock(&self.state);
            state.open_connections = state.open_connections.saturating_sub(1);
        }
    }
}

/// A raw result for a restaurant called `name` at `(lat, lng)`.
#[must_use]
pub fn raw_place(lat: f64, lng: f64, name: &str) -> RawPlace {
    let mut place = RawPlace::new();
    place.insert(
        "Location".to_owned(),
        Value::String(format!("lat: {lat}, lng: {lng}")),
    );
    place.insert("name".to_owned(), Value::String(name.to_owned()));
    place.insert(
        "place_id".to_owned(),
        Value::String(name.to_lowercase().replace(' ', "-")),
    );
    place.insert("vicinity".to_owned(), Value::String(format!("near {name}")));
    place.insert("rating".to_owned(), Value::from(4.0));
    place.insert("open_now".to_owned(), Value::Bool(true));
    place
}

/// A stored record for `name` at `(lat, lng)` with a fixed timestamp.
#[must_use]
pub fn choice_record(lat: f64, lng: f64, name: &str) -> ChoiceRecord {
    ChoiceRecord {
        lat,
        lng,
        time: Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .single()
            .unwrap_or_default(),
        restaurant: Restaurant {
            name: name.to_owned(),
            ..Restaurant::default()
        },
        weather: None,
    }
}

#[derive(Debug, Clone)]
enum Script {
    Pages(Vec<Vec<RawPlace>>),
    Endless,
    Error(ProviderError),
}

/// Scripted [`NearbySearchProvider`].
///
/// Scripted pages are linked by tokens `page-1`, `page-2`, and so on; the
/// last page carries no token. Every call is recorded.
#[derive(Debug)]
pub struct StubSearchProvider {
    script: Script,
    calls: Mutex<Vec<(NearbyRequest, Option<String>)>>,
}

impl StubSearchProvider {
    /// Serve `pages` in order. An empty script serves one empty page.
    #[must_use]
    pub fn with_pages(pages: Vec<Vec<RawPlace>>) -> Self {
        Self::scripted(Script::Pages(pages))
    }

    /// Fail every request with `error`.
    #[must_use]
    pub fn with_error(error: ProviderError) -> Self {
        Self::scripted(Script::Error(error))
    }

    /// Always return one result and a continuation token.
    #[must_use]
    pub fn endless() -> Self {
        Self::scripted(Script::Endless)
    }

    fn scripted(script: Script) -> Self {
        Self {
            script,
            calls: Mutex::default(),
        }
    }

    /// Number of pages requested.
    #[must_use]
    pub fn calls(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Tokens passed with each request, in call order.
    #[must_use]
    pub fn page_tokens(&self) -> Vec<Option<String>> {
        lock(&self.calls).iter().map(|(_, token)| token.clone()).collect()
    }

    /// Requests received, in call order.
    #[must_use]
    pub fn requests(&self) -> Vec<NearbyRequest> {
        lock(&self.calls).iter().map(|(request, _)| request.clone()).collect()
    }
}

fn page_index(token: Option<&str>) -> Option<usize> {
    match token {
        None => Some(0),
        Some(token) => token.strip_prefix("page-")?.parse().ok(),
    }
}

impl NearbySearchProvider for StubSearchProvider {
    fn fetch_page(
        &self,
        request: &NearbyRequest,
        page_token: Option<&str>,
    ) -> Result<RawPage, ProviderError> {
        lock(&self.calls).push((request.clone(), page_token.map(str::to_owned)));
        let index = page_index(page_token).ok_or_else(|| ProviderError::MalformedResponse {
            message: format!("unknown page token {page_token:?}"),
        })?;

        match &self.script {
            Script::Error(error) => Err(error.clone()),
            Script::Endless => Ok(RawPage {
                results: vec![raw_place(
                    request.lat,
                    request.lng,
                    &format!("Endless {index}"),
                )],
                next_page_token: Some(format!("page-{}", index + 1)),
            }),
            Script::Pages(pages) if pages.is_empty() && index == 0 => Ok(RawPage::default()),
            Script::Pages(pages) => {
                let results = pages
                    .get(index)
                    .cloned()
                    .ok_or_else(|| ProviderError::MalformedResponse {
                        message: format!("no page {index}"),
                    })?;
                let next_page_token =
                    (index + 1 < pages.len()).then(|| format!("page-{}", index + 1));
                Ok(RawPage {
                    results,
                    next_page_token,
                })
            }
        }
    }
}

/// [`WeatherSource`] returning a fixed answer.
#[derive(Debug, Clone)]
pub struct StubWeatherSource {
    response: Result<WeatherSnapshot, ProviderError>,
}

impl StubWeatherSource {
    #[must_use]
    pub const fn with_snapshot(snapshot: WeatherSnapshot) -> Self {
        Self {
            response: Ok(snapshot),
        }
    }

    #[must_use]
    pub const fn with_error(error: ProviderError) -> Self {
        Self {
            response: Err(error),
        }
    }
}

impl WeatherSource for StubWeatherSource {
    fn snapshot(&self, _lat: f64, _lng: f64) -> Result<WeatherSnapshot, ProviderError> {
        self.response.clone()
    }
}
