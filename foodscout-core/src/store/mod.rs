//! Backing-store abstraction and the two record stores built on it.
//!
//! The backing store is document oriented: each logical [`Collection`] holds
//! JSON bodies indexed by two numeric fields, latitude and longitude. A
//! [`StoreBackend`] dials new [`StoreConnection`]s; the [`SessionPool`] is the
//! only component that calls it, so every read and write runs inside a
//! [`Session`].
//!
//! # Examples
//!
//! ```rust
//! use foodscout_core::test_support::MemoryBackend;
//! use foodscout_core::{AreaDiscoveryIndex, Credentials, SessionPool};
//!
//! let backend = MemoryBackend::new();
//! let pool = SessionPool::new(backend.clone(), 2);
//! let mut session = pool.acquire(&Credentials::new("finder", "user", "secret"))?;
//!
//! let index = AreaDiscoveryIndex::new();
//! index.record_discovered(&mut session, 25.05, 121.53, 200.0)?;
//! assert!(index.is_discovered(&mut session, 25.05, 121.53, 150.0)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::GeoBounds;

mod choices;
mod discovery;
mod error;
mod pool;

pub use choices::ChoiceStore;
pub use discovery::AreaDiscoveryIndex;
pub use error::{BoxError, StoreError};
pub use pool::{PoolError, Session, SessionId, SessionPool};

/// Logical collections held by the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// [`DiscoveredArea`](crate::DiscoveredArea) records.
    DiscoveredAreas,
    /// [`ChoiceRecord`](crate::ChoiceRecord) records.
    Choices,
}

impl Collection {
    /// Every collection, in schema order.
    pub const ALL: [Self; 2] = [Self::DiscoveredAreas, Self::Choices];

    /// Stable collection name used by persistent backends.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DiscoveredAreas => "restaurant_discover",
            Self::Choices => "restaurant_choice",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stored document: a JSON body plus its two indexed coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub lat: f64,
    pub lng: f64,
    pub body: Value,
}

impl Document {
    /// Serialise `value` into a document indexed at `(lat, lng)`.
    pub fn encode<T: Serialize>(lat: f64, lng: f64, value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            lat,
            lng,
            body: serde_json::to_value(value)?,
        })
    }

    /// Deserialise the body into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.body)
    }
}

/// Login details presented when a session is opened.
///
/// The password is never serialised or printed.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Database (or authentication source) name.
    pub database: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl Credentials {
    pub fn new(
        database: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One open connection to the backing store.
///
/// Range queries are inclusive on both axes.
pub trait StoreConnection: Send {
    /// Authenticate the connection. Called once, straight after dialling.
    fn authenticate(&mut self, credentials: &Credentials) -> Result<(), StoreError>;

    /// Append a document to `collection`.
    fn insert_one(&mut self, collection: Collection, document: Document)
    -> Result<(), StoreError>;

    /// Return every document in `collection` whose coordinates fall in `bounds`.
    fn find_in_range(
        &mut self,
        collection: Collection,
        bounds: &GeoBounds,
    ) -> Result<Vec<Document>, StoreError>;

    /// Close the underlying connection. Failures are logged, not returned.
    ///
    /// The pool calls this exactly once per connection, either when the
    /// owning session is released or when authentication fails.
    fn close(&mut self);
}

/// Dials new connections to a backing store.
///
/// Implementations must be cheap to share between threads; each call to
/// [`StoreBackend::dial`] opens a fresh physical connection.
pub trait StoreBackend: Send + Sync {
    /// Connection type produced by [`StoreBackend::dial`].
    type Connection: StoreConnection;

    /// Open a new, unauthenticated connection.
    fn dial(&self) -> Result<Self::Connection, StoreError>;
}
