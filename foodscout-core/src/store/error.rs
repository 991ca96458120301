use thiserror::Error;

use super::Collection;

/// Boxed source error raised by a backend driver.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by backing-store connections and the record stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Opening a physical connection failed.
    #[error("failed to connect to backing store at {location}")]
    Dial {
        /// Address, path or connection string that was dialled.
        location: String,
        /// Driver error.
        #[source]
        source: BoxError,
    },
    /// The store refused the supplied credentials.
    #[error("authentication failed for user {username:?} on {database:?}")]
    Authentication {
        /// Database the login was attempted against.
        database: String,
        /// Rejected user name.
        username: String,
    },
    /// A read or write against a collection failed.
    #[error("failed to {operation} {collection}")]
    Query {
        /// Collection the operation targeted.
        collection: Collection,
        /// Short description of the operation, e.g. `"insert into"`.
        operation: &'static str,
        /// Driver error.
        #[source]
        source: BoxError,
    },
    /// A record could not be serialised into a document.
    #[error("failed to encode document for {collection}")]
    Encode {
        /// Target collection.
        collection: Collection,
        /// Serialisation failure.
        #[source]
        source: serde_json::Error,
    },
    /// A stored document did not match the expected record shape.
    #[error("malformed document in {collection}")]
    Decode {
        /// Collection the document was read from.
        collection: Collection,
        /// Deserialisation failure.
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Whether the error happened while opening or authenticating a connection.
    #[must_use]
    pub const fn is_connection_failure(&self) -> bool {
        matches!(self, Self::Dial { .. } | Self::Authentication { .. })
    }

    /// Build a [`StoreError::Query`] from any driver error.
    pub fn query(
        collection: Collection,
        operation: &'static str,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Query {
            collection,
            operation,
            source: source.into(),
        }
    }
}
