//! SQLite document store for the discovery cache.
//!
//! Each [`Collection`] maps to a table of the same name holding the two
//! indexed coordinates and the JSON body:
//!
//! ```sql
//! CREATE TABLE restaurant_choice (
//!     id   INTEGER PRIMARY KEY AUTOINCREMENT,
//!     lat  REAL NOT NULL,
//!     lng  REAL NOT NULL,
//!     body TEXT NOT NULL
//! );
//! ```
//!
//! Every [`SqliteBackend::dial`] opens a fresh connection to the database
//! file and creates missing tables, so the file may start out absent.

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use foodscout_core::{
    Collection, Credentials, Document, GeoBounds, StoreBackend, StoreConnection, StoreError,
};
use log::{debug, warn};
use rusqlite::{Connection, params};

/// How long a connection waits on a lock held by another connection.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Dials connections to one SQLite database file.
///
/// # Examples
///
/// ```no_run
/// use foodscout_core::{Credentials, SessionPool};
/// use foodscout_data::sqlite::SqliteBackend;
///
/// let backend = SqliteBackend::new("var/foodscout.sqlite")
///     .with_accepted_credentials("finder", "secret");
/// let pool = SessionPool::new(backend, 4);
/// let session = pool.acquire(&Credentials::new("foodscout", "finder", "secret"))?;
/// # drop(session);
/// # Ok::<(), foodscout_core::PoolError>(())
/// ```
#[derive(Clone)]
pub struct SqliteBackend {
    path: Utf8PathBuf,
    accepted: Option<(String, String)>,
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("path", &self.path)
            .field(
                "accepted_user",
                &self.accepted.as_ref().map(|(username, _)| username),
            )
            .finish()
    }
}

impl SqliteBackend {
    /// A backend for the database at `path` that accepts any login.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            accepted: None,
        }
    }

    /// Only authenticate sessions presenting this user name and password.
    ///
    /// SQLite has no user model of its own; the check is enforced here.
    #[must_use]
    pub fn with_accepted_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.accepted = Some((username.into(), password.into()));
        self
    }

    /// Database file location.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn dial_error(&self, source: impl Into<foodscout_core::BoxError>) -> StoreError {
        StoreError::Dial {
            location: self.path.to_string(),
            source: source.into(),
        }
    }
}

impl StoreBackend for SqliteBackend {
    type Connection = SqliteConnection;

    fn dial(&self) -> Result<Self::Connection, StoreError> {
        foodscout_fs::ensure_parent_dir(&self.path).map_err(|err| self.dial_error(err))?;
        let connection =
            Connection::open(self.path.as_std_path()).map_err(|err| self.dial_error(err))?;
        connection
            .busy_timeout(BUSY_TIMEOUT)
            .map_err(|err| self.dial_error(err))?;
        create_schema(&connection).map_err(|err| self.dial_error(err))?;
        debug!("opened SQLite connection to {}", self.path);
        Ok(SqliteConnection {
            connection: Some(connection),
            location: self.path.clone(),
            accepted: self.accepted.clone(),
        })
    }
}

fn create_schema(connection: &Connection) -> rusqlite::Result<()> {
    for collection in Collection::ALL {
        let table = collection.name();
        connection.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                 id   INTEGER PRIMARY KEY AUTOINCREMENT,
                 lat  REAL NOT NULL,
                 lng  REAL NOT NULL,
                 body TEXT NOT NULL
             );
             CREATE INDEX IF NOT EXISTS {table}_lat_lng ON {table} (lat, lng);"
        ))?;
    }
    Ok(())
}

/// One open SQLite connection.
#[derive(Debug)]
pub struct SqliteConnection {
    connection: Option<Connection>,
    location: Utf8PathBuf,
    accepted: Option<(String, String)>,
}

impl SqliteConnection {
    fn live(
        &self,
        collection: Collection,
        operation: &'static str,
    ) -> Result<&Connection, StoreError> {
        self.connection
            .as_ref()
            .ok_or_else(|| StoreError::query(collection, operation, "connection already closed"))
    }
}

impl StoreConnection for SqliteConnection {
    fn authenticate(&mut self, credentials: &Credentials) -> Result<(), StoreError> {
        match &self.accepted {
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
        const OPERATION: &str = "insert into";
        let connection = self.live(collection, OPERATION)?;
        let body = serde_json::to_string(&document.body)
            .map_err(|source| StoreError::Encode { collection, source })?;
        connection
            .execute(
                &format!(
                    "INSERT INTO {} (lat, lng, body) VALUES (?1, ?2, ?3)",
                    collection.name()
                ),
                params![document.lat, document.lng, body],
            )
            .map_err(|err| StoreError::query(collection, OPERATION, err))?;
        Ok(())
    }

    fn find_in_range(
        &mut self,
        collection: Collection,
        bounds: &GeoBounds,
    ) -> Result<Vec<Document>, StoreError> {
        const OPERATION: &str = "query";
        let connection = self.live(collection, OPERATION)?;
        let mut statement = connection
            .prepare_cached(&format!(
                "SELECT lat, lng, body FROM {} \
                 WHERE lat BETWEEN ?1 AND ?2 AND lng BETWEEN ?3 AND ?4 \
                 ORDER BY id",
                collection.name()
            ))
            .map_err(|err| StoreError::query(collection, OPERATION, err))?;
        let rows = statement
            .query_map(
                params![bounds.south(), bounds.north(), bounds.west(), bounds.east()],
                |row| {
                    Ok((
                        row.get::<_, f64>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .map_err(|err| StoreError::query(collection, OPERATION, err))?;

        let mut documents = Vec::new();
        for row in rows {
            let (lat, lng, body) = row.map_err(|err| StoreError::query(collection, OPERATION, err))?;
            let body = serde_json::from_str(&body)
                .map_err(|source| StoreError::Decode { collection, source })?;
            documents.push(Document { lat, lng, body });
        }
        Ok(documents)
    }

    fn close(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };
        if let Err((_, err)) = connection.close() {
            warn!("failed to close SQLite connection to {}: {err}", self.location);
        }
    }
}

impl Drop for SqliteConnection {
    fn drop(&mut self) {
        self.close();
    }
}
