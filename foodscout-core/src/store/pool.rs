//! Admission control for backing-store connections.
//!
//! [`SessionPool`] caps the number of simultaneously open connections. It is
//! not a reuse cache: every [`SessionPool::acquire`] dials a fresh connection
//! and every release closes it. The admission check and the slot reservation
//! happen under one lock, so concurrent callers can never push the active
//! count past the configured maximum.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, warn};
use thiserror::Error;

use super::{Credentials, StoreBackend, StoreConnection, StoreError};

/// Errors returned by [`SessionPool::acquire`].
#[derive(Debug, Error)]
pub enum PoolError {
    /// The active-session ceiling has been reached.
    #[error("no free session: {max_sessions} sessions already active")]
    Exhausted {
        /// Configured ceiling.
        max_sessions: usize,
    },
    /// Dialling or authenticating the new connection failed.
    #[error(transparent)]
    Connection(#[from] StoreError),
}

/// Identifier of a session within its pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

#[derive(Debug, Default)]
struct ActiveSessions {
    next_id: u64,
    ids: HashSet<SessionId>,
}

impl ActiveSessions {
    fn reserve(&mut self) -> SessionId {
        let id = SessionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.ids.insert(id);
        id
    }
}

type SharedSessions = Arc<Mutex<ActiveSessions>>;

// The set only holds ids, so a panic while it was locked cannot leave it in a
// state worth refusing.
fn lock(sessions: &SharedSessions) -> MutexGuard<'_, ActiveSessions> {
    sessions.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Bounds the number of concurrently open backing-store connections.
pub struct SessionPool<B: StoreBackend> {
    backend: B,
    max_sessions: usize,
    active: SharedSessions,
}

impl<B: StoreBackend> fmt::Debug for SessionPool<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionPool")
            .field("max_sessions", &self.max_sessions)
            .field("active", &self.active())
            .finish_non_exhaustive()
    }
}

impl<B: StoreBackend> SessionPool<B> {
    /// Create a pool admitting at most `max_sessions` concurrent sessions.
    pub fn new(backend: B, max_sessions: usize) -> Self {
        Self {
            backend,
            max_sessions,
            active: SharedSessions::default(),
        }
    }

    /// Open, authenticate and track a new session.
    ///
    /// Fails with [`PoolError::Exhausted`] without dialling when the ceiling
    /// has been reached. A slot reserved for a connection that then fails to
    /// dial or authenticate is returned to the pool.
    pub fn acquire(&self, credentials: &Credentials) -> Result<Session<B::Connection>, PoolError> {
        let id = {
            let mut active = lock(&self.active);
            if active.ids.len() >= self.max_sessions {
                debug!(
                    "session admission denied: {} of {} active",
                    active.ids.len(),
                    self.max_sessions
                );
                return Err(PoolError::Exhausted {
                    max_sessions: self.max_sessions,
                });
            }
            active.reserve()
        };

        match self.open(credentials) {
            Ok(connection) => {
                debug!("opened {id} for user {:?}", credentials.username);
                Ok(Session {
                    id,
                    connection,
                    active: Arc::clone(&self.active),
                })
            }
            Err(err) => {
                lock(&self.active).ids.remove(&id);
                warn!("failed to open {id}: {err}");
                Err(PoolError::Connection(err))
            }
        }
    }

    /// Release a session, closing its connection.
    ///
    /// Equivalent to dropping the session; provided for call sites that want
    /// the release to be explicit.
    pub fn release(&self, session: Session<B::Connection>) {
        drop(session);
    }

    /// Number of sessions currently open.
    #[must_use]
    pub fn active(&self) -> usize {
        lock(&self.active).ids.len()
    }

    /// Configured ceiling.
    #[must_use]
    pub const fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    /// Backend used to dial new connections.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    fn open(&self, credentials: &Credentials) -> Result<B::Connection, StoreError> {
        let mut connection = self.backend.dial()?;
        if let Err(err) = connection.authenticate(credentials) {
            connection.close();
            return Err(err);
        }
        Ok(connection)
    }
}

/// An open, authenticated connection held by one caller.
///
/// Dropping the session removes it from the pool's active set and closes the
/// connection, so every exit path of the holder releases it.
pub struct Session<C: StoreConnection> {
    id: SessionId,
    pub(crate) connection: C,
    active: SharedSessions,
}

impl<C: StoreConnection> Session<C> {
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }
}

impl<C: StoreConnection> fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("id", &self.id).finish_non_exhaustive()
    }
}

impl<C: StoreConnection> Drop for Session<C> {
    fn drop(&mut self) {
        // Removing an id that is no longer tracked is a no-op.
        let tracked = lock(&self.active).ids.remove(&self.id);
        self.connection.close();
        if tracked {
            debug!("released {}", self.id);
        }
    }
}
