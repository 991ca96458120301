use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Shared flag used to interrupt an in-flight remote fetch.
///
/// Clones observe the same flag. Cancelling wakes every thread blocked in
/// [`CancellationToken::wait_timeout`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use foodscout_core::CancellationToken;
///
/// let token = CancellationToken::new();
/// token.cancel();
/// assert!(token.wait_timeout(Duration::from_secs(60)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the token cancelled and wake all waiters.
    pub fn cancel(&self) {
        let (flag, wake) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = true;
        wake.notify_all();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block for up to `timeout`, returning early if the token is cancelled.
    ///
    /// Returns `true` when the wait ended because of cancellation. A timeout
    /// too large to represent as a deadline waits until cancelled.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (flag, wake) = &*self.inner;
        let deadline = Instant::now().checked_add(timeout);
        let mut cancelled = flag.lock().unwrap_or_else(PoisonError::into_inner);
        while !*cancelled {
            cancelled = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    wake.wait_timeout(cancelled, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => wake.wait(cancelled).unwrap_or_else(PoisonError::into_inner),
            };
        }
        true
    }
}
