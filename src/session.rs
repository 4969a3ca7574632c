//! Relay session store
//!
//! The relay backend identifies a mailbox by an opaque session token
//! rather than by address, so the client keeps at most one token,
//! paired with the address it was created for. The pair is the only
//! shared mutable state in the crate; every check-then-create and
//! sweep-then-clear sequence runs under one mutex so the idle sweep
//! can never invalidate a token in the middle of a resolution.
//!
//! The server communicates no expiry, so the store enforces its own
//! idle policy: a token whose creation timestamp is older than
//! [`IDLE_TIMEOUT`] is discarded, both on access and by a recurring
//! sweep task owned by the client (see [`SessionStore::spawn_sweeper`]).

use crate::error::Result;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

/// How long an unchanged token survives before the store discards it.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// How often the background sweep re-checks the stored token.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Opaque credential binding this client to one relay mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug)]
struct StoredSession {
    token: SessionToken,
    address: String,
    /// When the token was created or last replaced. Reuse does not
    /// refresh it.
    last_confirmed: Instant,
}

/// At most one relay session, keyed by the address it was created for.
#[derive(Debug)]
pub struct SessionStore {
    idle_timeout: Duration,
    inner: Mutex<Option<StoredSession>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_idle_timeout(IDLE_TIMEOUT)
    }

    /// Store with a custom idle threshold.
    #[must_use]
    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            idle_timeout,
            inner: Mutex::new(None),
        }
    }

    /// Resolve a session token for `address`.
    ///
    /// Reuses the stored token without calling `create` when it was
    /// made for the same address and has not idled out. Otherwise
    /// `create` is awaited while the store lock is held and its token
    /// replaces any prior one, stamped with a fresh creation time.
    ///
    /// # Errors
    ///
    /// Propagates whatever `create` returns; no retry is attempted.
    pub async fn resolve_with<F, Fut>(&self, address: &str, create: F) -> Result<SessionToken>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SessionToken>>,
    {
        let mut slot = self.inner.lock().await;
        Self::expire_idle(&mut slot, self.idle_timeout);

        if let Some(stored) = slot.as_ref() {
            if stored.address == address {
                debug!("Reusing relay session for {}", address);
                return Ok(stored.token.clone());
            }
        }

        let token = create().await?;
        info!("Created relay session for {}", address);
        *slot = Some(StoredSession {
            token: token.clone(),
            address: address.to_string(),
            last_confirmed: Instant::now(),
        });
        Ok(token)
    }

    /// Run one idle-expiry pass over the stored token.
    pub async fn sweep(&self) {
        let mut slot = self.inner.lock().await;
        Self::expire_idle(&mut slot, self.idle_timeout);
    }

    /// Drop the stored token and its timestamp together.
    pub async fn clear(&self) {
        let mut slot = self.inner.lock().await;
        *slot = None;
    }

    /// Spawn the recurring sweep as a task owned by the returned
    /// guard. Dropping the guard aborts the task, tying the sweep's
    /// lifecycle to its owner rather than leaving a process-wide
    /// timer behind.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> SweeperGuard {
        let store = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                store.sweep().await;
            }
        });
        SweeperGuard { handle }
    }

    fn expire_idle(slot: &mut Option<StoredSession>, idle_timeout: Duration) {
        if let Some(stored) = slot.as_ref() {
            if stored.last_confirmed.elapsed() > idle_timeout {
                info!("Discarding idle relay session for {}", stored.address);
                *slot = None;
            }
        }
    }
}

/// Owns the background sweep task; aborts it on drop.
#[derive(Debug)]
pub struct SweeperGuard {
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for SweeperGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
