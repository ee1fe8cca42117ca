//! A bounded pool of warm engine sessions.
//!
//! Spawning an engine and running the handshake costs far more than a
//! typical query. [`EnginePool`] keeps up to `size` initialized sessions
//! around and hands them out one caller at a time.
//!
//! ```ignore
//! let pool = EnginePool::new(config, 4)?;
//! pool.warm_up().await?;
//!
//! let mut engine = pool.checkout().await?;
//! let ok = engine.apply_move("e2e4", "startpos").await;
//! drop(engine); // back to the idle list
//! ```

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use futures::future::try_join_all;
use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::{EngineConfig, StrengthLevel};
use crate::session::EngineSession;
use crate::{Error, Result};

/// Shared handle to a pool of engine sessions. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EnginePool {
    inner: Arc<PoolInner>,
}

#[derive(Debug)]
struct PoolInner {
    config: EngineConfig,
    strength: Option<StrengthLevel>,
    size: usize,
    idle: Mutex<Vec<EngineSession>>,
    /// One permit per session that may be checked out at once.
    permits: Arc<Semaphore>,
}

impl EnginePool {
    /// Create an empty pool of at most `size` sessions.
    ///
    /// No engine is spawned until [`warm_up`](Self::warm_up) or the first
    /// [`checkout`](Self::checkout).
    pub fn new(config: EngineConfig, size: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidConfig("pool size must be at least 1".into()));
        }
        Ok(Self {
            inner: Arc::new(PoolInner {
                config,
                strength: None,
                size,
                idle: Mutex::new(Vec::with_capacity(size)),
                permits: Arc::new(Semaphore::new(size)),
            }),
        })
    }

    /// Initialize every session with this strength limit.
    ///
    /// Must be called before the pool is cloned; on a shared pool the limit
    /// is not applied and a warning is logged.
    pub fn with_strength(mut self, level: StrengthLevel) -> Self {
        match Arc::get_mut(&mut self.inner) {
            Some(inner) => inner.strength = Some(level),
            None => tracing::warn!(%level, "engine pool already shared, strength limit ignored"),
        }
        self
    }

    /// Strength limit applied to new sessions.
    pub fn strength(&self) -> Option<StrengthLevel> {
        self.inner.strength
    }

    pub fn size(&self) -> usize {
        self.inner.size
    }

    /// Sessions waiting in the idle list.
    pub fn idle_count(&self) -> usize {
        self.inner.idle.lock().len()
    }

    /// Checkouts that would not wait right now.
    pub fn available(&self) -> usize {
        self.inner.permits.available_permits()
    }

    /// Fill the idle list up to the pool size, opening sessions concurrently.
    ///
    /// Fails if any session fails to open; those that did open are closed.
    pub async fn warm_up(&self) -> Result<()> {
        let missing = self.inner.size.saturating_sub(self.idle_count());
        if missing == 0 {
            return Ok(());
        }

        let sessions = try_join_all((0..missing).map(|_| self.inner.open_session())).await?;
        tracing::debug!(opened = sessions.len(), "engine pool warmed up");

        let mut idle = self.inner.idle.lock();
        let room = self.inner.size.saturating_sub(idle.len());
        idle.extend(sessions.into_iter().take(room));
        Ok(())
    }

    /// Wait for a free slot and hand out a healthy session.
    ///
    /// Idle sessions are pinged first; one that fails is closed and the next
    /// is tried. With no idle session left a fresh one is opened.
    pub async fn checkout(&self) -> Result<PooledSession> {
        let permit = Arc::clone(&self.inner.permits)
            .acquire_owned()
            .await
            .map_err(|_| Error::SessionClosed)?;

        loop {
            let candidate = self.inner.idle.lock().pop();
            let Some(mut session) = candidate else { break };
            if session.is_healthy().await {
                return Ok(PooledSession::new(session, Arc::clone(&self.inner), permit));
            }
            tracing::debug!("discarding idle engine that failed its ping");
            session.close().await;
        }

        let session = self.inner.open_session().await?;
        Ok(PooledSession::new(session, Arc::clone(&self.inner), permit))
    }

    /// Close every idle session and refuse further checkouts.
    ///
    /// Sessions checked out right now are closed when they come back.
    pub async fn close(&self) {
        self.inner.permits.close();
        let sessions = std::mem::take(&mut *self.inner.idle.lock());
        for mut session in sessions {
            session.close().await;
        }
    }
}

impl PoolInner {
    async fn open_session(&self) -> Result<EngineSession> {
        let mut session = EngineSession::open(&self.config)?;
        if let Err(e) = session.try_initialize(self.strength).await {
            session.close().await;
            return Err(e);
        }
        Ok(session)
    }

    fn check_in(&self, session: EngineSession) {
        if session.is_closed() || session.is_poisoned() {
            tracing::debug!("dropping unhealthy engine session");
            return;
        }
        if self.permits.is_closed() {
            return;
        }
        let mut idle = self.idle.lock();
        if idle.len() < self.size {
            idle.push(session);
        }
    }
}

/// A session on loan from an [`EnginePool`].
///
/// Dereferences to [`EngineSession`]. Dropping it returns the session to the
/// pool unless its last exchange timed out or failed.
#[derive(Debug)]
pub struct PooledSession {
    session: EngineSession,
    pool: Arc<PoolInner>,
    _permit: OwnedSemaphorePermit,
}

impl PooledSession {
    fn new(session: EngineSession, pool: Arc<PoolInner>, permit: OwnedSemaphorePermit) -> Self {
        Self {
            session,
            pool,
            _permit: permit,
        }
    }

    /// Close the session instead of returning it.
    pub async fn close(mut self) {
        self.session.close().await;
    }
}

impl Deref for PooledSession {
    type Target = EngineSession;

    fn deref(&self) -> &EngineSession {
        &self.session
    }
}

impl DerefMut for PooledSession {
    fn deref_mut(&mut self) -> &mut EngineSession {
        &mut self.session
    }
}

impl Drop for PooledSession {
    fn drop(&mut self) {
        let session = self.session.take();
        self.pool.check_in(session);
    }
}
