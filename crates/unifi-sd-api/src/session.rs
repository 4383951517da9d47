// Time-bounded session cache
//
// Optional: with a zero TTL every lookup misses and each discovery request
// logs in afresh. The configuration is process-wide, so one slot is enough.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::auth::Session;

#[derive(Debug)]
struct CachedSession {
    session: Session,
    issued_at: Instant,
}

/// Holds the most recent login session for up to `ttl`.
#[derive(Debug)]
pub struct SessionCache {
    ttl: Duration,
    slot: Mutex<Option<CachedSession>>,
}

impl SessionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// A cache that never holds anything.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// The cached session, if one exists and is younger than the TTL.
    pub async fn get(&self) -> Option<Session> {
        if !self.is_enabled() {
            return None;
        }
        let mut slot = self.slot.lock().await;
        match slot.as_ref() {
            Some(cached) if cached.issued_at.elapsed() < self.ttl => {
                trace!("reusing cached session");
                Some(cached.session.clone())
            }
            Some(_) => {
                debug!("cached session expired");
                *slot = None;
                None
            }
            None => None,
        }
    }

    /// Remember a freshly issued session.
    pub async fn store(&self, session: Session) {
        if !self.is_enabled() {
            return;
        }
        *self.slot.lock().await = Some(CachedSession {
            session,
            issued_at: Instant::now(),
        });
    }

    /// Drop the cached session if it is still `rejected`.
    ///
    /// A concurrent request may already have replaced it with a fresh login;
    /// that one is kept.
    pub async fn invalidate_if(&self, rejected: &Session) {
        let mut slot = self.slot.lock().await;
        if slot.as_ref().is_some_and(|cached| &cached.session == rejected) {
            *slot = None;
            debug!("cached session invalidated");
        }
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::disabled()
    }
}
