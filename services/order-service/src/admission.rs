//! Admission locks
//!
//! Short-TTL exclusive locks keyed by (user, market). A user gets at
//! most one in-flight submission per market; a second attempt while the
//! lock is held is rejected immediately rather than queued. The TTL
//! bounds how long a crashed task can block its user.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use types::ids::{MarketId, UserAddress};

/// Default lock TTL.
pub const DEFAULT_ADMISSION_TTL: Duration = Duration::from_secs(5);

type Key = (UserAddress, MarketId);

#[derive(Debug, Clone, Copy)]
struct Lease {
    token: u64,
    expires_at: Instant,
}

#[derive(Debug)]
struct Inner {
    leases: DashMap<Key, Lease>,
    ttl: Duration,
    counter: AtomicU64,
}

/// Table of per-(user, market) admission locks.
#[derive(Debug, Clone)]
pub struct AdmissionLocks {
    inner: Arc<Inner>,
}

impl AdmissionLocks {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                leases: DashMap::new(),
                ttl,
                counter: AtomicU64::new(0),
            }),
        }
    }

    /// Non-blocking acquire. Returns `None` while another submission by
    /// the same user on the same market holds an unexpired lease.
    pub fn try_acquire(&self, user: UserAddress, market_id: MarketId) -> Option<AdmissionGuard> {
        let now = Instant::now();
        let token = self.inner.counter.fetch_add(1, Ordering::Relaxed);
        let lease = Lease {
            token,
            expires_at: now + self.inner.ttl,
        };
        let key = (user, market_id);

        match self.inner.leases.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().expires_at > now {
                    return None;
                }
                // Expired lease left by a crashed or stalled task
                occupied.insert(lease);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(lease);
            }
        }
        Some(AdmissionGuard {
            inner: self.inner.clone(),
            key,
            token,
        })
    }
}

impl Default for AdmissionLocks {
    fn default() -> Self {
        Self::new(DEFAULT_ADMISSION_TTL)
    }
}

/// Held lock; releases on drop (also on error paths).
#[derive(Debug)]
pub struct AdmissionGuard {
    inner: Arc<Inner>,
    key: Key,
    token: u64,
}

impl Drop for AdmissionGuard {
    fn drop(&mut self) {
        // Only release a lease this guard still owns; an expired lease
        // may have been taken over by a newer submission.
        self.inner
            .leases
            .remove_if(&self.key, |_, lease| lease.token == self.token);
    }
}
