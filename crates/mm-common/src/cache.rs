//! In-memory result cache with request coalescing.
//!
//! Each key moves through `Empty → Pending → Cached → (Expired → Empty)`.
//! The first caller to find a key empty or expired becomes the leader and
//! runs the computation; everyone arriving while it is pending subscribes to
//! the leader's `watch` channel and receives the same value. If the leader's
//! future is dropped before it publishes, the pending slot is cleared and the
//! waiters race to become the next leader.

use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::AsRefStr;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::fallback::Computed;

pub const MIN_DEGRADED_TTL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CacheCategory {
    /// Market and price data.
    Market,
    /// Match scores and analyses.
    Score,
    /// Profile and trust data.
    Profile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub market: Duration,
    pub score: Duration,
    pub profile: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            market: Duration::from_secs(60),
            score: Duration::from_secs(300),
            profile: Duration::from_secs(1800),
        }
    }
}

impl CacheTtls {
    pub fn policy(&self, category: CacheCategory) -> TtlPolicy {
        let ttl = match category {
            CacheCategory::Market => self.market,
            CacheCategory::Score => self.score,
            CacheCategory::Profile => self.profile,
        };
        TtlPolicy::new(ttl)
    }
}

/// Lifetime for full-confidence results and the shorter one for degraded ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    pub ttl: Duration,
    pub degraded_ttl: Duration,
}

impl TtlPolicy {
    /// Degraded results live a quarter as long, never under one second
    /// and never longer than `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            degraded_ttl: (ttl / 4).max(MIN_DEGRADED_TTL).min(ttl),
        }
    }

    pub fn ttl_for(&self, degraded: bool) -> Duration {
        if degraded { self.degraded_ttl } else { self.ttl }
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: Instant,
    pub ttl: Duration,
    pub degraded: bool,
}

impl<V> CacheEntry<V> {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) > self.ttl
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupOutcome {
    /// Served from a live entry.
    Hit,
    /// This caller ran the computation.
    Miss,
    /// Joined a computation another caller started.
    Coalesced,
}

impl LookupOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupOutcome::Hit => "hit",
            LookupOutcome::Miss => "miss",
            LookupOutcome::Coalesced => "coalesced",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheLookup<V> {
    pub value: V,
    pub degraded: bool,
    pub outcome: LookupOutcome,
}

type Published<V> = Option<(V, bool)>;

enum Slot<V> {
    Pending(watch::Receiver<Published<V>>),
    Ready(CacheEntry<V>),
}

enum Role<V> {
    Leader(watch::Sender<Published<V>>, watch::Receiver<Published<V>>),
    Follower(watch::Receiver<Published<V>>),
}

pub struct AdaptiveCache<V> {
    name: &'static str,
    slots: Arc<Mutex<HashMap<String, Slot<V>>>>,
}

impl<V> Clone for AdaptiveCache<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            slots: Arc::clone(&self.slots),
        }
    }
}

fn lock<V>(slots: &Mutex<HashMap<String, Slot<V>>>) -> MutexGuard<'_, HashMap<String, Slot<V>>> {
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<V> AdaptiveCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the live value for `key`, or runs `compute` exactly once across
    /// all concurrent callers and caches its output under `policy`.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &str,
        policy: TtlPolicy,
        compute: F,
    ) -> CacheLookup<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Computed<V>>,
    {
        let lookup = self
            .try_get_or_compute(key, policy, move || async move {
                Ok::<_, Infallible>(compute().await)
            })
            .await;
        match lookup {
            Ok(lookup) => lookup,
            Err(never) => match never {},
        }
    }

    /// Like `get_or_compute`, but `compute` may fail. A failure is returned
    /// to the leader only, nothing is cached, and waiting followers retry.
    pub async fn try_get_or_compute<F, Fut, E>(
        &self,
        key: &str,
        policy: TtlPolicy,
        compute: F,
    ) -> Result<CacheLookup<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Computed<V>, E>>,
    {
        loop {
            let role = {
                let mut slots = lock(&self.slots);
                let now = Instant::now();
                match slots.get(key) {
                    Some(Slot::Ready(entry)) if !entry.is_expired(now) => {
                        return Ok(CacheLookup {
                            value: entry.value.clone(),
                            degraded: entry.degraded,
                            outcome: LookupOutcome::Hit,
                        });
                    }
                    Some(Slot::Pending(rx)) => Role::Follower(rx.clone()),
                    _ => {
                        let (tx, rx) = watch::channel(None);
                        slots.insert(key.to_string(), Slot::Pending(rx.clone()));
                        Role::Leader(tx, rx)
                    }
                }
            };

            match role {
                Role::Follower(mut rx) => {
                    // Err means the leader vanished without publishing.
                    let published = rx
                        .wait_for(Option::is_some)
                        .await
                        .ok()
                        .and_then(|published| (*published).clone());
                    if let Some((value, degraded)) = published {
                        return Ok(CacheLookup {
                            value,
                            degraded,
                            outcome: LookupOutcome::Coalesced,
                        });
                    }
                    debug!(cache = self.name, key, "pending computation abandoned; retrying");
                }
                Role::Leader(tx, rx) => {
                    let guard = PendingGuard {
                        slots: &self.slots,
                        key,
                        rx,
                        armed: true,
                    };

                    let Computed { value, degraded } = compute().await?;
                    let entry = CacheEntry {
                        value: value.clone(),
                        created_at: Instant::now(),
                        ttl: policy.ttl_for(degraded),
                        degraded,
                    };

                    lock(&self.slots).insert(key.to_string(), Slot::Ready(entry));
                    guard.disarm();
                    let _ = tx.send(Some((value.clone(), degraded)));

                    return Ok(CacheLookup {
                        value,
                        degraded,
                        outcome: LookupOutcome::Miss,
                    });
                }
            }
        }
    }

    /// Live value for `key` without computing anything.
    pub fn peek(&self, key: &str) -> Option<V> {
        match lock(&self.slots).get(key) {
            Some(Slot::Ready(entry)) if !entry.is_expired(Instant::now()) => {
                Some(entry.value.clone())
            }
            _ => None,
        }
    }

    /// Drops every expired entry. Pending computations are left alone.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut slots = lock(&self.slots);
        let before = slots.len();
        slots.retain(|_, slot| match slot {
            Slot::Ready(entry) => !entry.is_expired(now),
            Slot::Pending(_) => true,
        });
        before - slots.len()
    }

    pub fn len(&self) -> usize {
        lock(&self.slots).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Clears our pending slot if the leader future is dropped mid-computation.
struct PendingGuard<'a, V> {
    slots: &'a Mutex<HashMap<String, Slot<V>>>,
    key: &'a str,
    rx: watch::Receiver<Published<V>>,
    armed: bool,
}

impl<V> PendingGuard<'_, V> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<V> Drop for PendingGuard<'_, V> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut slots = lock(self.slots);
        if let Some(Slot::Pending(rx)) = slots.get(self.key) {
            if rx.same_channel(&self.rx) {
                slots.remove(self.key);
            }
        }
    }
}

/// Anything the sweeper can purge.
pub trait Sweep: Send + Sync {
    fn name(&self) -> &'static str;
    fn purge_expired(&self) -> usize;
}

impl<V> Sweep for AdaptiveCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        AdaptiveCache::name(self)
    }

    fn purge_expired(&self) -> usize {
        AdaptiveCache::purge_expired(self)
    }
}

/// Owned background task that periodically evicts expired entries.
pub struct CacheSweeper {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl CacheSweeper {
    pub fn init(interval: Duration, caches: Vec<Arc<dyn Sweep>>) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        for cache in &caches {
                            let purged = cache.purge_expired();
                            if purged > 0 {
                                debug!(cache = cache.name(), purged, "evicted expired cache entries");
                            }
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        info!(interval_secs = interval.as_secs(), "cache sweeper started");
        Self { shutdown, handle }
    }

    /// Signals the task and waits for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
        info!("cache sweeper stopped");
    }
}
