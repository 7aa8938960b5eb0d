//! Expiring Cache Module
//!
//! A data hash of expiring entries plus an optional hash of rate counters,
//! kept in the backing store. Expired fields are removed two ways:
//!
//! - **Lazy sweep**: every write enqueues a [`ScheduleToken`]; a background
//!   worker pops tokens in FIFO order, sleeps until the entry's clear time and
//!   deletes it. Tokens are processed strictly in order, so an entry with a
//!   short TTL queued behind one with a long TTL waits for the latter.
//! - **Active sweep**: the `cron_*` operations scan the whole hash and delete
//!   every due field. Queues live in memory only, so this is what cleans up
//!   after a restart.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::cache::config::{CacheOptions, TIMES_KEY_SUFFIX};
use crate::cache::entry::{decode, encode, time_until, CacheData, CacheTimes};
use crate::cache::queue::{RingQueue, ScheduleToken};
use crate::cache::stats::{SweepCounters, SweepStats};
use crate::error::{CacheError, Result};
use crate::store::SharedStore;

type TokenQueue = Mutex<RingQueue<ScheduleToken>>;

/// Which hash a sweep worker is responsible for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SweepKind {
    Data,
    Times,
}

// == Cache Core ==
/// State shared between the cache handle and its sweep workers.
struct CacheCore {
    store: SharedStore,
    data_key: String,
    times_key: String,
    options: CacheOptions,
    data_queue: TokenQueue,
    times_queue: Option<TokenQueue>,
    counters: SweepCounters,
}

impl CacheCore {
    async fn read_data(&self, field: &str) -> Result<Option<CacheData>> {
        match self.store.hash_get(&self.data_key, field).await? {
            Some(raw) => decode(&raw),
            None => Ok(None),
        }
    }

    async fn read_times(&self, field: &str) -> Result<Option<CacheTimes>> {
        if !self.options.rate_limited() {
            return Ok(None);
        }
        match self.store.hash_get(&self.times_key, field).await? {
            Some(raw) => decode(&raw),
            None => Ok(None),
        }
    }

    fn queue(&self, kind: SweepKind) -> Option<&TokenQueue> {
        match kind {
            SweepKind::Data => Some(&self.data_queue),
            SweepKind::Times => self.times_queue.as_ref(),
        }
    }

    fn hash_key(&self, kind: SweepKind) -> &str {
        match kind {
            SweepKind::Data => &self.data_key,
            SweepKind::Times => &self.times_key,
        }
    }

    /// Sleep used when the queue is empty.
    fn idle_interval(&self, kind: SweepKind) -> std::time::Duration {
        match kind {
            SweepKind::Data => self.options.data_ttl,
            SweepKind::Times => self.options.times_ttl,
        }
    }

    async fn clear_time(
        &self,
        kind: SweepKind,
        field: &str,
    ) -> Result<Option<chrono::DateTime<chrono::Utc>>> {
        Ok(match kind {
            SweepKind::Data => self.read_data(field).await?.map(|data| data.clear_time),
            SweepKind::Times => self.read_times(field).await?.map(|times| times.clear_time),
        })
    }
}

// == Expiring Cache ==
/// Expiring, optionally rate-limited cache over one store hash.
///
/// Construction spawns the lazy sweep workers on the current tokio runtime.
/// They run until the cache is dropped.
pub struct ExpiringCache {
    core: Arc<CacheCore>,
    workers: Vec<JoinHandle<()>>,
}

impl ExpiringCache {
    // == Constructor ==
    /// Creates the cache for data hash `key` and starts its sweep workers.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    pub fn new(store: SharedStore, key: impl Into<String>, options: CacheOptions) -> Self {
        let data_key = key.into();
        let times_key = format!("{}{}", data_key, TIMES_KEY_SUFFIX);
        let capacity = options.initial_queue_capacity;
        let rate_limited = options.rate_limited();

        let core = Arc::new(CacheCore {
            store,
            data_key,
            times_key,
            data_queue: Mutex::new(RingQueue::new(capacity)),
            times_queue: rate_limited.then(|| Mutex::new(RingQueue::new(capacity))),
            options,
            counters: SweepCounters::default(),
        });

        let mut workers = vec![tokio::spawn(run_lazy_sweep(core.clone(), SweepKind::Data))];
        if rate_limited {
            workers.push(tokio::spawn(run_lazy_sweep(core.clone(), SweepKind::Times)));
        }

        info!(
            "Cache {} started: data_ttl={:?}, rate_limit={}, workers={}",
            core.data_key,
            core.options.data_ttl,
            core.options.rate_limit,
            workers.len()
        );

        Self { core, workers }
    }

    // == Accessors ==
    pub fn data_key(&self) -> &str {
        &self.core.data_key
    }

    /// Initial capacity of the schedule queues.
    pub fn data_size(&self) -> usize {
        self.core.options.initial_queue_capacity
    }

    pub fn times_key(&self) -> &str {
        &self.core.times_key
    }

    pub fn times_limit(&self) -> i64 {
        self.core.options.rate_limit
    }

    pub fn options(&self) -> &CacheOptions {
        &self.core.options
    }

    // == Set ==
    /// Stores `value` under `field`, expiring after the data TTL.
    ///
    /// A non-empty `times_field` also records a hit on that rate counter;
    /// a failure there is logged and does not fail the call. A `null` value
    /// is ignored.
    pub async fn set<V: Serialize>(&self, field: &str, times_field: &str, value: V) -> Result<()> {
        let value = serde_json::to_value(value).map_err(CacheError::Serialization)?;
        if value.is_null() {
            return Ok(());
        }

        let data = CacheData::new(field, value, self.core.options.data_ttl);
        let raw = encode(&data)?;
        self.core.store.hash_set(&self.core.data_key, field, &raw).await?;

        if !times_field.is_empty() {
            if let Err(err) = self.add_times(times_field).await {
                warn!(
                    "Cache {}: failed to count {} for {}: {}",
                    self.core.data_key, times_field, field, err
                );
            }
        }

        self.core
            .data_queue
            .lock()
            .await
            .push(ScheduleToken::new(field));
        Ok(())
    }

    // == Get ==
    /// Reads the entry stored under `field`.
    ///
    /// With `clear`, the entry is deleted after a successful read.
    pub async fn get(&self, field: &str, clear: bool) -> Result<Option<CacheData>> {
        let data = self.core.read_data(field).await?;
        if clear && data.is_some() {
            if let Err(err) = self.del(field).await {
                warn!("Cache {}: failed to clear {}: {}", self.core.data_key, field, err);
            }
        }
        Ok(data)
    }

    // == Get All ==
    /// Reads every entry; fails on the first malformed payload.
    pub async fn get_all(&self) -> Result<Vec<CacheData>> {
        let raws = self.core.store.hash_vals(&self.core.data_key).await?;
        let mut entries = Vec::with_capacity(raws.len());
        for raw in raws {
            if let Some(data) = decode(&raw)? {
                entries.push(data);
            }
        }
        Ok(entries)
    }

    // == Delete ==
    pub async fn del(&self, field: &str) -> Result<()> {
        self.core.store.hash_delete(&self.core.data_key, field).await
    }

    // == Valid Times ==
    /// Whether `times_field` is still under the rate limit.
    ///
    /// Always true when rate limiting is disabled or no counter exists.
    pub async fn valid_times(&self, times_field: &str) -> Result<bool> {
        if !self.core.options.rate_limited() {
            return Ok(true);
        }
        Ok(match self.core.read_times(times_field).await? {
            Some(times) => times.times < self.core.options.rate_limit,
            None => true,
        })
    }

    // == Add Times ==
    /// Records one hit on `times_field`.
    ///
    /// The first hit opens a window of `times_ttl`; later hits keep the
    /// window's clear time. The limit is not enforced here: callers check
    /// [`valid_times`](Self::valid_times) first, and concurrent callers may
    /// both pass that check.
    pub async fn add_times(&self, times_field: &str) -> Result<()> {
        let Some(queue) = self.core.times_queue.as_ref() else {
            return Ok(());
        };

        let times = match self.core.read_times(times_field).await? {
            Some(mut times) => {
                times.times += 1;
                times
            }
            None => CacheTimes::first(times_field, self.core.options.times_ttl),
        };
        let raw = encode(&times)?;
        self.core
            .store
            .hash_set(&self.core.times_key, times_field, &raw)
            .await?;

        queue.lock().await.push(ScheduleToken::new(times_field));
        Ok(())
    }

    /// Reads the rate counter for `times_field`; `None` when disabled or absent.
    pub async fn get_times(&self, times_field: &str) -> Result<Option<CacheTimes>> {
        self.core.read_times(times_field).await
    }

    /// Reads every rate counter; fails on the first malformed payload.
    pub async fn get_all_times(&self) -> Result<Vec<CacheTimes>> {
        let raws = self.core.store.hash_vals(&self.core.times_key).await?;
        let mut counters = Vec::with_capacity(raws.len());
        for raw in raws {
            if let Some(times) = decode(&raw)? {
                counters.push(times);
            }
        }
        Ok(counters)
    }

    pub async fn del_times(&self, times_field: &str) -> Result<()> {
        self.core
            .store
            .hash_delete(&self.core.times_key, times_field)
            .await
    }

    // == Active Sweep ==
    /// Deletes every entry whose clear time has passed.
    ///
    /// Returns the number of entries removed. Failures are logged, never returned.
    pub async fn cron_clear_expired_data(&self) -> usize {
        let entries = match self.get_all().await {
            Ok(entries) => entries,
            Err(err) => {
                warn!("Cache {}: active sweep read failed: {}", self.core.data_key, err);
                return 0;
            }
        };

        let mut removed = 0;
        for data in entries.iter().filter(|data| data.is_expired()) {
            match self.del(&data.field).await {
                Ok(()) => removed += 1,
                Err(err) => warn!(
                    "Cache {}: active sweep failed to delete {}: {}",
                    self.core.data_key, data.field, err
                ),
            }
        }
        self.core.counters.record_active_removals(removed);
        removed
    }

    /// Deletes every rate counter whose window has closed.
    pub async fn cron_clear_expired_times(&self) -> usize {
        let counters = match self.get_all_times().await {
            Ok(counters) => counters,
            Err(err) => {
                warn!("Cache {}: active sweep read failed: {}", self.core.times_key, err);
                return 0;
            }
        };

        let mut removed = 0;
        for times in counters.iter().filter(|times| times.is_expired()) {
            match self.del_times(&times.field).await {
                Ok(()) => removed += 1,
                Err(err) => warn!(
                    "Cache {}: active sweep failed to delete {}: {}",
                    self.core.times_key, times.field, err
                ),
            }
        }
        self.core.counters.record_active_removals(removed);
        removed
    }

    // == Stats ==
    pub fn stats(&self) -> SweepStats {
        self.core.counters.snapshot()
    }

    /// Number of tokens waiting in the data schedule queue.
    pub async fn pending_tokens(&self) -> usize {
        self.core.data_queue.lock().await.len()
    }
}

impl Drop for ExpiringCache {
    fn drop(&mut self) {
        for worker in &self.workers {
            worker.abort();
        }
    }
}

impl std::fmt::Debug for ExpiringCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiringCache")
            .field("data_key", &self.core.data_key)
            .field("times_key", &self.core.times_key)
            .field("options", &self.core.options)
            .finish_non_exhaustive()
    }
}

// == Lazy Sweep Worker ==
/// Pops tokens in FIFO order, waits out each entry's clear time and deletes it.
///
/// Errors and absent entries make the worker back off for `retry_interval`;
/// the token is dropped in that case.
async fn run_lazy_sweep(core: Arc<CacheCore>, kind: SweepKind) {
    let Some(queue) = core.queue(kind) else {
        return;
    };
    let key = core.hash_key(kind);
    debug!("Lazy sweep started for {}", key);

    loop {
        let token = queue.lock().await.pop();
        let Some(token) = token else {
            sleep(core.idle_interval(kind)).await;
            continue;
        };

        match core.clear_time(kind, &token.field).await {
            Ok(Some(clear_time)) => {
                if let Some(wait) = time_until(clear_time) {
                    sleep(wait).await;
                }
            }
            Ok(None) => {
                debug!("Lazy sweep {}: {} already gone", key, token);
                core.counters.record_retry();
                sleep(core.options.retry_interval).await;
                continue;
            }
            Err(err) => {
                warn!("Lazy sweep {}: failed to read {}: {}", key, token, err);
                core.counters.record_retry();
                sleep(core.options.retry_interval).await;
                continue;
            }
        }

        match core.store.hash_delete(key, &token.field).await {
            Ok(()) => {
                core.counters.record_lazy_removal();
                debug!("Lazy sweep {}: removed {}", key, token);
            }
            Err(err) => warn!("Lazy sweep {}: failed to remove {}: {}", key, token, err),
        }
    }
}
