//! Per-host request throttling.
//!
//! One token bucket per hostname, created lazily on first use. The registry
//! lock is held only long enough to reserve the next permit slot, so waiting
//! for one host never delays acquisition for another.

use log::debug;
use std::collections::HashMap;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

const DEFAULT_IDLE_EVICTION: Duration = Duration::from_secs(10 * 60);
const DEFAULT_MAX_ENTRIES: usize = 1000;

struct HostBucket {
    next_slot: Instant,
    last_used: Instant,
}

pub struct RateLimiterRegistry {
    buckets: Mutex<HashMap<String, HostBucket>>,
    interval: Duration,
    idle_eviction: Duration,
    max_entries: usize,
}

impl RateLimiterRegistry {
    /// Creates a registry granting `permits_per_second` to each hostname.
    pub fn new(permits_per_second: f64) -> Self {
        Self::with_limits(
            permits_per_second,
            DEFAULT_IDLE_EVICTION,
            DEFAULT_MAX_ENTRIES,
        )
    }

    pub fn with_limits(
        permits_per_second: f64,
        idle_eviction: Duration,
        max_entries: usize,
    ) -> Self {
        let rate = if permits_per_second > 0.0 {
            permits_per_second
        } else {
            2.0
        };
        Self {
            buckets: Mutex::new(HashMap::new()),
            interval: Duration::from_secs_f64(1.0 / rate),
            idle_eviction,
            max_entries: max_entries.max(1),
        }
    }

    /// Blocks the calling worker until the host's next permit is due. The
    /// first permit for a host is granted immediately.
    pub fn acquire(&self, hostname: &str) {
        let slot = {
            let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());
            let now = Instant::now();
            Self::evict(
                &mut buckets,
                now,
                self.idle_eviction,
                self.max_entries,
                hostname,
            );
            let bucket = buckets.entry(hostname.to_string()).or_insert(HostBucket {
                next_slot: now,
                last_used: now,
            });
            let slot = bucket.next_slot.max(now);
            bucket.next_slot = slot + self.interval;
            bucket.last_used = now;
            slot
        };
        let now = Instant::now();
        if slot > now {
            debug!("Throttling {hostname} for {:?}", slot - now);
            thread::sleep(slot - now);
        }
    }

    /// Number of live buckets; exposed for eviction monitoring.
    pub fn len(&self) -> usize {
        self.buckets
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict(
        buckets: &mut HashMap<String, HostBucket>,
        now: Instant,
        idle_eviction: Duration,
        max_entries: usize,
        incoming: &str,
    ) {
        buckets.retain(|_, b| now.duration_since(b.last_used) < idle_eviction);
        // bound the registry; oldest-unused buckets go first
        while buckets.len() >= max_entries && !buckets.contains_key(incoming) {
            let oldest = buckets
                .iter()
                .min_by_key(|(_, b)| b.last_used)
                .map(|(host, _)| host.clone());
            match oldest {
                Some(host) => {
                    debug!("Evicting rate limiter for {host}");
                    buckets.remove(&host);
                }
                None => break,
            }
        }
    }
}
