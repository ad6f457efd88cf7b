use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Refill state for one client IP.
struct Bucket {
    tokens: f64,
    updated: Instant,
}

/// Token-bucket rate limiter for the public lookup endpoints, one bucket per
/// client IP. Lookups fan out to several upstream calls each, so the cap here
/// also bounds the load we put on the Roblox APIs.
pub struct IpRateLimiter {
    buckets: Mutex<HashMap<IpAddr, Bucket>>,
    burst: f64,
    per_sec: f64,
}

impl IpRateLimiter {
    pub fn new(burst: f64, per_sec: f64) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            burst,
            per_sec,
        }
    }

    /// Take one token for this IP. `false` means the caller is over its limit.
    pub async fn allow(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;
        let bucket = buckets.entry(ip).or_insert(Bucket {
            tokens: self.burst,
            updated: now,
        });

        let refilled = now.duration_since(bucket.updated).as_secs_f64() * self.per_sec;
        bucket.tokens = (bucket.tokens + refilled).min(self.burst);
        bucket.updated = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Drop buckets idle longer than `max_idle`.
    pub async fn sweep(&self, max_idle: Duration) {
        let now = Instant::now();
        self.buckets
            .lock()
            .await
            .retain(|_, b| now.duration_since(b.updated) < max_idle);
    }

    #[cfg(test)]
    async fn tracked_ips(&self) -> usize {
        self.buckets.lock().await.len()
    }
}
