//! Per-agent token-bucket rate limiting.
//!
//! Buckets accrue `rate` tokens per second continuously, bounded by
//! `capacity`, and each admitted check consumes one token. A denied check
//! consumes nothing. The limiter runs before policy evaluation, so it also
//! shields the oracle connection from request floods.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use tracing::debug;

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token-bucket limiter keyed by agent id.
///
/// The bucket table sits behind one mutex; the read-modify-write on a
/// bucket must be atomic per agent, and the table itself is tiny.
pub struct RateLimiter {
    capacity: f64,
    rate: f64,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    /// Build a limiter with `capacity` burst tokens refilling at
    /// `rate_per_sec` tokens per second. New agents start with a full
    /// bucket.
    pub fn new(capacity: f64, rate_per_sec: f64) -> Self {
        Self {
            capacity,
            rate: rate_per_sec,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Admit or deny one request for `agent_id` at the current clock.
    pub fn allowed(&self, agent_id: &str) -> bool {
        self.allowed_at(agent_id, Instant::now())
    }

    /// Admit or deny at an explicit clock. Exposed for deterministic tests;
    /// `now` must never move backwards for a given agent.
    pub fn allowed_at(&self, agent_id: &str, now: Instant) -> bool {
        let mut buckets = self.buckets.lock().expect("rate limit lock poisoned");

        let bucket = buckets.entry(agent_id.to_string()).or_insert(Bucket {
            tokens: self.capacity,
            last_refill: now,
        });

        let elapsed = now.saturating_duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.rate).min(self.capacity);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            debug!(agent_id, tokens = bucket.tokens, "rate limit denied");
            false
        }
    }
}
