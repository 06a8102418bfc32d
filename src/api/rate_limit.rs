use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration
};
use tokio::{sync::Mutex as AsyncMutex, time::Instant};

struct BucketState {
    window_start: Instant,
    used: u32
}

/// Sliding-window request limiter keyed by a logical bucket name.
///
/// Callers that cannot acquire capacity suspend until the window rolls over
/// rather than erroring. Each bucket has its own state and mutex, so waiting
/// on a full bucket never stalls callers of a different bucket.
pub struct RateLimiter {
    capacity: u32,
    window: Duration,
    buckets: Mutex<HashMap<String, Arc<AsyncMutex<BucketState>>>>
}

impl RateLimiter {
    pub fn new(capacity: u32, window: Duration) -> RateLimiter {
        RateLimiter {
            capacity,
            window,
            buckets: Mutex::new(HashMap::new())
        }
    }

    pub fn per_minute(capacity: u32) -> RateLimiter {
        Self::new(capacity, Duration::from_secs(60))
    }

    fn bucket(&self, name: &str) -> Arc<AsyncMutex<BucketState>> {
        let mut buckets = self.buckets.lock().expect("bucket map poisoned");
        buckets
            .entry(name.to_owned())
            .or_insert_with(|| {
                Arc::new(AsyncMutex::new(BucketState {
                    window_start: Instant::now(),
                    used: 0
                }))
            })
            .clone()
    }

    /// Suspends until one unit of capacity is available in the bucket, then
    /// consumes it.
    pub async fn acquire(&self, bucket: &str) {
        let state = self.bucket(bucket);

        loop {
            let wait = {
                let mut state = state.lock().await;
                let now = Instant::now();

                if now.duration_since(state.window_start) >= self.window {
                    state.window_start = now;
                    state.used = 0;
                }

                if state.used < self.capacity {
                    state.used += 1;
                    return;
                }

                self.window - now.duration_since(state.window_start)
            };

            tokio::time::sleep(wait).await;
        }
    }
}
