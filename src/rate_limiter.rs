use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Sliding-window rate limiter shared across concurrent pipeline runs.
/// Acquiring a slot is an atomic check-and-increment over the window of
/// recent timestamps; entries older than the window are pruned on every
/// call.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    timestamps: Mutex<Vec<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        RateLimiter {
            max_requests,
            window,
            timestamps: Mutex::new(Vec::new()),
        }
    }

    /// Try to take a request slot. Returns false when the window is full;
    /// callers skip the request rather than queue or retry.
    pub fn acquire(&self) -> bool {
        let now = Instant::now();
        let mut timestamps = match self.timestamps.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        timestamps.retain(|t| now.duration_since(*t) < self.window);
        if timestamps.len() >= self.max_requests {
            return false;
        }
        timestamps.push(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_up_to_limit() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        assert!(limiter.acquire());
        assert!(limiter.acquire());
        assert!(limiter.acquire());
        assert!(!limiter.acquire());
    }

    #[test]
    fn test_window_expiry_frees_slots() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20));
        assert!(limiter.acquire());
        assert!(!limiter.acquire());
        std::thread::sleep(Duration::from_millis(30));
        assert!(limiter.acquire());
    }

    #[test]
    fn test_concurrent_acquire() {
        use std::sync::Arc;

        let limiter = Arc::new(RateLimiter::new(4, Duration::from_secs(60)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || limiter.acquire())
            })
            .collect();
        let granted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|granted| *granted)
            .count();
        assert_eq!(granted, 4);
    }
}
