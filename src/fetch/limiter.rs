//! The per-query fetch-limit admission counter: an atomic integer with a
//! compare-and-add `consume`, not a mutex-guarded field.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::FetchError;

/// Tracks the cumulative number of admitted single fetches against a fixed
/// `limit`, shared across a query's parallel workers.
#[derive(Debug)]
pub struct FetchLimiter {
    limit: u64,
    admitted: AtomicU64,
}

impl FetchLimiter {
    pub fn new(limit: u64) -> Self {
        FetchLimiter { limit, admitted: AtomicU64::new(0) }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn admitted(&self) -> u64 {
        self.admitted.load(Ordering::SeqCst)
    }

    /// Atomically admit `k` more fetches, or fail without mutating state if
    /// doing so would exceed `limit`.
    pub fn consume(&self, k: u64) -> Result<(), FetchError> {
        let mut current = self.admitted.load(Ordering::SeqCst);
        loop {
            let next = current.checked_add(k).filter(|&n| n <= self.limit);
            let Some(next) = next else {
                tracing::warn!(requested = k, admitted = current, limit = self.limit, "fetch limit exceeded");
                return Err(FetchError::FetchLimitExceeded { requested: k, limit: self.limit });
            };
            match self.admitted.compare_exchange_weak(current, next, Ordering::SeqCst, Ordering::SeqCst) {
                Ok(_) => return Ok(()),
                Err(observed) => current = observed,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_admits_while_under_limit() {
        let limiter = FetchLimiter::new(10);
        assert!(limiter.consume(4).is_ok());
        assert!(limiter.consume(6).is_ok());
        assert_eq!(limiter.admitted(), 10);
    }

    #[test]
    fn consume_rejects_overflow_without_mutating_state() {
        let limiter = FetchLimiter::new(10);
        limiter.consume(8).unwrap();
        let err = limiter.consume(5).unwrap_err();
        assert!(matches!(err, FetchError::FetchLimitExceeded { requested: 5, limit: 10 }));
        assert_eq!(limiter.admitted(), 8);
    }

    #[test]
    fn consume_is_atomic_under_concurrent_callers() {
        use std::sync::Arc;
        use std::thread;

        let limiter = Arc::new(FetchLimiter::new(1_000));
        let handles: Vec<_> = (0..100)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                thread::spawn(move || limiter.consume(10).is_ok())
            })
            .collect();
        let results: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.iter().all(|&ok| ok));
        assert_eq!(limiter.admitted(), 1_000);
    }
}
