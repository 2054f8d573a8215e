// Per-user command cooldowns
//
// The cooldown key is the user id alone: one clock per user, shared by
// every command and every guild.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use tokio::sync::Mutex;
use tracing::debug;

/// Outcome of a cooldown check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cooldown {
    Allowed,
    /// Whole seconds left before the next accepted invocation
    Throttled { remaining_secs: u64 },
}

/// Tracks the last accepted invocation per user.
///
/// Bounded by an LRU so the map can't grow for the life of the process; the
/// least recently seen users are forgotten first.
pub struct RateLimiter {
    last_used: Mutex<LruCache<u64, Instant>>,
}

impl RateLimiter {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            last_used: Mutex::new(LruCache::new(capacity)),
        }
    }

    #[allow(dead_code)]
    pub async fn check(&self, user_id: u64, cooldown: Duration) -> Cooldown {
        self.check_at(user_id, cooldown, Instant::now()).await
    }

    /// Check and, when allowed, record `now` as the user's last invocation.
    ///
    /// Throttled checks leave the stored timestamp alone so retrying doesn't
    /// extend the wait. The lookup and the insert happen under one lock.
    pub async fn check_at(&self, user_id: u64, cooldown: Duration, now: Instant) -> Cooldown {
        let mut last_used = self.last_used.lock().await;

        if let Some(&last) = last_used.get(&user_id) {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < cooldown {
                let remaining_secs = cooldown.as_secs().saturating_sub(elapsed.as_secs());
                return Cooldown::Throttled { remaining_secs };
            }
        }

        last_used.put(user_id, now);
        Cooldown::Allowed
    }

    /// Forget users whose last invocation is at least `max_age` old
    pub async fn prune(&self, now: Instant, max_age: Duration) -> usize {
        let mut last_used = self.last_used.lock().await;
        let stale: Vec<u64> = last_used
            .iter()
            .filter(|(_, at)| now.saturating_duration_since(**at) >= max_age)
            .map(|(user, _)| *user)
            .collect();

        for user in &stale {
            last_used.pop(user);
        }

        if !stale.is_empty() {
            debug!("Pruned {} cooldown entries", stale.len());
        }
        stale.len()
    }

    #[allow(dead_code)]
    pub async fn len(&self) -> usize {
        self.last_used.lock().await.len()
    }

    pub async fn clear(&self) {
        self.last_used.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const COOLDOWN: Duration = Duration::from_secs(30);

    #[tokio::test]
    async fn test_cooldown_sequence() {
        let limiter = RateLimiter::new(100);
        let t0 = Instant::now();

        assert_eq!(limiter.check_at(1, COOLDOWN, t0).await, Cooldown::Allowed);
        assert_eq!(
            limiter.check_at(1, COOLDOWN, t0 + Duration::from_secs(10)).await,
            Cooldown::Throttled { remaining_secs: 20 }
        );
        assert_eq!(
            limiter.check_at(1, COOLDOWN, t0 + Duration::from_secs(30)).await,
            Cooldown::Allowed
        );
    }

    #[tokio::test]
    async fn test_throttled_check_does_not_extend_wait() {
        let limiter = RateLimiter::new(100);
        let t0 = Instant::now();

        limiter.check_at(1, COOLDOWN, t0).await;
        for secs in [5, 15, 29] {
            assert!(matches!(
                limiter.check_at(1, COOLDOWN, t0 + Duration::from_secs(secs)).await,
                Cooldown::Throttled { .. }
            ));
        }
        assert_eq!(
            limiter.check_at(1, COOLDOWN, t0 + Duration::from_secs(30)).await,
            Cooldown::Allowed
        );
    }

    #[tokio::test]
    async fn test_partial_seconds_round_remaining_up() {
        let limiter = RateLimiter::new(100);
        let t0 = Instant::now();

        limiter.check_at(1, COOLDOWN, t0).await;
        assert_eq!(
            limiter.check_at(1, COOLDOWN, t0 + Duration::from_millis(29_500)).await,
            Cooldown::Throttled { remaining_secs: 1 }
        );
    }

    #[tokio::test]
    async fn test_users_are_independent() {
        let limiter = RateLimiter::new(100);
        let t0 = Instant::now();

        assert_eq!(limiter.check_at(1, COOLDOWN, t0).await, Cooldown::Allowed);
        assert_eq!(limiter.check_at(2, COOLDOWN, t0).await, Cooldown::Allowed);
        assert!(matches!(
            limiter.check_at(1, COOLDOWN, t0).await,
            Cooldown::Throttled { .. }
        ));
    }

    #[tokio::test]
    async fn test_zero_cooldown_always_allows() {
        let limiter = RateLimiter::new(100);
        let t0 = Instant::now();

        assert_eq!(limiter.check_at(1, Duration::ZERO, t0).await, Cooldown::Allowed);
        assert_eq!(limiter.check_at(1, Duration::ZERO, t0).await, Cooldown::Allowed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checks_allow_once() {
        let limiter = Arc::new(RateLimiter::new(100));
        let now = Instant::now();

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.check_at(7, COOLDOWN, now).await })
            })
            .collect();

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap() == Cooldown::Allowed {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 1);
    }

    #[tokio::test]
    async fn test_capacity_bounds_entries() {
        let limiter = RateLimiter::new(2);
        let t0 = Instant::now();

        limiter.check_at(1, COOLDOWN, t0).await;
        limiter.check_at(2, COOLDOWN, t0).await;
        limiter.check_at(3, COOLDOWN, t0).await;
        assert_eq!(limiter.len().await, 2);

        // user 1 was evicted, so it starts fresh
        assert_eq!(limiter.check_at(1, COOLDOWN, t0).await, Cooldown::Allowed);
    }

    #[tokio::test]
    async fn test_prune_and_clear() {
        let limiter = RateLimiter::new(100);
        let t0 = Instant::now();

        limiter.check_at(1, COOLDOWN, t0).await;
        limiter.check_at(2, COOLDOWN, t0 + Duration::from_secs(50)).await;

        let pruned = limiter
            .prune(t0 + Duration::from_secs(60), Duration::from_secs(60))
            .await;
        assert_eq!(pruned, 1);
        assert_eq!(limiter.len().await, 1);

        limiter.clear().await;
        assert_eq!(limiter.len().await, 0);
    }
}
