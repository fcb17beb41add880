//! Per-user sliding-window rate limiter.
//!
//! Every user gets a ring of at most `max_requests` instants. A request is
//! allowed while fewer than `max_requests` of them fall inside the trailing
//! window; instants older than the window are pruned when the user is checked.
//! Only allowed requests are recorded.

use dashmap::DashMap;
use serenity::model::id::UserId;
use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};
use tracing::debug;

pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    records: DashMap<UserId, VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests: max_requests as usize,
            window,
            records: DashMap::new(),
        }
    }

    /// Checks and records a request made now.
    pub fn allow(&self, user_id: UserId) -> bool {
        self.allow_at(user_id, Instant::now())
    }

    pub fn allow_at(&self, user_id: UserId, now: Instant) -> bool {
        if self.max_requests == 0 {
            return false;
        }

        let mut record = self
            .records
            .entry(user_id)
            .or_default();

        while let Some(oldest) = record.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                record.pop_front();
            } else {
                break;
            }
        }

        if record.len() >= self.max_requests {
            debug!("⏳ Usuario {} limitado ({} en ventana)", user_id, record.len());
            return false;
        }

        record.push_back(now);
        true
    }

    /// Drops users whose whole record has left the window.
    pub fn prune(&self) {
        let now = Instant::now();
        self.records.retain(|_, record| {
            record
                .back()
                .is_some_and(|last| now.saturating_duration_since(*last) < self.window)
        });
    }

    pub fn tracked_users(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    #[test]
    fn test_request_after_ceiling_is_denied() {
        let limiter = RateLimiter::new(3, WINDOW);
        let user = UserId::new(1);
        let start = Instant::now();

        for i in 0..3 {
            assert!(limiter.allow_at(user, start + Duration::from_secs(i)));
        }
        assert!(!limiter.allow_at(user, start + Duration::from_secs(10)));
        assert!(!limiter.allow_at(user, start + Duration::from_secs(59)));
    }

    #[test]
    fn test_window_slides() {
        let limiter = RateLimiter::new(2, WINDOW);
        let user = UserId::new(1);
        let start = Instant::now();

        assert!(limiter.allow_at(user, start));
        assert!(limiter.allow_at(user, start + Duration::from_secs(30)));
        assert!(!limiter.allow_at(user, start + Duration::from_secs(45)));

        // The first request has left the window, the second has not.
        assert!(limiter.allow_at(user, start + Duration::from_secs(60)));
        assert!(!limiter.allow_at(user, start + Duration::from_secs(61)));
    }

    #[test]
    fn test_denied_requests_are_not_recorded() {
        let limiter = RateLimiter::new(1, WINDOW);
        let user = UserId::new(1);
        let start = Instant::now();

        assert!(limiter.allow_at(user, start));
        for secs in 1..60 {
            assert!(!limiter.allow_at(user, start + Duration::from_secs(secs)));
        }
        assert!(limiter.allow_at(user, start + Duration::from_secs(60)));
    }

    #[test]
    fn test_users_are_independent() {
        let limiter = RateLimiter::new(1, WINDOW);
        let start = Instant::now();

        assert!(limiter.allow_at(UserId::new(1), start));
        assert!(limiter.allow_at(UserId::new(2), start));
        assert!(!limiter.allow_at(UserId::new(1), start));
    }

    #[test]
    fn test_zero_ceiling_denies_everything() {
        let limiter = RateLimiter::new(0, WINDOW);
        assert!(!limiter.allow(UserId::new(1)));
    }

    #[test]
    fn test_ring_grows_on_demand() {
        let limiter = RateLimiter::new(50_000_000, WINDOW);
        let user = UserId::new(1);
        let start = Instant::now();

        for i in 0..3 {
            assert!(limiter.allow_at(user, start + Duration::from_millis(i)));
        }

        let record = limiter.records.get(&user).unwrap();
        assert_eq!(record.len(), 3);
        assert!(record.capacity() < 1024, "capacity {}", record.capacity());
    }

    #[test]
    fn test_prune_keeps_recent_users() {
        let limiter = RateLimiter::new(5, WINDOW);
        limiter.allow(UserId::new(1));
        limiter.prune();
        assert_eq!(limiter.tracked_users(), 1);
    }
}
