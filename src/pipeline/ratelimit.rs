//! Per-user rate-limit window.
//!
//! Sliding window of recent update timestamps per user. The over-limit
//! entry is still recorded, so a flooding user stays rejected until old
//! entries age out (leaky-window, not token-bucket).
//!
//! Entries are pruned on every admission, but keys for users who stop
//! messaging are never purged; unbounded growth across distinct users is
//! an accepted limitation of the in-memory design.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Per-user sliding-window admission control.
#[derive(Clone)]
pub struct RateWindow {
    windows: Arc<DashMap<u64, Vec<Instant>>>,
    max_messages: usize,
    window: Duration,
}

impl RateWindow {
    pub fn new(max_messages: usize, window: Duration) -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
            max_messages,
            window,
        }
    }

    /// Record an update at `now` and decide admission.
    ///
    /// Appends unconditionally, prunes entries older than the window, and
    /// admits iff the resulting length is within the configured maximum.
    pub fn admit(&self, user_id: u64, now: Instant) -> bool {
        let mut entry = self.windows.entry(user_id).or_default();
        entry.retain(|&t| now.duration_since(t) < self.window);
        entry.push(now);
        entry.len() <= self.max_messages
    }

    /// Number of timestamps currently held for a user.
    #[cfg(test)]
    fn len(&self, user_id: u64) -> usize {
        self.windows.get(&user_id).map(|v| v.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> RateWindow {
        RateWindow::new(3, Duration::from_secs(10))
    }

    #[test]
    fn test_admits_up_to_max() {
        let w = window();
        let base = Instant::now();
        for i in 0..3 {
            assert!(w.admit(1, base + Duration::from_millis(i)), "call {} rejected", i);
        }
        assert!(!w.admit(1, base + Duration::from_millis(3)));
    }

    #[test]
    fn test_admitted_count_never_exceeds_max() {
        let w = window();
        let base = Instant::now();
        let admitted = (0..20)
            .filter(|&i| w.admit(1, base + Duration::from_millis(i)))
            .count();
        assert_eq!(admitted, 3);
    }

    #[test]
    fn test_rejected_entries_still_recorded() {
        let w = window();
        let base = Instant::now();
        for i in 0..5 {
            w.admit(1, base + Duration::from_millis(i));
        }
        // All five pushes are retained, including the rejected ones.
        assert_eq!(w.len(1), 5);
    }

    #[test]
    fn test_entries_age_out() {
        let w = window();
        let base = Instant::now();
        for i in 0..4 {
            w.admit(1, base + Duration::from_millis(i));
        }
        // Past the window the old entries are pruned and admission resumes.
        assert!(w.admit(1, base + Duration::from_secs(11)));
        assert_eq!(w.len(1), 1);
    }

    #[test]
    fn test_windows_are_per_user() {
        let w = window();
        let base = Instant::now();
        for i in 0..4 {
            w.admit(1, base + Duration::from_millis(i));
        }
        assert!(w.admit(2, base + Duration::from_millis(5)));
    }
}
