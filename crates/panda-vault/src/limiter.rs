//! Fixed-window rate limiter for decrypt calls.

use std::time::Duration;

/// Fixed-window counter.
///
/// The window starts on the first acquisition and resets wholesale once
/// its duration has fully elapsed, not entry by entry.
/// A rejected acquisition does not consume a token.
#[derive(Debug)]
pub(crate) struct RateWindow<I> {
    max: u32,
    window: Duration,
    started: Option<I>,
    count: u32,
}

impl<I> RateWindow<I>
where
    I: Copy + Ord + std::ops::Sub<Output = Duration>,
{
    pub(crate) fn new(max: u32, window: Duration) -> Self {
        Self { max, window, started: None, count: 0 }
    }

    /// Try to take a token at `now`. Returns `false` when the window is
    /// exhausted.
    pub(crate) fn try_acquire(&mut self, now: I) -> bool {
        match self.started {
            Some(start) if now - start < self.window => {
                if self.count >= self.max {
                    return false;
                }
                self.count += 1;
                true
            },
            // First acquisition, or the window rolled over: start fresh.
            _ => {
                self.started = Some(now);
                self.count = 1;
                true
            },
        }
    }

    /// Forget all window state (explicit clearKeys or teardown).
    pub(crate) fn reset(&mut self) {
        self.started = None;
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    fn at(secs: u64) -> Duration {
        Duration::from_secs(secs)
    }

    #[test]
    fn allows_up_to_max_within_window() {
        let mut limiter = RateWindow::new(3, WINDOW);

        assert!(limiter.try_acquire(at(0)));
        assert!(limiter.try_acquire(at(1)));
        assert!(limiter.try_acquire(at(2)));
        assert!(!limiter.try_acquire(at(3)));
    }

    #[test]
    fn rejection_does_not_consume_a_token() {
        let mut limiter = RateWindow::new(2, WINDOW);

        assert!(limiter.try_acquire(at(0)));
        assert!(limiter.try_acquire(at(0)));

        // Hammering the exhausted window changes nothing.
        for _ in 0..10 {
            assert!(!limiter.try_acquire(at(5)));
        }

        // After rollover the full quota is available again.
        assert!(limiter.try_acquire(at(60)));
        assert!(limiter.try_acquire(at(61)));
        assert!(!limiter.try_acquire(at(62)));
    }

    #[test]
    fn window_resets_wholesale_not_sliding() {
        let mut limiter = RateWindow::new(2, WINDOW);

        assert!(limiter.try_acquire(at(0)));
        assert!(limiter.try_acquire(at(59)));
        assert!(!limiter.try_acquire(at(59)));

        // 60s after the window started, everything is forgotten at once.
        assert!(limiter.try_acquire(at(60)));
    }

    #[test]
    fn reset_clears_all_state() {
        let mut limiter = RateWindow::new(1, WINDOW);

        assert!(limiter.try_acquire(at(0)));
        assert!(!limiter.try_acquire(at(1)));

        limiter.reset();

        assert!(limiter.try_acquire(at(2)));
    }
}
