//! Resettable idle deadline.

use std::time::Duration;

use tokio::time::Instant;

/// Used when `now + window` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Deadline that moves forward every time activity is seen.
///
/// A buffering task flushes once `deadline()` passes without a `touch()`.
#[derive(Debug, Clone, Copy)]
pub struct IdleDeadline {
    window: Duration,
    deadline: Instant,
}

impl IdleDeadline {
    /// Start a deadline one window from now.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: after(window),
        }
    }

    /// Record activity; the deadline becomes one window from now.
    pub fn touch(&mut self) {
        self.deadline = after(self.window);
    }

    /// Current deadline.
    #[must_use]
    pub const fn deadline(&self) -> Instant {
        self.deadline
    }
}

fn after(window: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(window)
        .unwrap_or_else(|| now + window.min(FAR_FUTURE))
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(900);

    #[tokio::test(start_paused = true)]
    async fn deadline_is_one_window_out() {
        let start = Instant::now();
        let deadline = IdleDeadline::new(WINDOW);
        assert_eq!(deadline.deadline(), start + WINDOW);
    }

    #[tokio::test(start_paused = true)]
    async fn touch_restarts_window() {
        let mut deadline = IdleDeadline::new(WINDOW);
        tokio::time::advance(Duration::from_secs(600)).await;

        deadline.touch();
        assert_eq!(deadline.deadline(), Instant::now() + WINDOW);
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_window_does_not_overflow() {
        let start = Instant::now();
        let mut deadline = IdleDeadline::new(Duration::MAX);
        assert!(deadline.deadline() >= start + Duration::from_secs(86_400 * 365));

        deadline.touch();
        assert!(deadline.deadline() >= start + Duration::from_secs(86_400 * 365));
    }
}
