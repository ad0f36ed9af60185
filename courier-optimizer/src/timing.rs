//! Debounce and throttle helpers

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Runs only the last call made within the delay window.
///
/// Each call restarts the window; earlier calls are dropped.
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Schedule `f` to run after the delay unless another call supersedes it.
    pub fn call<F, Fut>(&self, f: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mine = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = self.generation.clone();
        let delay = self.delay;

        tokio::spawn(async move {
            sleep(delay).await;
            if generation.load(Ordering::SeqCst) == mine {
                f().await;
            }
        });
    }

    /// Drop any scheduled call.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Allows at most one call per interval, firing on the leading edge.
pub struct Throttler {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Throttler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Run `f` now if the interval has elapsed since the last run.
    pub fn call<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let now = Instant::now();
        {
            let mut last = self.last.lock();
            if let Some(previous) = *last
                && now.duration_since(previous) < self.interval
            {
                return None;
            }
            *last = Some(now);
        }
        Some(f())
    }

    pub fn reset(&self) {
        *self.last.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn test_debounce_runs_last_call_only() {
        let debouncer = Debouncer::new(Duration::from_millis(100));
        let fired = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let fired = fired.clone();
            debouncer.call(move || async move { fired.lock().push(i) });
            tokio::time::sleep(Duration::from_millis(30)).await;
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*fired.lock(), vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_cancel() {
        let debouncer = Debouncer::new(Duration::from_millis(50));
        let count = Arc::new(AtomicUsize::new(0));

        let counter = count.clone();
        debouncer.call(move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        debouncer.cancel();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_leading_edge() {
        let throttler = Throttler::new(Duration::from_millis(100));

        assert_eq!(throttler.call(|| 1), Some(1));
        assert_eq!(throttler.call(|| 2), None);

        tokio::time::advance(Duration::from_millis(60)).await;
        assert_eq!(throttler.call(|| 3), None);

        tokio::time::advance(Duration::from_millis(40)).await;
        assert_eq!(throttler.call(|| 4), Some(4));

        throttler.reset();
        assert_eq!(throttler.call(|| 5), Some(5));
    }
}
