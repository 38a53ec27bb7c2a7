//! Fixed-interval polling.
//!
//! The server has no push channel, so screens that wait on it run a
//! [`Poll`] implementation on a timer. The first tick fires immediately.

use std::ops::ControlFlow;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};

/// Shortest period a poll runs at. Shorter periods, zero included, are
/// raised to this.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

#[async_trait]
pub trait Poll: Send + 'static {
    /// One poll. Returning `Break` stops the timer for good.
    async fn tick(&mut self) -> ControlFlow<()>;
}

/// Owns a running poll task. Dropping the handle cancels the task, including
/// any request it has in flight.
#[derive(Debug)]
pub struct PollHandle {
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Waits until the poll breaks on its own or is cancelled.
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if e.is_panic() {
                    error!("💥 Poll task panicked: {}", e);
                }
            }
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub fn spawn<P: Poll>(period: Duration, mut poll: P) -> PollHandle {
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period.max(MIN_PERIOD));
        // slow polls push later ticks back
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if poll.tick().await.is_break() {
                debug!("⏹️ Poll stopped");
                break;
            }
        }
    });
    PollHandle { task: Some(task) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counter {
        ticks: Arc<AtomicUsize>,
        stop_after: usize,
    }

    #[async_trait]
    impl Poll for Counter {
        async fn tick(&mut self) -> ControlFlow<()> {
            let n = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= self.stop_after {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stops_ticking_after_break() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let handle = spawn(
            Duration::from_secs(3),
            Counter {
                ticks: ticks.clone(),
                stop_after: 3,
            },
        );
        handle.join().await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_period_still_polls() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let handle = spawn(
            Duration::ZERO,
            Counter {
                ticks: ticks.clone(),
                stop_after: 3,
            },
        );
        handle.join().await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_cancels() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let handle = spawn(
            Duration::from_secs(3),
            Counter {
                ticks: ticks.clone(),
                stop_after: usize::MAX,
            },
        );
        tokio::time::sleep(Duration::from_millis(6500)).await;
        let seen = ticks.load(Ordering::SeqCst);
        assert_eq!(seen, 3); // t = 0, 3, 6

        drop(handle);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), seen);
    }
}
