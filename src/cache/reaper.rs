//! Contains the background task which removes expired entries.
//!
//! The reaper is a single cooperative task per cache. Its life cycle strictly
//! follows the occupancy of the cache: it is armed when the first entry is
//! inserted, sleeps for the configured polling interval, performs a sweep and
//! stands down on its own once the cache runs empty. The next insert into an
//! empty cache arms a fresh task.
//!
//! Every armed task is bound to a [ReaperToken]. Cancelling the token (because
//! the cache was cleared, disposed, polling was stopped or the interval was
//! replaced) terminates the task at its next suspension point. A task never
//! outlives its token: whenever a new task is required, a new token is created
//! as well, therefore a stale task can always detect that it has been replaced.
//!
//! The task deliberately holds only a weak reference to the cache. Dropping the
//! cache is therefore never delayed by its reaper and is observed by the task
//! as a termination condition.
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::Notify;

use crate::cache::ttl_cache::Shared;

/// Links an armed reaper task with the cache which spawned it.
///
/// The token is the only channel between the two: the cache cancels it to shut
/// the task down, the task polls it at every suspension point.
pub(crate) struct ReaperToken {
    cancelled: AtomicBool,
    wakeup: Notify,
}

impl ReaperToken {
    /// Creates a token for a freshly armed task.
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(ReaperToken {
            cancelled: AtomicBool::new(false),
            wakeup: Notify::new(),
        })
    }

    /// Requests the associated task to terminate.
    ///
    /// The flag is raised before the wakeup so that the task observes the
    /// cancellation no matter whether it is currently sleeping or sweeping.
    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.wakeup.notify_one();
    }

    /// Determines if [cancel](ReaperToken::cancel) has been invoked.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Resolves once the token has been cancelled.
    ///
    /// Relies on the permit stored by `notify_one`, therefore a cancellation
    /// which happens before this is first awaited is still observed.
    async fn cancelled(&self) {
        while !self.is_cancelled() {
            self.wakeup.notified().await;
        }
    }
}

/// Spawns the reaper task for the given cache.
///
/// The task sleeps for `interval`, then removes all expired entries from the
/// cache and repeats. It terminates once its token is cancelled, once the cache
/// has been dropped or disposed, or once a sweep leaves the cache empty.
///
/// Note that this must be invoked from within a tokio runtime.
pub(crate) fn spawn<K, V>(cache: Weak<Shared<K, V>>, interval: Duration, token: Arc<ReaperToken>)
where
    K: Eq + Hash + Send + 'static,
    V: Send + 'static,
{
    let _ = tokio::spawn(async move {
        log::debug!("Cache reaper armed (sweeping every {:?})...", interval);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }

            // The token might have been cancelled while the sweep of the
            // previous tick was still running, therefore check again before
            // touching the cache...
            if token.is_cancelled() {
                break;
            }

            let cache = match cache.upgrade() {
                Some(cache) => cache,
                None => break,
            };

            if !cache.sweep(&token) {
                break;
            }
        }

        log::debug!("Cache reaper terminated.");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancelling_wakes_a_waiting_task() {
        let token = ReaperToken::new();
        let waiter = {
            let token = token.clone();
            tokio::spawn(async move {
                token.cancelled().await;
            })
        };

        // The task keeps waiting as long as nobody cancels...
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        // ...and wakes up promptly once we do.
        token.cancel();
        waiter.await.unwrap();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn early_cancellations_are_not_lost() {
        let token = ReaperToken::new();
        token.cancel();

        // Must resolve immediately even though the cancel happened before
        // anybody was waiting...
        token.cancelled().await;
        assert!(token.is_cancelled());
    }
}
