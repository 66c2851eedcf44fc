//! Background revalidation: a periodic tick and a visibility signal from the
//! host, both funneled into the store's validate operation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::store::SessionStore;

/// How often an authenticated session is re-checked in the background.
pub const REVALIDATE_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Owns the timer task. Both triggers fire only while the session is
/// authenticated, and the task is torn down on `stop` or drop so no periodic
/// work leaks past the session's lifetime.
pub struct RevalidationDriver {
    visibility: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl RevalidationDriver {
    pub fn start(store: SessionStore, interval: Duration) -> Self {
        let visibility = Arc::new(Notify::new());
        let signal = visibility.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick completes immediately; consume it so the loop
            // waits a full interval before the first periodic check.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = signal.notified() => {}
                }

                if store.snapshot().is_authenticated {
                    store.trigger_validate();
                }
            }
        });

        Self { visibility, handle }
    }

    /// Host hook: call when the tab regains visibility.
    pub fn notify_visible(&self) {
        self.visibility.notify_one();
    }

    /// Tear the background task down.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for RevalidationDriver {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
