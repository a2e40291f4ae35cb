//! Background reaper.
//!
//! Periodically sweeps expired records out of a [`SessionStore`] so memory
//! stays bounded by sessions issued within the last TTL plus one interval.
//!
//! The loop runs until [`ReaperHandle::shutdown`] is called or the handle is
//! dropped.

use std::sync::Arc;
use std::time::Duration;

use common::logger::{TraceId, root_span};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use crate::store::SessionStore;

/// Owner of a running reaper task.
pub struct ReaperHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ReaperHandle {
    /// Signal the loop to stop and wait for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);

        if let Err(e) = self.task.await {
            warn!(error = ?e, "session reaper task did not exit cleanly");
        }
    }
}

/// Spawn the reaper on the current tokio runtime. The first sweep runs one
/// full `every` after the call.
pub fn spawn_reaper(store: Arc<SessionStore>, every: Duration) -> ReaperHandle {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(run_reaper(store, every, shutdown_rx));

    ReaperHandle { shutdown_tx, task }
}

async fn run_reaper(store: Arc<SessionStore>, every: Duration, mut cancel: watch::Receiver<bool>) {
    let mut ticker = interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(every_ms = every.as_millis() as u64, "session reaper started");

    loop {
        tokio::select! {
            changed = cancel.changed() => {
                // A dropped handle counts as a shutdown request.
                if changed.is_err() || *cancel.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => sweep(&store),
        }
    }

    info!("session reaper stopped");
}

fn sweep(store: &SessionStore) {
    let trace_id = TraceId::default();
    let span = root_span("session_reaper_sweep", &trace_id);
    let _enter = span.enter();

    let removed = store.reap_expired();

    if removed > 0 {
        info!(removed, remaining = store.count(), "reaper swept expired sessions");
    } else {
        debug!("reaper found nothing to sweep");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::StoreConfig;
    use crate::model::Attributes;
    use chrono::TimeDelta;
    use tracing_test::traced_test;

    const EVERY: Duration = Duration::from_secs(300);

    fn store_with_clock(ttl: TimeDelta) -> (Arc<SessionStore>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let store = SessionStore::new(&StoreConfig::default().with_ttl(ttl))
            .with_clock(clock.clone());
        (Arc::new(store), clock)
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_runs_after_one_interval() {
        let (store, clock) = store_with_clock(TimeDelta::minutes(1));
        for _ in 0..5 {
            store.issue(Attributes::new()).unwrap();
        }

        let reaper = spawn_reaper(store.clone(), EVERY);
        clock.advance(TimeDelta::minutes(2));

        // Nothing happens before the first period elapses.
        tokio::time::sleep(EVERY - Duration::from_secs(1)).await;
        assert_eq!(store.count(), 5);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(store.count(), 0);

        reaper.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn live_sessions_survive_sweeps() {
        let (store, clock) = store_with_clock(TimeDelta::hours(1));
        let token = store.issue(Attributes::new()).unwrap();

        let reaper = spawn_reaper(store.clone(), EVERY);
        clock.advance(TimeDelta::minutes(10));

        tokio::time::sleep(EVERY * 2 + Duration::from_secs(1)).await;

        assert_eq!(store.count(), 1);
        assert!(store.validate(&token).is_ok());

        reaper.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_the_loop() {
        let (store, clock) = store_with_clock(TimeDelta::seconds(1));
        let reaper = spawn_reaper(store.clone(), EVERY);

        reaper.shutdown().await;

        store.issue(Attributes::new()).unwrap();
        clock.advance(TimeDelta::minutes(1));
        tokio::time::sleep(EVERY * 3).await;

        assert_eq!(store.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_stops_the_loop() {
        let (store, _clock) = store_with_clock(TimeDelta::seconds(1));
        let reaper = spawn_reaper(store.clone(), EVERY);
        let task_probe = Arc::downgrade(&store);

        drop(reaper);
        tokio::time::sleep(Duration::from_millis(1)).await;

        // The task released its clone of the store on exit.
        drop(store);
        assert!(task_probe.upgrade().is_none());
    }

    #[test]
    #[traced_test]
    fn sweep_logs_removed_count() {
        let (store, clock) = store_with_clock(TimeDelta::seconds(1));
        store.issue(Attributes::new()).unwrap();
        store.issue(Attributes::new()).unwrap();
        clock.advance(TimeDelta::seconds(5));

        sweep(&store);

        assert_eq!(store.count(), 0);
        assert!(logs_contain("reaper swept expired sessions"));
        assert!(logs_contain("removed=2"));
    }
}
