//! Periodic eviction of expired sessions and replay records.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::{ReplayCache, SessionStore};

/// Background task sweeping both stores on a fixed interval.
///
/// Lazy eviction only touches entries that are looked up again; the sweeper
/// bounds memory for sessions and IDs that never are.
pub struct Sweeper;

impl Sweeper {
    /// Spawns the sweep loop on the current tokio runtime.
    ///
    /// The loop exits once `shutdown` carries `true` or its sender is dropped.
    pub fn spawn(
        sessions: Arc<SessionStore>,
        replay: Arc<ReplayCache>,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        Self::sweep_once(&sessions, &replay);
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::debug!("store sweeper stopped");
        })
    }

    /// Runs one sweep of both stores, returning `(sessions, replay_ids)` removed.
    pub fn sweep_once(sessions: &SessionStore, replay: &ReplayCache) -> (usize, usize) {
        let expired_sessions = sessions.sweep();
        let expired_ids = replay.sweep();
        if expired_sessions > 0 || expired_ids > 0 {
            tracing::info!(
                sessions = expired_sessions,
                replay_ids = expired_ids,
                "swept expired entries"
            );
        }
        (expired_sessions, expired_ids)
    }
}
