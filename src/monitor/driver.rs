use std::time::Duration;

use tokio::task::JoinHandle;

use super::ExpirationMonitor;
use super::schedule::Wake;
use crate::clock::Clock;

/// Running monitor. Dropping or stopping it clears both timers.
#[derive(Debug)]
pub struct MonitorHandle {
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Stops the monitor; a pending interval or one-shot re-check never runs.
    pub fn stop(mut self) {
        self.abort();
    }

    /// `true` once the monitor disarmed itself (no token, or expiry handled).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Activates `monitor` on the current tokio runtime.
///
/// With `check_immediately` the first check runs synchronously, before this
/// function returns. Later checks are strictly sequential.
#[must_use = "dropping the handle stops the monitor"]
pub fn spawn<C: Clock>(mut monitor: ExpirationMonitor<C>) -> MonitorHandle {
    let interval_ms = monitor.config.interval_ms;
    let first = if monitor.config.check_immediately {
        let outcome = monitor.check();
        monitor.next_wake(outcome)
    } else {
        Wake::After(interval_ms)
    };

    let Wake::After(first_ms) = first else {
        tracing::debug!("Token monitor idle after initial check");
        return MonitorHandle { task: None };
    };

    let task = tokio::spawn(async move {
        let mut wait_ms = first_ms;
        loop {
            tokio::time::sleep(to_duration(wait_ms)).await;
            let outcome = monitor.check();
            match monitor.next_wake(outcome) {
                Wake::After(ms) => wait_ms = ms,
                Wake::Disarm => {
                    tracing::debug!(?outcome, "Token monitor disarmed");
                    break;
                }
            }
        }
    });

    MonitorHandle { task: Some(task) }
}

fn to_duration(ms: i64) -> Duration {
    Duration::from_millis(u64::try_from(ms).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use tokio::time::Instant;

    use super::*;
    use crate::clock::Millis;
    use crate::monitor::MonitorConfig;
    use crate::session::SessionState;
    use crate::token::token_expiring_at;
    use crate::types::{UserId, UserProfile};

    const BASE: Millis = 1_700_000_000_000;

    /// Wall clock that follows tokio's (pausable) time.
    struct TokioClock {
        start: Instant,
    }

    impl Clock for TokioClock {
        fn now_ms(&self) -> Millis {
            BASE + Millis::try_from(self.start.elapsed().as_millis()).unwrap()
        }
    }

    fn session_expiring_in(ms: Millis) -> Arc<SessionState> {
        let session = SessionState::in_memory();
        session
            .establish(&token_expiring_at(BASE + ms), &UserProfile::new(UserId(1), "A"))
            .unwrap();
        Arc::new(session)
    }

    #[tokio::test(start_paused = true)]
    async fn tightens_polling_then_fires_once() {
        let start = Instant::now();
        let fired_at = Arc::new(Mutex::new(Vec::new()));
        let sink = fired_at.clone();

        // 150 s left: regular tick at 60 s, then a 30 s one-shot hits the
        // 60 s margin exactly at 90 s.
        let monitor = ExpirationMonitor::new(
            session_expiring_in(150_000),
            TokioClock { start },
            MonitorConfig::default(),
        )
        .on_expire(move |_| sink.lock().unwrap().push(start.elapsed()));

        let handle = spawn(monitor);
        tokio::time::sleep(Duration::from_secs(600)).await;

        assert_eq!(*fired_at.lock().unwrap(), vec![Duration::from_secs(90)]);
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_check_runs_before_spawn_returns() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let session = session_expiring_in(30_000);

        let handle = spawn(
            ExpirationMonitor::new(
                session.clone(),
                TokioClock { start: Instant::now() },
                MonitorConfig::default(),
            )
            .on_expire(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(handle.is_finished());
        assert_eq!(session.token(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn deferred_first_check_waits_for_interval() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let session = session_expiring_in(30_000);

        let _handle = spawn(
            ExpirationMonitor::new(
                session.clone(),
                TokioClock { start: Instant::now() },
                MonitorConfig::default().with_check_immediately(false),
            )
            .on_expire(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_pending_checks() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let session = session_expiring_in(150_000);

        let handle = spawn(
            ExpirationMonitor::new(
                session.clone(),
                TokioClock { start: Instant::now() },
                MonitorConfig::default(),
            )
            .on_expire(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        handle.stop();

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(session.token().is_some());
    }

    #[tokio::test]
    async fn no_token_never_spawns() {
        let handle = spawn(ExpirationMonitor::new(
            Arc::new(SessionState::in_memory()),
            crate::clock::SystemClock,
            MonitorConfig::default(),
        ));
        assert!(handle.is_finished());
    }
}
