use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time;
use tracing::debug;

use super::SessionRegistry;

/// Upper bound on how often the reaper polls.
pub const DEFAULT_REAPER_INTERVAL_SECS: u64 = 30;

/// Background task that expires idle sessions.
pub struct SessionReaper {
    registry: Arc<SessionRegistry>,
    idle_timeout: Duration,
    check_interval: Duration,
    running: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
}

impl SessionReaper {
    /// Polls every `idle_timeout / 4`, clamped to `[10ms, 30s]`.
    pub fn new(registry: Arc<SessionRegistry>, idle_timeout: Duration) -> Self {
        let check_interval = (idle_timeout / 4).clamp(
            Duration::from_millis(10),
            Duration::from_secs(DEFAULT_REAPER_INTERVAL_SECS),
        );
        Self {
            registry,
            idle_timeout,
            check_interval,
            running: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Starts the background task (no-op if already running).
    pub fn start(&self) -> tokio::task::JoinHandle<()> {
        // AcqRel: only one caller may flip running from false to true.
        if self.running.swap(true, Ordering::AcqRel) {
            return tokio::spawn(async {});
        }
        self.shutdown.store(false, Ordering::Release);

        let registry = Arc::clone(&self.registry);
        let running = Arc::clone(&self.running);
        let shutdown = Arc::clone(&self.shutdown);
        let idle_timeout = self.idle_timeout;
        let check_interval = self.check_interval;

        tokio::spawn(async move {
            let mut interval = time::interval(check_interval);
            loop {
                interval.tick().await;
                if shutdown.load(Ordering::Acquire) {
                    break;
                }
                let reaped = registry.reap_idle(idle_timeout);
                if !reaped.is_empty() {
                    debug!(users = ?reaped, "Expired sessions");
                }
            }
            running.store(false, Ordering::Release);
        })
    }

    /// Asks the task to stop at its next tick.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Release);
    }
}

impl Drop for SessionReaper {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for SessionReaper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionReaper")
            .field("idle_timeout", &self.idle_timeout)
            .field("check_interval", &self.check_interval)
            .field("running", &self.is_running())
            .finish()
    }
}
