//! Idle-shutdown watchdog for the hosting process. The bundled desktop
//! shell pings `/heartbeat` while its window is open; once the pings stop,
//! the server has no reason to keep running.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::info;

/// Tracks the last received heartbeat. Mutated only through
/// [`record_activity`](Watchdog::record_activity); the monitor loop only
/// reads.
pub struct Watchdog {
    last_activity: Mutex<Instant>,
    grace: Duration,
    idle_limit: Duration,
}

impl Watchdog {
    pub fn new(grace: Duration, idle_limit: Duration) -> Self {
        Self {
            last_activity: Mutex::new(Instant::now()),
            grace,
            idle_limit,
        }
    }

    /// Marks the process as active. Called from the heartbeat route.
    pub fn record_activity(&self) {
        if let Ok(mut last) = self.last_activity.lock() {
            *last = Instant::now();
        }
    }

    /// Time since the last recorded heartbeat.
    pub fn idle_for(&self) -> Duration {
        self.last_activity
            .lock()
            .map(|last| last.elapsed())
            .unwrap_or_default()
    }

    pub fn expired(&self) -> bool {
        self.idle_for() > self.idle_limit
    }

    /// Monitor loop for a dedicated thread: waits out the startup grace
    /// period, then polls once a second and terminates the process when the
    /// idle window lapses.
    pub fn run(&self) -> ! {
        info!(
            grace_secs = self.grace.as_secs(),
            idle_secs = self.idle_limit.as_secs(),
            "activity monitor started"
        );
        std::thread::sleep(self.grace);
        loop {
            std::thread::sleep(Duration::from_secs(1));
            if self.expired() {
                info!(
                    idle_secs = self.idle_for().as_secs(),
                    "no heartbeat received, shutting down"
                );
                std::process::exit(0);
            }
        }
    }
}
