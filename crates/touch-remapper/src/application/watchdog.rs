//! Health Watchdog: out-of-band liveness check of the event tap.
//!
//! The host can disable the tap without telling the callback, for example
//! after a burst of slow callbacks or while secure input is active.  Once that
//! happens no further events arrive, so the callback can never notice.  The
//! watchdog polls the tap's enabled flag on its own timer on the surface
//! context, re-enables a disabled tap, and keeps counters for the status
//! bridge.  It never touches event processing.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::application::error::TouchError;
use crate::infrastructure::event_tap::TapControl;

/// Shortest period the watchdog will poll at.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Read-only health counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchdogState {
    pub is_healthy: bool,
    /// Silent disables detected so far.
    pub disable_count: u64,
    pub last_disable_time: Option<SystemTime>,
    pub checks_performed: u64,
}

impl Default for WatchdogState {
    fn default() -> Self {
        Self {
            is_healthy: true,
            disable_count: 0,
            last_disable_time: None,
            checks_performed: 0,
        }
    }
}

/// Periodic checker over one tap.
pub struct HealthWatchdog {
    control: Arc<dyn TapControl>,
    state: Arc<Mutex<WatchdogState>>,
}

impl HealthWatchdog {
    pub fn new(control: Arc<dyn TapControl>) -> Self {
        Self {
            control,
            state: Arc::new(Mutex::new(WatchdogState::default())),
        }
    }

    /// Snapshot of the counters.
    pub fn state(&self) -> WatchdogState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Shared handle to the counters, readable after the watchdog task ends.
    pub fn state_handle(&self) -> Arc<Mutex<WatchdogState>> {
        Arc::clone(&self.state)
    }

    /// Runs one check: re-enables a disabled tap and updates the counters.
    pub fn check_once(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.checks_performed += 1;

        if self.control.is_enabled() {
            state.is_healthy = true;
            return;
        }

        state.is_healthy = false;
        state.disable_count += 1;
        state.last_disable_time = Some(SystemTime::now());
        warn!(
            disable_count = state.disable_count,
            "{} silently; re-enabling",
            TouchError::InterceptionDisabled
        );

        self.control.set_enabled(true);
        state.is_healthy = self.control.is_enabled();
        if state.is_healthy {
            info!("event tap re-enabled by watchdog");
        } else {
            error!("event tap could not be re-enabled; touch remapping is offline");
        }
    }

    /// Spawns the periodic check on the current Tokio runtime.
    ///
    /// The first check runs one full `interval` after spawning.  Abort the
    /// returned handle to stop.  Intervals below one millisecond are raised
    /// to one millisecond.
    pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
        let interval = interval.max(MIN_INTERVAL);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.check_once();
            }
        })
    }
}
