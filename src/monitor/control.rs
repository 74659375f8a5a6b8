//! Live-mutable control state and scan triggering
//!
//! Control flags are owned behind an `RwLock` and mutated only by the
//! command handler; the loop reads them at the top of every cycle. The
//! manual trigger rides on `tokio::sync::Notify`: a raise with no waiter
//! stores a permit, so a trigger fired mid-cycle is picked up at the next
//! wait instead of being lost.

use std::time::Duration;
use tokio::sync::Notify;

/// Flags read by the monitor loop each cycle.
#[derive(Debug, Clone)]
pub struct ControlState {
    pub paused: bool,
    /// true: alert on every new listing; false: only favorable ones
    pub broad_mode: bool,
    /// Pages per automatic scan
    pub scan_pages: u32,
    /// Pages per manually triggered scan
    pub manual_pages: u32,
}

impl ControlState {
    pub fn new(scan_pages: u32, manual_pages: u32) -> Self {
        Self {
            paused: false,
            broad_mode: false,
            scan_pages,
            manual_pages,
        }
    }
}

/// What woke the loop up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Scan interval elapsed
    Timer,
    /// Operator requested a scan
    Manual,
}

/// Single-slot manual-trigger signal.
#[derive(Debug, Default)]
pub struct ScanTrigger {
    manual: Notify,
}

impl ScanTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the manual-trigger signal. Safe to call from any task; if
    /// the loop is mid-cycle the permit is held until the next wait.
    pub fn raise(&self) {
        self.manual.notify_one();
    }

    /// Wait for either the interval to elapse or a manual trigger,
    /// whichever fires first. The stored permit is consumed exactly once.
    pub async fn wait(&self, interval: Duration) -> Trigger {
        tokio::select! {
            _ = self.manual.notified() => Trigger::Manual,
            _ = tokio::time::sleep(interval) => Trigger::Timer,
        }
    }
}
