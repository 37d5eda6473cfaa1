//! Cosmetic progress indicator shown while an analysis call is outstanding.
//!
//! The value does not track real request progress. A ticker task bumps it by
//! a fixed step on a fixed interval up to a ceiling below 100; only the
//! orchestrator sets 100, after the call has resolved.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

pub const PROGRESS_STEP: u8 = 10;
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);
pub const PROGRESS_CEILING: u8 = 90;
pub const PROGRESS_COMPLETE: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSchedule {
    pub step: u8,
    pub interval: Duration,
    pub ceiling: u8,
}

impl Default for ProgressSchedule {
    fn default() -> Self {
        Self {
            step: PROGRESS_STEP,
            interval: PROGRESS_INTERVAL,
            ceiling: PROGRESS_CEILING,
        }
    }
}

/// Shared progress value, 0..=100. Clones observe the same value.
#[derive(Debug, Clone)]
pub struct ProgressMeter {
    tx: Arc<watch::Sender<u8>>,
}

impl Default for ProgressMeter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressMeter {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    pub fn get(&self) -> u8 {
        *self.tx.borrow()
    }

    #[cfg(test)]
    pub fn subscribe(&self) -> watch::Receiver<u8> {
        self.tx.subscribe()
    }

    pub fn reset(&self) {
        self.tx.send_replace(0);
    }

    pub fn complete(&self) {
        self.tx.send_replace(PROGRESS_COMPLETE);
    }

    /// Adds `step` without passing `ceiling`. Returns false, leaving the value
    /// untouched, once the value is at or above the ceiling or `stopped` is set.
    ///
    /// `stopped` is read under the channel's write lock, so once it is set any
    /// later `reset` or `complete` cannot be overwritten by a tick in flight.
    fn advance(&self, step: u8, ceiling: u8, stopped: &AtomicBool) -> bool {
        let mut advanced = false;
        self.tx.send_if_modified(|value| {
            if stopped.load(Ordering::Acquire) || *value >= ceiling {
                return false;
            }
            *value = value.saturating_add(step).min(ceiling);
            advanced = true;
            true
        });
        advanced
    }
}

/// Repeating tick driving a [`ProgressMeter`]. Stopped on `stop` or drop.
#[derive(Debug)]
pub struct ProgressTicker {
    handle: Option<JoinHandle<()>>,
    stopped: Arc<AtomicBool>,
}

impl ProgressTicker {
    pub fn start(meter: ProgressMeter, schedule: ProgressSchedule) -> Self {
        let stopped = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stopped);
        let handle = tokio::spawn(async move {
            let first_tick = Instant::now() + schedule.interval;
            let mut ticks = time::interval_at(first_tick, schedule.interval);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                if !meter.advance(schedule.step, schedule.ceiling, &flag) {
                    break;
                }
            }
        });
        Self {
            handle: Some(handle),
            stopped,
        }
    }

    /// After this returns the meter is never advanced again, even by a tick
    /// already running on another worker.
    pub fn stop(&mut self) {
        self.stopped.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.stop();
    }
}
