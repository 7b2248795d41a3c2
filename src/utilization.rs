//! CPU load accounting.
//!
//! Embassy has no idle-task counter, so each task future is wrapped in a
//! [`TrackedFuture`] that adds the ticks spent inside `poll` to a per-task
//! counter. The reporter turns counter deltas into [`DeciPercent`].
//!
//! All percentages are integers in tenths of a percent: 1000 == 100.0 %.

use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::sync::atomic::{AtomicU32, Ordering};
use core::task::{Context, Poll};

use embassy_time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct TaskId(pub usize);

pub const MAX_TASKS: usize = 12;

pub const CONTROL: TaskId = TaskId(0);
pub const VEHICLE: TaskId = TaskId(1);
pub const BUTTONS: TaskId = TaskId(2);
pub const SWITCHES: TaskId = TaskId(3);
pub const PANEL: TaskId = TaskId(4);
pub const WATCHDOG: TaskId = TaskId(5);
pub const OVERLOAD_DETECTOR: TaskId = TaskId(6);
pub const EXTRA_LOAD: TaskId = TaskId(7);
pub const CPU_REPORTER: TaskId = TaskId(8);
pub const CONSOLE: TaskId = TaskId(9);

pub const TASK_NAMES: [&str; 10] = [
    "control",
    "vehicle",
    "buttons",
    "switches",
    "panel",
    "watchdog",
    "overload",
    "extra_load",
    "cpu",
    "console",
];

/// Load in tenths of a percent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct DeciPercent(pub u16);

impl DeciPercent {
    pub const ZERO: Self = Self(0);
    pub const FULL: Self = Self(1000);

    /// `busy / total`, capped at 100.0 %. A zero window reads as idle.
    pub fn from_ticks(busy: u32, total: u32) -> Self {
        if total == 0 {
            return Self::ZERO;
        }
        let scaled = busy as u64 * 1000 / total as u64;
        Self(scaled.min(1000) as u16)
    }

    pub const fn whole(self) -> u16 {
        self.0 / 10
    }

    pub const fn tenths(self) -> u16 {
        self.0 % 10
    }
}

impl fmt::Display for DeciPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}%", self.whole(), self.tenths())
    }
}

/// Busy-tick and poll counters for every tracked task.
pub struct LoadMeter {
    ticks: [AtomicU32; MAX_TASKS],
    polls: [AtomicU32; MAX_TASKS],
}

impl LoadMeter {
    pub const fn new() -> Self {
        Self {
            ticks: [const { AtomicU32::new(0) }; MAX_TASKS],
            polls: [const { AtomicU32::new(0) }; MAX_TASKS],
        }
    }

    pub fn add(&self, id: TaskId, busy_ticks: u32) {
        if id.0 < MAX_TASKS {
            self.ticks[id.0].fetch_add(busy_ticks, Ordering::Relaxed);
            self.polls[id.0].fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn ticks(&self, id: TaskId) -> u32 {
        self.ticks.get(id.0).map_or(0, |t| t.load(Ordering::Relaxed))
    }

    pub fn polls(&self, id: TaskId) -> u32 {
        self.polls.get(id.0).map_or(0, |p| p.load(Ordering::Relaxed))
    }

    /// Sum over all tasks; wraps like the individual counters.
    pub fn total_ticks(&self) -> u32 {
        self.ticks
            .iter()
            .fold(0u32, |acc, t| acc.wrapping_add(t.load(Ordering::Relaxed)))
    }
}

impl Default for LoadMeter {
    fn default() -> Self {
        Self::new()
    }
}

pub struct TrackedFuture<'m, F> {
    id: TaskId,
    meter: &'m LoadMeter,
    inner: F,
}

impl<F: Future> Future for TrackedFuture<'_, F> {
    type Output = F::Output;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let start = Instant::now().as_ticks() as u32;
        // SAFETY: `inner` is never moved out of the pinned wrapper.
        let res = unsafe { self.as_mut().map_unchecked_mut(|s| &mut s.inner) }.poll(cx);
        let end = Instant::now().as_ticks() as u32;
        self.meter.add(self.id, end.wrapping_sub(start));
        res
    }
}

pub trait TrackedExt: Future + Sized {
    fn tracked(self, meter: &LoadMeter, id: TaskId) -> TrackedFuture<'_, Self> {
        TrackedFuture {
            id,
            meter,
            inner: self,
        }
    }
}

impl<F: Future> TrackedExt for F {}

/// Turns successive meter readings into a window load figure.
pub struct CpuSampler {
    last_busy: u32,
    last_time: u64,
}

impl CpuSampler {
    pub fn new(meter: &LoadMeter, now: Instant) -> Self {
        Self {
            last_busy: meter.total_ticks(),
            last_time: now.as_ticks(),
        }
    }

    /// Load since the previous sample, or `None` for an empty window.
    pub fn sample(&mut self, meter: &LoadMeter, now: Instant) -> Option<DeciPercent> {
        let busy = meter.total_ticks();
        let now = now.as_ticks();
        let elapsed = now.saturating_sub(self.last_time);
        let delta = busy.wrapping_sub(self.last_busy);
        self.last_busy = busy;
        self.last_time = now;
        if elapsed == 0 {
            return None;
        }
        Some(DeciPercent::from_ticks(
            delta,
            elapsed.min(u32::MAX as u64) as u32,
        ))
    }
}
