use core::cell::RefCell;
use core::future::poll_fn;
use core::task::Poll;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::waitqueue::WakerRegistration;
use embassy_time::{with_timeout, Duration, TimeoutError};

use crate::state::SensorFlags;

/// Condition a waiter blocks on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum Pattern {
    AllSet(SensorFlags),
    AllClear(SensorFlags),
}

impl Pattern {
    pub const fn matches(self, flags: SensorFlags) -> bool {
        match self {
            Pattern::AllSet(mask) => flags.contains(mask),
            Pattern::AllClear(mask) => flags.excludes(mask),
        }
    }
}

struct Inner {
    flags: SensorFlags,
    waker: WakerRegistration,
}

/// Named boolean flags with atomic group-level publish.
///
/// Writers update their subset inside one critical section, so a reader
/// never observes a half-applied sample.
pub struct EventGroup {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Inner>>,
}

impl EventGroup {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                flags: SensorFlags::EMPTY,
                waker: WakerRegistration::new(),
            })),
        }
    }

    /// Sets `set` and clears `clear` in one step. Returns the new flag set.
    pub fn post(&self, set: SensorFlags, clear: SensorFlags) -> SensorFlags {
        self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            let next = inner.flags.difference(clear).union(set);
            if next != inner.flags {
                inner.flags = next;
                inner.waker.wake();
            }
            next
        })
    }

    /// Replaces the `owned` subset with `values`, leaving other flags alone.
    pub fn publish(&self, owned: SensorFlags, values: SensorFlags) -> SensorFlags {
        let set = values.intersection(owned);
        let clear = owned.difference(values);
        self.post(set, clear)
    }

    pub fn snapshot(&self) -> SensorFlags {
        self.inner.lock(|cell| cell.borrow().flags)
    }

    /// Zero-timeout pend: `Ok` if the pattern holds right now.
    pub fn check(&self, pattern: Pattern) -> Result<SensorFlags, TimeoutError> {
        let flags = self.snapshot();
        if pattern.matches(flags) {
            Ok(flags)
        } else {
            Err(TimeoutError)
        }
    }

    /// Waits until `pattern` holds and returns the flags that satisfied it.
    pub async fn wait(&self, pattern: Pattern) -> SensorFlags {
        poll_fn(|cx| {
            self.inner.lock(|cell| {
                let mut inner = cell.borrow_mut();
                if pattern.matches(inner.flags) {
                    Poll::Ready(inner.flags)
                } else {
                    inner.waker.register(cx.waker());
                    Poll::Pending
                }
            })
        })
        .await
    }

    pub async fn wait_within(
        &self,
        pattern: Pattern,
        timeout: Duration,
    ) -> Result<SensorFlags, TimeoutError> {
        with_timeout(timeout, self.wait(pattern)).await
    }
}

impl Default for EventGroup {
    fn default() -> Self {
        Self::new()
    }
}
