use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{with_timeout, Duration, TimeoutError};

/// Single-slot overwrite mailbox.
///
/// `post` never blocks and replaces whatever is in the slot, so a reader only
/// ever sees the latest value. Intermediate values are dropped on purpose.
pub struct Mailbox<T> {
    slot: Signal<CriticalSectionRawMutex, T>,
}

impl<T> Mailbox<T> {
    pub const fn new() -> Self {
        Self { slot: Signal::new() }
    }

    pub fn post(&self, value: T) {
        self.slot.signal(value);
    }

    /// Removes the value if one is present, without waiting.
    pub fn try_take(&self) -> Option<T> {
        self.slot.try_take()
    }

    /// Waits until a value is posted.
    pub async fn take(&self) -> T {
        self.slot.wait().await
    }

    /// Waits up to `timeout` for a value.
    pub async fn take_within(&self, timeout: Duration) -> Result<T, TimeoutError> {
        with_timeout(timeout, self.slot.wait()).await
    }

    pub fn is_full(&self) -> bool {
        self.slot.signaled()
    }
}

impl<T: Copy> Mailbox<T> {
    /// Non-blocking read that falls back to the last value seen.
    ///
    /// Returns `true` when `cached` was replaced by a fresh value.
    pub fn refresh(&self, cached: &mut T) -> bool {
        match self.slot.try_take() {
            Some(value) => {
                *cached = value;
                true
            }
            None => false,
        }
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}
