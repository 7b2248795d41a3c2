use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{with_timeout, Duration, TimeoutError};

/// Payload-free liveness token. Only presence within a deadline matters.
pub struct Heartbeat {
    beat: Signal<CriticalSectionRawMutex, ()>,
}

impl Heartbeat {
    pub const fn new() -> Self {
        Self { beat: Signal::new() }
    }

    pub fn beat(&self) {
        self.beat.signal(());
    }

    /// Consumes one beat, or fails if none arrives within `timeout`.
    pub async fn wait_within(&self, timeout: Duration) -> Result<(), TimeoutError> {
        with_timeout(timeout, self.beat.wait()).await
    }
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self::new()
    }
}
