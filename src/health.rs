//! Deadline supervision of the overload detector.
//!
//! A missed heartbeat is the only real fault in the system. It is counted,
//! reported once per missed window and, depending on [`OverloadPolicy`],
//! used to inhibit the throttle until beats arrive on time again.

use embassy_time::{Duration, TimeoutError};

use crate::config::WATCHDOG_TIMEOUT;
use crate::sync::Heartbeat;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum OverloadPolicy {
    /// Warn and keep running.
    #[default]
    LogOnly,
    /// Warn and hold the throttle at zero while overloaded.
    CutThrottle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WatchdogConfig {
    pub timeout: Duration,
    pub policy: OverloadPolicy,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            timeout: WATCHDOG_TIMEOUT,
            policy: OverloadPolicy::LogOnly,
        }
    }
}

/// One missed window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct OverloadReport {
    /// Total missed windows since boot, this one included.
    pub window: u32,
    /// Misses in a row ending with this one.
    pub consecutive: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum Verdict {
    Alive,
    /// First on-time beat after `missed` consecutive misses.
    Recovered { missed: u32 },
    Overload(OverloadReport),
}

pub struct Watchdog {
    config: WatchdogConfig,
    missed_total: u32,
    consecutive: u32,
}

impl Watchdog {
    pub const fn new(config: WatchdogConfig) -> Self {
        Self {
            config,
            missed_total: 0,
            consecutive: 0,
        }
    }

    pub fn config(&self) -> &WatchdogConfig {
        &self.config
    }

    pub fn missed_total(&self) -> u32 {
        self.missed_total
    }

    pub fn is_overloaded(&self) -> bool {
        self.consecutive > 0
    }

    /// Folds the outcome of one bounded heartbeat wait into the verdict.
    pub fn observe(&mut self, beat: Result<(), TimeoutError>) -> Verdict {
        match beat {
            Ok(()) if self.consecutive == 0 => Verdict::Alive,
            Ok(()) => {
                let missed = self.consecutive;
                self.consecutive = 0;
                Verdict::Recovered { missed }
            }
            Err(TimeoutError) => {
                self.missed_total = self.missed_total.wrapping_add(1);
                self.consecutive = self.consecutive.saturating_add(1);
                Verdict::Overload(OverloadReport {
                    window: self.missed_total,
                    consecutive: self.consecutive,
                })
            }
        }
    }

    /// Whether the throttle inhibit should be raised (`Some(true)`), dropped
    /// (`Some(false)`) or left as is after `verdict`.
    pub fn inhibit_change(&self, verdict: &Verdict) -> Option<bool> {
        if self.config.policy != OverloadPolicy::CutThrottle {
            return None;
        }
        match verdict {
            Verdict::Alive => None,
            Verdict::Recovered { .. } => Some(false),
            Verdict::Overload(report) if report.consecutive == 1 => Some(true),
            Verdict::Overload(_) => None,
        }
    }

    /// Waits for one beat within the configured timeout.
    pub async fn supervise(&mut self, heartbeat: &Heartbeat) -> Verdict {
        let beat = heartbeat.wait_within(self.config.timeout).await;
        self.observe(beat)
    }
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new(WatchdogConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;

    #[test]
    fn steady_beats_stay_alive() {
        let mut dog = Watchdog::default();
        for _ in 0..5 {
            assert_eq!(dog.observe(Ok(())), Verdict::Alive);
        }
        assert_eq!(dog.missed_total(), 0);
    }

    #[test]
    fn each_missed_window_reported_once() {
        let mut dog = Watchdog::default();
        let verdicts = [
            dog.observe(Ok(())),
            dog.observe(Err(TimeoutError)),
            dog.observe(Err(TimeoutError)),
            dog.observe(Ok(())),
            dog.observe(Err(TimeoutError)),
        ];
        assert_eq!(
            verdicts,
            [
                Verdict::Alive,
                Verdict::Overload(OverloadReport {
                    window: 1,
                    consecutive: 1
                }),
                Verdict::Overload(OverloadReport {
                    window: 2,
                    consecutive: 2
                }),
                Verdict::Recovered { missed: 2 },
                Verdict::Overload(OverloadReport {
                    window: 3,
                    consecutive: 1
                }),
            ]
        );
        assert!(dog.is_overloaded());
    }

    #[test]
    fn log_only_never_touches_throttle() {
        let mut dog = Watchdog::default();
        let verdict = dog.observe(Err(TimeoutError));
        assert_eq!(dog.inhibit_change(&verdict), None);
    }

    #[test]
    fn cut_throttle_latches_until_recovery() {
        let mut dog = Watchdog::new(WatchdogConfig {
            policy: OverloadPolicy::CutThrottle,
            ..WatchdogConfig::default()
        });
        let first = dog.observe(Err(TimeoutError));
        assert_eq!(dog.inhibit_change(&first), Some(true));
        let second = dog.observe(Err(TimeoutError));
        assert_eq!(dog.inhibit_change(&second), None);
        let back = dog.observe(Ok(()));
        assert_eq!(dog.inhibit_change(&back), Some(false));
        let steady = dog.observe(Ok(()));
        assert_eq!(dog.inhibit_change(&steady), None);
    }

    #[test]
    fn pending_beat_is_consumed_immediately() {
        let heartbeat = Heartbeat::new();
        let mut dog = Watchdog::default();
        heartbeat.beat();
        assert_eq!(block_on(dog.supervise(&heartbeat)), Verdict::Alive);
    }

    #[test]
    fn late_detector_is_reported_then_recovers() {
        static HEARTBEAT: Heartbeat = Heartbeat::new();
        let mut dog = Watchdog::new(WatchdogConfig {
            timeout: Duration::from_millis(150),
            ..WatchdogConfig::default()
        });

        let late = std::thread::spawn(|| {
            std::thread::sleep(std::time::Duration::from_millis(220));
            HEARTBEAT.beat();
        });

        let first = block_on(dog.supervise(&HEARTBEAT));
        let second = block_on(dog.supervise(&HEARTBEAT));
        late.join().unwrap();

        assert_eq!(
            first,
            Verdict::Overload(OverloadReport {
                window: 1,
                consecutive: 1
            })
        );
        assert_eq!(second, Verdict::Recovered { missed: 1 });
    }
}
