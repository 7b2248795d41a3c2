//! Operator console: fixed-size text lines queued for the serial port.
//!
//! Producers never block. When the queue is full the line is dropped and
//! counted.

use core::fmt::Write;
use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::String;

use crate::config::{CONSOLE_LINE_LEN, CONSOLE_QUEUE_DEPTH};
use crate::health::OverloadReport;
use crate::state::{ThrottleCommand, VehicleState};
use crate::utilization::DeciPercent;

pub type Line = String<CONSOLE_LINE_LEN>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsoleLine {
    Vehicle {
        state: VehicleState,
        throttle: ThrottleCommand,
    },
    CpuUsage(DeciPercent),
    ExtraLoad(u8),
    Overload(OverloadReport),
    Recovered { missed: u32 },
}

impl ConsoleLine {
    /// Renders the line without terminator. Overlong text is truncated.
    pub fn render(&self) -> Line {
        let mut line = Line::new();
        let _ = match *self {
            ConsoleLine::Vehicle { state, throttle } => {
                let sign = if state.velocity < 0 { "-" } else { "" };
                let speed = state.velocity.unsigned_abs();
                write!(
                    line,
                    "Position: {}m Velocity: {}{}.{}m/s Throttle: {}V",
                    state.position_m(),
                    sign,
                    speed / 10,
                    speed % 10,
                    throttle.volts()
                )
            }
            ConsoleLine::CpuUsage(load) => write!(line, "CPU usage is {}", load),
            ConsoleLine::ExtraLoad(percent) => write!(line, "ExtraLoad: {}%", percent),
            ConsoleLine::Overload(report) => write!(
                line,
                "System Overload: window {} ({} in a row)",
                report.window, report.consecutive
            ),
            ConsoleLine::Recovered { missed } => {
                write!(line, "Heartbeat back after {} missed", missed)
            }
        };
        line
    }
}

pub struct Console {
    queue: Channel<CriticalSectionRawMutex, ConsoleLine, CONSOLE_QUEUE_DEPTH>,
    dropped: AtomicU32,
}

impl Console {
    pub const fn new() -> Self {
        Self {
            queue: Channel::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Queues `line`; returns `false` if it was dropped.
    pub fn push(&self, line: ConsoleLine) -> bool {
        match self.queue.try_send(line) {
            Ok(()) => true,
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    pub fn try_next(&self) -> Option<ConsoleLine> {
        self.queue.try_receive().ok()
    }

    pub async fn next(&self) -> ConsoleLine {
        self.queue.receive().await
    }

    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;

    #[test]
    fn vehicle_trace_in_metres_and_volts() {
        let line = ConsoleLine::Vehicle {
            state: VehicleState::new(12345, 263),
            throttle: ThrottleCommand::saturating(47),
        };
        assert_eq!(
            line.render().as_str(),
            "Position: 1234m Velocity: 26.3m/s Throttle: 4V"
        );
    }

    #[test]
    fn reversing_keeps_sign_below_one_metre_per_second() {
        let line = ConsoleLine::Vehicle {
            state: VehicleState::new(0, -5),
            throttle: ThrottleCommand::ZERO,
        };
        assert_eq!(
            line.render().as_str(),
            "Position: 0m Velocity: -0.5m/s Throttle: 0V"
        );
    }

    #[test]
    fn status_lines() {
        assert_eq!(
            ConsoleLine::CpuUsage(DeciPercent(812)).render().as_str(),
            "CPU usage is 81.2%"
        );
        assert_eq!(ConsoleLine::ExtraLoad(60).render().as_str(), "ExtraLoad: 60%");
        assert_eq!(
            ConsoleLine::Overload(OverloadReport {
                window: 3,
                consecutive: 2
            })
            .render()
            .as_str(),
            "System Overload: window 3 (2 in a row)"
        );
        assert_eq!(
            ConsoleLine::Recovered { missed: 2 }.render().as_str(),
            "Heartbeat back after 2 missed"
        );
    }

    #[test]
    fn full_queue_drops_and_counts() {
        let console = Console::new();
        for i in 0..CONSOLE_QUEUE_DEPTH {
            assert!(console.push(ConsoleLine::ExtraLoad(i as u8)));
        }
        assert!(!console.push(ConsoleLine::ExtraLoad(99)));
        assert!(!console.push(ConsoleLine::ExtraLoad(98)));
        assert_eq!(console.dropped(), 2);

        assert_eq!(block_on(console.next()), ConsoleLine::ExtraLoad(0));
        assert!(console.push(ConsoleLine::ExtraLoad(7)));
    }

    #[test]
    fn lines_come_out_in_order() {
        let console = Console::new();
        console.push(ConsoleLine::ExtraLoad(20));
        console.push(ConsoleLine::CpuUsage(DeciPercent(100)));
        assert_eq!(console.try_next(), Some(ConsoleLine::ExtraLoad(20)));
        assert_eq!(
            console.try_next(),
            Some(ConsoleLine::CpuUsage(DeciPercent(100)))
        );
        assert_eq!(console.try_next(), None);
    }
}
