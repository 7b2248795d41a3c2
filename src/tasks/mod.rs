//! Task bodies.
//!
//! Every task is a plain `async fn` that never returns. The firmware binary
//! wraps each one in an executor task and places it on the executor that
//! gives it its priority. All cross-task traffic goes through [`SystemBus`].

use crate::console::Console;
use crate::state::{CruiseStatus, ThrottleCommand, VehicleState};
use crate::sync::{EventGroup, Heartbeat, Mailbox};
use crate::utilization::LoadMeter;

pub mod control;
pub mod cpu;
pub mod inputs;
pub mod load;
pub mod panel;
pub mod vehicle;
pub mod watchdog;

/// The shared primitives. Each slot has exactly one writer.
pub struct SystemBus {
    /// Written by the input tasks (and the watchdog for the inhibit flag).
    pub events: EventGroup,
    /// Vehicle → Control.
    pub velocity: Mailbox<i16>,
    /// Control → Vehicle.
    pub throttle: Mailbox<ThrottleCommand>,
    /// Control → Panel.
    pub cruise: Mailbox<CruiseStatus>,
    /// Vehicle → Panel.
    pub vehicle: Mailbox<VehicleState>,
    /// Vehicle → ExtraLoad.
    pub position: Mailbox<u16>,
    /// Overload detector → Watchdog.
    pub heartbeat: Heartbeat,
    pub console: Console,
    pub meter: LoadMeter,
}

impl SystemBus {
    pub const fn new() -> Self {
        Self {
            events: EventGroup::new(),
            velocity: Mailbox::new(),
            throttle: Mailbox::new(),
            cruise: Mailbox::new(),
            vehicle: Mailbox::new(),
            position: Mailbox::new(),
            heartbeat: Heartbeat::new(),
            console: Console::new(),
            meter: LoadMeter::new(),
        }
    }
}

impl Default for SystemBus {
    fn default() -> Self {
        Self::new()
    }
}
