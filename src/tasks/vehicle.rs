use embassy_time::Ticker;

use crate::config::{VEHICLE_PERIOD, VEHICLE_PERIOD_MS};
use crate::console::ConsoleLine;
use crate::drivers::dynamics;
use crate::state::{ThrottleCommand, VehicleState};
use crate::tasks::SystemBus;
use crate::{debug, info};

/// Simulated car. Owns the vehicle state and the last throttle it saw.
pub struct Vehicle {
    state: VehicleState,
    throttle: ThrottleCommand,
}

impl Vehicle {
    pub const fn new(state: VehicleState) -> Self {
        Self {
            state,
            throttle: ThrottleCommand::ZERO,
        }
    }

    pub fn state(&self) -> VehicleState {
        self.state
    }

    pub fn throttle(&self) -> ThrottleCommand {
        self.throttle
    }

    /// Integrates one period after release and publishes the result.
    pub fn advance(&mut self, bus: &SystemBus) -> VehicleState {
        if !bus.throttle.refresh(&mut self.throttle) {
            debug!("no new throttle, holding {}", self.throttle.get());
        }
        let brake = bus.events.snapshot().brake_pedal();
        self.state = dynamics::step(self.state, self.throttle, brake, VEHICLE_PERIOD_MS);

        bus.vehicle.post(self.state);
        bus.position.post(self.state.position);
        bus.console.push(ConsoleLine::Vehicle {
            state: self.state,
            throttle: self.throttle,
        });
        self.state
    }
}

impl Default for Vehicle {
    fn default() -> Self {
        Self::new(VehicleState::default())
    }
}

pub async fn run(bus: &SystemBus, mut vehicle: Vehicle) -> ! {
    info!("vehicle task started");
    let mut ticker = Ticker::every(VEHICLE_PERIOD);
    loop {
        bus.velocity.post(vehicle.state().velocity);
        ticker.next().await;
        vehicle.advance(bus);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SensorFlags;

    #[test]
    fn advance_uses_latest_throttle_then_holds_it() {
        let bus = SystemBus::new();
        let mut vehicle = Vehicle::new(VehicleState::new(1000, 100));

        bus.throttle.post(ThrottleCommand::saturating(20));
        bus.throttle.post(ThrottleCommand::saturating(40));
        assert_eq!(vehicle.advance(&bus), VehicleState::new(1030, 105));
        assert_eq!(vehicle.throttle().get(), 40);

        // Empty slot: same throttle again.
        let next = vehicle.advance(&bus);
        assert_eq!(vehicle.throttle().get(), 40);
        assert_eq!(next.position, 1061);
    }

    #[test]
    fn advance_publishes_to_panel_load_and_console() {
        let bus = SystemBus::new();
        let mut vehicle = Vehicle::new(VehicleState::new(5000, 200));
        bus.throttle.post(ThrottleCommand::saturating(60));
        let state = vehicle.advance(&bus);

        assert_eq!(bus.vehicle.try_take(), Some(state));
        assert_eq!(bus.position.try_take(), Some(5060));
        assert_eq!(
            bus.console.try_next(),
            Some(ConsoleLine::Vehicle {
                state,
                throttle: ThrottleCommand::saturating(60)
            })
        );
    }

    #[test]
    fn brake_flag_is_read_from_event_group() {
        let bus = SystemBus::new();
        let mut vehicle = Vehicle::new(VehicleState::new(0, 100));
        bus.events.publish(SensorFlags::BUTTONS, SensorFlags::BRAKE);
        assert_eq!(vehicle.advance(&bus).velocity, 40);
        assert_eq!(vehicle.advance(&bus).velocity, 0);
    }
}
