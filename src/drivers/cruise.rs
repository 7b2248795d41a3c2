use crate::config::CRUISE_MIN_VELOCITY;
use crate::drivers::pid::{throttle_from_output, PidGains, SpeedPid};
use crate::state::{CruiseStatus, SensorFlags, ThrottleCommand};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum DriveMode {
    EngineOff,
    Manual,
    CruiseActive,
}

/// Latched on the first active cycle, dropped on the first bad one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CruiseSession {
    pub target_velocity: i16,
}

/// Result of one control cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlOutput {
    pub throttle: ThrottleCommand,
    pub status: CruiseStatus,
}

/// Engine, manual throttle and cruise logic of the control task.
///
/// Pure state machine: the task feeds it one flag snapshot and one velocity
/// sample per release and posts the returned throttle.
pub struct CruiseController {
    engine_on: bool,
    throttle: i32,
    session: Option<CruiseSession>,
    pid: SpeedPid,
    // Pedals as sampled at the end of the previous cycle.
    gas_pedal: bool,
    brake_pedal: bool,
    top_gear: bool,
}

impl CruiseController {
    pub fn new(gains: PidGains) -> Self {
        Self {
            engine_on: false,
            throttle: 0,
            session: None,
            pid: SpeedPid::new(gains),
            gas_pedal: false,
            brake_pedal: false,
            top_gear: false,
        }
    }

    pub fn mode(&self) -> DriveMode {
        match (self.engine_on, self.session) {
            (false, _) => DriveMode::EngineOff,
            (true, None) => DriveMode::Manual,
            (true, Some(_)) => DriveMode::CruiseActive,
        }
    }

    pub fn session(&self) -> Option<CruiseSession> {
        self.session
    }

    pub fn brake_sampled(&self) -> bool {
        self.brake_pedal
    }

    pub fn top_gear_sampled(&self) -> bool {
        self.top_gear
    }

    pub fn step(&mut self, flags: SensorFlags, velocity: i16) -> ControlOutput {
        if flags.engine_running() {
            self.engine_on = true;
        } else if velocity == 0 {
            // Stalls only at standstill with the key released.
            self.engine_on = false;
        }

        if self.engine_on {
            self.run_engine(flags, velocity);
        } else {
            self.session = None;
            if !self.gas_pedal {
                self.throttle = 0;
            }
        }

        if flags.throttle_inhibit() {
            self.throttle = 0;
        }

        let throttle = ThrottleCommand::saturating(self.throttle);
        self.throttle = throttle.get() as i32;

        ControlOutput {
            throttle,
            status: CruiseStatus {
                engine_on: self.engine_on,
                active: self.session.is_some(),
                target_velocity: self.session.map_or(0, |s| s.target_velocity),
            },
        }
    }

    fn run_engine(&mut self, flags: SensorFlags, velocity: i16) {
        if self.gas_pedal {
            self.throttle += 1;
        } else if self.throttle != 0 && self.session.is_none() {
            self.throttle -= 1;
        }

        if Self::may_cruise(flags, velocity) {
            if self.session.is_none() {
                self.session = Some(CruiseSession {
                    target_velocity: velocity,
                });
            }
        } else {
            self.session = None;
        }

        if let Some(session) = self.session {
            let output = self.pid.compute(session.target_velocity, velocity);
            self.throttle = throttle_from_output(output).get() as i32;
        }

        self.gas_pedal = flags.gas_pedal();
        self.brake_pedal = flags.brake_pedal();
        self.top_gear = flags.top_gear();
        if self.gas_pedal || self.brake_pedal {
            self.session = None;
        }
    }

    fn may_cruise(flags: SensorFlags, velocity: i16) -> bool {
        velocity >= CRUISE_MIN_VELOCITY
            && flags.contains(SensorFlags::CRUISE_REQUEST.union(SensorFlags::TOP_GEAR))
            && flags.excludes(SensorFlags::GAS.union(SensorFlags::BRAKE))
    }
}

impl Default for CruiseController {
    fn default() -> Self {
        Self::new(PidGains::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(list: &[SensorFlags]) -> SensorFlags {
        list.iter().fold(SensorFlags::EMPTY, |acc, f| acc.union(*f))
    }

    fn cruise_ready() -> SensorFlags {
        flags(&[
            SensorFlags::ENGINE,
            SensorFlags::TOP_GEAR,
            SensorFlags::CRUISE_REQUEST,
        ])
    }

    #[test]
    fn starts_with_engine_off() {
        let ctrl = CruiseController::default();
        assert_eq!(ctrl.mode(), DriveMode::EngineOff);
    }

    #[test]
    fn engine_switch_starts_engine_at_standstill() {
        let mut ctrl = CruiseController::default();
        let out = ctrl.step(SensorFlags::ENGINE, 0);
        assert_eq!(ctrl.mode(), DriveMode::Manual);
        assert!(out.status.engine_on);
    }

    #[test]
    fn engine_stalls_only_at_standstill_with_switch_released() {
        let mut ctrl = CruiseController::default();
        ctrl.step(SensorFlags::ENGINE, 0);

        ctrl.step(SensorFlags::EMPTY, 35);
        assert_eq!(ctrl.mode(), DriveMode::Manual);

        let out = ctrl.step(SensorFlags::EMPTY, 0);
        assert_eq!(ctrl.mode(), DriveMode::EngineOff);
        assert_eq!(out.throttle, ThrottleCommand::ZERO);
    }

    #[test]
    fn gas_ramps_throttle_one_cycle_behind() {
        let mut ctrl = CruiseController::default();
        let gas = flags(&[SensorFlags::ENGINE, SensorFlags::GAS]);

        assert_eq!(ctrl.step(gas, 0).throttle.get(), 0);
        assert_eq!(ctrl.step(gas, 10).throttle.get(), 1);
        assert_eq!(ctrl.step(gas, 20).throttle.get(), 2);
        // Released this cycle, but the previous sample still says pressed.
        assert_eq!(ctrl.step(SensorFlags::ENGINE, 30).throttle.get(), 3);
        assert_eq!(ctrl.step(SensorFlags::ENGINE, 30).throttle.get(), 2);
    }

    #[test]
    fn throttle_never_exceeds_ceiling() {
        let mut ctrl = CruiseController::default();
        let gas = flags(&[SensorFlags::ENGINE, SensorFlags::GAS]);
        let mut last = ThrottleCommand::ZERO;
        for _ in 0..120 {
            last = ctrl.step(gas, 50).throttle;
        }
        assert_eq!(last, ThrottleCommand::MAX);
    }

    #[test]
    fn cruise_latches_target_on_activation() {
        let mut ctrl = CruiseController::default();
        let out = ctrl.step(cruise_ready(), 250);
        assert_eq!(ctrl.mode(), DriveMode::CruiseActive);
        assert!(out.status.active);
        assert_eq!(out.status.target_velocity, 250);
        assert_eq!(ctrl.session(), Some(CruiseSession { target_velocity: 250 }));

        let out = ctrl.step(cruise_ready(), 262);
        assert_eq!(out.status.target_velocity, 250);
    }

    #[test]
    fn gas_cancels_cruise_in_the_cycle_it_is_seen() {
        let mut ctrl = CruiseController::default();
        ctrl.step(cruise_ready(), 250);
        assert_eq!(ctrl.mode(), DriveMode::CruiseActive);

        let out = ctrl.step(cruise_ready().union(SensorFlags::GAS), 250);
        assert_eq!(ctrl.mode(), DriveMode::Manual);
        assert!(!out.status.active);
    }

    #[test]
    fn brake_cancels_cruise() {
        let mut ctrl = CruiseController::default();
        ctrl.step(cruise_ready(), 300);
        ctrl.step(cruise_ready().union(SensorFlags::BRAKE), 300);
        assert!(ctrl.session().is_none());
        assert!(ctrl.brake_sampled());
    }

    #[test]
    fn slow_or_low_gear_blocks_activation() {
        let mut ctrl = CruiseController::default();
        ctrl.step(cruise_ready(), 199);
        assert_eq!(ctrl.mode(), DriveMode::Manual);

        ctrl.step(cruise_ready().difference(SensorFlags::TOP_GEAR), 250);
        assert_eq!(ctrl.mode(), DriveMode::Manual);

        ctrl.step(cruise_ready().difference(SensorFlags::CRUISE_REQUEST), 250);
        assert_eq!(ctrl.mode(), DriveMode::Manual);
    }

    #[test]
    fn single_bad_cycle_ends_session_and_relatches() {
        let mut ctrl = CruiseController::default();
        ctrl.step(cruise_ready(), 250);
        ctrl.step(cruise_ready(), 150);
        assert!(ctrl.session().is_none());

        ctrl.step(cruise_ready(), 280);
        assert_eq!(ctrl.session(), Some(CruiseSession { target_velocity: 280 }));
    }

    #[test]
    fn cruise_throttle_comes_from_pid() {
        let mut ctrl = CruiseController::default();
        let out = ctrl.step(cruise_ready(), 250);
        // Zero error on the latching cycle: 2·(0/10000 + 1).
        assert_eq!(out.throttle.get(), 2);

        let out = ctrl.step(cruise_ready(), 240);
        // error 10, integral 10: output 202 → 2·(4 + 1).
        assert_eq!(out.throttle.get(), 10);
    }

    #[test]
    fn inhibit_flag_forces_zero_throttle() {
        let mut ctrl = CruiseController::default();
        let gas = flags(&[SensorFlags::ENGINE, SensorFlags::GAS]);
        for _ in 0..10 {
            ctrl.step(gas, 100);
        }
        let out = ctrl.step(gas.union(SensorFlags::THROTTLE_INHIBIT), 100);
        assert_eq!(out.throttle, ThrottleCommand::ZERO);
    }
}
