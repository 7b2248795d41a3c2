use crate::config::{PID_KD, PID_KI, PID_KP};
use crate::state::ThrottleCommand;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

impl Default for PidGains {
    fn default() -> Self {
        Self {
            kp: PID_KP,
            ki: PID_KI,
            kd: PID_KD,
        }
    }
}

/// Positional PID on velocity error (dm/s).
///
/// Error and integral are kept as 16-bit integers, the gains are applied in
/// float and the result is truncated back to 16 bits. The integral is never
/// reset between cruise sessions.
pub struct SpeedPid {
    gains: PidGains,
    setpoint: i16,
    previous_error: i16,
    integral: i16,
}

impl SpeedPid {
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            setpoint: 0,
            previous_error: 0,
            integral: 0,
        }
    }

    pub fn compute(&mut self, target: i16, actual: i16) -> i16 {
        self.setpoint = target;
        let error = target.wrapping_sub(actual);
        self.integral = self.integral.wrapping_add(error);

        let output = self.gains.kp * error as f32
            + self.gains.ki * self.integral as f32
            + self.gains.kd * error.wrapping_sub(self.previous_error) as f32;

        self.previous_error = error;
        output as i16
    }

    pub fn setpoint(&self) -> i16 {
        self.setpoint
    }

    pub fn integral(&self) -> i16 {
        self.integral
    }
}

impl Default for SpeedPid {
    fn default() -> Self {
        Self::new(PidGains::default())
    }
}

/// `2·(output²/10000 + 1)` clamped to the throttle range.
///
/// Squaring drops the sign: overspeed and underspeed of the same magnitude
/// ask for the same throttle.
pub fn throttle_from_output(output: i16) -> ThrottleCommand {
    let out = output as i32;
    ThrottleCommand::saturating(2 * (out * out / 10_000 + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_carries_between_calls() {
        let mut pid = SpeedPid::default();
        let first = pid.compute(250, 240);
        let second = pid.compute(250, 240);
        assert_eq!(first, 202);
        assert_eq!(second, 201);
        assert_ne!(first, second);
        assert_eq!(pid.integral(), 20);
        assert_eq!(pid.setpoint(), 250);
    }

    #[test]
    fn zero_error_from_fresh_state_is_zero() {
        let mut pid = SpeedPid::default();
        assert_eq!(pid.compute(300, 300), 0);
    }

    #[test]
    fn derivative_reacts_to_error_change() {
        let mut pid = SpeedPid::new(PidGains {
            kp: 0.0,
            ki: 0.0,
            kd: 1.0,
        });
        assert_eq!(pid.compute(100, 90), 10);
        assert_eq!(pid.compute(100, 80), 10);
        assert_eq!(pid.compute(100, 80), 0);
    }

    #[test]
    fn throttle_mapping_discards_sign() {
        assert_eq!(throttle_from_output(0).get(), 2);
        assert_eq!(throttle_from_output(202).get(), 10);
        assert_eq!(throttle_from_output(-202).get(), 10);
        assert_eq!(throttle_from_output(1000).get(), 80);
        assert_eq!(throttle_from_output(i16::MIN).get(), 80);
    }
}
