//! Shared state types for inter-task communication.
//!
//! All types are `Copy` so they can be posted through single-slot mailboxes
//! and snapshotted out of the event group without borrowing.

use crate::config::{THROTTLE_MAX, TRACK_LENGTH_DM};

// ── Sensor flags ─────────────────────────────────────────────────────────────

/// Typed flag set published through the event group.
///
/// Bit positions are internal; the mapping to raw button/switch bits lives in
/// `drivers::panel`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct SensorFlags(u8);

impl SensorFlags {
    pub const EMPTY: Self = Self(0);
    pub const ENGINE: Self = Self(0x01);
    pub const CRUISE_REQUEST: Self = Self(0x02);
    pub const BRAKE: Self = Self(0x04);
    pub const GAS: Self = Self(0x08);
    pub const TOP_GEAR: Self = Self(0x10);
    /// Raised by the watchdog when the overload policy cuts the throttle.
    pub const THROTTLE_INHIBIT: Self = Self(0x20);

    /// Flags owned by the button bank.
    pub const BUTTONS: Self = Self(Self::GAS.0 | Self::BRAKE.0 | Self::CRUISE_REQUEST.0);
    /// Flags owned by the switch bank.
    pub const SWITCHES: Self = Self(Self::ENGINE.0 | Self::TOP_GEAR.0);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// True when every flag in `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when every flag in `other` is clear.
    pub const fn excludes(self, other: Self) -> bool {
        self.0 & other.0 == 0
    }

    pub const fn with(self, flag: Self, on: bool) -> Self {
        if on {
            self.union(flag)
        } else {
            self.difference(flag)
        }
    }

    pub const fn engine_running(self) -> bool {
        self.contains(Self::ENGINE)
    }

    pub const fn gas_pedal(self) -> bool {
        self.contains(Self::GAS)
    }

    pub const fn brake_pedal(self) -> bool {
        self.contains(Self::BRAKE)
    }

    pub const fn cruise_request(self) -> bool {
        self.contains(Self::CRUISE_REQUEST)
    }

    pub const fn top_gear(self) -> bool {
        self.contains(Self::TOP_GEAR)
    }

    pub const fn throttle_inhibit(self) -> bool {
        self.contains(Self::THROTTLE_INHIBIT)
    }
}

// ── Vehicle ──────────────────────────────────────────────────────────────────

/// Position (dm, `[0, 24000)`) and velocity (dm/s, roughly `[-200, 700]`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct VehicleState {
    pub position: u16,
    pub velocity: i16,
}

impl VehicleState {
    pub const fn new(position: u16, velocity: i16) -> Self {
        Self { position, velocity }
    }

    pub const fn position_m(&self) -> u16 {
        self.position / 10
    }
}

const _: () = assert!(TRACK_LENGTH_DM <= u16::MAX as i32);

/// Throttle voltage in deci-volts, always within `[0, THROTTLE_MAX]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct ThrottleCommand(u8);

impl ThrottleCommand {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(THROTTLE_MAX);

    /// Clamps any signed request into the legal throttle range.
    pub fn saturating(raw: i32) -> Self {
        Self(raw.clamp(0, THROTTLE_MAX as i32) as u8)
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    pub const fn volts(self) -> u8 {
        self.0 / 10
    }
}

// ── Cruise ───────────────────────────────────────────────────────────────────

/// What the control task exposes to the panel each cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct CruiseStatus {
    pub engine_on: bool,
    pub active: bool,
    pub target_velocity: i16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_accessors_follow_bits() {
        let flags = SensorFlags::ENGINE.union(SensorFlags::TOP_GEAR);
        assert!(flags.engine_running());
        assert!(flags.top_gear());
        assert!(!flags.gas_pedal());
        assert!(flags.excludes(SensorFlags::GAS.union(SensorFlags::BRAKE)));
        assert!(!flags.contains(SensorFlags::GAS.union(SensorFlags::ENGINE)));
    }

    #[test]
    fn with_sets_and_clears_single_flag() {
        let flags = SensorFlags::EMPTY.with(SensorFlags::BRAKE, true);
        assert!(flags.brake_pedal());
        assert_eq!(flags.with(SensorFlags::BRAKE, false), SensorFlags::EMPTY);
    }

    #[test]
    fn throttle_saturates_both_ends() {
        assert_eq!(ThrottleCommand::saturating(-12), ThrottleCommand::ZERO);
        assert_eq!(ThrottleCommand::saturating(500), ThrottleCommand::MAX);
        assert_eq!(ThrottleCommand::saturating(42).get(), 42);
        assert_eq!(ThrottleCommand::saturating(42).volts(), 4);
    }
}
