//! Driver panel boundary: raw button/switch bitmasks in, LED and
//! seven-segment patterns out.
//!
//! This is the only place that knows hardware bit positions.

use crate::drivers::dynamics::terrain_band;
use crate::state::{CruiseStatus, SensorFlags, VehicleState};

// Key bank, 1 = pressed. Only the low nibble carries keys.
pub const BUTTON_MASK: u32 = 0x0f;
pub const BUTTON_CRUISE: u32 = 0x02;
pub const BUTTON_BRAKE: u32 = 0x04;
pub const BUTTON_GAS: u32 = 0x08;

// Toggle bank.
pub const SWITCH_ENGINE: u32 = 0x01;
pub const SWITCH_TOP_GEAR: u32 = 0x02;

// Red LEDs.
pub const LED_RED_ENGINE: u32 = 0x0000_0001;
pub const LED_RED_TOP_GEAR: u32 = 0x0000_0002;
/// LEDR17 marks the first band, LEDR12 the last.
pub const LED_RED_POSITION_MSB: u32 = 17;

// Green LEDs.
pub const LED_GREEN_CRUISE_ACTIVE: u16 = 0x0001;
pub const LED_GREEN_CRUISE_BUTTON: u16 = 0x0004;
pub const LED_GREEN_BRAKE: u16 = 0x0010;
pub const LED_GREEN_GAS: u16 = 0x0040;

/// Source of a raw input bitmask (key bank or toggle bank).
pub trait InputBank {
    fn read(&mut self) -> u32;
}

/// Fire-and-forget output sinks of the panel.
pub trait PanelSink {
    fn write_red_leds(&mut self, pattern: u32);
    fn write_green_leds(&mut self, pattern: u16);
    /// Current velocity in whole m/s.
    fn write_seven_seg_low(&mut self, value: i16);
    /// Cruise target in whole m/s, 0 when inactive.
    fn write_seven_seg_high(&mut self, value: i16);
}

pub fn decode_buttons(raw: u32) -> SensorFlags {
    let keys = raw & BUTTON_MASK;
    SensorFlags::EMPTY
        .with(SensorFlags::GAS, keys & BUTTON_GAS != 0)
        .with(SensorFlags::BRAKE, keys & BUTTON_BRAKE != 0)
        .with(SensorFlags::CRUISE_REQUEST, keys & BUTTON_CRUISE != 0)
}

pub fn decode_switches(raw: u32) -> SensorFlags {
    SensorFlags::EMPTY
        .with(SensorFlags::ENGINE, raw & SWITCH_ENGINE != 0)
        .with(SensorFlags::TOP_GEAR, raw & SWITCH_TOP_GEAR != 0)
}

/// Holds a flag set until `depth` consecutive identical samples agree.
pub struct Debouncer {
    depth: u8,
    stable: SensorFlags,
    candidate: SensorFlags,
    streak: u8,
}

impl Debouncer {
    pub const fn new(depth: u8) -> Self {
        Self {
            depth: if depth == 0 { 1 } else { depth },
            stable: SensorFlags::EMPTY,
            candidate: SensorFlags::EMPTY,
            streak: 0,
        }
    }

    pub fn sample(&mut self, raw: SensorFlags) -> SensorFlags {
        if raw == self.candidate {
            self.streak = self.streak.saturating_add(1);
        } else {
            self.candidate = raw;
            self.streak = 1;
        }
        if self.streak >= self.depth {
            self.stable = self.candidate;
        }
        self.stable
    }

    pub fn stable(&self) -> SensorFlags {
        self.stable
    }
}

/// Everything the panel shows in one refresh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PanelFrame {
    pub red: u32,
    pub green: u16,
    pub seven_seg_low: i16,
    pub seven_seg_high: i16,
}

impl PanelFrame {
    pub fn compose(flags: SensorFlags, vehicle: VehicleState, cruise: CruiseStatus) -> Self {
        let mut red = 0;
        if flags.engine_running() {
            red |= LED_RED_ENGINE;
        }
        if flags.top_gear() {
            red |= LED_RED_TOP_GEAR;
        }
        red |= 1 << (LED_RED_POSITION_MSB - terrain_band(vehicle.position) as u32);

        let mut green = 0;
        if cruise.active {
            green |= LED_GREEN_CRUISE_ACTIVE;
        }
        if flags.cruise_request() {
            green |= LED_GREEN_CRUISE_BUTTON;
        }
        if flags.brake_pedal() {
            green |= LED_GREEN_BRAKE;
        }
        if flags.gas_pedal() {
            green |= LED_GREEN_GAS;
        }

        Self {
            red,
            green,
            seven_seg_low: vehicle.velocity / 10,
            seven_seg_high: if cruise.active {
                cruise.target_velocity / 10
            } else {
                0
            },
        }
    }

    pub fn write_to<P: PanelSink>(&self, sink: &mut P) {
        sink.write_red_leds(self.red);
        sink.write_green_leds(self.green);
        sink.write_seven_seg_low(self.seven_seg_low);
        sink.write_seven_seg_high(self.seven_seg_high);
    }
}
