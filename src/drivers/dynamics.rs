//! Longitudinal vehicle model on a closed 2.4 km track.
//!
//! Fixed-point throughout: positions in dm, velocities in dm/s,
//! accelerations in dm/s², time in ms. Every division truncates toward zero
//! so runs are bit-for-bit reproducible.

use crate::config::{BRAKE_RETARDATION, TRACK_LENGTH_DM};
use crate::state::{ThrottleCommand, VehicleState};

/// Upper edges of the terrain bands, in dm.
pub const TERRAIN_BOUNDARIES: [u16; 5] = [4000, 8000, 12000, 16000, 20000];

/// Retardation added per band: even, uphill, steep uphill, even, downhill,
/// steep downhill.
pub const TERRAIN_OFFSETS: [i16; 6] = [0, 15, 25, 0, -10, -5];

/// Index of the terrain band containing `position` (0..=5).
pub fn terrain_band(position: u16) -> usize {
    TERRAIN_BOUNDARIES
        .iter()
        .position(|&edge| position < edge)
        .unwrap_or(TERRAIN_BOUNDARIES.len())
}

pub fn terrain_offset(position: u16) -> i16 {
    TERRAIN_OFFSETS[terrain_band(position)]
}

/// Air drag: `sign(v)·v²/10000 + 1`.
pub fn wind_factor(velocity: i16) -> i16 {
    let v = velocity as i32;
    let drag = v * v / 10_000;
    let signed = if velocity > 0 { drag } else { -drag };
    (signed + 1) as i16
}

pub fn retardation(position: u16, velocity: i16) -> i16 {
    wind_factor(velocity) + terrain_offset(position)
}

/// `throttle/2 - retardation`, narrowed to the model's 8-bit range.
pub fn acceleration(throttle: ThrottleCommand, position: u16, velocity: i16) -> i8 {
    (throttle.get() as i32 / 2 - retardation(position, velocity) as i32) as i8
}

/// Wraps any displacement result onto `[0, TRACK_LENGTH_DM)`.
pub fn wrap_position(position: i32) -> u16 {
    position.rem_euclid(TRACK_LENGTH_DM) as u16
}

pub fn adjust_position(position: u16, velocity: i16, acceleration: i8, dt_ms: u16) -> u16 {
    let dt = dt_ms as i32;
    let dt_s = dt / 1000;
    let next = position as i32
        + velocity as i32 * dt / 1000
        + acceleration as i32 / 2 * dt_s * dt_s;
    wrap_position(next)
}

pub fn adjust_velocity(velocity: i16, acceleration: i8, brake: bool, dt_ms: u16) -> i16 {
    let dt = dt_ms as i32;
    let v = velocity as i32;
    if !brake {
        ((v * 1000 + acceleration as i32 * dt) / 1000) as i16
    } else {
        let drop = BRAKE_RETARDATION * dt / 1000;
        if drop > v {
            0
        } else {
            (v - drop) as i16
        }
    }
}

/// One integration step. Position advances with the pre-step velocity.
pub fn step(state: VehicleState, throttle: ThrottleCommand, brake: bool, dt_ms: u16) -> VehicleState {
    let accel = acceleration(throttle, state.position, state.velocity);
    VehicleState {
        position: adjust_position(state.position, state.velocity, accel, dt_ms),
        velocity: adjust_velocity(state.velocity, accel, brake, dt_ms),
    }
}
