//! Configuration constants for the cruise-control unit.
//!
//! Every period in the system is a multiple of the hardware tick base, so the
//! divisors below are the only knobs for task release rates.

use embassy_time::Duration;

// ── Tick base ────────────────────────────────────────────────────────────────

/// Hardware timer base period in milliseconds.
pub const BASE_TICK_MS: u64 = 100;

/// Control task release divisor (3 × 100 ms).
pub const CONTROL_PERIOD_TICKS: u64 = 3;
/// Vehicle task release divisor (3 × 100 ms).
pub const VEHICLE_PERIOD_TICKS: u64 = 3;
/// CPU-usage reporter release divisor (5 × 100 ms).
pub const CPU_REPORT_PERIOD_TICKS: u64 = 5;

pub const fn ticks(divisor: u64) -> Duration {
    Duration::from_millis(BASE_TICK_MS * divisor)
}

pub const CONTROL_PERIOD: Duration = ticks(CONTROL_PERIOD_TICKS);
pub const VEHICLE_PERIOD: Duration = ticks(VEHICLE_PERIOD_TICKS);
pub const CPU_REPORT_PERIOD: Duration = ticks(CPU_REPORT_PERIOD_TICKS);

/// Time step fed to the dynamics model, in milliseconds.
pub const VEHICLE_PERIOD_MS: u16 = (BASE_TICK_MS * VEHICLE_PERIOD_TICKS) as u16;

// ── I/O polling ──────────────────────────────────────────────────────────────

pub const BUTTON_POLL_PERIOD: Duration = Duration::from_millis(100);
pub const SWITCH_POLL_PERIOD: Duration = Duration::from_millis(10);
pub const PANEL_REFRESH_PERIOD: Duration = Duration::from_millis(100);

/// Consecutive identical samples required before an input flag changes.
/// 1 means every flag follows the most recent sample.
pub const DEBOUNCE_SAMPLES: u8 = 1;

// ── Liveness ─────────────────────────────────────────────────────────────────

pub const OVERLOAD_BEAT_PERIOD: Duration = Duration::from_millis(290);
pub const WATCHDOG_TIMEOUT: Duration = Duration::from_millis(300);

// ── Synthetic load ───────────────────────────────────────────────────────────

pub const EXTRA_LOAD_PERIOD: Duration = Duration::from_millis(300);
/// Inner-loop length used when no calibration has been run.
pub const DEFAULT_ITERATIONS_PER_PERCENT: u32 = 410;
/// Size of the batch timed at start-up to calibrate the burn loop.
pub const CALIBRATION_BATCH: u32 = 10_000;

// ── Vehicle model ────────────────────────────────────────────────────────────

/// Track length in decimetres; positions wrap modulo this value.
pub const TRACK_LENGTH_DM: i32 = 24_000;
/// Deceleration applied while the brake pedal is held (dm/s²).
pub const BRAKE_RETARDATION: i32 = 200;

// ── Control law ──────────────────────────────────────────────────────────────

pub const THROTTLE_MAX: u8 = 80;
/// Minimum velocity (dm/s) for cruise control to engage.
pub const CRUISE_MIN_VELOCITY: i16 = 200;

pub const PID_KP: f32 = 20.0;
pub const PID_KI: f32 = 0.08;
pub const PID_KD: f32 = 0.2;

// ── Console ──────────────────────────────────────────────────────────────────

pub const CONSOLE_QUEUE_DEPTH: usize = 8;
pub const CONSOLE_LINE_LEN: usize = 64;

/// CPU load above which the reporter warns (0.1 % units).
pub const CPU_WARN_DECI_PERCENT: u16 = 800;
