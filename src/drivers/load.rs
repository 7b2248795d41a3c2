//! Synthetic CPU load for provoking overload.

use core::hint::black_box;

use embassy_time::Duration;

use crate::config::{CALIBRATION_BATCH, DEFAULT_ITERATIONS_PER_PERCENT, EXTRA_LOAD_PERIOD};
use crate::drivers::dynamics::terrain_band;

/// Percent of CPU added per terrain band.
pub const PERCENT_PER_BAND: u8 = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadConfig {
    pub period: Duration,
    pub calibration_batch: u32,
    pub iterations_per_percent: u32,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            period: EXTRA_LOAD_PERIOD,
            calibration_batch: CALIBRATION_BATCH,
            iterations_per_percent: DEFAULT_ITERATIONS_PER_PERCENT,
        }
    }
}

/// Load dial read off the track: band index × 20 %, at most 100 %.
pub fn load_percent_for(position: u16) -> u8 {
    let percent = terrain_band(position) as u32 * PERCENT_PER_BAND as u32;
    percent.min(100) as u8
}

/// Runs `iterations` rounds of arithmetic the optimiser cannot elide.
pub fn spin(iterations: u32) -> u32 {
    let mut acc: u32 = 0;
    for i in 0..iterations {
        acc = black_box(acc.wrapping_mul(31).wrapping_add(i));
    }
    acc
}

pub struct LoadGenerator {
    iterations_per_percent: u32,
}

impl LoadGenerator {
    pub const fn new(iterations_per_percent: u32) -> Self {
        Self {
            iterations_per_percent,
        }
    }

    /// Scales a timed batch so that 100 % burns roughly one `period`.
    pub fn from_measurement(batch: u32, elapsed: Duration, period: Duration) -> Self {
        let elapsed_us = elapsed.as_micros().max(1);
        let per_period = batch as u64 * period.as_micros() / elapsed_us;
        let per_percent = (per_period / 100).clamp(1, u32::MAX as u64) as u32;
        Self::new(per_percent)
    }

    /// Times one batch on the spot and calibrates from it.
    pub fn calibrate(config: &LoadConfig) -> Self {
        let started = embassy_time::Instant::now();
        spin(config.calibration_batch);
        Self::from_measurement(config.calibration_batch, started.elapsed(), config.period)
    }

    pub fn iterations_per_percent(&self) -> u32 {
        self.iterations_per_percent
    }

    pub fn iterations_for(&self, percent: u8) -> u32 {
        (percent.min(100) as u32).saturating_mul(self.iterations_per_percent)
    }

    /// Burns CPU proportional to `percent`; returns the iteration count.
    pub fn burn(&self, percent: u8) -> u32 {
        let iterations = self.iterations_for(percent);
        spin(iterations);
        iterations
    }
}

impl Default for LoadGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATIONS_PER_PERCENT)
    }
}
