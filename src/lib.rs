#![cfg_attr(not(test), no_std)]

//! Cruise-control core: vehicle model, controller, input/output mapping and
//! the task bodies that tie them together over embassy primitives.

mod macros;

pub mod config;
pub mod console;
pub mod drivers;
pub mod health;
pub mod state;
pub mod sync;
pub mod tasks;
pub mod utilization;
