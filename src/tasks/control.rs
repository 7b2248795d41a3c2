use embassy_time::Ticker;

use crate::config::CONTROL_PERIOD;
use crate::drivers::cruise::{ControlOutput, CruiseController, DriveMode};
use crate::tasks::SystemBus;
use crate::{debug, info};

/// Engine, throttle and cruise control.
///
/// Blocks on a fresh velocity, runs one controller step against the current
/// flag snapshot, posts throttle and cruise status, then waits for release.
pub async fn run(bus: &SystemBus, mut controller: CruiseController) -> ! {
    info!("control task started");
    let mut ticker = Ticker::every(CONTROL_PERIOD);
    loop {
        cycle(bus, &mut controller).await;
        ticker.next().await;
    }
}

pub async fn cycle(bus: &SystemBus, controller: &mut CruiseController) -> ControlOutput {
    let velocity = bus.velocity.take().await;
    let flags = bus.events.snapshot();

    let before = controller.mode();
    let out = controller.step(flags, velocity);
    let after = controller.mode();
    if before != after {
        match after {
            DriveMode::CruiseActive => {
                info!("cruise engaged at {} dm/s", out.status.target_velocity)
            }
            DriveMode::Manual if before == DriveMode::CruiseActive => {
                info!("cruise released at {} dm/s", velocity)
            }
            DriveMode::Manual => info!("engine on"),
            DriveMode::EngineOff => info!("engine off"),
        }
    }
    debug!("control v={} throttle={}", velocity, out.throttle.get());

    bus.throttle.post(out.throttle);
    bus.cruise.post(out.status);
    out
}
