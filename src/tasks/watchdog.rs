//! Overload detector and the watchdog that supervises it.
//!
//! The detector runs at the lowest priority and beats every 290 ms. When the
//! CPU is saturated it misses its beat and the watchdog, at the highest
//! priority, notices within 300 ms.

use embassy_time::Ticker;

use crate::config::OVERLOAD_BEAT_PERIOD;
use crate::console::ConsoleLine;
use crate::health::{Verdict, Watchdog};
use crate::state::SensorFlags;
use crate::tasks::SystemBus;
use crate::{info, warn};

pub async fn overload_detector(bus: &SystemBus) -> ! {
    let mut ticker = Ticker::every(OVERLOAD_BEAT_PERIOD);
    loop {
        ticker.next().await;
        bus.heartbeat.beat();
    }
}

pub async fn run(bus: &SystemBus, mut watchdog: Watchdog) -> ! {
    info!("watchdog armed");
    loop {
        let verdict = watchdog.supervise(&bus.heartbeat).await;
        apply(bus, &watchdog, verdict);
    }
}

/// Logs a verdict, queues it for the console and applies the policy.
pub fn apply(bus: &SystemBus, watchdog: &Watchdog, verdict: Verdict) {
    match verdict {
        Verdict::Alive => {}
        Verdict::Overload(report) => {
            warn!(
                "system overload: window {} missed ({} in a row)",
                report.window, report.consecutive
            );
            bus.console.push(ConsoleLine::Overload(report));
        }
        Verdict::Recovered { missed } => {
            info!("overload detector back after {} missed windows", missed);
            bus.console.push(ConsoleLine::Recovered { missed });
        }
    }

    match watchdog.inhibit_change(&verdict) {
        Some(true) => {
            warn!("throttle inhibited");
            bus.events.post(SensorFlags::THROTTLE_INHIBIT, SensorFlags::EMPTY);
        }
        Some(false) => {
            info!("throttle inhibit lifted");
            bus.events.post(SensorFlags::EMPTY, SensorFlags::THROTTLE_INHIBIT);
        }
        None => {}
    }
}
