use embassy_time::{Instant, Ticker};

use crate::config::{CPU_REPORT_PERIOD, CPU_WARN_DECI_PERCENT};
use crate::console::ConsoleLine;
use crate::tasks::SystemBus;
use crate::utilization::{CpuSampler, DeciPercent, MAX_TASKS, TASK_NAMES, TaskId};
use crate::{debug, info, warn};

pub const WARN_THRESHOLD: DeciPercent = DeciPercent(CPU_WARN_DECI_PERCENT);

/// Logs one load figure. Returns `true` if it crossed the warning line.
pub fn report(bus: &SystemBus, load: DeciPercent) -> bool {
    bus.console.push(ConsoleLine::CpuUsage(load));
    if load > WARN_THRESHOLD {
        warn!("high CPU load: {}.{}%", load.whole(), load.tenths());
        true
    } else {
        info!("CPU usage {}.{}%", load.whole(), load.tenths());
        false
    }
}

pub async fn run(bus: &SystemBus) -> ! {
    let mut sampler = CpuSampler::new(&bus.meter, Instant::now());
    let mut last_ticks = [0u32; MAX_TASKS];
    let mut ticker = Ticker::every(CPU_REPORT_PERIOD);
    loop {
        ticker.next().await;
        let Some(load) = sampler.sample(&bus.meter, Instant::now()) else {
            continue;
        };
        report(bus, load);

        for (i, name) in TASK_NAMES.iter().enumerate() {
            let ticks = bus.meter.ticks(TaskId(i));
            debug!("  {}: {} ticks", name, ticks.wrapping_sub(last_ticks[i]));
            last_ticks[i] = ticks;
        }
        if bus.console.dropped() > 0 {
            debug!("console dropped {} lines", bus.console.dropped());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_warns_above_threshold() {
        let bus = SystemBus::new();
        assert!(!report(&bus, DeciPercent(800)));
        assert!(report(&bus, DeciPercent(801)));
        assert_eq!(
            bus.console.try_next(),
            Some(ConsoleLine::CpuUsage(DeciPercent(800)))
        );
    }
}
