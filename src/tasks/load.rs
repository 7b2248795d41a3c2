use embassy_time::Ticker;

use crate::config::EXTRA_LOAD_PERIOD;
use crate::console::ConsoleLine;
use crate::drivers::load::{load_percent_for, LoadGenerator};
use crate::tasks::SystemBus;
use crate::{debug, info};

/// Burns CPU in proportion to where the car is on the track.
pub struct ExtraLoad {
    generator: LoadGenerator,
    position: u16,
}

impl ExtraLoad {
    pub fn new(generator: LoadGenerator) -> Self {
        Self {
            generator,
            position: 0,
        }
    }

    /// One period of load. Returns the dial value used.
    pub fn cycle(&mut self, bus: &SystemBus) -> u8 {
        bus.position.refresh(&mut self.position);
        let percent = load_percent_for(self.position);
        let iterations = self.generator.burn(percent);
        debug!("extra load {}% ({} iterations)", percent, iterations);
        bus.console.push(ConsoleLine::ExtraLoad(percent));
        percent
    }
}

pub async fn run(bus: &SystemBus, mut load: ExtraLoad) -> ! {
    info!(
        "extra load started, {} iterations per percent",
        load.generator.iterations_per_percent()
    );
    let mut ticker = Ticker::every(EXTRA_LOAD_PERIOD);
    loop {
        load.cycle(bus);
        ticker.next().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dial_follows_latest_position() {
        let bus = SystemBus::new();
        let mut load = ExtraLoad::new(LoadGenerator::new(1));
        assert_eq!(load.cycle(&bus), 0);

        bus.position.post(9000);
        assert_eq!(load.cycle(&bus), 40);
        // No new position: keeps the last one.
        assert_eq!(load.cycle(&bus), 40);

        bus.position.post(21000);
        assert_eq!(load.cycle(&bus), 100);
        assert_eq!(bus.console.try_next(), Some(ConsoleLine::ExtraLoad(0)));
    }
}
