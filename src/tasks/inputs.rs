//! Button and switch polling.
//!
//! Each bank owns a disjoint subset of the event group and republishes that
//! subset in one step every poll.

use embassy_time::{Duration, Ticker};

use crate::config::{BUTTON_POLL_PERIOD, DEBOUNCE_SAMPLES, SWITCH_POLL_PERIOD};
use crate::drivers::panel::{decode_buttons, decode_switches, Debouncer, InputBank};
use crate::state::SensorFlags;
use crate::sync::EventGroup;
use crate::tasks::SystemBus;
use crate::{debug, info};

pub struct InputPoller<B> {
    bank: B,
    decode: fn(u32) -> SensorFlags,
    owned: SensorFlags,
    period: Duration,
    debouncer: Debouncer,
}

impl<B: InputBank> InputPoller<B> {
    /// Key bank: gas, brake, cruise request.
    pub fn buttons(bank: B) -> Self {
        Self {
            bank,
            decode: decode_buttons,
            owned: SensorFlags::BUTTONS,
            period: BUTTON_POLL_PERIOD,
            debouncer: Debouncer::new(DEBOUNCE_SAMPLES),
        }
    }

    /// Toggle bank: engine, top gear.
    pub fn switches(bank: B) -> Self {
        Self {
            bank,
            decode: decode_switches,
            owned: SensorFlags::SWITCHES,
            period: SWITCH_POLL_PERIOD,
            debouncer: Debouncer::new(DEBOUNCE_SAMPLES),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Samples the bank once and publishes the debounced subset.
    pub fn poll(&mut self, events: &EventGroup) -> SensorFlags {
        let raw = (self.decode)(self.bank.read());
        let stable = self.debouncer.sample(raw);
        let before = events.snapshot().intersection(self.owned);
        events.publish(self.owned, stable);
        if before != stable {
            debug!("inputs {} -> {}", before.bits(), stable.bits());
        }
        stable
    }
}

pub async fn run<B: InputBank>(bus: &SystemBus, mut poller: InputPoller<B>) -> ! {
    info!("input poller started");
    let mut ticker = Ticker::every(poller.period());
    loop {
        poller.poll(&bus.events);
        ticker.next().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::panel::{BUTTON_BRAKE, BUTTON_GAS, SWITCH_ENGINE, SWITCH_TOP_GEAR};

    struct Scripted<'a> {
        samples: &'a [u32],
        next: usize,
    }

    impl InputBank for Scripted<'_> {
        fn read(&mut self) -> u32 {
            let value = self.samples[self.next.min(self.samples.len() - 1)];
            self.next += 1;
            value
        }
    }

    #[test]
    fn banks_publish_only_their_own_flags() {
        let events = EventGroup::new();
        let mut switches = InputPoller::switches(Scripted {
            samples: &[SWITCH_ENGINE | SWITCH_TOP_GEAR],
            next: 0,
        });
        let mut buttons = InputPoller::buttons(Scripted {
            samples: &[BUTTON_GAS, 0],
            next: 0,
        });

        switches.poll(&events);
        buttons.poll(&events);
        assert_eq!(
            events.snapshot(),
            SensorFlags::SWITCHES.union(SensorFlags::GAS)
        );

        buttons.poll(&events);
        assert_eq!(events.snapshot(), SensorFlags::SWITCHES);
    }

    #[test]
    fn release_clears_flag_on_next_poll() {
        let events = EventGroup::new();
        let mut buttons = InputPoller::buttons(Scripted {
            samples: &[BUTTON_BRAKE, BUTTON_BRAKE | BUTTON_GAS, 0],
            next: 0,
        });
        assert!(buttons.poll(&events).brake_pedal());
        let both = buttons.poll(&events);
        assert!(both.brake_pedal() && both.gas_pedal());
        assert_eq!(buttons.poll(&events), SensorFlags::EMPTY);
        assert!(events.snapshot().excludes(SensorFlags::BUTTONS));
    }

    #[test]
    fn poll_rates_follow_bank() {
        let keys = InputPoller::buttons(Scripted { samples: &[0], next: 0 });
        let toggles = InputPoller::switches(Scripted { samples: &[0], next: 0 });
        assert_eq!(keys.period(), BUTTON_POLL_PERIOD);
        assert_eq!(toggles.period(), SWITCH_POLL_PERIOD);
    }
}
