use embassy_time::Ticker;

use crate::config::PANEL_REFRESH_PERIOD;
use crate::drivers::panel::{PanelFrame, PanelSink};
use crate::state::{CruiseStatus, VehicleState};
use crate::tasks::SystemBus;
use crate::info;

/// Sole owner of the LEDs and seven-segment displays.
pub struct Panel<P> {
    sink: P,
    vehicle: VehicleState,
    cruise: CruiseStatus,
    last: Option<PanelFrame>,
}

impl<P: PanelSink> Panel<P> {
    pub fn new(sink: P) -> Self {
        Self {
            sink,
            vehicle: VehicleState::default(),
            cruise: CruiseStatus::default(),
            last: None,
        }
    }

    /// Composes a frame from the latest inputs and writes it if it changed.
    pub fn refresh(&mut self, bus: &SystemBus) -> PanelFrame {
        bus.vehicle.refresh(&mut self.vehicle);
        bus.cruise.refresh(&mut self.cruise);
        let frame = PanelFrame::compose(bus.events.snapshot(), self.vehicle, self.cruise);
        if self.last != Some(frame) {
            frame.write_to(&mut self.sink);
            self.last = Some(frame);
        }
        frame
    }

    pub fn sink(&self) -> &P {
        &self.sink
    }
}

pub async fn run<P: PanelSink>(bus: &SystemBus, mut panel: Panel<P>) -> ! {
    info!("panel task started");
    let mut ticker = Ticker::every(PANEL_REFRESH_PERIOD);
    loop {
        panel.refresh(bus);
        ticker.next().await;
    }
}
