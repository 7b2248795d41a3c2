use defmt::debug;
use embassy_stm32::gpio::{AnyPin, Input, Level, Output, Pin, Pull, Speed};
use embassy_stm32::peripherals::{PB5, PB6, PB7, PC0, PC1, PC13, PC2, PC3, PC4};
use embassy_stm32::rcc::*;
use embassy_stm32::time::Hertz as TimeHertz;
use embassy_stm32::Config;

use cruise_control::drivers::panel::{
    InputBank, PanelSink, BUTTON_BRAKE, BUTTON_CRUISE, BUTTON_GAS, LED_GREEN_BRAKE,
    LED_GREEN_CRUISE_ACTIVE, LED_RED_ENGINE, LED_RED_TOP_GEAR, SWITCH_ENGINE, SWITCH_TOP_GEAR,
};

pub struct Board {
    pub p: embassy_stm32::Peripherals,
}

impl Board {
    pub fn init() -> Self {
        let mut config = Config::default();
        config.rcc.hse = Some(Hse {
            freq: TimeHertz(8_000_000), // 8 MHz crystal
            mode: HseMode::Oscillator,
        });
        config.rcc.pll_src = PllSource::HSE;
        config.rcc.pll = Some(Pll {
            prediv: PllPreDiv::DIV4,
            mul: PllMul::MUL168,
            divp: Some(PllPDiv::DIV2), // 168 MHz
            divq: Some(PllQDiv::DIV7), // 48 MHz for USB
            divr: None,
        });
        config.rcc.sys = Sysclk::PLL1_P;
        config.rcc.ahb_pre = AHBPrescaler::DIV1;
        config.rcc.apb1_pre = APBPrescaler::DIV4;
        config.rcc.apb2_pre = APBPrescaler::DIV2;

        let p = embassy_stm32::init(config);

        Self { p }
    }
}

// ── Dashboard ────────────────────────────────────────────────────────────────
//  Push buttons and toggles pull to ground, so a low pin reads as 1.

fn active_low(pin: &Input<'static, AnyPin>, bit: u32) -> u32 {
    if pin.is_low() {
        bit
    } else {
        0
    }
}

/// Cruise (PC0), brake (PC1) and gas (PC2) push buttons.
pub struct KeyBank {
    cruise: Input<'static, AnyPin>,
    brake: Input<'static, AnyPin>,
    gas: Input<'static, AnyPin>,
}

impl InputBank for KeyBank {
    fn read(&mut self) -> u32 {
        active_low(&self.cruise, BUTTON_CRUISE)
            | active_low(&self.brake, BUTTON_BRAKE)
            | active_low(&self.gas, BUTTON_GAS)
    }
}

/// Engine (PC3) and top-gear (PC4) toggles.
pub struct SwitchBank {
    engine: Input<'static, AnyPin>,
    top_gear: Input<'static, AnyPin>,
}

impl InputBank for SwitchBank {
    fn read(&mut self) -> u32 {
        active_low(&self.engine, SWITCH_ENGINE) | active_low(&self.top_gear, SWITCH_TOP_GEAR)
    }
}

/// The board has four spare LEDs; the rest of the frame goes to the log.
pub struct PanelLeds {
    engine: Output<'static, AnyPin>,
    top_gear: Output<'static, AnyPin>,
    cruise: Output<'static, AnyPin>,
    brake: Output<'static, AnyPin>,
}

fn drive(led: &mut Output<'static, AnyPin>, on: bool) {
    // LEDs sink current: low is lit.
    led.set_level(if on { Level::Low } else { Level::High });
}

impl PanelSink for PanelLeds {
    fn write_red_leds(&mut self, pattern: u32) {
        drive(&mut self.engine, pattern & LED_RED_ENGINE != 0);
        drive(&mut self.top_gear, pattern & LED_RED_TOP_GEAR != 0);
        debug!("red leds {=u32:#x}", pattern);
    }

    fn write_green_leds(&mut self, pattern: u16) {
        drive(&mut self.cruise, pattern & LED_GREEN_CRUISE_ACTIVE != 0);
        drive(&mut self.brake, pattern & LED_GREEN_BRAKE != 0);
        debug!("green leds {=u16:#x}", pattern);
    }

    fn write_seven_seg_low(&mut self, value: i16) {
        debug!("speed {} m/s", value);
    }

    fn write_seven_seg_high(&mut self, value: i16) {
        debug!("target {} m/s", value);
    }
}

pub struct Dashboard {
    pub keys: KeyBank,
    pub switches: SwitchBank,
    pub leds: PanelLeds,
}

impl Dashboard {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pc0: PC0,
        pc1: PC1,
        pc2: PC2,
        pc3: PC3,
        pc4: PC4,
        pc13: PC13,
        pb5: PB5,
        pb6: PB6,
        pb7: PB7,
    ) -> Self {
        let input = |pin: AnyPin| Input::new(pin, Pull::Up);
        let led = |pin: AnyPin| Output::new(pin, Level::High, Speed::Low);
        Self {
            keys: KeyBank {
                cruise: input(pc0.degrade()),
                brake: input(pc1.degrade()),
                gas: input(pc2.degrade()),
            },
            switches: SwitchBank {
                engine: input(pc3.degrade()),
                top_gear: input(pc4.degrade()),
            },
            leds: PanelLeds {
                engine: led(pc13.degrade()),
                top_gear: led(pb5.degrade()),
                cruise: led(pb6.degrade()),
                brake: led(pb7.degrade()),
            },
        }
    }
}
