#![no_std]
#![no_main]

mod board;
mod usb;

use cortex_m_rt::entry;
use defmt::info;
use embassy_executor::{Executor, InterruptExecutor};
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::{InterruptExt, Priority};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use cruise_control::drivers::cruise::CruiseController;
use cruise_control::drivers::load::{LoadConfig, LoadGenerator};
use cruise_control::health::{Watchdog, WatchdogConfig};
use cruise_control::tasks::inputs::InputPoller;
use cruise_control::tasks::load::ExtraLoad;
use cruise_control::tasks::panel::Panel;
use cruise_control::tasks::vehicle::Vehicle;
use cruise_control::tasks::{self, SystemBus};
use cruise_control::utilization::{self, TrackedExt};

use crate::board::{Board, KeyBank, PanelLeds, SwitchBank};
use crate::usb::UsbSerial;

// ── Shared primitives ────────────────────────────────────────────────────────
static BUS: SystemBus = SystemBus::new();

// ── Executors ────────────────────────────────────────────────────────────────
//  NVIC: lower number preempts. Thread mode sits below all of them.
static EXECUTOR_CRITICAL: InterruptExecutor = InterruptExecutor::new();
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();
static EXECUTOR_MEDIUM: InterruptExecutor = InterruptExecutor::new();
static EXECUTOR_THREAD: StaticCell<Executor> = StaticCell::new();

#[interrupt]
unsafe fn UART4() {
    EXECUTOR_CRITICAL.on_interrupt()
}

#[interrupt]
unsafe fn UART5() {
    EXECUTOR_HIGH.on_interrupt()
}

#[interrupt]
unsafe fn USART6() {
    EXECUTOR_MEDIUM.on_interrupt()
}

// ── Critical ─────────────────────────────────────────────────────────────────
#[embassy_executor::task]
async fn watchdog_task(watchdog: Watchdog) -> ! {
    tasks::watchdog::run(&BUS, watchdog)
        .tracked(&BUS.meter, utilization::WATCHDOG)
        .await
}

#[embassy_executor::task]
async fn control_task(controller: CruiseController) -> ! {
    tasks::control::run(&BUS, controller)
        .tracked(&BUS.meter, utilization::CONTROL)
        .await
}

// ── High ─────────────────────────────────────────────────────────────────────
#[embassy_executor::task]
async fn vehicle_task(vehicle: Vehicle) -> ! {
    tasks::vehicle::run(&BUS, vehicle)
        .tracked(&BUS.meter, utilization::VEHICLE)
        .await
}

#[embassy_executor::task]
async fn cpu_task() -> ! {
    tasks::cpu::run(&BUS)
        .tracked(&BUS.meter, utilization::CPU_REPORTER)
        .await
}

// ── Medium ───────────────────────────────────────────────────────────────────
#[embassy_executor::task]
async fn button_task(poller: InputPoller<KeyBank>) -> ! {
    tasks::inputs::run(&BUS, poller)
        .tracked(&BUS.meter, utilization::BUTTONS)
        .await
}

#[embassy_executor::task]
async fn switch_task(poller: InputPoller<SwitchBank>) -> ! {
    tasks::inputs::run(&BUS, poller)
        .tracked(&BUS.meter, utilization::SWITCHES)
        .await
}

#[embassy_executor::task]
async fn panel_task(panel: Panel<PanelLeds>) -> ! {
    tasks::panel::run(&BUS, panel)
        .tracked(&BUS.meter, utilization::PANEL)
        .await
}

// ── Thread mode ──────────────────────────────────────────────────────────────
#[embassy_executor::task]
async fn extra_load_task(load: ExtraLoad) -> ! {
    tasks::load::run(&BUS, load)
        .tracked(&BUS.meter, utilization::EXTRA_LOAD)
        .await
}

#[embassy_executor::task]
async fn overload_detector_task() -> ! {
    tasks::watchdog::overload_detector(&BUS)
        .tracked(&BUS.meter, utilization::OVERLOAD_DETECTOR)
        .await
}

#[embassy_executor::task]
async fn console_task(serial: UsbSerial<'static>) -> ! {
    usb::console_task(serial, &BUS.console)
        .tracked(&BUS.meter, utilization::CONSOLE)
        .await
}

// ── Main ─────────────────────────────────────────────────────────────────────
#[entry]
fn main() -> ! {
    info!("Lab: Cruise Control");

    // 1. Board init (168 MHz PLL) and dashboard I/O
    let board = Board::init();
    let p = board.p;
    let dash = board::Dashboard::new(
        p.PC0, p.PC1, p.PC2, p.PC3, p.PC4, p.PC13, p.PB5, p.PB6, p.PB7,
    );

    // 2. USB CDC-ACM console
    let (usb_dev, usb_serial) = usb::init(p.USB_OTG_FS, p.PA12, p.PA11);

    // 3. Synthetic load calibration (timer must be running)
    let generator = LoadGenerator::calibrate(&LoadConfig::default());
    info!(
        "extra load calibrated: {} iterations per percent",
        generator.iterations_per_percent()
    );

    // 4. Critical: watchdog and control
    interrupt::UART4.set_priority(Priority::P5);
    let spawner = EXECUTOR_CRITICAL.start(interrupt::UART4);
    spawner
        .spawn(watchdog_task(Watchdog::new(WatchdogConfig::default())))
        .unwrap();
    spawner
        .spawn(control_task(CruiseController::default()))
        .unwrap();

    // 5. High: vehicle model and CPU reporter
    interrupt::UART5.set_priority(Priority::P6);
    let spawner = EXECUTOR_HIGH.start(interrupt::UART5);
    spawner.spawn(vehicle_task(Vehicle::default())).unwrap();
    spawner.spawn(cpu_task()).unwrap();

    // 6. Medium: panel I/O
    interrupt::USART6.set_priority(Priority::P7);
    let spawner = EXECUTOR_MEDIUM.start(interrupt::USART6);
    spawner
        .spawn(button_task(InputPoller::buttons(dash.keys)))
        .unwrap();
    spawner
        .spawn(switch_task(InputPoller::switches(dash.switches)))
        .unwrap();
    spawner.spawn(panel_task(Panel::new(dash.leds))).unwrap();

    // 7. Thread mode: everything that may be starved
    let executor = EXECUTOR_THREAD.init(Executor::new());
    executor.run(|spawner| {
        spawner.spawn(usb::usb_task(usb_dev)).unwrap();
        spawner.spawn(console_task(usb_serial)).unwrap();
        spawner
            .spawn(extra_load_task(ExtraLoad::new(generator)))
            .unwrap();
        spawner.spawn(overload_detector_task()).unwrap();
        info!("All tasks spawned");
    })
}
