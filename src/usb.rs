use embassy_stm32::usb_otg::{self, Driver};
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_usb::class::cdc_acm::{CdcAcmClass, State};
use embassy_usb::driver::EndpointError;
use embassy_usb::{Builder, Config, UsbDevice};
use static_cell::StaticCell;

use cruise_control::console::Console;

bind_interrupts!(pub struct Irqs {
    OTG_FS => usb_otg::InterruptHandler<peripherals::USB_OTG_FS>;
});

pub type UsbDriver = Driver<'static, peripherals::USB_OTG_FS>;
pub type UsbSerial<'a> = CdcAcmClass<'a, UsbDriver>;

const MAX_PACKET: usize = 64;

struct UsbResources {
    config_desc: [u8; 256],
    bos_desc: [u8; 256],
    control_buf: [u8; 64],
    ep_out_buffer: [u8; 256],
}

static USB_RES: StaticCell<UsbResources> = StaticCell::new();
static CDC_STATE: StaticCell<State<'static>> = StaticCell::new();

#[embassy_executor::task]
pub async fn usb_task(mut device: UsbDevice<'static, UsbDriver>) -> ! {
    device.run().await
}

/// Drains the console queue onto the CDC port while a host is attached.
pub async fn console_task(mut serial: UsbSerial<'static>, console: &'static Console) -> ! {
    loop {
        serial.wait_connection().await;
        defmt::info!("console attached");
        let _ = pump(&mut serial, console).await;
        defmt::info!("console detached, {} lines dropped so far", console.dropped());
    }
}

async fn pump(serial: &mut UsbSerial<'static>, console: &Console) -> Result<(), EndpointError> {
    loop {
        let mut line = console.next().await.render();
        let _ = line.push_str("\r\n");
        let bytes = line.as_bytes();
        for chunk in bytes.chunks(MAX_PACKET) {
            serial.write_packet(chunk).await?;
        }
        if bytes.len() % MAX_PACKET == 0 {
            // Full last packet: terminate the transfer.
            serial.write_packet(&[]).await?;
        }
    }
}

pub fn init(
    usb_periph: peripherals::USB_OTG_FS,
    pa12: peripherals::PA12,
    pa11: peripherals::PA11,
) -> (UsbDevice<'static, UsbDriver>, UsbSerial<'static>) {
    let UsbResources {
        config_desc,
        bos_desc,
        control_buf,
        ep_out_buffer,
    } = USB_RES.init(UsbResources {
        config_desc: [0; 256],
        bos_desc: [0; 256],
        control_buf: [0; 64],
        ep_out_buffer: [0; 256],
    });

    let mut usb_config = usb_otg::Config::default();
    usb_config.vbus_detection = false;
    let driver = Driver::new_fs(usb_periph, Irqs, pa12, pa11, ep_out_buffer, usb_config);

    let mut config = Config::new(0xc0de, 0xcafe);
    config.manufacturer = Some("Cruise Lab");
    config.product = Some("Cruise Control Console");
    config.serial_number = Some("00000001");

    let mut builder = Builder::new(
        driver,
        config,
        config_desc,
        bos_desc,
        &mut [], // msos_descs
        control_buf,
    );

    let state = CDC_STATE.init(State::new());
    let class = CdcAcmClass::new(&mut builder, state, MAX_PACKET as u16);
    let usb = builder.build();

    (usb, class)
}
