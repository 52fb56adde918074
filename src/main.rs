#![no_std]
#![no_main]

// Required for ESP-IDF bootloader compatibility
// Use explicit parameters to ensure correct efuse block revision values
esp_bootloader_esp_idf::esp_app_desc!(
    env!("CARGO_PKG_VERSION"),  // version
    env!("CARGO_PKG_NAME"),     // project_name
    "00:00:00",                 // build_time
    "2025-01-01",               // build_date
    "0.0.0",                    // idf_ver (not using IDF)
    0x10000,                    // mmu_page_size (64KB)
    0,                          // min_efuse_blk_rev_full (accept all)
    u16::MAX                    // max_efuse_blk_rev_full (accept all)
);

use embassy_usb::class::cdc_acm::{CdcAcmClass, State};
use embassy_usb::Builder;
use esp_backtrace as _;
use esp_hal::otg_fs::asynch::{Config as OtgConfig, Driver};
use esp_hal::otg_fs::Usb;
use esp_hal::timer::timg::TimerGroup;
use esp_hal::uart::{Config as UartConfig, Uart};
use static_cell::StaticCell;

mod bridge;
mod config;
mod tasks;
mod uart;
mod usb;

use tasks::UsbDriver;
use uart::UartPort;
use usb::UsbCdcTransport;

/// Static executor for embassy
static EXECUTOR: StaticCell<esp_rtos::embassy::Executor> = StaticCell::new();

/// OTG OUT endpoint buffer
static EP_OUT_BUFFER: StaticCell<[u8; 1024]> = StaticCell::new();

/// embassy-usb descriptor and control buffers
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 64]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// CDC-ACM class state, one per COM port
static CDC0_STATE: StaticCell<State> = StaticCell::new();
static CDC1_STATE: StaticCell<State> = StaticCell::new();

#[esp_hal::main]
fn main() -> ! {
    let peripherals = esp_hal::init(esp_hal::Config::default());

    // Log over the USB Serial JTAG pins; the OTG peripheral is taken by
    // the two data CDCs
    esp_println::logger::init_logger_from_env();

    // Initialise the RTOS scheduler with timer - MUST be done before any async operations
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // Both bridge UARTs run fixed 115200 8N1
    let uart_config = || UartConfig::default().with_baudrate(config::serial::BAUD_RATE);

    let uart0 = Uart::new(peripherals.UART1, uart_config())
        .unwrap()
        .with_tx(peripherals.GPIO17)
        .with_rx(peripherals.GPIO18);
    let uart1 = Uart::new(peripherals.UART2, uart_config())
        .unwrap()
        .with_tx(peripherals.GPIO15)
        .with_rx(peripherals.GPIO16);

    let (rx0, tx0) = uart0.split();
    let (rx1, tx1) = uart1.split();
    let ports = [UartPort::new(rx0, tx0), UartPort::new(rx1, tx1)];

    // USB OTG full-speed peripheral on the fixed D-/D+ pins
    let otg = Usb::new(peripherals.USB0, peripherals.GPIO20, peripherals.GPIO19);
    let driver = Driver::new(otg, EP_OUT_BUFFER.init([0; 1024]), OtgConfig::default());

    // Composite device with two CDC-ACM functions behind IADs
    let mut usb_config = embassy_usb::Config::new(config::usb::VID, config::usb::PID);
    usb_config.manufacturer = Some(config::usb::MANUFACTURER);
    usb_config.product = Some(config::usb::PRODUCT);
    usb_config.composite_with_iads = true;
    usb_config.device_class = 0xEF;
    usb_config.device_sub_class = 0x02;
    usb_config.device_protocol = 0x01;

    let mut builder = Builder::new(
        driver,
        usb_config,
        CONFIG_DESCRIPTOR.init([0; 256]),
        BOS_DESCRIPTOR.init([0; 64]),
        &mut [], // no msos descriptors
        CONTROL_BUF.init([0; 64]),
    );

    let cdc0: CdcAcmClass<'static, UsbDriver> = CdcAcmClass::new(
        &mut builder,
        CDC0_STATE.init(State::new()),
        config::usb::MAX_PACKET_SIZE as u16,
    );
    let cdc1: CdcAcmClass<'static, UsbDriver> = CdcAcmClass::new(
        &mut builder,
        CDC1_STATE.init(State::new()),
        config::usb::MAX_PACKET_SIZE as u16,
    );

    let usb_device = builder.build();
    let transport = UsbCdcTransport::new([cdc0, cdc1]);

    // Create and run the embassy executor
    let executor = EXECUTOR.init(esp_rtos::embassy::Executor::new());
    executor.run(|spawner| {
        spawner.must_spawn(tasks::usb_device_task(usb_device));
        spawner.must_spawn(tasks::bridge_task(transport, ports));
    })
}
