//! Bridge and USB device tasks.

use embassy_futures::yield_now;
use embassy_usb::UsbDevice;

use crate::bridge::Bridge;
use crate::uart::UartPort;
use crate::usb::UsbCdcTransport;

/// Concrete USB driver for the ESP32-S3 OTG peripheral.
pub type UsbDriver = esp_hal::otg_fs::asynch::Driver<'static>;

/// Task that runs the embassy-usb device state machine.
///
/// Handles enumeration, configuration and endpoint servicing; must run
/// alongside the bridge task on the same executor.
#[embassy_executor::task]
pub async fn usb_device_task(mut device: UsbDevice<'static, UsbDriver>) {
    device.run().await
}

/// Task that runs the bridge scheduler forever.
///
/// One service cycle per iteration, with a yield in between so the USB
/// device task keeps servicing the bus.
#[embassy_executor::task]
pub async fn bridge_task(
    mut transport: UsbCdcTransport<'static, UsbDriver>,
    mut uarts: [UartPort<'static>; 2],
) {
    let mut bridge = Bridge::new();
    log::info!("bridge task started");

    loop {
        bridge.service_cycle(&mut uarts, &mut transport).await;
        yield_now().await;
    }
}
