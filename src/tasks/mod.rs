//! Embassy tasks module
//!
//! Contains the async tasks for the firmware: the USB device state machine
//! and the bridge scheduling loop.

pub mod bridge;

pub use bridge::{bridge_task, usb_device_task, UsbDriver};
