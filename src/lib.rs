#![cfg_attr(not(test), no_std)]

pub mod bridge;
pub mod config;

// These modules depend on esp-hal/embassy features only available with embedded feature
#[cfg(feature = "embedded")]
pub mod tasks;
#[cfg(feature = "embedded")]
pub mod uart;
#[cfg(feature = "embedded")]
pub mod usb;
