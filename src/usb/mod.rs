//! USB OTG module for dual CDC-ACM serial ports.
//!
//! Exposes two virtual COM ports to the host, one per hardware UART:
//! - CDC0: bridged to UART channel 0
//! - CDC1: bridged to UART channel 1

pub mod transport;

pub use transport::UsbCdcTransport;
