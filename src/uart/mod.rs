//! esp-hal UART glue for the bridge core.

pub mod port;

pub use port::UartPort;
