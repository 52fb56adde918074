//! Hardware configuration constants for the ESP32-S3 dual COM port bridge

/// UART0 pins (channel pair 0)
pub mod uart0_pins {
    pub const TX: u8 = 17;
    pub const RX: u8 = 18;
}

/// UART1 pins (channel pair 1)
pub mod uart1_pins {
    pub const TX: u8 = 15;
    pub const RX: u8 = 16;
}

/// Serial configuration
///
/// Both UARTs run a fixed 115200 8N1; there is no runtime renegotiation
/// and host-side line coding requests are ignored.
pub mod serial {
    pub const BAUD_RATE: u32 = 115_200;

    /// Software RX buffer behind each hardware FIFO
    pub const RX_BUFFER_SIZE: usize = 256;
}

/// Bridge scheduling constants
pub mod bridge {
    /// Per-turn staging buffer, sized to one full-speed bulk packet.
    /// A drain never exceeds this; surplus bytes wait for the next turn.
    pub const STAGING_CAPACITY: usize = 64;

    /// Upper bound on waiting for CDC IN readiness before the staged
    /// bytes are dropped and the stall is reported.
    pub const WRITE_READY_TIMEOUT_MS: u64 = 500;
}

/// USB device identity
pub mod usb {
    /// Espressif test VID/PID pair
    pub const VID: u16 = 0x303a;
    pub const PID: u16 = 0x4002;

    pub const MANUFACTURER: &str = "innomatic";
    pub const PRODUCT: &str = "Dual COM Bridge";

    /// Max packet size for the CDC data endpoints
    pub const MAX_PACKET_SIZE: u8 = 64;
}
