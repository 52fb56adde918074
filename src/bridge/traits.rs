//! Hardware seam traits for the bridge core
//!
//! These traits define the interfaces the relays run against, allowing the
//! actual UART and USB drivers to be swapped with mocks for testing.

use core::future::Future;

/// Identity of one UART/CDC channel pair.
///
/// UART *n* is bridged 1:1 to CDC function *n*.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortId {
    Port0,
    Port1,
}

impl PortId {
    /// Index usable for array lookup.
    pub fn index(self) -> usize {
        match self {
            PortId::Port0 => 0,
            PortId::Port1 => 1,
        }
    }

    /// The opposite port.
    pub fn other(self) -> PortId {
        match self {
            PortId::Port0 => PortId::Port1,
            PortId::Port1 => PortId::Port0,
        }
    }
}

/// Errors that can occur on the host transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The selected CDC port did not become ready for a write in time
    Stall,
    /// A bulk write was rejected by the driver
    WriteFailed,
}

/// One hardware serial port with a byte-oriented polling interface.
///
/// All operations are non-blocking: `rx_count` reports what is already
/// buffered, `read_byte` pops from that buffer, and `write` hands bytes to
/// the driver without waiting for them to leave the wire.
pub trait UartChannel {
    /// Number of received bytes currently buffered.
    fn rx_count(&mut self) -> u16;

    /// Pop one buffered byte. Callers must check `rx_count` first;
    /// an empty buffer yields 0.
    fn read_byte(&mut self) -> u8;

    /// Queue bytes for transmission, fire-and-forget.
    fn write(&mut self, data: &[u8]);
}

/// The shared upstream USB front end multiplexing both CDC functions.
///
/// Exactly one port is active for data transfer at a time; `select_port`
/// switches the target of the subsequent read/write calls.
pub trait HostTransport {
    /// True once per configuration transition (edge-triggered).
    fn configuration_changed(&mut self) -> bool;

    /// Whether the host has configured the device.
    fn is_configured(&mut self) -> bool;

    /// (Re)arm the data endpoints after a configuration transition.
    fn init_endpoints(&mut self);

    /// Choose the active CDC port for subsequent data operations.
    fn select_port(&mut self, port: PortId);

    /// Wait, bounded, until the selected port can accept a bulk write.
    ///
    /// Returns `TransportError::Stall` if the port does not become ready
    /// within the implementation's timeout.
    fn wait_write_ready(&mut self) -> impl Future<Output = Result<(), TransportError>>;

    /// Write bytes to the selected port as one bulk transfer.
    /// Valid only after `wait_write_ready` succeeded.
    fn write(&mut self, data: &[u8]) -> impl Future<Output = Result<(), TransportError>>;

    /// Whether inbound host data is waiting on the selected port.
    fn rx_ready(&mut self) -> bool;

    /// Drain inbound data of the selected port into `buf`, returning the
    /// number of bytes copied (at most `buf.len()`).
    fn read_all(&mut self, buf: &mut [u8]) -> u16;
}
