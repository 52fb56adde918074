//! Channel-multiplexing bridge core
//!
//! Hardware-independent scheduling logic connecting two UARTs to two CDC
//! ports through one shared USB transport. Everything here runs against the
//! traits in [`traits`], so the whole module is unit-tested on the host.

pub mod relay;
pub mod traits;
pub mod watcher;

pub use relay::{InboundRelay, OutboundRelay, PortCursor};
pub use traits::{HostTransport, PortId, TransportError, UartChannel};

/// The bridge scheduler: both relays plus the configuration watcher,
/// serviced as one cycle.
pub struct Bridge {
    inbound: InboundRelay,
    outbound: OutboundRelay,
}

impl Bridge {
    pub fn new() -> Self {
        Self {
            inbound: InboundRelay::new(),
            outbound: OutboundRelay::new(),
        }
    }

    /// Run one scheduling cycle: configuration watch, then host→UART, then
    /// UART→host. Each relay services one port and hands the turn over, so
    /// a port pair is fully revisited every second cycle.
    ///
    /// Transport stalls are counted and logged by the inbound relay; they
    /// never abort the cycle.
    pub async fn service_cycle<U: UartChannel, T: HostTransport>(
        &mut self,
        uarts: &mut [U; 2],
        transport: &mut T,
    ) {
        watcher::poll(transport);
        self.outbound.service(uarts, transport);
        let _ = self.inbound.service(uarts, transport).await;
    }

    /// Turns lost to a stalled host port since startup.
    pub fn stall_count(&self) -> u32 {
        self.inbound.stall_count()
    }
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new()
    }
}
