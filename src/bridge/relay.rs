//! Round-robin relays moving bytes between the UARTs and the CDC ports
//!
//! Two relays, one per direction, each with its own alternating port
//! cursor. A relay services exactly one port per call and hands the turn to
//! the other port afterwards, whether or not any bytes moved, so a bursty
//! port can never starve its neighbour.

use crate::config::bridge::STAGING_CAPACITY;

use super::traits::{HostTransport, PortId, TransportError, UartChannel};

/// Alternating port selector.
///
/// Owned by a relay as a plain field; there is no process-global cursor
/// state.
#[derive(Debug)]
pub struct PortCursor {
    current: PortId,
}

impl PortCursor {
    pub fn new() -> Self {
        Self {
            current: PortId::Port0,
        }
    }

    /// The port the next turn will service.
    pub fn current(&self) -> PortId {
        self.current
    }

    /// Yield the current port and hand the turn to the other one.
    pub fn take_turn(&mut self) -> PortId {
        let port = self.current;
        self.current = port.other();
        port
    }
}

impl Default for PortCursor {
    fn default() -> Self {
        Self::new()
    }
}

/// UART → host relay.
///
/// Drains one UART's receive buffer into a staging buffer and forwards the
/// batch to the matching CDC port as a single bulk write.
pub struct InboundRelay {
    cursor: PortCursor,
    stalls: u32,
}

impl InboundRelay {
    pub fn new() -> Self {
        Self {
            cursor: PortCursor::new(),
            stalls: 0,
        }
    }

    /// The port the next call will service.
    pub fn current_port(&self) -> PortId {
        self.cursor.current()
    }

    /// Number of turns lost to a stalled host port so far.
    pub fn stall_count(&self) -> u32 {
        self.stalls
    }

    /// Service one port, then advance the cursor.
    ///
    /// Returns the number of bytes forwarded. The drain is capped at the
    /// staging capacity; surplus bytes stay queued in the UART driver and
    /// are picked up on this port's next turn. If the host port does not
    /// become ready in time the staged bytes are dropped and the stall is
    /// reported, so the other port keeps making progress.
    pub async fn service<U: UartChannel, T: HostTransport>(
        &mut self,
        uarts: &mut [U; 2],
        transport: &mut T,
    ) -> Result<usize, TransportError> {
        let port = self.cursor.take_turn();

        let pending = uarts[port.index()].rx_count() as usize;
        if pending == 0 {
            return Ok(0);
        }

        let mut staging = [0u8; STAGING_CAPACITY];
        let count = pending.min(STAGING_CAPACITY);
        for slot in staging[..count].iter_mut() {
            *slot = uarts[port.index()].read_byte();
        }

        transport.select_port(port);
        let delivered = async {
            transport.wait_write_ready().await?;
            transport.write(&staging[..count]).await
        }
        .await;

        match delivered {
            Ok(()) => Ok(count),
            // A stall can surface at either stage: waiting for readiness,
            // or inside the bulk write when the host stops draining the
            // endpoint. Both drop the staged bytes and yield the turn.
            Err(TransportError::Stall) => {
                self.stalls = self.stalls.wrapping_add(1);
                log::warn!(
                    "host port {} stalled, dropping {} byte(s)",
                    port.index(),
                    count
                );
                Err(TransportError::Stall)
            }
            Err(err) => Err(err),
        }
    }
}

impl Default for InboundRelay {
    fn default() -> Self {
        Self::new()
    }
}

/// Host → UART relay.
///
/// Reads whatever the host has sent to one CDC port and forwards it to the
/// matching UART.
pub struct OutboundRelay {
    cursor: PortCursor,
}

impl OutboundRelay {
    pub fn new() -> Self {
        Self {
            cursor: PortCursor::new(),
        }
    }

    /// The port the next call will service.
    pub fn current_port(&self) -> PortId {
        self.cursor.current()
    }

    /// Service one port, then advance the cursor.
    ///
    /// The port is selected on the transport before the configuration check
    /// so the per-function transport state stays consistent during the
    /// pre-configured period. Returns the number of bytes forwarded.
    pub fn service<U: UartChannel, T: HostTransport>(
        &mut self,
        uarts: &mut [U; 2],
        transport: &mut T,
    ) -> usize {
        let port = self.cursor.take_turn();

        transport.select_port(port);
        if !transport.is_configured() || !transport.rx_ready() {
            return 0;
        }

        let mut buf = [0u8; STAGING_CAPACITY];
        let count = transport.read_all(&mut buf) as usize;
        if count > 0 {
            uarts[port.index()].write(&buf[..count]);
        }

        count
    }
}

impl Default for OutboundRelay {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::traits::mock::{MockTransport, MockUart};

    fn uart_pair() -> [MockUart; 2] {
        [MockUart::new(), MockUart::new()]
    }

    fn configured_transport() -> MockTransport {
        let mut t = MockTransport::new();
        t.set_configured(true);
        // Consume the configuration edge so relays see a settled device
        let _ = t.configuration_changed();
        t
    }

    #[test]
    fn test_cursor_alternates() {
        let mut cursor = PortCursor::new();
        assert_eq!(cursor.take_turn(), PortId::Port0);
        assert_eq!(cursor.take_turn(), PortId::Port1);
        assert_eq!(cursor.take_turn(), PortId::Port0);
        assert_eq!(cursor.take_turn(), PortId::Port1);
    }

    #[test]
    fn test_inbound_roundtrip_order() {
        let mut relay = InboundRelay::new();
        let mut uarts = uart_pair();
        let mut transport = configured_transport();

        futures::executor::block_on(async {
            uarts[0].queue_rx_data(&[0x10, 0x20, 0x30]);

            let moved = relay.service(&mut uarts, &mut transport).await.unwrap();
            assert_eq!(moved, 3);
            assert_eq!(transport.written(PortId::Port0).as_slice(), &[0x10, 0x20, 0x30]);
        });
    }

    #[test]
    fn test_inbound_channel_isolation() {
        let mut relay = InboundRelay::new();
        let mut uarts = uart_pair();
        let mut transport = configured_transport();

        futures::executor::block_on(async {
            uarts[1].queue_rx_data(b"second port only");

            // Port0's turn: nothing pending, nothing written anywhere
            assert_eq!(relay.service(&mut uarts, &mut transport).await.unwrap(), 0);
            // Port1's turn: data flows to CDC1, CDC0 untouched
            let moved = relay.service(&mut uarts, &mut transport).await.unwrap();
            assert_eq!(moved, 16);
            assert!(transport.written(PortId::Port0).is_empty());
            assert_eq!(transport.written(PortId::Port1).as_slice(), b"second port only");
        });
    }

    #[test]
    fn test_inbound_cursor_advances_without_data() {
        let mut relay = InboundRelay::new();
        let mut uarts = uart_pair();
        let mut transport = configured_transport();

        futures::executor::block_on(async {
            // Only port 0 ever has data; the cursor must still alternate
            let mut serviced = heapless::Vec::<PortId, 8>::new();
            for _ in 0..6 {
                serviced.push(relay.current_port()).unwrap();
                uarts[0].queue_rx_data(&[0xEE]);
                let _ = relay.service(&mut uarts, &mut transport).await;
                // Flush the queue so the next port-0 turn starts clean
                while uarts[0].rx_count() > 0 {
                    uarts[0].read_byte();
                }
            }
            assert_eq!(
                serviced.as_slice(),
                &[
                    PortId::Port0,
                    PortId::Port1,
                    PortId::Port0,
                    PortId::Port1,
                    PortId::Port0,
                    PortId::Port1,
                ]
            );
        });
    }

    #[test]
    fn test_inbound_fairness_under_load() {
        let mut relay = InboundRelay::new();
        let mut uarts = uart_pair();
        let mut transport = configured_transport();

        futures::executor::block_on(async {
            // Both ports continuously producing; over N turns each port is
            // serviced N/2 times
            let mut turns = [0u32; 2];
            for _ in 0..10 {
                uarts[0].queue_rx_data(&[0x00]);
                uarts[1].queue_rx_data(&[0x01]);
                let port = relay.current_port();
                if relay.service(&mut uarts, &mut transport).await.unwrap() > 0 {
                    turns[port.index()] += 1;
                }
            }
            assert_eq!(turns, [5, 5]);
        });
    }

    #[test]
    fn test_inbound_exact_capacity_single_write() {
        let mut relay = InboundRelay::new();
        let mut uarts = uart_pair();
        let mut transport = configured_transport();

        futures::executor::block_on(async {
            let data: heapless::Vec<u8, 64> = (0..64u8).collect();
            uarts[0].queue_rx_data(&data);

            let moved = relay.service(&mut uarts, &mut transport).await.unwrap();
            assert_eq!(moved, 64);
            assert_eq!(transport.written(PortId::Port0).as_slice(), data.as_slice());
            assert_eq!(uarts[0].rx_count(), 0);
        });
    }

    #[test]
    fn test_inbound_caps_drain_then_carries_remainder() {
        let mut relay = InboundRelay::new();
        let mut uarts = uart_pair();
        let mut transport = configured_transport();

        futures::executor::block_on(async {
            let data: heapless::Vec<u8, 65> = (0..65u8).collect();
            uarts[0].queue_rx_data(&data);

            // First turn moves exactly the staging capacity
            assert_eq!(relay.service(&mut uarts, &mut transport).await.unwrap(), 64);
            assert_eq!(uarts[0].rx_count(), 1);

            // Port1's turn passes in between
            assert_eq!(relay.service(&mut uarts, &mut transport).await.unwrap(), 0);

            // Port0's next turn delivers the remainder
            assert_eq!(relay.service(&mut uarts, &mut transport).await.unwrap(), 1);
            assert_eq!(transport.written(PortId::Port0).as_slice(), data.as_slice());
        });
    }

    #[test]
    fn test_inbound_stall_drops_and_keeps_going() {
        let mut relay = InboundRelay::new();
        let mut uarts = uart_pair();
        let mut transport = configured_transport();

        futures::executor::block_on(async {
            transport.set_stalled(true);
            uarts[0].queue_rx_data(&[0x42]);

            assert_eq!(
                relay.service(&mut uarts, &mut transport).await,
                Err(TransportError::Stall)
            );
            assert_eq!(relay.stall_count(), 1);
            assert!(transport.written(PortId::Port0).is_empty());

            // The stall cost port 0 its bytes but not port 1 its turn
            transport.set_stalled(false);
            uarts[1].queue_rx_data(&[0x43]);
            assert_eq!(relay.service(&mut uarts, &mut transport).await.unwrap(), 1);
            assert_eq!(transport.written(PortId::Port1).as_slice(), &[0x43]);
        });
    }

    #[test]
    fn test_inbound_write_stall_counts_and_spares_other_port() {
        let mut relay = InboundRelay::new();
        let mut outbound = OutboundRelay::new();
        let mut uarts = uart_pair();
        let mut transport = configured_transport();

        futures::executor::block_on(async {
            // Readiness passes (device is configured) but the host has
            // stopped draining the port, so the bulk write itself stalls
            transport.set_write_stalled(true);
            uarts[0].queue_rx_data(&[0x42]);

            assert_eq!(
                relay.service(&mut uarts, &mut transport).await,
                Err(TransportError::Stall)
            );
            assert_eq!(relay.stall_count(), 1);
            assert!(transport.written(PortId::Port0).is_empty());

            // The stuck port must not freeze port 1 or the outbound side
            transport.queue_inbound(PortId::Port1, &[0x51]);
            uarts[1].queue_rx_data(&[0x52]);
            let _ = outbound.service(&mut uarts, &mut transport);
            assert_eq!(outbound.service(&mut uarts, &mut transport), 1);
            assert_eq!(uarts[1].tx_data().as_slice(), &[0x51]);

            transport.set_write_stalled(false);
            assert_eq!(relay.service(&mut uarts, &mut transport).await, Ok(1));
            assert_eq!(transport.written(PortId::Port1).as_slice(), &[0x52]);
        });
    }

    #[test]
    fn test_outbound_roundtrip_and_isolation() {
        let mut relay = OutboundRelay::new();
        let mut uarts = uart_pair();
        let mut transport = configured_transport();

        transport.queue_inbound(PortId::Port0, b"to uart0");
        transport.queue_inbound(PortId::Port1, b"to uart1");

        assert_eq!(relay.service(&mut uarts, &mut transport), 8);
        assert_eq!(relay.service(&mut uarts, &mut transport), 8);

        assert_eq!(uarts[0].tx_data().as_slice(), b"to uart0");
        assert_eq!(uarts[1].tx_data().as_slice(), b"to uart1");
    }

    #[test]
    fn test_outbound_gated_until_configured() {
        let mut relay = OutboundRelay::new();
        let mut uarts = uart_pair();
        let mut transport = MockTransport::new();

        transport.queue_inbound(PortId::Port0, &[0x99]);

        // Unconfigured: no bytes move, but the port is still selected
        assert_eq!(relay.service(&mut uarts, &mut transport), 0);
        assert_eq!(relay.service(&mut uarts, &mut transport), 0);
        assert!(uarts[0].tx_data().is_empty());
        assert_eq!(
            transport.selections().as_slice(),
            &[PortId::Port0, PortId::Port1]
        );

        // Configured: the queued data flows on port 0's next turn
        transport.set_configured(true);
        assert_eq!(relay.service(&mut uarts, &mut transport), 1);
        assert_eq!(uarts[0].tx_data().as_slice(), &[0x99]);
    }

    #[test]
    fn test_outbound_cursor_independent_of_inbound() {
        let mut inbound = InboundRelay::new();
        let mut outbound = OutboundRelay::new();
        let mut uarts = uart_pair();
        let mut transport = configured_transport();

        futures::executor::block_on(async {
            // Advance only the inbound cursor
            let _ = inbound.service(&mut uarts, &mut transport).await;
            assert_eq!(inbound.current_port(), PortId::Port1);
            assert_eq!(outbound.current_port(), PortId::Port0);

            let _ = outbound.service(&mut uarts, &mut transport);
            assert_eq!(outbound.current_port(), PortId::Port1);
            assert_eq!(inbound.current_port(), PortId::Port1);
        });
    }

    #[test]
    fn test_outbound_fairness_under_load() {
        let mut relay = OutboundRelay::new();
        let mut uarts = uart_pair();
        let mut transport = configured_transport();

        let mut turns = [0u32; 2];
        for _ in 0..9 {
            transport.queue_inbound(PortId::Port0, &[0xA0]);
            transport.queue_inbound(PortId::Port1, &[0xA1]);
            let port = relay.current_port();
            if relay.service(&mut uarts, &mut transport) > 0 {
                turns[port.index()] += 1;
            }
        }
        // 9 turns: one port gets the extra turn, neither gets two extra
        assert_eq!(turns[0] + turns[1], 9);
        assert!(turns[0].abs_diff(turns[1]) <= 1);
    }
}
