//! Dual CDC-ACM front end wrapped as a [`HostTransport`].
//!
//! Both CDC functions live on one embassy-usb device; the bridge core
//! switches between them with `select_port`. The device state machine
//! itself runs in the separate USB task, so everything here is either
//! non-blocking or explicitly bounded.

use core::task::Poll;

use embassy_futures::poll_once;
use embassy_time::{with_timeout, Duration};
use embassy_usb::class::cdc_acm::CdcAcmClass;
use embassy_usb::driver::Driver;

use crate::bridge::{HostTransport, PortId, TransportError};
use crate::config::bridge::{STAGING_CAPACITY, WRITE_READY_TIMEOUT_MS};

/// The shared USB front end over two CDC-ACM classes.
pub struct UsbCdcTransport<'d, D: Driver<'d>> {
    ports: [CdcAcmClass<'d, D>; 2],
    active: PortId,
    was_configured: bool,
    /// One host packet parked between the `rx_ready` poll and `read_all`
    pending: [u8; STAGING_CAPACITY],
    pending_len: usize,
    pending_port: PortId,
}

impl<'d, D: Driver<'d>> UsbCdcTransport<'d, D> {
    /// `ports[n]` must be the CDC function bridged to UART channel *n*.
    pub fn new(ports: [CdcAcmClass<'d, D>; 2]) -> Self {
        Self {
            ports,
            active: PortId::Port0,
            was_configured: false,
            pending: [0u8; STAGING_CAPACITY],
            pending_len: 0,
            pending_port: PortId::Port0,
        }
    }

    /// The host counts as having configured the device once it opens
    /// either COM port (DTR asserted).
    fn host_configured(&self) -> bool {
        self.ports[0].dtr() || self.ports[1].dtr()
    }
}

impl<'d, D: Driver<'d>> HostTransport for UsbCdcTransport<'d, D> {
    fn configuration_changed(&mut self) -> bool {
        let configured = self.host_configured();
        if configured != self.was_configured {
            self.was_configured = configured;
            true
        } else {
            false
        }
    }

    fn is_configured(&mut self) -> bool {
        self.host_configured()
    }

    fn init_endpoints(&mut self) {
        // The embassy-usb device task re-arms the endpoints itself; only
        // the parked packet from a previous session must be discarded.
        self.pending_len = 0;
    }

    fn select_port(&mut self, port: PortId) {
        self.active = port;
    }

    async fn wait_write_ready(&mut self) -> Result<(), TransportError> {
        let port = &mut self.ports[self.active.index()];
        with_timeout(
            Duration::from_millis(WRITE_READY_TIMEOUT_MS),
            port.wait_connection(),
        )
        .await
        .map_err(|_| TransportError::Stall)
    }

    async fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        // wait_connection() settles as soon as the device is configured; a
        // host that opened the port but stopped draining the IN endpoint
        // stalls here instead, so the write itself is bounded too.
        let port = &mut self.ports[self.active.index()];
        match with_timeout(
            Duration::from_millis(WRITE_READY_TIMEOUT_MS),
            port.write_packet(data),
        )
        .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(TransportError::WriteFailed),
            Err(_) => Err(TransportError::Stall),
        }
    }

    fn rx_ready(&mut self) -> bool {
        if self.pending_len > 0 {
            // A parked packet is held until its own port's turn drains it,
            // at most one scheduling turn away.
            return self.pending_port == self.active;
        }
        match poll_once(self.ports[self.active.index()].read_packet(&mut self.pending)) {
            Poll::Ready(Ok(len)) if len > 0 => {
                self.pending_len = len;
                self.pending_port = self.active;
                true
            }
            _ => false,
        }
    }

    fn read_all(&mut self, buf: &mut [u8]) -> u16 {
        if self.pending_len == 0 || self.pending_port != self.active {
            return 0;
        }
        let count = self.pending_len.min(buf.len());
        buf[..count].copy_from_slice(&self.pending[..count]);
        self.pending_len = 0;
        count as u16
    }
}
