//! Blocking esp-hal UART wrapped as a [`UartChannel`].
//!
//! The hardware FIFO is shallow, so received bytes are pulled into a
//! software buffer on every `rx_count` poll; the relay then drains from
//! that buffer byte by byte.

use esp_hal::uart::{UartRx, UartTx};
use esp_hal::Blocking;
use heapless::Deque;

use crate::bridge::UartChannel;
use crate::config::serial::RX_BUFFER_SIZE;

/// One hardware serial port of the bridge.
pub struct UartPort<'d> {
    rx: UartRx<'d, Blocking>,
    tx: UartTx<'d, Blocking>,
    buffered: Deque<u8, RX_BUFFER_SIZE>,
}

impl<'d> UartPort<'d> {
    pub fn new(rx: UartRx<'d, Blocking>, tx: UartTx<'d, Blocking>) -> Self {
        Self {
            rx,
            tx,
            buffered: Deque::new(),
        }
    }

    /// Move whatever the hardware has received into the software buffer.
    /// Bytes arriving while the buffer is full are dropped.
    fn pump_rx(&mut self) {
        let mut chunk = [0u8; 64];
        while let Ok(n) = self.rx.read_buffered(&mut chunk) {
            if n == 0 {
                break;
            }
            for &byte in &chunk[..n] {
                if self.buffered.push_back(byte).is_err() {
                    log::warn!("uart rx buffer full, dropping input");
                    return;
                }
            }
        }
    }
}

impl UartChannel for UartPort<'_> {
    fn rx_count(&mut self) -> u16 {
        self.pump_rx();
        self.buffered.len() as u16
    }

    fn read_byte(&mut self) -> u8 {
        self.buffered.pop_front().unwrap_or(0)
    }

    fn write(&mut self, data: &[u8]) {
        let mut rest = data;
        while !rest.is_empty() {
            match self.tx.write(rest) {
                Ok(written) => rest = &rest[written..],
                Err(_) => {
                    log::warn!("uart tx error, dropping {} byte(s)", rest.len());
                    break;
                }
            }
        }
    }
}
