//! Dry-run transport
//!
//! Stands in for the USB session with `--dry-run`: every packet is logged
//! and each completed command is checked by reassembling its packets.

use log::{info, trace, warn};
use usbdisp_hal::{BulkSession, EndpointAddress};
use usbdisp_hal_rusb::UsbError;
use usbdisp_protocol::packet::FLAG_START;
use usbdisp_protocol::reassemble;

/// Session that writes nowhere
#[derive(Debug, Default)]
pub struct DryRunSession {
    /// Packets of the command currently being streamed
    pending: Vec<Vec<u8>>,
    commands: u32,
    packets: u32,
    bytes: usize,
    malformed: u32,
}

impl DryRunSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands seen so far, counting the one in progress
    pub fn commands(&self) -> u32 {
        self.commands
    }

    pub fn packets(&self) -> u32 {
        self.packets
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }

    /// Commands whose packets did not reassemble
    pub fn malformed(&self) -> u32 {
        self.malformed
    }

    fn finish_command(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        match reassemble(&self.pending) {
            Ok((opcode, body)) => info!(
                "[dry-run] {:?}: {} bytes in {} packets",
                opcode,
                body.len(),
                self.pending.len()
            ),
            Err(e) => {
                warn!("[dry-run] command does not reassemble: {:?}", e);
                self.malformed += 1;
            }
        }
        self.pending.clear();
    }
}

impl BulkSession for DryRunSession {
    type Error = UsbError;

    fn write_bulk(&mut self, endpoint: EndpointAddress, data: &[u8]) -> Result<usize, UsbError> {
        if data.first().is_some_and(|control| control & FLAG_START != 0) {
            self.finish_command();
            self.commands += 1;
        }
        trace!("[dry-run] ep 0x{:02x} <- {:02x?}", endpoint.0, data);
        self.pending.push(data.to_vec());
        self.packets += 1;
        self.bytes += data.len();
        Ok(data.len())
    }

    fn release(&mut self) -> Result<(), UsbError> {
        self.finish_command();
        Ok(())
    }
}
