//! Splitting encoded commands into bulk packets
//!
//! Packet format (at most `pkt_max + 1` bytes each):
//!
//! ```text
//! first:         ┌─────────────────────────┬────────┬──────────────────────────────┐
//!                │ START|CLEAR|opcode (1B) │ header │ payload[..pkt_max - header]  │
//!                └─────────────────────────┴────────┴──────────────────────────────┘
//! continuation:  ┌─────────────┬───────────────────────────┐
//!                │ opcode (1B) │ next pkt_max payload bytes│
//!                └─────────────┴───────────────────────────┘
//! ```
//!
//! The device resynchronizes on the START flag, so every command begins a
//! fresh reassembly. Continuations repeat the bare opcode with both flags
//! clear.

use alloc::vec::Vec;

use heapless::Vec as HVec;

use crate::command::{EncodedCommand, Opcode};

/// Largest bulk transfer the device endpoint accepts
pub const MAX_PACKET_SIZE: usize = 64;

/// Default number of bytes after the control byte
pub const DEFAULT_PKT_MAX: usize = MAX_PACKET_SIZE - 1;

/// Control byte flag: first packet of a command
pub const FLAG_START: u8 = 1 << 7;

/// Control byte flag: device drops any partially received command
pub const FLAG_CLEAR: u8 = 1 << 6;

/// Control byte bits carrying the opcode
pub const OPCODE_MASK: u8 = 0x3f;

/// One bulk packet
pub type Packet = HVec<u8, MAX_PACKET_SIZE>;

/// Errors from framing or reassembly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// `pkt_max` is zero or leaves no room for the control byte
    InvalidPacketSize,
    /// Command header does not fit in the first packet
    HeaderTooLarge,
    /// No packets to reassemble, or an empty packet
    Empty,
    /// First packet lacks the START/CLEAR flags
    MissingStart,
    /// Continuation packet carries flags or a different opcode
    UnexpectedControl,
    /// Control byte names no known opcode
    UnknownOpcode,
}

/// Control byte for a packet of the given command
pub fn control_byte(opcode: Opcode, first: bool) -> u8 {
    if first {
        FLAG_START | FLAG_CLEAR | opcode.to_byte()
    } else {
        opcode.to_byte()
    }
}

/// Packet framer for a fixed per-packet budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacketFramer {
    pkt_max: usize,
}

impl Default for PacketFramer {
    fn default() -> Self {
        Self {
            pkt_max: DEFAULT_PKT_MAX,
        }
    }
}

impl PacketFramer {
    /// Create a framer carrying up to `pkt_max` bytes after each control byte
    pub fn new(pkt_max: usize) -> Result<Self, FrameError> {
        if pkt_max == 0 || pkt_max > DEFAULT_PKT_MAX {
            return Err(FrameError::InvalidPacketSize);
        }
        Ok(Self { pkt_max })
    }

    /// Bytes carried after each control byte
    pub fn pkt_max(&self) -> usize {
        self.pkt_max
    }

    /// Number of payload bytes that ride in the first packet
    fn first_chunk_len(&self, header_len: usize, payload_len: usize) -> usize {
        (self.pkt_max - header_len).min(payload_len)
    }

    /// Number of packets a command of this shape produces
    pub fn packet_count(&self, header_len: usize, payload_len: usize) -> Result<usize, FrameError> {
        if header_len > self.pkt_max {
            return Err(FrameError::HeaderTooLarge);
        }
        let rest = payload_len - self.first_chunk_len(header_len, payload_len);
        Ok(1 + rest.div_ceil(self.pkt_max))
    }

    /// Iterate over the packets for an encoded command
    pub fn packets<'a>(&self, command: &'a EncodedCommand) -> Result<Packets<'a>, FrameError> {
        if command.header.len() > self.pkt_max {
            return Err(FrameError::HeaderTooLarge);
        }
        Ok(Packets {
            opcode: command.opcode,
            header: &command.header,
            payload: &command.payload,
            pkt_max: self.pkt_max,
            offset: None,
        })
    }
}

/// Iterator over the packets of one command
///
/// Created by [`PacketFramer::packets`].
#[derive(Debug, Clone)]
pub struct Packets<'a> {
    opcode: Opcode,
    header: &'a [u8],
    payload: &'a [u8],
    pkt_max: usize,
    /// Payload bytes already emitted; None until the first packet is out
    offset: Option<usize>,
}

impl Packets<'_> {
    fn remaining(&self) -> usize {
        let sent = match self.offset {
            None => {
                let first = (self.pkt_max - self.header.len()).min(self.payload.len());
                return 1 + (self.payload.len() - first).div_ceil(self.pkt_max);
            }
            Some(sent) => sent,
        };
        self.payload.len().saturating_sub(sent).div_ceil(self.pkt_max)
    }
}

impl Iterator for Packets<'_> {
    type Item = Packet;

    fn next(&mut self) -> Option<Self::Item> {
        let mut packet = Packet::new();
        match self.offset {
            None => {
                let first = (self.pkt_max - self.header.len()).min(self.payload.len());
                // Capacity is pkt_max + 1 <= MAX_PACKET_SIZE, checked at construction
                let _ = packet.push(control_byte(self.opcode, true));
                let _ = packet.extend_from_slice(self.header);
                let _ = packet.extend_from_slice(&self.payload[..first]);
                self.offset = Some(first);
            }
            Some(offset) if offset < self.payload.len() => {
                let end = (offset + self.pkt_max).min(self.payload.len());
                let _ = packet.push(control_byte(self.opcode, false));
                let _ = packet.extend_from_slice(&self.payload[offset..end]);
                self.offset = Some(end);
            }
            Some(_) => return None,
        }
        Some(packet)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Packets<'_> {}

/// Rebuild `(opcode, header + payload)` from the packets of one command
///
/// Strips one control byte per packet and checks that the first packet
/// carries START|CLEAR and every continuation repeats the bare opcode.
pub fn reassemble<I, P>(packets: I) -> Result<(Opcode, Vec<u8>), FrameError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<[u8]>,
{
    let mut packets = packets.into_iter();
    let first = packets.next().ok_or(FrameError::Empty)?;
    let (&control, body) = first.as_ref().split_first().ok_or(FrameError::Empty)?;

    if control & (FLAG_START | FLAG_CLEAR) != FLAG_START | FLAG_CLEAR {
        return Err(FrameError::MissingStart);
    }
    let opcode = Opcode::from_byte(control & OPCODE_MASK).ok_or(FrameError::UnknownOpcode)?;

    let mut data = Vec::from(body);
    for packet in packets {
        let (&control, body) = packet.as_ref().split_first().ok_or(FrameError::Empty)?;
        if control != control_byte(opcode, false) {
            return Err(FrameError::UnexpectedControl);
        }
        data.extend_from_slice(body);
    }

    Ok((opcode, data))
}
