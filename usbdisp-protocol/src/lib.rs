//! usbdisp Command Protocol
//!
//! This crate defines how drawing commands for the usbdisp pixel display are
//! encoded and split into bulk packets. The device endpoint accepts at most
//! 64 bytes per transfer, so every command is streamed as one flagged first
//! packet followed by zero or more continuation packets.
//!
//! # Protocol Overview
//!
//! ```text
//! Command ──encode──▶ (opcode, header, payload) ──frame──▶ [packet, packet, ...]
//!
//! ┌──────────────────┬────────┬─────────────┐
//! │ 1|1|OPCODE (1B)  │ HEADER │ PAYLOAD ... │   first packet
//! └──────────────────┴────────┴─────────────┘
//! ┌──────────────────┬───────────────────────┐
//! │ 0|0|OPCODE (1B)  │ PAYLOAD ...           │   continuation packets
//! └──────────────────┴───────────────────────┘
//! ```
//!
//! Encoding never fails: colors saturate, geometry is forwarded as given.
//! The only errors come from the framer's packet budget.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

pub mod color;
pub mod command;
pub mod packet;

pub use color::{Color, ColorMode};
pub use command::{BlendOp, Command, EncodedCommand, Image, ImageBuffer, Opcode, Rect};
pub use packet::{
    reassemble, FrameError, Packet, PacketFramer, Packets, DEFAULT_PKT_MAX, MAX_PACKET_SIZE,
};
