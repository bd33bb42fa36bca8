//! Session driver for the usbdisp pixel display
//!
//! Ties the command protocol to a transport: a [`UsbDisplay`] owns one
//! claimed bulk session and turns each drawing command into an ordered
//! stream of packets.
//!
//! ```text
//! Command ─▶ encode ─▶ PacketFramer ─▶ BulkSession::write_bulk (one packet at a time)
//! ```

#![no_std]
#![deny(unsafe_code)]

pub mod display;

pub use display::{DisplayError, UsbDisplay};
