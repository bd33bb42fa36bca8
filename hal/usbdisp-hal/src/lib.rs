//! usbdisp Transport Abstraction Layer
//!
//! This crate defines the traits a USB backend implements so the display
//! driver can run against real hardware or a test double.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (usbdisp-host)             │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  usbdisp-driver (UsbDisplay<S>)         │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  usbdisp-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  usbdisp-hal-rusb (libusb backend)      │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`transport::UsbHost`] - Device discovery and interface claiming
//! - [`transport::BulkSession`] - Bulk writes and interface release

#![no_std]
#![deny(unsafe_code)]

pub mod device;
pub mod transport;

// Re-export key traits at crate root for convenience
pub use device::{DeviceId, EndpointAddress};
pub use transport::{connect, BulkSession, TransportError, UsbHost};
