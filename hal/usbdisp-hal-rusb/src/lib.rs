//! libusb transport for the usbdisp display
//!
//! Implements the `usbdisp-hal` traits on top of `rusb`:
//!
//! - [`RusbHost`] - bus enumeration, endpoint lookup, interface claim
//! - [`RusbSession`] - blocking bulk writes, idempotent release
//! - [`DeviceInfo`] - descriptor snapshot used for endpoint lookup and the
//!   device dump

#![deny(unsafe_code)]

pub mod error;
pub mod host;
pub mod info;

pub use error::UsbError;
pub use host::{RusbHost, RusbSession, DEFAULT_WRITE_TIMEOUT};
pub use info::{BulkEndpoint, DeviceInfo};
