//! Bulk transport abstractions
//!
//! Provides traits for locating the display, claiming its interface and
//! writing bulk packets. Backends (libusb, test doubles) implement these.

use crate::device::{DeviceId, EndpointAddress};

/// Transport error taxonomy shared by backends
///
/// Every variant is fatal to the current session; nothing is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// No device with the requested identity
    NotFound,
    /// Device has no bulk OUT endpoint at the configured address
    EndpointNotFound,
    /// Interface could not be claimed (busy, permissions)
    Claim,
    /// Bulk write failed
    Write,
    /// Device accepted fewer bytes than sent
    ShortWrite,
    /// Write did not complete in time
    Timeout,
    /// Device went away
    Disconnected,
    /// Any other backend failure
    Other,
}

impl core::fmt::Display for TransportError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            TransportError::NotFound => "device not found",
            TransportError::EndpointNotFound => "bulk endpoint not found",
            TransportError::Claim => "could not claim interface",
            TransportError::Write => "bulk write failed",
            TransportError::ShortWrite => "short bulk write",
            TransportError::Timeout => "bulk write timed out",
            TransportError::Disconnected => "device disconnected",
            TransportError::Other => "transport error",
        };
        f.write_str(msg)
    }
}

/// An open device with its interface claimed
///
/// Exclusively owned by one sender; writes are blocking.
pub trait BulkSession {
    /// Error type for session operations
    type Error;

    /// Write one packet to a bulk endpoint
    ///
    /// Returns the number of bytes the device accepted.
    fn write_bulk(&mut self, endpoint: EndpointAddress, data: &[u8]) -> Result<usize, Self::Error>;

    /// Release the claimed interface
    ///
    /// Safe to call more than once; later calls do nothing.
    fn release(&mut self) -> Result<(), Self::Error>;
}

/// Device discovery and session setup
pub trait UsbHost {
    /// Handle to a discovered, not yet opened device
    type Device;

    /// Session produced by a successful claim
    type Session: BulkSession;

    /// Error type for host operations
    type Error;

    /// Find the first attached device with this identity
    fn discover(&mut self, id: DeviceId) -> Result<Option<Self::Device>, Self::Error>;

    /// Open the device and claim the interface owning `endpoint`
    ///
    /// On failure nothing stays claimed.
    fn open_and_claim(
        &mut self,
        device: Self::Device,
        endpoint: EndpointAddress,
    ) -> Result<Self::Session, Self::Error>;
}

/// Discover and claim in one step
///
/// Maps a missing device to `NotFound` through the backend's error type.
pub fn connect<H>(host: &mut H, id: DeviceId, endpoint: EndpointAddress) -> Result<H::Session, H::Error>
where
    H: UsbHost,
    H::Error: From<TransportError>,
{
    let device = host.discover(id)?.ok_or(TransportError::NotFound)?;
    host.open_and_claim(device, endpoint)
}
