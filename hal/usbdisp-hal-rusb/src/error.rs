//! Backend error type
//!
//! Wraps `rusb` failures with the shared [`TransportError`] taxonomy.

use thiserror::Error;
use usbdisp_hal::TransportError;

/// Errors from the libusb backend
#[derive(Debug, Error)]
pub enum UsbError {
    /// libusb call failed
    #[error("{kind}: {source}")]
    Usb {
        kind: TransportError,
        #[source]
        source: rusb::Error,
    },

    /// Failure detected by the backend itself
    #[error("{0}")]
    Transport(TransportError),
}

impl UsbError {
    /// Wrap a libusb error raised while doing `op`
    ///
    /// Timeouts and unplugs keep their own kind regardless of the operation.
    pub fn usb(op: TransportError, source: rusb::Error) -> Self {
        let kind = match source {
            rusb::Error::Timeout => TransportError::Timeout,
            rusb::Error::NoDevice => TransportError::Disconnected,
            _ => op,
        };
        UsbError::Usb { kind, source }
    }

    /// Position of this error in the shared taxonomy
    pub fn kind(&self) -> TransportError {
        match self {
            UsbError::Usb { kind, .. } => *kind,
            UsbError::Transport(kind) => *kind,
        }
    }
}

impl From<TransportError> for UsbError {
    fn from(e: TransportError) -> Self {
        UsbError::Transport(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_overrides_operation() {
        let err = UsbError::usb(TransportError::Write, rusb::Error::Timeout);
        assert_eq!(err.kind(), TransportError::Timeout);
    }

    #[test]
    fn test_unplug_overrides_operation() {
        let err = UsbError::usb(TransportError::Claim, rusb::Error::NoDevice);
        assert_eq!(err.kind(), TransportError::Disconnected);
    }

    #[test]
    fn test_operation_kind_kept() {
        let err = UsbError::usb(TransportError::Claim, rusb::Error::Busy);
        assert_eq!(err.kind(), TransportError::Claim);
        assert!(err.to_string().starts_with("could not claim interface"));
    }

    #[test]
    fn test_from_transport_error() {
        let err = UsbError::from(TransportError::NotFound);
        assert_eq!(err.kind(), TransportError::NotFound);
        assert_eq!(err.to_string(), "device not found");
    }
}
