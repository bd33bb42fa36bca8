//! Error types for the host application

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use usbdisp_driver::DisplayError;
use usbdisp_hal::TransportError;
use usbdisp_hal_rusb::UsbError;
use usbdisp_protocol::FrameError;

/// Errors that end a `usbdisp` run
#[derive(Error, Debug)]
pub enum Error {
    /// File could not be read
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Configuration is not valid TOML for this schema
    #[error("invalid configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration parsed but holds unusable values
    #[error("invalid configuration: {0}")]
    Config(String),

    /// USB backend failure
    #[error(transparent)]
    Usb(#[from] UsbError),

    /// Command could not be framed
    #[error("framing failed: {0:?}")]
    Frame(FrameError),

    /// Device accepted only part of a packet
    #[error("short write: device took {written} of {expected} bytes")]
    ShortWrite { expected: usize, written: usize },

    /// Raw image file does not match the requested geometry
    #[error("image file holds {actual} bytes, {width}x{height} RGB needs {expected}")]
    ImageSize {
        width: u16,
        height: u16,
        expected: usize,
        actual: usize,
    },
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Error::Usb(UsbError::from(e))
    }
}

impl From<FrameError> for Error {
    fn from(e: FrameError) -> Self {
        Error::Frame(e)
    }
}

impl From<DisplayError<UsbError>> for Error {
    fn from(e: DisplayError<UsbError>) -> Self {
        match e {
            DisplayError::Frame(e) => Error::Frame(e),
            DisplayError::Transport(e) => Error::Usb(e),
            DisplayError::ShortWrite { expected, written } => Error::ShortWrite { expected, written },
        }
    }
}
