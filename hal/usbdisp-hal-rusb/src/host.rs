//! libusb device discovery and bulk session
//!
//! [`RusbHost`] finds the display on any bus and claims the interface that
//! owns its bulk OUT endpoint. [`RusbSession`] holds the claim and releases
//! it on every exit path.

use std::time::Duration;

use log::{debug, info, warn};
use rusb::{Device, DeviceHandle, GlobalContext};
use usbdisp_hal::{BulkSession, DeviceId, EndpointAddress, TransportError, UsbHost};
use usbdisp_protocol::MAX_PACKET_SIZE;

use crate::error::UsbError;
use crate::info::DeviceInfo;

/// Default timeout for one bulk write
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(1000);

/// USB host backed by the global libusb context
#[derive(Debug, Clone)]
pub struct RusbHost {
    write_timeout: Duration,
}

impl Default for RusbHost {
    fn default() -> Self {
        Self::new(DEFAULT_WRITE_TIMEOUT)
    }
}

impl RusbHost {
    pub fn new(write_timeout: Duration) -> Self {
        Self { write_timeout }
    }

    /// Snapshot the descriptors of every attached device with this identity
    pub fn list(&self, id: DeviceId) -> Result<Vec<DeviceInfo>, UsbError> {
        let devices = rusb::devices().map_err(|e| UsbError::usb(TransportError::Other, e))?;
        let mut found = Vec::new();
        for device in devices.iter() {
            let info = match DeviceInfo::read(&device) {
                Ok(info) => info,
                Err(e) => {
                    debug!(
                        "Cannot read descriptors on bus {} address {}: {}",
                        device.bus_number(),
                        device.address(),
                        e
                    );
                    continue;
                }
            };
            if info.id == id {
                found.push(info);
            }
        }
        Ok(found)
    }
}

impl UsbHost for RusbHost {
    type Device = Device<GlobalContext>;
    type Session = RusbSession;
    type Error = UsbError;

    fn discover(&mut self, id: DeviceId) -> Result<Option<Self::Device>, UsbError> {
        let devices = rusb::devices().map_err(|e| UsbError::usb(TransportError::Other, e))?;
        for device in devices.iter() {
            let desc = match device.device_descriptor() {
                Ok(desc) => desc,
                Err(_) => continue,
            };
            if id.matches(desc.vendor_id(), desc.product_id()) {
                info!(
                    "Found display {} on bus {} address {}",
                    id,
                    device.bus_number(),
                    device.address()
                );
                return Ok(Some(device));
            }
        }
        debug!("No device matching {}", id);
        Ok(None)
    }

    fn open_and_claim(
        &mut self,
        device: Self::Device,
        endpoint: EndpointAddress,
    ) -> Result<RusbSession, UsbError> {
        let info = DeviceInfo::read(&device).map_err(|e| UsbError::usb(TransportError::Other, e))?;
        let bulk = info
            .find_bulk_out(endpoint)
            .ok_or(TransportError::EndpointNotFound)?;

        if usize::from(bulk.max_packet_size) < MAX_PACKET_SIZE {
            warn!(
                "Endpoint 0x{:02x} max packet size is {}, packets may be split",
                endpoint.0, bulk.max_packet_size
            );
        }

        let mut handle = device
            .open()
            .map_err(|e| UsbError::usb(TransportError::Claim, e))?;

        // Unsupported on some platforms; the claim below reports real conflicts
        if let Err(e) = handle.set_auto_detach_kernel_driver(true) {
            debug!("Kernel driver auto-detach unavailable: {}", e);
        }

        // On failure the handle is dropped here and nothing stays claimed
        handle
            .claim_interface(bulk.interface)
            .map_err(|e| UsbError::usb(TransportError::Claim, e))?;

        info!(
            "Claimed interface {} (config {}, endpoint 0x{:02x})",
            bulk.interface, bulk.config, endpoint.0
        );

        Ok(RusbSession {
            handle,
            interface: bulk.interface,
            claimed: true,
            write_timeout: self.write_timeout,
        })
    }
}

/// Open device with one claimed interface
pub struct RusbSession {
    handle: DeviceHandle<GlobalContext>,
    interface: u8,
    claimed: bool,
    write_timeout: Duration,
}

impl RusbSession {
    /// Interface number held by this session
    pub fn interface(&self) -> u8 {
        self.interface
    }

    /// Whether the interface is still claimed
    pub fn is_claimed(&self) -> bool {
        self.claimed
    }
}

impl BulkSession for RusbSession {
    type Error = UsbError;

    fn write_bulk(&mut self, endpoint: EndpointAddress, data: &[u8]) -> Result<usize, UsbError> {
        if !self.claimed {
            return Err(TransportError::Write.into());
        }
        self.handle
            .write_bulk(endpoint.0, data, self.write_timeout)
            .map_err(|e| UsbError::usb(TransportError::Write, e))
    }

    fn release(&mut self) -> Result<(), UsbError> {
        if !self.claimed {
            return Ok(());
        }
        self.claimed = false;
        self.handle
            .release_interface(self.interface)
            .map_err(|e| UsbError::usb(TransportError::Other, e))?;
        info!("Released interface {}", self.interface);
        Ok(())
    }
}

impl Drop for RusbSession {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("Failed to release interface {}: {}", self.interface, e);
        }
    }
}
