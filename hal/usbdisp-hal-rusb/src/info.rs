//! Descriptor snapshot
//!
//! Copies the parts of a device's descriptor tree we care about into plain
//! structs, so endpoint lookup and the `info` dump work without holding
//! libusb objects.

use core::fmt;

use rusb::{Device, TransferType, UsbContext};
use usbdisp_hal::{DeviceId, EndpointAddress};

/// Endpoint transfer type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    Control,
    Isochronous,
    Bulk,
    Interrupt,
}

impl From<TransferType> for TransferKind {
    fn from(t: TransferType) -> Self {
        match t {
            TransferType::Control => TransferKind::Control,
            TransferType::Isochronous => TransferKind::Isochronous,
            TransferType::Bulk => TransferKind::Bulk,
            TransferType::Interrupt => TransferKind::Interrupt,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointInfo {
    pub address: EndpointAddress,
    pub transfer: TransferKind,
    pub max_packet_size: u16,
    pub interval: u8,
}

/// One alternate setting of an interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub number: u8,
    pub setting: u8,
    pub class: u8,
    pub sub_class: u8,
    pub protocol: u8,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigInfo {
    pub number: u8,
    pub max_power_ma: u16,
    pub self_powered: bool,
    pub remote_wakeup: bool,
    pub interfaces: Vec<InterfaceInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub bus: u8,
    pub address: u8,
    pub id: DeviceId,
    pub class: u8,
    pub sub_class: u8,
    pub protocol: u8,
    pub max_packet_size: u8,
    pub version: (u8, u8, u8),
    pub configs: Vec<ConfigInfo>,
}

/// Where a bulk OUT endpoint lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkEndpoint {
    pub config: u8,
    pub interface: u8,
    pub setting: u8,
    pub max_packet_size: u16,
}

impl DeviceInfo {
    /// Read the descriptor tree of a device
    ///
    /// Configurations that fail to read are skipped.
    pub fn read<T: UsbContext>(device: &Device<T>) -> rusb::Result<Self> {
        let desc = device.device_descriptor()?;
        let version = desc.device_version();

        let mut configs = Vec::new();
        for index in 0..desc.num_configurations() {
            let config = match device.config_descriptor(index) {
                Ok(config) => config,
                Err(e) => {
                    log::debug!("Skipping configuration {}: {}", index, e);
                    continue;
                }
            };

            let mut interfaces = Vec::new();
            for interface in config.interfaces() {
                for alt in interface.descriptors() {
                    let endpoints = alt
                        .endpoint_descriptors()
                        .map(|ep| EndpointInfo {
                            address: EndpointAddress(ep.address()),
                            transfer: ep.transfer_type().into(),
                            max_packet_size: ep.max_packet_size(),
                            interval: ep.interval(),
                        })
                        .collect();
                    interfaces.push(InterfaceInfo {
                        number: alt.interface_number(),
                        setting: alt.setting_number(),
                        class: alt.class_code(),
                        sub_class: alt.sub_class_code(),
                        protocol: alt.protocol_code(),
                        endpoints,
                    });
                }
            }

            configs.push(ConfigInfo {
                number: config.number(),
                max_power_ma: config.max_power(),
                self_powered: config.self_powered(),
                remote_wakeup: config.remote_wakeup(),
                interfaces,
            });
        }

        Ok(Self {
            bus: device.bus_number(),
            address: device.address(),
            id: DeviceId::new(desc.vendor_id(), desc.product_id()),
            class: desc.class_code(),
            sub_class: desc.sub_class_code(),
            protocol: desc.protocol_code(),
            max_packet_size: desc.max_packet_size(),
            version: (version.major(), version.minor(), version.sub_minor()),
            configs,
        })
    }

    /// Locate the bulk OUT endpoint with this address
    pub fn find_bulk_out(&self, endpoint: EndpointAddress) -> Option<BulkEndpoint> {
        if !endpoint.is_out() {
            return None;
        }
        self.configs.iter().find_map(|config| {
            config.interfaces.iter().find_map(|interface| {
                interface
                    .endpoints
                    .iter()
                    .find(|ep| ep.address == endpoint && ep.transfer == TransferKind::Bulk)
                    .map(|ep| BulkEndpoint {
                        config: config.number,
                        interface: interface.number,
                        setting: interface.setting,
                        max_packet_size: ep.max_packet_size,
                    })
            })
        })
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Device: bus {:03} address {:03}", self.bus, self.address)?;
        writeln!(f, "  Device class: {}", self.class)?;
        writeln!(f, "  Device sub class: {}", self.sub_class)?;
        writeln!(f, "  Device protocol: {}", self.protocol)?;
        writeln!(f, "  Max packet size: {}", self.max_packet_size)?;
        writeln!(f, "  idVendor: {0} (0x{0:04x})", self.id.vendor_id)?;
        writeln!(f, "  idProduct: {0} (0x{0:04x})", self.id.product_id)?;
        let (major, minor, sub) = self.version;
        writeln!(f, "  Device version: {}.{}.{}", major, minor, sub)?;
        for config in &self.configs {
            writeln!(f, "  Configuration: {}", config.number)?;
            writeln!(f, "    selfPowered: {}", config.self_powered)?;
            writeln!(f, "    remoteWakeup: {}", config.remote_wakeup)?;
            writeln!(f, "    maxPower: {} mA", config.max_power_ma)?;
            for interface in &config.interfaces {
                writeln!(f, "    Interface: {}", interface.number)?;
                writeln!(f, "    Alternate setting: {}", interface.setting)?;
                writeln!(f, "      Interface class: {}", interface.class)?;
                writeln!(f, "      Interface sub class: {}", interface.sub_class)?;
                writeln!(f, "      Interface protocol: {}", interface.protocol)?;
                for ep in &interface.endpoints {
                    writeln!(f, "      Endpoint: 0x{:02x}", ep.address.0)?;
                    writeln!(f, "        Type: {:?}", ep.transfer)?;
                    writeln!(f, "        Max packet size: {}", ep.max_packet_size)?;
                    writeln!(f, "        Interval: {}", ep.interval)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DeviceInfo {
        DeviceInfo {
            bus: 1,
            address: 7,
            id: DeviceId::DEFAULT,
            class: 0,
            sub_class: 0,
            protocol: 0,
            max_packet_size: 64,
            version: (1, 0, 0),
            configs: vec![ConfigInfo {
                number: 1,
                max_power_ma: 100,
                self_powered: false,
                remote_wakeup: false,
                interfaces: vec![
                    InterfaceInfo {
                        number: 0,
                        setting: 0,
                        class: 0xff,
                        sub_class: 0,
                        protocol: 0,
                        endpoints: vec![EndpointInfo {
                            address: EndpointAddress(0x01),
                            transfer: TransferKind::Interrupt,
                            max_packet_size: 8,
                            interval: 10,
                        }],
                    },
                    InterfaceInfo {
                        number: 1,
                        setting: 0,
                        class: 0xff,
                        sub_class: 0,
                        protocol: 0,
                        endpoints: vec![
                            EndpointInfo {
                                address: EndpointAddress(0x81),
                                transfer: TransferKind::Bulk,
                                max_packet_size: 64,
                                interval: 0,
                            },
                            EndpointInfo {
                                address: EndpointAddress(0x01),
                                transfer: TransferKind::Bulk,
                                max_packet_size: 64,
                                interval: 0,
                            },
                        ],
                    },
                ],
            }],
        }
    }

    #[test]
    fn test_find_bulk_out_skips_non_bulk() {
        let found = sample().find_bulk_out(EndpointAddress(0x01)).unwrap();
        assert_eq!(
            found,
            BulkEndpoint {
                config: 1,
                interface: 1,
                setting: 0,
                max_packet_size: 64,
            }
        );
    }

    #[test]
    fn test_find_bulk_out_rejects_in_endpoint() {
        assert_eq!(sample().find_bulk_out(EndpointAddress(0x81)), None);
    }

    #[test]
    fn test_find_bulk_out_missing() {
        assert_eq!(sample().find_bulk_out(EndpointAddress(0x02)), None);
    }

    #[test]
    fn test_display_lists_endpoints() {
        let text = sample().to_string();
        assert!(text.contains("idVendor: 64719 (0xfccf)"));
        assert!(text.contains("idProduct: 40961 (0xa001)"));
        assert!(text.contains("Endpoint: 0x81"));
        assert!(text.contains("Type: Bulk"));
        assert!(text.contains("maxPower: 100 mA"));
    }
}
