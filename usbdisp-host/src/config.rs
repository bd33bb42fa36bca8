//! Host configuration
//!
//! Loaded from a TOML file, or from the defaults compiled into the binary
//! when no file is given.

use std::fs;
use std::path::Path;
use std::time::Duration;

use log::{debug, info};
use serde::Deserialize;
use usbdisp_hal::{DeviceId, EndpointAddress};
use usbdisp_protocol::{ColorMode, PacketFramer};

use crate::error::Error;

/// Embedded default configuration
pub const DEFAULT_CONFIG: &str = include_str!("../display.toml");

/// Device identity and endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceConfig {
    pub vendor_id: u16,
    pub product_id: u16,
    pub endpoint: u8,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            vendor_id: usbdisp_hal::device::DEFAULT_VENDOR_ID,
            product_id: usbdisp_hal::device::DEFAULT_PRODUCT_ID,
            endpoint: usbdisp_hal::device::DEFAULT_ENDPOINT,
        }
    }
}

/// Packet budget and write timing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkConfig {
    pub packet_max: usize,
    pub write_timeout_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            packet_max: usbdisp_protocol::DEFAULT_PKT_MAX,
            write_timeout_ms: 1000,
        }
    }
}

/// Screen geometry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScreenConfig {
    pub width: u16,
    pub height: u16,
    pub color_mode: ColorMode,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            color_mode: ColorMode::Rgb555,
        }
    }
}

/// Demo pacing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    pub cycle_delay_ms: u64,
    pub ramp_delay_ms: u64,
    pub settle_delay_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            cycle_delay_ms: 500,
            ramp_delay_ms: 10,
            settle_delay_ms: 100,
        }
    }
}

/// Complete host configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    pub device: DeviceConfig,
    pub link: LinkConfig,
    pub screen: ScreenConfig,
    pub demo: DemoConfig,
}

impl HostConfig {
    /// Parse and validate TOML text
    pub fn parse(text: &str) -> Result<Self, Error> {
        let config: HostConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the device cannot work with
    pub fn validate(&self) -> Result<(), Error> {
        self.framer()?;
        if !self.endpoint().is_out() {
            return Err(Error::Config(format!(
                "endpoint 0x{:02x} is not an OUT endpoint",
                self.device.endpoint
            )));
        }
        if self.screen.width == 0 || self.screen.height == 0 {
            return Err(Error::Config(format!(
                "screen size {}x{} is empty",
                self.screen.width, self.screen.height
            )));
        }
        Ok(())
    }

    pub fn device_id(&self) -> DeviceId {
        DeviceId::new(self.device.vendor_id, self.device.product_id)
    }

    pub fn endpoint(&self) -> EndpointAddress {
        EndpointAddress(self.device.endpoint)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.link.write_timeout_ms)
    }

    /// Framer for the configured packet budget
    pub fn framer(&self) -> Result<PacketFramer, Error> {
        PacketFramer::new(self.link.packet_max).map_err(|_| {
            Error::Config(format!(
                "packet_max {} outside 1..={}",
                self.link.packet_max,
                usbdisp_protocol::DEFAULT_PKT_MAX
            ))
        })
    }
}

/// Load configuration from `path`, or the embedded defaults
pub fn load(path: Option<&Path>) -> Result<HostConfig, Error> {
    let config = match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            let text = fs::read_to_string(path).map_err(|source| Error::Io {
                path: path.to_path_buf(),
                source,
            })?;
            HostConfig::parse(&text)?
        }
        None => {
            debug!("Using embedded default configuration");
            HostConfig::parse(DEFAULT_CONFIG)?
        }
    };

    log_config_summary(&config);
    Ok(config)
}

fn log_config_summary(config: &HostConfig) {
    debug!(
        "  device {} endpoint 0x{:02x}",
        config.device_id(),
        config.device.endpoint
    );
    debug!(
        "  packet_max {} timeout {} ms",
        config.link.packet_max, config.link.write_timeout_ms
    );
    debug!(
        "  screen {}x{} {:?}",
        config.screen.width, config.screen.height, config.screen.color_mode
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_default_matches_default() {
        assert_eq!(HostConfig::parse(DEFAULT_CONFIG).unwrap(), HostConfig::default());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config = HostConfig::parse(
            r#"
            [device]
            vendor_id = 0x1209

            [screen]
            color_mode = "rgb565"
            "#,
        )
        .unwrap();

        assert_eq!(config.device_id(), DeviceId::new(0x1209, 0xa001));
        assert_eq!(config.screen.color_mode, ColorMode::Rgb565);
        assert_eq!(config.link, LinkConfig::default());
    }

    #[test]
    fn test_packet_max_out_of_range() {
        let err = HostConfig::parse("[link]\npacket_max = 64\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = HostConfig::parse("[link]\npacket_max = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_in_endpoint_rejected() {
        let err = HostConfig::parse("[device]\nendpoint = 0x81\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_empty_screen_rejected() {
        let err = HostConfig::parse("[screen]\nwidth = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = HostConfig::parse("[link]\npkt_max = 32\n").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_write_timeout() {
        let config = HostConfig::parse("[link]\nwrite_timeout_ms = 250\n").unwrap();
        assert_eq!(config.write_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load(Some(Path::new("/nonexistent/usbdisp.toml"))).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
