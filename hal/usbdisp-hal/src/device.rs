//! Device identity
//!
//! The display is located by its vendor/product pair and driven through a
//! single bulk OUT endpoint.

/// Vendor ID the display firmware enumerates with
pub const DEFAULT_VENDOR_ID: u16 = 0xfccf;

/// Product ID the display firmware enumerates with
pub const DEFAULT_PRODUCT_ID: u16 = 0xa001;

/// Bulk OUT endpoint the display listens on
pub const DEFAULT_ENDPOINT: u8 = 0x01;

/// USB vendor/product pair used for discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceId {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl DeviceId {
    /// Identity of the stock display firmware
    pub const DEFAULT: Self = Self::new(DEFAULT_VENDOR_ID, DEFAULT_PRODUCT_ID);

    pub const fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }

    /// Check a descriptor's vendor/product against this identity
    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id == vendor_id && self.product_id == product_id
    }
}

impl Default for DeviceId {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl core::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

/// Endpoint address with the direction bit in bit 7
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EndpointAddress(pub u8);

impl EndpointAddress {
    const DIRECTION_IN: u8 = 0x80;

    /// Endpoint number without the direction bit
    pub fn number(self) -> u8 {
        self.0 & 0x0f
    }

    /// True for host-to-device endpoints
    pub fn is_out(self) -> bool {
        self.0 & Self::DIRECTION_IN == 0
    }
}

impl Default for EndpointAddress {
    fn default() -> Self {
        Self(DEFAULT_ENDPOINT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_identity() {
        assert_eq!(DeviceId::default(), DeviceId::new(0xfccf, 0xa001));
        assert!(DeviceId::DEFAULT.matches(0xfccf, 0xa001));
        assert!(!DeviceId::DEFAULT.matches(0xfccf, 0xa002));
    }

    #[test]
    fn test_endpoint_direction() {
        assert!(EndpointAddress::default().is_out());
        assert_eq!(EndpointAddress::default().number(), 1);
        assert!(!EndpointAddress(0x81).is_out());
        assert_eq!(EndpointAddress(0x81).number(), 1);
    }
}
