//! Dotted-quad codec and CIDR value type.
//!
//! Addresses travel through the crate as plain `u32` values in host byte
//! order. This file converts them to and from their textual form and
//! provides the mask arithmetic shared by the tree and the command layer.

use serde::{Serialize, Serializer};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Narrowest subnet the tree accepts (65536 hosts)
pub const MIN_WIDTH: u8 = 16;

/// Width of a single host
pub const HOST_WIDTH: u8 = 32;

/// Errors produced while parsing a dotted-quad address or a CIDR string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("Invalid Address Format: {input} (expected four dot-separated octets)")]
    WrongOctetCount { input: String },

    #[error("Invalid Address Format: {input} (octet '{octet}' is not a decimal number)")]
    NotNumeric { input: String, octet: String },

    #[error("Invalid Address Format: {input} (octet {value} is out of range 0..=255)")]
    OctetOutOfRange { input: String, value: u32 },

    #[error("Invalid Address Format: {input} (prefix width must be 0..=32)")]
    InvalidWidth { input: String },
}

/// Build the mask with the top `width` bits set.
///
/// Widths above 32 saturate to a full host mask.
///
/// # Examples
/// ```
/// use subnet_rollup::ip::codec::width_to_mask;
///
/// assert_eq!(width_to_mask(24), 0xffff_ff00);
/// assert_eq!(width_to_mask(32), 0xffff_ffff);
/// assert_eq!(width_to_mask(0), 0);
/// ```
pub fn width_to_mask(width: u8) -> u32 {
    match width {
        0 => 0,
        w if w >= HOST_WIDTH => u32::MAX,
        w => u32::MAX << (HOST_WIDTH - w),
    }
}

/// Parse a dotted-quad IPv4 address into a `u32`.
///
/// Each octet must be one to three ASCII digits with a value of at most 255.
/// Signs, embedded whitespace and empty octets are rejected before any
/// arithmetic is done.
///
/// # Examples
/// ```
/// use subnet_rollup::ip::codec::parse_ipv4;
///
/// assert_eq!(parse_ipv4("128.250.1.7"), Ok(0x80fa_0107));
/// assert!(parse_ipv4("400.1.1.1").is_err());
/// assert!(parse_ipv4("1.2.3").is_err());
/// ```
pub fn parse_ipv4(input: &str) -> Result<u32, AddressError> {
    let fields: Vec<&str> = input.split('.').collect();
    if fields.len() != 4 {
        return Err(AddressError::WrongOctetCount {
            input: input.to_string(),
        });
    }

    let mut address = 0u32;
    for field in fields {
        address = (address << 8) | parse_octet(input, field)?;
    }

    Ok(address)
}

fn parse_octet(input: &str, field: &str) -> Result<u32, AddressError> {
    if field.is_empty() || field.len() > 3 || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AddressError::NotNumeric {
            input: input.to_string(),
            octet: field.to_string(),
        });
    }

    // At most three digits, so this cannot overflow
    let value = field
        .bytes()
        .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0'));

    if value > 255 {
        return Err(AddressError::OctetOutOfRange {
            input: input.to_string(),
            value,
        });
    }

    Ok(value)
}

/// Render a `u32` address as `a.b.c.d`.
pub fn format_ipv4(address: u32) -> String {
    Ipv4Addr::from(address).to_string()
}

/// A CIDR block: an aligned prefix and its width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cidr {
    prefix: u32,
    width: u8,
}

impl Cidr {
    /// Create a block, aligning `prefix` to `width`.
    ///
    /// Widths above 32 are clamped to 32.
    pub fn new(prefix: u32, width: u8) -> Self {
        let width = width.min(HOST_WIDTH);
        Self {
            prefix: prefix & width_to_mask(width),
            width,
        }
    }

    /// Network address of the block
    pub fn prefix(&self) -> u32 {
        self.prefix
    }

    /// Number of significant leading bits
    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn mask(&self) -> u32 {
        width_to_mask(self.width)
    }

    /// Number of host addresses in the block
    pub fn size(&self) -> u64 {
        1u64 << (HOST_WIDTH - self.width)
    }

    /// Last address inside the block
    pub fn last(&self) -> u32 {
        self.prefix | !self.mask()
    }

    /// Check whether `address` falls inside the block
    pub fn contains(&self, address: u32) -> bool {
        address & self.mask() == self.prefix
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", Ipv4Addr::from(self.prefix), self.width)
    }
}

impl FromStr for Cidr {
    type Err = AddressError;

    /// Parse `a.b.c.d/w`; the address is aligned to the width.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (address, width) = s.split_once('/').ok_or_else(|| AddressError::InvalidWidth {
            input: s.to_string(),
        })?;

        let prefix = parse_ipv4(address)?;
        let width = match width.parse::<u8>() {
            Ok(w) if w <= HOST_WIDTH && !width.starts_with('+') => w,
            _ => {
                return Err(AddressError::InvalidWidth {
                    input: s.to_string(),
                })
            }
        };

        Ok(Cidr::new(prefix, width))
    }
}

impl Serialize for Cidr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_to_mask() {
        assert_eq!(width_to_mask(16), 0xffff_0000);
        assert_eq!(width_to_mask(25), 0xffff_ff80);
        assert_eq!(width_to_mask(31), 0xffff_fffe);
        assert_eq!(width_to_mask(40), u32::MAX);
    }

    #[test]
    fn test_parse_valid_addresses() {
        assert_eq!(parse_ipv4("0.0.0.0"), Ok(0));
        assert_eq!(parse_ipv4("255.255.255.255"), Ok(u32::MAX));
        assert_eq!(parse_ipv4("10.0.0.1"), Ok(0x0a00_0001));
        assert_eq!(parse_ipv4("001.002.003.004"), Ok(0x0102_0304));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let invalid = vec![
            "", "1.2.3", "1.2.3.4.5", "1..2.3", "a.b.c.d", "-1.2.3.4", "+1.2.3.4",
            " 1.2.3.4", "1.2.3.4 ", "1.2.3.1000", "1.2.3.0x1",
        ];

        for input in invalid {
            assert!(parse_ipv4(input).is_err(), "'{}' should be rejected", input);
        }
    }

    #[test]
    fn test_parse_out_of_range_octet() {
        match parse_ipv4("400.1.1.1") {
            Err(AddressError::OctetOutOfRange { value, .. }) => assert_eq!(value, 400),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(parse_ipv4("1.1.1.256").is_err());
    }

    #[test]
    fn test_format_ipv4() {
        assert_eq!(format_ipv4(0x80fa_0100), "128.250.1.0");
        assert_eq!(format_ipv4(u32::MAX), "255.255.255.255");
    }

    #[test]
    fn test_cidr_alignment_and_display() {
        let block = Cidr::new(parse_ipv4("128.250.1.77").unwrap(), 24);
        assert_eq!(block.to_string(), "128.250.1.0/24");
        assert_eq!(block.size(), 256);
        assert_eq!(format_ipv4(block.last()), "128.250.1.255");
        assert!(block.contains(parse_ipv4("128.250.1.200").unwrap()));
        assert!(!block.contains(parse_ipv4("128.250.2.0").unwrap()));
    }

    #[test]
    fn test_cidr_from_str() {
        let block: Cidr = "10.1.2.3/16".parse().unwrap();
        assert_eq!(block, Cidr::new(0x0a01_0000, 16));
        assert_eq!("1.2.3.4/32".parse::<Cidr>().unwrap().width(), 32);

        assert!("10.1.2.3".parse::<Cidr>().is_err());
        assert!("10.1.2.3/33".parse::<Cidr>().is_err());
        assert!("10.1.2.3/-1".parse::<Cidr>().is_err());
        assert!("10.1.2/8".parse::<Cidr>().is_err());
    }

    #[test]
    fn test_cidr_serializes_as_string() {
        let blocks = vec![Cidr::new(0x80fa_0100, 25), Cidr::new(0x80fa_0180, 32)];
        let json = serde_json::to_string(&blocks).unwrap();
        assert_eq!(json, r#"["128.250.1.0/25","128.250.1.128/32"]"#);
    }
}
