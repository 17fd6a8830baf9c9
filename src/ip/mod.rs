//! IPv4 address handling.
//!
//! This module converts between dotted-quad text and `u32` addresses and
//! provides the CIDR block type used by the tree and its summaries.

pub mod codec;

// Re-export commonly used types
pub use codec::{format_ipv4, parse_ipv4, width_to_mask, AddressError, Cidr};
