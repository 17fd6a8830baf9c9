//! # subnet-rollup - Minimal CIDR summaries of live hosts
//!
//! This library tracks the up/down state of every host in one IPv4 subnet
//! and, on demand, produces the smallest list of CIDR prefixes whose union
//! is exactly the set of hosts that are up. It is the route-summarization
//! step behind announcing a handful of aggregates instead of one route per
//! host.
//!
//! ## Overview
//!
//! The subnet is modeled as a complete binary tree. Leaves are hosts and
//! every internal node is the aligned block formed by its two halves. A node
//! is active when all of its hosts are up. Updates touch only the path from
//! a leaf to the root, and the summary is a pre-order walk that stops at the
//! first active node on each path.
//!
//! - **Bounded size**: subnets from /16 (65536 hosts) down to a single /32
//! - **O(height) updates**: at most 17 nodes touched per up/down event
//! - **O(1) host lookup**: leaves are addressed by offset into the subnet
//! - **Lazy summaries**: the cover is an iterator, restartable at any time
//!
//! ## Architecture
//!
//! - `ip`: dotted-quad codec, mask arithmetic and the `Cidr` type
//! - `tree`: the address tree, its builder, status propagation and traversal
//! - `command`: parsing of the `u`/`d`/`p`/`x` line protocol
//! - `session`: the command loop driving a tree from any reader
//! - `config`: startup configuration types and validation
//! - `config_loader`: YAML loading and merging with command-line values
//! - `shared`: a lock-protected handle for multi-threaded embedding
//!
//! ## Example Usage
//!
//! ```rust
//! use subnet_rollup::ip::codec::parse_ipv4;
//! use subnet_rollup::tree::AddressTree;
//!
//! let mut tree = AddressTree::build(parse_ipv4("128.250.1.0")?, 24)?;
//! for host in 0..128 {
//!     tree.mark_up(parse_ipv4("128.250.1.0")? + host)?;
//! }
//! tree.mark_up(parse_ipv4("128.250.1.128")?)?;
//!
//! let cover: Vec<String> = tree.aggregate().map(|block| block.to_string()).collect();
//! assert_eq!(cover, ["128.250.1.0/25", "128.250.1.128/32"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Command Protocol
//!
//! The `subnet-rollup` binary reads one command per line:
//!
//! ```text
//! u 128.250.1.7     mark a host up
//! d 128.250.1.7     mark a host down
//! p                 print the minimal covering prefixes
//! x                 exit
//! ```
//!
//! ## Error Handling
//!
//! Library operations return typed errors built with `thiserror`; nothing in
//! the library exits the process. The binary reports fatal errors through
//! `color_eyre` and prints usage with exit status 1 for bad arguments.

pub mod command;
pub mod config;
pub mod config_loader;
pub mod ip;
pub mod session;
pub mod shared;
pub mod tree;

pub use command::{Command, CommandError};
pub use ip::{AddressError, Cidr};
pub use session::{OutputFormat, Session, SessionError};
pub use shared::SharedTree;
pub use tree::{AddressTree, TreeError};
