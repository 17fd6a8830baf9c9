//! Address-space binary tree.
//!
//! The tree covers one IPv4 subnet. Every node is an aligned CIDR block; the
//! leaves are the individual hosts in address order and each internal node
//! is the union of its two halves. A node is *active* when every host below
//! it is up, which lets the aggregator emit the minimal cover by stopping at
//! the first active node on every path.
//!
//! Nodes live in a single heap-ordered arena:
//!
//! - slot 1 is the root, slot 0 is an unused sentinel
//! - the children of slot `i` are `2i` and `2i + 1`, its parent is `i / 2`
//! - the `N` leaves occupy slots `N..2N`, so a host at offset `o` is slot `N + o`
//!
//! No links are stored; navigation is index arithmetic.

mod aggregate;
mod builder;
mod status;
mod verify;

pub use aggregate::Aggregates;
pub use verify::InvariantViolation;

use crate::ip::codec::{width_to_mask, Cidr, HOST_WIDTH};
use std::net::Ipv4Addr;

/// Arena slot of the root node
const ROOT: usize = 1;

/// Errors returned by tree construction and host lookups
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("Invalid network width {width}: must be in the range 16..32")]
    InvalidWidth { width: u8 },

    #[error("Host Address is not within the sub-network: {host} (network {subnet})")]
    AddressOutsideSubnet { host: Ipv4Addr, subnet: Cidr },

    #[error("Unable to allocate {nodes} tree nodes")]
    OutOfMemory { nodes: usize },
}

/// Stable handle to a node in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena
    pub fn index(self) -> usize {
        self.0
    }
}

/// One block of the address space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Node {
    prefix: u32,
    width: u8,
    active: bool,
}

impl Node {
    /// A single host, initially down
    fn host(address: u32) -> Self {
        Self {
            prefix: address,
            width: HOST_WIDTH,
            active: false,
        }
    }

    /// Derive a parent from its two children
    fn combine(left: &Node, right: &Node) -> Self {
        let width = left.width - 1;
        Self {
            prefix: left.prefix & width_to_mask(width),
            width,
            active: left.active && right.active,
        }
    }

    pub fn prefix(&self) -> u32 {
        self.prefix
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    /// Whether every host in this block is up
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn cidr(&self) -> Cidr {
        Cidr::new(self.prefix, self.width)
    }
}

/// Up/down state of every host in a subnet, with aggregate state per block.
///
/// Built once by [`AddressTree::build`]; afterwards only the active flags
/// change, through [`AddressTree::mark_up`] and [`AddressTree::mark_down`].
#[derive(Debug, Clone)]
pub struct AddressTree {
    subnet: Cidr,
    leaf_base: usize,
    nodes: Vec<Node>,
}

impl AddressTree {
    /// The subnet covered by the root
    pub fn subnet(&self) -> Cidr {
        self.subnet
    }

    pub fn root(&self) -> NodeId {
        NodeId(ROOT)
    }

    /// Number of host leaves
    pub fn leaf_count(&self) -> usize {
        self.leaf_base
    }

    /// Number of live nodes, leaves included
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Number of levels between the root and a leaf
    pub fn height(&self) -> u8 {
        HOST_WIDTH - self.subnet.width()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        id.0 >= self.leaf_base
    }

    pub fn left(&self, id: NodeId) -> Option<NodeId> {
        (!self.is_leaf(id)).then(|| NodeId(id.0 * 2))
    }

    pub fn right(&self, id: NodeId) -> Option<NodeId> {
        (!self.is_leaf(id)).then(|| NodeId(id.0 * 2 + 1))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        (id.0 > ROOT).then(|| NodeId(id.0 / 2))
    }

    /// Find the leaf of `host` in O(1).
    ///
    /// Fails with [`TreeError::AddressOutsideSubnet`] when the host does not
    /// share the root prefix.
    pub fn locate(&self, host: u32) -> Result<NodeId, TreeError> {
        if !self.subnet.contains(host) {
            return Err(TreeError::AddressOutsideSubnet {
                host: Ipv4Addr::from(host),
                subnet: self.subnet,
            });
        }

        let offset = (host & !self.subnet.mask()) as usize;
        Ok(NodeId(self.leaf_base + offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ip::codec::parse_ipv4;

    fn addr(s: &str) -> u32 {
        parse_ipv4(s).unwrap()
    }

    #[test]
    fn test_locate_maps_offset_to_leaf() {
        let tree = AddressTree::build(addr("128.250.1.0"), 24).unwrap();

        let first = tree.locate(addr("128.250.1.0")).unwrap();
        let last = tree.locate(addr("128.250.1.255")).unwrap();
        assert_eq!(first.index(), 256);
        assert_eq!(last.index(), 511);
        assert_eq!(tree.node(last).cidr().to_string(), "128.250.1.255/32");
        assert!(tree.is_leaf(first));
    }

    #[test]
    fn test_locate_rejects_foreign_host() {
        let tree = AddressTree::build(addr("128.250.1.0"), 24).unwrap();

        let err = tree.locate(addr("10.0.0.1")).unwrap_err();
        assert_eq!(
            err,
            TreeError::AddressOutsideSubnet {
                host: Ipv4Addr::new(10, 0, 0, 1),
                subnet: tree.subnet(),
            }
        );
        assert!(tree.locate(addr("128.250.2.0")).is_err());
    }

    #[test]
    fn test_navigation() {
        let tree = AddressTree::build(addr("192.168.0.0"), 30).unwrap();
        let root = tree.root();

        assert_eq!(tree.parent(root), None);
        let left = tree.left(root).unwrap();
        let right = tree.right(root).unwrap();
        assert_eq!(tree.node(left).cidr().to_string(), "192.168.0.0/31");
        assert_eq!(tree.node(right).cidr().to_string(), "192.168.0.2/31");
        assert_eq!(tree.parent(right), Some(root));

        let leaf = tree.locate(addr("192.168.0.3")).unwrap();
        assert_eq!(tree.left(leaf), None);
        assert_eq!(tree.right(leaf), None);
        assert_eq!(tree.parent(leaf), Some(right));
    }

    #[test]
    fn test_error_messages() {
        let err = TreeError::InvalidWidth { width: 8 };
        assert_eq!(err.to_string(), "Invalid network width 8: must be in the range 16..32");
    }
}
