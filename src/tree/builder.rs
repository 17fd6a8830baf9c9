//! One-time construction of the address tree.

use super::{AddressTree, Node, TreeError, ROOT};
use crate::ip::codec::{Cidr, HOST_WIDTH, MIN_WIDTH};
use log::debug;

impl AddressTree {
    /// Build the tree for `root_prefix/root_width` with every host down.
    ///
    /// The prefix is aligned to the width first. The arena is reserved in a
    /// single fallible allocation; nothing is allocated after this returns.
    ///
    /// # Errors
    /// * [`TreeError::InvalidWidth`] if `root_width` is outside 16..=32
    /// * [`TreeError::OutOfMemory`] if the arena cannot be reserved
    ///
    /// # Examples
    /// ```
    /// use subnet_rollup::tree::AddressTree;
    ///
    /// let tree = AddressTree::build(0x80fa_0100, 24).unwrap();
    /// assert_eq!(tree.leaf_count(), 256);
    /// assert_eq!(tree.subnet().to_string(), "128.250.1.0/24");
    /// assert!(AddressTree::build(0x80fa_0100, 8).is_err());
    /// ```
    pub fn build(root_prefix: u32, root_width: u8) -> Result<Self, TreeError> {
        if !(MIN_WIDTH..=HOST_WIDTH).contains(&root_width) {
            return Err(TreeError::InvalidWidth { width: root_width });
        }

        let subnet = Cidr::new(root_prefix, root_width);
        let leaf_count = 1usize << (HOST_WIDTH - root_width);
        let slots = leaf_count * 2;

        let mut nodes = Vec::new();
        nodes
            .try_reserve_exact(slots)
            .map_err(|_| TreeError::OutOfMemory { nodes: slots - 1 })?;
        nodes.resize(slots, Node::default());

        for (offset, leaf) in nodes[leaf_count..].iter_mut().enumerate() {
            *leaf = Node::host(subnet.prefix() + offset as u32);
        }

        // Pair slots 2i and 2i+1 into slot i, one level at a time from the
        // leaves up. With a single host the root is the leaf and this is empty.
        for i in (ROOT..leaf_count).rev() {
            nodes[i] = Node::combine(&nodes[2 * i], &nodes[2 * i + 1]);
        }

        debug_assert_eq!(nodes[ROOT].cidr(), subnet);
        debug!(
            "Built address tree for {}: {} hosts, {} nodes",
            subnet,
            leaf_count,
            slots - 1
        );

        Ok(Self {
            subnet,
            leaf_base: leaf_count,
            nodes,
        })
    }
}
