//! Structural and aggregate invariant checks.

use super::{AddressTree, Node, ROOT};
use crate::ip::codec::{Cidr, HOST_WIDTH};

/// A node whose stored fields disagree with what its position implies
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("Root covers {found}, expected {expected}")]
    RootMismatch { found: Cidr, expected: Cidr },

    #[error("Leaf at slot {slot} covers {found}, expected {expected}")]
    LeafMismatch { slot: usize, found: Cidr, expected: Cidr },

    #[error("Node at slot {slot} covers {found}, but its children imply {expected}")]
    BlockMismatch { slot: usize, found: Cidr, expected: Cidr },

    #[error("Node {block} is marked {found} but its children imply {expected}")]
    ActiveMismatch { block: Cidr, found: bool, expected: bool },
}

impl AddressTree {
    /// Check every node against the tree invariants.
    ///
    /// Leaves must be the hosts of the subnet in address order; every
    /// internal node must be the aligned union of its children and be active
    /// exactly when both children are. Runs in O(nodes).
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let root = self.nodes[ROOT].cidr();
        if root != self.subnet {
            return Err(InvariantViolation::RootMismatch {
                found: root,
                expected: self.subnet,
            });
        }

        for (offset, leaf) in self.nodes[self.leaf_base..].iter().enumerate() {
            let expected = Cidr::new(self.subnet.prefix() + offset as u32, HOST_WIDTH);
            if leaf.cidr() != expected || leaf.width() != HOST_WIDTH {
                return Err(InvariantViolation::LeafMismatch {
                    slot: self.leaf_base + offset,
                    found: leaf.cidr(),
                    expected,
                });
            }
        }

        for slot in ROOT..self.leaf_base {
            let node = &self.nodes[slot];
            let derived = Node::combine(&self.nodes[2 * slot], &self.nodes[2 * slot + 1]);

            if node.cidr() != derived.cidr() || node.prefix() != derived.prefix() {
                return Err(InvariantViolation::BlockMismatch {
                    slot,
                    found: node.cidr(),
                    expected: derived.cidr(),
                });
            }
            if node.is_active() != derived.is_active() {
                return Err(InvariantViolation::ActiveMismatch {
                    block: node.cidr(),
                    found: node.is_active(),
                    expected: derived.is_active(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_trees_are_consistent() {
        for width in 16..=32 {
            let tree = AddressTree::build(0xac10_0000, width).unwrap();
            assert!(tree.check_invariants().is_ok(), "width {}", width);
        }
    }

    #[test]
    fn test_detects_stale_ancestor() {
        let mut tree = AddressTree::build(0x0a00_0000, 30).unwrap();
        tree.nodes[ROOT].active = true;

        assert_eq!(
            tree.check_invariants(),
            Err(InvariantViolation::ActiveMismatch {
                block: tree.subnet(),
                found: true,
                expected: false,
            })
        );
    }

    #[test]
    fn test_detects_misplaced_leaf() {
        let mut tree = AddressTree::build(0x0a00_0000, 30).unwrap();
        let slot = tree.leaf_base + 2;
        tree.nodes[slot].prefix = 0x0a00_0003;

        assert!(matches!(
            tree.check_invariants(),
            Err(InvariantViolation::LeafMismatch { slot: s, .. }) if s == slot
        ));
    }
}
