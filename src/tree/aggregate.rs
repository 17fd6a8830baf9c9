//! Minimal-cover traversal.

use super::{AddressTree, NodeId};
use crate::ip::codec::Cidr;

/// Pre-order walk yielding the maximal active blocks, lowest address first.
///
/// An active node is emitted whole and its subtree skipped; an inactive leaf
/// yields nothing. The stack never holds more than `height + 1` entries.
#[derive(Debug, Clone)]
pub struct Aggregates<'a> {
    tree: &'a AddressTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Aggregates<'a> {
    type Item = Cidr;

    fn next(&mut self) -> Option<Cidr> {
        while let Some(id) = self.stack.pop() {
            let node = self.tree.node(id);
            if node.is_active() {
                return Some(node.cidr());
            }

            if let (Some(left), Some(right)) = (self.tree.left(id), self.tree.right(id)) {
                self.stack.push(right);
                self.stack.push(left);
            }
        }
        None
    }
}

impl AddressTree {
    /// Minimal list of CIDR blocks whose union is exactly the set of up hosts.
    ///
    /// Each call starts a fresh traversal.
    ///
    /// # Examples
    /// ```
    /// use subnet_rollup::tree::AddressTree;
    ///
    /// let mut tree = AddressTree::build(0x0a00_0000, 30).unwrap();
    /// tree.mark_up(0x0a00_0000).unwrap();
    /// tree.mark_up(0x0a00_0001).unwrap();
    /// tree.mark_up(0x0a00_0003).unwrap();
    ///
    /// let cover: Vec<String> = tree.aggregate().map(|c| c.to_string()).collect();
    /// assert_eq!(cover, ["10.0.0.0/31", "10.0.0.3/32"]);
    /// ```
    pub fn aggregate(&self) -> Aggregates<'_> {
        let mut stack = Vec::with_capacity(usize::from(self.height()) + 1);
        stack.push(self.root());
        Aggregates { tree: self, stack }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ip::codec::parse_ipv4;

    fn addr(s: &str) -> u32 {
        parse_ipv4(s).unwrap()
    }

    fn cover(tree: &AddressTree) -> Vec<String> {
        tree.aggregate().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_empty_tree_emits_nothing() {
        let tree = AddressTree::build(addr("10.0.0.0"), 20).unwrap();
        assert_eq!(tree.aggregate().count(), 0);
    }

    #[test]
    fn test_full_tree_emits_root() {
        let mut tree = AddressTree::build(addr("10.0.0.0"), 29).unwrap();
        for host in 0..8 {
            tree.mark_up(addr("10.0.0.0") + host).unwrap();
        }
        assert_eq!(cover(&tree), ["10.0.0.0/29"]);
    }

    #[test]
    fn test_unaligned_run_splits_into_blocks() {
        let mut tree = AddressTree::build(addr("10.0.0.0"), 28).unwrap();
        // .3 through .12
        for host in 3..=12 {
            tree.mark_up(addr("10.0.0.0") + host).unwrap();
        }
        assert_eq!(
            cover(&tree),
            ["10.0.0.3/32", "10.0.0.4/30", "10.0.0.8/30", "10.0.0.12/32"]
        );
    }

    #[test]
    fn test_traversal_is_restartable() {
        let mut tree = AddressTree::build(addr("10.0.0.0"), 24).unwrap();
        tree.mark_up(addr("10.0.0.42")).unwrap();

        let mut first = tree.aggregate();
        assert_eq!(first.next().map(|c| c.to_string()), Some("10.0.0.42/32".to_string()));
        assert_eq!(first.next(), None);
        assert_eq!(cover(&tree), ["10.0.0.42/32"]);
    }

    #[test]
    fn test_single_host_tree() {
        let mut tree = AddressTree::build(addr("10.9.8.7"), 32).unwrap();
        assert_eq!(tree.aggregate().count(), 0);
        tree.mark_up(addr("10.9.8.7")).unwrap();
        assert_eq!(cover(&tree), ["10.9.8.7/32"]);
    }
}
