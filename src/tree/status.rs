//! Host status updates and incremental ancestor repair.
//!
//! An internal node is active exactly when both children are active, so a
//! single leaf change can only affect the nodes on its path to the root.
//! Both walks below stop as soon as an ancestor is found whose value cannot
//! change, which bounds every update by the tree height.

use super::{AddressTree, TreeError, ROOT};
use log::trace;

impl AddressTree {
    /// Mark `host` up and recompute its ancestors.
    ///
    /// The walk stops at the first ancestor that recomputes to false: one of
    /// its other descendants is down, so it was already false and every node
    /// above it is unaffected.
    pub fn mark_up(&mut self, host: u32) -> Result<(), TreeError> {
        let leaf = self.locate(host)?;
        let mut index = leaf.index();
        self.nodes[index].active = true;

        let mut recomputed = 0;
        while self.nodes[index].active && index > ROOT {
            index /= 2;
            self.nodes[index].active =
                self.nodes[2 * index].active && self.nodes[2 * index + 1].active;
            recomputed += 1;
        }

        trace!(
            "Host {} up, {} ancestors recomputed",
            self.nodes[leaf.index()].cidr(),
            recomputed
        );
        Ok(())
    }

    /// Mark `host` down and clear every active ancestor.
    ///
    /// Any ancestor that was active loses its AND; the walk stops at the
    /// first node that was already inactive.
    pub fn mark_down(&mut self, host: u32) -> Result<(), TreeError> {
        let leaf = self.locate(host)?;
        let mut index = leaf.index();

        let mut cleared = 0;
        while index >= ROOT && self.nodes[index].active {
            self.nodes[index].active = false;
            index /= 2;
            cleared += 1;
        }

        trace!(
            "Host {} down, {} nodes cleared",
            self.nodes[leaf.index()].cidr(),
            cleared
        );
        Ok(())
    }

    /// Current state of a single host
    pub fn is_up(&self, host: u32) -> Result<bool, TreeError> {
        let leaf = self.locate(host)?;
        Ok(self.nodes[leaf.index()].active)
    }

    /// Number of hosts currently up
    pub fn up_count(&self) -> usize {
        self.nodes[self.leaf_base..]
            .iter()
            .filter(|leaf| leaf.active)
            .count()
    }
}
