//! Thread-safe handle over an address tree.
//!
//! Updates take the write lock, so there is a single writer at any time.
//! [`SharedTree::snapshot`] collects the whole cover under one read lock;
//! a traversal never observes a half-propagated update.

use crate::ip::codec::Cidr;
use crate::tree::{AddressTree, TreeError};
use parking_lot::RwLock;
use std::sync::Arc;

/// Cloneable, lock-protected [`AddressTree`]
#[derive(Debug, Clone)]
pub struct SharedTree {
    inner: Arc<RwLock<AddressTree>>,
}

impl SharedTree {
    pub fn new(tree: AddressTree) -> Self {
        Self {
            inner: Arc::new(RwLock::new(tree)),
        }
    }

    pub fn subnet(&self) -> Cidr {
        self.inner.read().subnet()
    }

    pub fn mark_up(&self, host: u32) -> Result<(), TreeError> {
        self.inner.write().mark_up(host)
    }

    pub fn mark_down(&self, host: u32) -> Result<(), TreeError> {
        self.inner.write().mark_down(host)
    }

    pub fn is_up(&self, host: u32) -> Result<bool, TreeError> {
        self.inner.read().is_up(host)
    }

    /// Point-in-time minimal cover of the up hosts
    pub fn snapshot(&self) -> Vec<Cidr> {
        self.inner.read().aggregate().collect()
    }

    /// Run `f` against the tree while holding the read lock
    pub fn with_tree<T>(&self, f: impl FnOnce(&AddressTree) -> T) -> T {
        f(&self.inner.read())
    }
}
