/// A single node in the arena-allocated device tree.
///
/// Nodes are stored in the flat slot vector owned by
/// [`DeviceTree`](super::DeviceTree). Parent and child links are indices
/// rather than pointers, so the child → parent back-reference can never keep
/// a parent alive and there is no ownership cycle to break.
use compact_str::CompactString;
use std::path::{Path, PathBuf};

/// Lightweight index into the tree arena.
///
/// Uses `u32` to keep nodes small. A discovery run produces a few hundred
/// nodes at most, so the range is never a concern in practice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The synthetic root always occupies the first slot.
    pub const ROOT: NodeId = NodeId(0);

    /// Create a new `NodeId` from a `usize`, panicking in debug builds if it
    /// exceeds `u32::MAX`.
    #[inline]
    pub fn new(index: usize) -> Self {
        debug_assert!(index <= u32::MAX as usize, "NodeId overflow");
        Self(index as u32)
    }

    /// Return the index as a `usize` for slot indexing.
    #[inline]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

/// One entry in the tree: the root, a device folder, or a track file.
///
/// The kind is not stored. It follows from depth: children of the root are
/// devices, their children are track files.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Display name: a volume label for devices, the base name for files.
    pub(crate) name: CompactString,

    /// Absolute path of the device folder or track file.
    pub(crate) full_path: PathBuf,

    /// Owned children in insertion (discovery) order.
    pub(crate) children: Vec<NodeId>,

    /// Non-owning back-reference. `None` only for the root.
    pub(crate) parent: Option<NodeId>,
}

impl TreeNode {
    pub(crate) fn new(name: CompactString, full_path: PathBuf, parent: Option<NodeId>) -> Self {
        Self {
            name,
            full_path,
            children: Vec::new(),
            parent,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    #[inline]
    pub fn full_path(&self) -> &Path {
        &self.full_path
    }

    /// Recorded parent, fixed at construction.
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order.
    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[inline]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}
