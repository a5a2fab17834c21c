/// Coordinate handles and data roles for the view-facing traversal contract.
///
/// A view never holds a [`TreeNode`](super::TreeNode) reference. It holds a
/// [`ModelIndex`]: a `(row, column, node)` triple stamped with the tree
/// generation it was minted in, so the model can refuse handles that
/// outlived a rescan.
use super::tree_node::NodeId;

/// Base value for application-defined role identifiers.
pub const USER_ROLE: i32 = 0x0100;

/// Opaque coordinate addressing one node of the device tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ModelIndex {
    row: usize,
    column: usize,
    node: Option<NodeId>,
    generation: u64,
}

impl ModelIndex {
    /// The invalid handle. As a parent argument it means "top level".
    pub const fn invalid() -> Self {
        Self {
            row: 0,
            column: 0,
            node: None,
            generation: 0,
        }
    }

    pub(crate) fn new(row: usize, column: usize, node: NodeId, generation: u64) -> Self {
        Self {
            row,
            column,
            node: Some(node),
            generation,
        }
    }

    /// `true` if this handle addresses a node. A valid handle may still be
    /// stale; the model checks the generation on use.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.node.is_some()
    }

    #[inline]
    pub fn row(&self) -> usize {
        self.row
    }

    #[inline]
    pub fn column(&self) -> usize {
        self.column
    }

    #[inline]
    pub(crate) fn node(&self) -> Option<NodeId> {
        self.node
    }

    #[inline]
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }
}

impl Default for ModelIndex {
    fn default() -> Self {
        Self::invalid()
    }
}

/// Data roles a view may request from the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// Display name of the node.
    Name,
    /// Absolute path. Declared in the role table but not served by `data`.
    FullPath,
}

impl Role {
    /// Numeric role identifier.
    pub fn id(self) -> i32 {
        match self {
            Self::Name => USER_ROLE + 1,
            Self::FullPath => USER_ROLE + 2,
        }
    }

    /// Stable string key exposed to the view.
    pub fn key(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::FullPath => "fullPath",
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        [Self::Name, Self::FullPath]
            .into_iter()
            .find(|role| role.id() == id)
    }
}
