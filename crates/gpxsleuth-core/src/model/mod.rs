/// Data model for the GpxSleuth device tree.
///
/// Re-exports the arena-allocated tree, its node type, and the coordinate
/// handles used by views.
pub mod index;
pub mod tree;
pub mod tree_node;

pub use index::{ModelIndex, Role, USER_ROLE};
pub use tree::{DeviceTree, TreeDump};
pub use tree_node::{NodeId, TreeNode};
