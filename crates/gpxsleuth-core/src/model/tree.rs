/// Arena-backed device tree.
///
/// All nodes live in one `Vec` of slots owned by [`DeviceTree`]. Discarding
/// a subtree empties its slots and puts them on a free list for the next
/// allocation. Resetting the root compacts the arena. Either way slot indices
/// get reused, which is why every reset also bumps a generation counter:
/// coordinate handles carry it and the model rejects handles minted before
/// the reset.
use super::tree_node::{NodeId, TreeNode};
use crate::error::TreeError;
use compact_str::CompactString;
use std::fmt;
use std::path::PathBuf;

/// The rooted, ordered tree of discovered devices and their track files.
#[derive(Debug, Clone)]
pub struct DeviceTree {
    /// Arena. Slot 0 is the root and is never discarded.
    slots: Vec<Option<TreeNode>>,

    /// Emptied slots available for reuse.
    free: Vec<NodeId>,

    /// Incremented by every [`reset`](Self::reset).
    generation: u64,
}

impl DeviceTree {
    /// Create a tree holding only an unparented root.
    pub fn new(name: &str, full_path: impl Into<PathBuf>) -> Self {
        let root = TreeNode::new(CompactString::new(name), full_path.into(), None);
        Self {
            slots: vec![Some(root)],
            free: Vec::new(),
            generation: 0,
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Get a live node, or `None` if the id was never allocated or has been
    /// discarded.
    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.slots.get(id.idx()).and_then(Option::as_ref)
    }

    /// Number of live nodes, root included.
    pub fn node_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Allocate a detached node that records `parent` as its parent.
    ///
    /// The node is *not* appended; call [`append_child`](Self::append_child)
    /// with the same parent, or use [`add_child`](Self::add_child) to do
    /// both at once.
    pub fn new_node(&mut self, name: &str, full_path: impl Into<PathBuf>, parent: NodeId) -> NodeId {
        let node = TreeNode::new(CompactString::new(name), full_path.into(), Some(parent));
        match self.free.pop() {
            Some(id) => {
                self.slots[id.idx()] = Some(node);
                id
            }
            None => {
                self.slots.push(Some(node));
                NodeId::new(self.slots.len() - 1)
            }
        }
    }

    /// Append `child` to the end of `parent`'s child list.
    ///
    /// The child must have been created for this parent and must not be
    /// attached yet.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        if self.node(parent).is_none() {
            return Err(TreeError::UnknownNode(parent));
        }
        let recorded = match self.node(child) {
            Some(node) if child != NodeId::ROOT => node.parent,
            _ => return Err(TreeError::UnknownNode(child)),
        };
        if recorded != Some(parent) {
            return Err(TreeError::ParentMismatch {
                child,
                parent,
                recorded,
            });
        }

        let children = &mut self.slot_mut(parent).children;
        if children.contains(&child) {
            return Err(TreeError::AlreadyAttached(child));
        }
        children.push(child);
        Ok(())
    }

    /// Construct a node under `parent` and append it in one step.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: &str,
        full_path: impl Into<PathBuf>,
    ) -> Result<NodeId, TreeError> {
        if self.node(parent).is_none() {
            return Err(TreeError::UnknownNode(parent));
        }
        let child = self.new_node(name, full_path, parent);
        self.append_child(parent, child)?;
        Ok(child)
    }

    /// The child at `index`, or `None` when out of range.
    pub fn child(&self, node: NodeId, index: usize) -> Option<NodeId> {
        self.node(node)?.children.get(index).copied()
    }

    pub fn child_count(&self, node: NodeId) -> usize {
        self.node(node).map_or(0, TreeNode::child_count)
    }

    /// The live parent of `node`. `None` for the root, for unknown ids, and
    /// for nodes whose parent has been discarded.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?
            .parent
            .filter(|parent| self.node(*parent).is_some())
    }

    /// Position of `node` among its parent's children.
    ///
    /// Recomputed on every call by an identity scan over the parent's child
    /// list. Returns 0 when there is no live parent.
    pub fn row(&self, node: NodeId) -> usize {
        self.parent(node)
            .and_then(|parent| self.node(parent))
            .and_then(|parent| parent.children.iter().position(|&c| c == node))
            .unwrap_or(0)
    }

    /// Number of edges between `node` and the root.
    pub fn depth(&self, node: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(node);
        while let Some(id) = current {
            depth += 1;
            current = self.parent(id);
        }
        depth
    }

    /// Discard every descendant of `node`, leaving it childless.
    ///
    /// Resetting the root also drops any detached nodes that were never
    /// appended.
    pub fn reset(&mut self, node: NodeId) {
        let Some(target) = self.slots.get_mut(node.idx()).and_then(Option::as_mut) else {
            return;
        };
        let mut pending = std::mem::take(&mut target.children);
        self.generation += 1;

        if node == NodeId::ROOT {
            self.slots.truncate(1);
            self.free.clear();
            return;
        }

        while let Some(id) = pending.pop() {
            if let Some(discarded) = self.slots.get_mut(id.idx()).and_then(Option::take) {
                pending.extend(discarded.children);
                self.free.push(id);
            }
        }
    }

    /// Lazy, indented text rendering of the subtree under `node`.
    pub fn dump(&self, node: NodeId) -> TreeDump<'_> {
        TreeDump { tree: self, node }
    }

    fn slot_mut(&mut self, id: NodeId) -> &mut TreeNode {
        match self.slots.get_mut(id.idx()).and_then(Option::as_mut) {
            Some(node) => node,
            None => unreachable!("slot {id:?} checked live by caller"),
        }
    }
}

/// Diagnostic dump returned by [`DeviceTree::dump`]. Nothing is walked until
/// it is formatted.
pub struct TreeDump<'a> {
    tree: &'a DeviceTree,
    node: NodeId,
}

impl fmt::Display for TreeDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![(self.node, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.tree.node(id) else {
                continue;
            };
            writeln!(
                f,
                "{:indent$}{} [{}]",
                "",
                node.name,
                node.full_path.display(),
                indent = depth * 2
            )?;
            // Reverse so children print in insertion order.
            stack.extend(node.children.iter().rev().map(|&c| (c, depth + 1)));
        }
        Ok(())
    }
}
