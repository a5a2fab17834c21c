/// Error types for the core crate.
///
/// None of these ever reach a view: traversal returns invalid handles
/// instead, and discovery logs and skips. They exist so the building blocks
/// (arena, config loader, volume enumeration) can report precisely what
/// went wrong to whoever calls them directly.
use crate::model::NodeId;
use std::path::PathBuf;

/// Structural errors raised by [`crate::model::DeviceTree`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TreeError {
    /// The id does not address a live node.
    #[error("node {0:?} does not exist")]
    UnknownNode(NodeId),

    /// The child was constructed for a different parent than the one it
    /// is being appended to.
    #[error("node {child:?} records parent {recorded:?} but was appended to {parent:?}")]
    ParentMismatch {
        child: NodeId,
        parent: NodeId,
        recorded: Option<NodeId>,
    },

    /// The child already sits in its parent's child list.
    #[error("node {0:?} is already attached")]
    AlreadyAttached(NodeId),
}

/// Failures while enumerating volumes or listing directories.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("failed to read mount table {path}: {source}")]
    MountTable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to list {path}: {message}")]
    Listing { path: PathBuf, message: String },

    #[error("volume enumeration failed: {0}")]
    Platform(String),
}

/// Failures loading a [`crate::config::DiscoveryConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("config field `{0}` must not be empty")]
    EmptyField(&'static str),
}
