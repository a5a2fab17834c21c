/// The device tree model: rescan orchestration plus the traversal contract a
/// hierarchical view drives.
///
/// The tree has three levels:
///
/// ```text
/// root (unaddressable)
/// ├── <volume label>      [<volume>/Garmin/GPX]
/// │   ├── <track name>    [<volume>/Garmin/GPX/<track>.gpx]
/// │   └── ...
/// └── ...
/// ```
///
/// Views address nodes through [`ModelIndex`] handles. Every structural
/// change is bracketed by [`ModelEvent::ResetBegun`] and
/// [`ModelEvent::ResetEnded`]. Any handle obtained before a reset must be
/// dropped once `ResetBegun` is observed; the model rejects stale handles
/// by generation rather than dereferencing them.
///
/// # Threading
///
/// `TreeModel` itself has no locking and must be driven from one thread at a
/// time. Use [`SharedTreeModel`] and [`rescan_shared`] when readers live on
/// other threads.
use crate::config::DiscoveryConfig;
use crate::discovery::{self, DiscoveredDevice};
use crate::error::DiscoveryError;
use crate::model::{DeviceTree, ModelIndex, NodeId, Role};
use crate::platform::{self, VolumeInfo};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Structural change notifications, delivered synchronously in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelEvent {
    /// The tree is about to be replaced. Stop reading node data.
    ResetBegun,
    /// The new tree is in place and safe to read.
    ResetEnded {
        /// Number of devices (children of the root) after the reset.
        devices: usize,
    },
}

/// Where the model gets its list of mounted volumes from.
pub trait VolumeSource: Send + Sync {
    fn mounted_volumes(&self) -> Result<Vec<VolumeInfo>, DiscoveryError>;
}

/// The volumes currently mounted on this host.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostVolumes;

impl VolumeSource for HostVolumes {
    fn mounted_volumes(&self) -> Result<Vec<VolumeInfo>, DiscoveryError> {
        platform::enumerate_volumes()
    }
}

/// A caller-supplied, fixed list of volumes.
#[derive(Debug, Default, Clone)]
pub struct FixedVolumes(pub Vec<VolumeInfo>);

impl VolumeSource for FixedVolumes {
    fn mounted_volumes(&self) -> Result<Vec<VolumeInfo>, DiscoveryError> {
        Ok(self.0.clone())
    }
}

/// A model shared across threads. Readers take the read lock; a rescan holds
/// the write lock from `ResetBegun` to `ResetEnded`.
pub type SharedTreeModel = Arc<RwLock<TreeModel>>;

/// Rescan a [`SharedTreeModel`] under its write lock.
pub fn rescan_shared(model: &SharedTreeModel) -> usize {
    model.write().load_devices()
}

/// Owns the device tree and exposes it to a view.
pub struct TreeModel {
    tree: DeviceTree,
    roles: BTreeMap<Role, &'static str>,
    source: Box<dyn VolumeSource>,
    config: DiscoveryConfig,
    subscribers: Vec<Sender<ModelEvent>>,
}

impl TreeModel {
    /// A model over the host's mounted volumes with the default Garmin layout.
    pub fn new() -> Self {
        Self::with_source(Box::new(HostVolumes), DiscoveryConfig::default())
    }

    pub fn with_source(source: Box<dyn VolumeSource>, config: DiscoveryConfig) -> Self {
        let roles = [Role::Name, Role::FullPath]
            .into_iter()
            .map(|role| (role, role.key()))
            .collect();
        Self {
            tree: DeviceTree::new("name", "/"),
            roles,
            source,
            config,
            subscribers: Vec::new(),
        }
    }

    /// Register for reset notifications. Subscribe before triggering a
    /// rescan. Dropping the receiver unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<ModelEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Read-only access to the underlying tree.
    pub fn tree(&self) -> &DeviceTree {
        &self.tree
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    // ── Discovery ──────────────────────────────────────────────────────────

    /// Rediscover devices and rebuild the tree. Returns the device count.
    ///
    /// Discovery runs to completion before the old tree is touched, so the
    /// previous devices stay in place until the replacement is ready.
    pub fn load_devices(&mut self) -> usize {
        self.notify(ModelEvent::ResetBegun);

        let volumes = self.source.mounted_volumes().unwrap_or_else(|err| {
            warn!("Volume enumeration failed, treating as no volumes: {err}");
            Vec::new()
        });
        let devices = discovery::discover(&volumes, &self.config);

        self.tree.reset(NodeId::ROOT);
        for device in &devices {
            self.add_device(device);
        }

        let count = self.tree.child_count(NodeId::ROOT);
        info!(
            "Rescan complete: {} volumes, {count} devices with tracks",
            volumes.len()
        );
        debug!("Device tree:\n{}", self.tree.dump(NodeId::ROOT));

        self.notify(ModelEvent::ResetEnded { devices: count });
        count
    }

    /// Replace the tree with a fixed two-device sample for view debugging.
    pub fn load_test_data(&mut self) {
        let sample = [
            DiscoveredDevice {
                label: "GPSMap".into(),
                folder: "/GPSMap".into(),
                tracks: vec![discovery::DiscoveredTrack {
                    name: "Weser".into(),
                    path: "/Edge/Garmin/GPX/Weser.GPX".into(),
                }],
            },
            DiscoveredDevice {
                label: "Edge".into(),
                folder: "/Edge".into(),
                tracks: vec![discovery::DiscoveredTrack {
                    name: "Leine".into(),
                    path: "/Edge/Garmin/GPX/Leine.GPX".into(),
                }],
            },
        ];

        self.notify(ModelEvent::ResetBegun);
        self.tree.reset(NodeId::ROOT);
        for device in &sample {
            self.add_device(device);
        }
        self.dump_tree();
        self.notify(ModelEvent::ResetEnded {
            devices: sample.len(),
        });
    }

    /// Log the whole tree at `debug`.
    pub fn dump_tree(&self) {
        debug!("Device tree:\n{}", self.tree.dump(NodeId::ROOT));
    }

    fn add_device(&mut self, device: &DiscoveredDevice) {
        if device.tracks.is_empty() {
            return;
        }
        let built = self
            .tree
            .add_child(NodeId::ROOT, &device.label, &device.folder)
            .and_then(|node| {
                device.tracks.iter().try_for_each(|track| {
                    self.tree.add_child(node, &track.name, &track.path).map(|_| ())
                })
            });
        if let Err(err) = built {
            warn!("Dropping device {}: {err}", device.label);
        }
    }

    fn notify(&mut self, event: ModelEvent) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }

    // ── Traversal contract ─────────────────────────────────────────────────

    /// Handle for the `row`-th child of `parent` (top level if `parent` is
    /// invalid). Invalid if `column != 0` or `row` is out of range.
    pub fn index(&self, row: usize, column: usize, parent: &ModelIndex) -> ModelIndex {
        if column != 0 {
            return ModelIndex::invalid();
        }
        let Some(parent_node) = self.resolve_parent(parent) else {
            return ModelIndex::invalid();
        };
        match self.tree.child(parent_node, row) {
            Some(child) => ModelIndex::new(row, column, child, self.tree.generation()),
            None => ModelIndex::invalid(),
        }
    }

    /// Handle of `child`'s parent. Invalid for top-level nodes, since the
    /// root is not addressable.
    pub fn parent(&self, child: &ModelIndex) -> ModelIndex {
        let Some(node) = self.resolve(child) else {
            return ModelIndex::invalid();
        };
        match self.tree.parent(node) {
            Some(parent) if parent != NodeId::ROOT => {
                ModelIndex::new(self.tree.row(parent), 0, parent, self.tree.generation())
            }
            _ => ModelIndex::invalid(),
        }
    }

    /// Number of children under `parent` (the root if `parent` is invalid).
    pub fn row_count(&self, parent: &ModelIndex) -> usize {
        if parent.column() > 0 {
            return 0;
        }
        self.resolve_parent(parent)
            .map_or(0, |node| self.tree.child_count(node))
    }

    pub fn column_count(&self, _parent: &ModelIndex) -> usize {
        1
    }

    /// The node's name for [`Role::Name`]; `None` for any other role or an
    /// invalid handle.
    pub fn data(&self, index: &ModelIndex, role: Role) -> Option<&str> {
        if role != Role::Name {
            return None;
        }
        self.tree.node(self.resolve(index)?).map(|node| node.name())
    }

    /// [`data`](Self::data) keyed by the numeric role id a view passes
    /// around (see [`Role::id`]). Unknown ids yield `None`.
    pub fn data_by_id(&self, index: &ModelIndex, role_id: i32) -> Option<&str> {
        Role::from_id(role_id).and_then(|role| self.data(index, role))
    }

    pub fn role_names(&self) -> &BTreeMap<Role, &'static str> {
        &self.roles
    }

    /// Full path of the selected track file. `None` when the handle addresses
    /// a device folder or is invalid.
    pub fn path_from_index(&self, index: &ModelIndex) -> Option<&Path> {
        if !self.parent(index).is_valid() {
            return None;
        }
        self.tree
            .node(self.resolve(index)?)
            .map(|node| node.full_path())
    }

    /// The node behind a valid, current handle.
    fn resolve(&self, index: &ModelIndex) -> Option<NodeId> {
        if index.generation() != self.tree.generation() {
            return None;
        }
        index.node().filter(|&id| self.tree.node(id).is_some())
    }

    /// Like [`resolve`](Self::resolve) but an invalid handle means the root.
    /// A stale handle still resolves to nothing.
    fn resolve_parent(&self, parent: &ModelIndex) -> Option<NodeId> {
        if parent.is_valid() {
            self.resolve(parent)
        } else {
            Some(NodeId::ROOT)
        }
    }
}

impl Default for TreeModel {
    fn default() -> Self {
        Self::new()
    }
}
