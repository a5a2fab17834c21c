/// GpxSleuth Core: device discovery and the device tree model.
///
/// This crate contains all business logic with zero UI dependencies. A view
/// layer drives it through [`tree_model::TreeModel`]'s traversal contract.
///
/// # Modules
///
/// - [`model`]: Arena-allocated device tree, node ids and view handles.
/// - [`discovery`]: Volume → `Garmin/GPX` folder → track file discovery.
/// - [`tree_model`]: Rescan orchestration, reset notifications, traversal.
/// - [`platform`]: Mounted-volume enumeration per OS.
/// - [`config`]: Folder convention and track extension settings.
/// - [`error`]: Error types.
pub mod config;
pub mod discovery;
pub mod error;
pub mod model;
pub mod platform;
pub mod tree_model;

pub use config::DiscoveryConfig;
pub use model::{ModelIndex, Role};
pub use tree_model::{
    rescan_shared, FixedVolumes, HostVolumes, ModelEvent, SharedTreeModel, TreeModel, VolumeSource,
};
