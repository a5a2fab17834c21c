//! GpxSleuth: finds Garmin/GPX track folders on mounted volumes.
//!
//! Thin binary entry point. All logic lives in the `gpxsleuth-core` crate.
//! Runs one rescan and prints the resulting device tree by walking the
//! model's traversal contract, the same way a view would.
//!
//! Usage: `gpxsleuth [config.json]`

use gpxsleuth_core::{DiscoveryConfig, HostVolumes, ModelIndex, Role, TreeModel};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("GpxSleuth starting");

    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => DiscoveryConfig::load(&path)?,
        None => DiscoveryConfig::default(),
    };

    let mut model = TreeModel::with_source(Box::new(HostVolumes), config);
    let events = model.subscribe();
    model.load_devices();
    for event in events.try_iter() {
        tracing::debug!("Model event: {event:?}");
    }

    let top = ModelIndex::invalid();
    for row in 0..model.row_count(&top) {
        let device = model.index(row, 0, &top);
        println!("{}", model.data(&device, Role::Name).unwrap_or_default());
        for track_row in 0..model.row_count(&device) {
            let track = model.index(track_row, 0, &device);
            if let Some(path) = model.path_from_index(&track) {
                println!("  {}", path.display());
            }
        }
    }

    Ok(())
}
