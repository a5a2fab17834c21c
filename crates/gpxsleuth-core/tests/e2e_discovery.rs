/// End-to-end discovery tests.
///
/// These build real directory trees in temporary folders, present them to
/// the model as mounted volumes through `FixedVolumes`, and then inspect the
/// result only through the traversal contract a view would use.
use gpxsleuth_core::platform::VolumeInfo;
use gpxsleuth_core::{DiscoveryConfig, FixedVolumes, ModelEvent, ModelIndex, Role, TreeModel};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"<gpx/>").unwrap();
}

fn volume(root: &Path, label: &str) -> VolumeInfo {
    VolumeInfo {
        root: root.to_path_buf(),
        label: label.to_string(),
        filesystem: "vfat".to_string(),
    }
}

fn model_over(volumes: Vec<VolumeInfo>) -> TreeModel {
    TreeModel::with_source(Box::new(FixedVolumes(volumes)), DiscoveryConfig::default())
}

fn top() -> ModelIndex {
    ModelIndex::invalid()
}

/// Names of the children under `parent`, in row order.
fn names(model: &TreeModel, parent: &ModelIndex) -> Vec<String> {
    (0..model.row_count(parent))
        .map(|row| {
            let index = model.index(row, 0, parent);
            model.data(&index, Role::Name).unwrap().to_string()
        })
        .collect()
}

/// Every valid handle in the model, depth first.
fn all_handles(model: &TreeModel) -> Vec<ModelIndex> {
    let mut out = Vec::new();
    let mut stack = vec![top()];
    while let Some(parent) = stack.pop() {
        for row in 0..model.row_count(&parent) {
            let index = model.index(row, 0, &parent);
            assert!(index.is_valid());
            out.push(index);
            stack.push(index);
        }
    }
    out
}

// ── Scenarios ─────────────────────────────────────────────────────────────────

/// `Edge/Garmin/GPX` with two tracks of mixed extension case yields one
/// device with two files.
#[test]
fn edge_volume_with_two_tracks() {
    let tmp = TempDir::new().unwrap();
    let edge = tmp.path().join("Edge");
    touch(&edge.join("Garmin/GPX/Weser.gpx"));
    touch(&edge.join("Garmin/GPX/Leine.GPX"));

    let mut model = model_over(vec![volume(&edge, "Edge")]);
    assert_eq!(model.load_devices(), 1);

    assert_eq!(names(&model, &top()), ["Edge"]);
    let device = model.index(0, 0, &top());
    let device_node = model.tree().child(model.tree().root(), 0).unwrap();
    assert_eq!(
        model.tree().node(device_node).unwrap().full_path(),
        edge.join("Garmin/GPX")
    );

    // Sorted listing order: "Leine.GPX" < "Weser.gpx".
    assert_eq!(names(&model, &device), ["Leine", "Weser"]);
    let paths: Vec<PathBuf> = (0..2)
        .map(|row| {
            let track = model.index(row, 0, &device);
            model.path_from_index(&track).unwrap().to_path_buf()
        })
        .collect();
    assert_eq!(
        paths,
        [
            edge.join("Garmin/GPX/Leine.GPX"),
            edge.join("Garmin/GPX/Weser.gpx")
        ]
    );
}

/// A `Garmin` folder without a `GPX` subfolder contributes nothing.
#[test]
fn garmin_folder_without_gpx_subfolder_is_skipped() {
    let tmp = TempDir::new().unwrap();
    touch(&tmp.path().join("Garmin/Activities/run.fit"));

    let mut model = model_over(vec![volume(tmp.path(), "Forerunner")]);
    assert_eq!(model.load_devices(), 0);
    assert_eq!(model.row_count(&top()), 0);
}

/// A `Garmin/GPX` folder holding only non-track files contributes nothing.
#[test]
fn gpx_folder_without_tracks_is_skipped() {
    let tmp = TempDir::new().unwrap();
    touch(&tmp.path().join("Garmin/GPX/readme.txt"));
    touch(&tmp.path().join("Garmin/GPX/Archive/old.gpx"));

    let mut model = model_over(vec![volume(tmp.path(), "Oregon")]);
    assert_eq!(model.load_devices(), 0);
}

/// macOS AppleDouble companions (`._*`) and other dot-files never become
/// tracks, and a folder holding only such files is not a device.
#[test]
fn hidden_files_are_not_tracks() {
    let tmp = TempDir::new().unwrap();
    let edge = tmp.path().join("edge");
    let junk = tmp.path().join("junk");
    touch(&edge.join("Garmin/GPX/Weser.gpx"));
    touch(&edge.join("Garmin/GPX/._Weser.gpx"));
    touch(&junk.join("Garmin/GPX/._Leine.gpx"));

    let mut model = model_over(vec![volume(&edge, "Edge"), volume(&junk, "Junk")]);
    assert_eq!(model.load_devices(), 1);

    assert_eq!(names(&model, &top()), ["Edge"]);
    let device = model.index(0, 0, &top());
    assert_eq!(names(&model, &device), ["Weser"]);
}

/// Tracks nested deeper than the convention folder are not picked up, and
/// the convention folder itself must sit at the volume's top level.
#[test]
fn no_recursion_beyond_two_levels() {
    let tmp = TempDir::new().unwrap();
    touch(&tmp.path().join("Backup/Garmin/GPX/deep.gpx"));

    let mut model = model_over(vec![volume(tmp.path(), "Disk")]);
    assert_eq!(model.load_devices(), 0);
}

// ── Properties ────────────────────────────────────────────────────────────────

/// Folder names match in any case; extensions match in any case.
#[test]
fn case_insensitive_matching() {
    let tmp = TempDir::new().unwrap();
    let spellings = ["Garmin", "GARMIN", "garmin"];
    let volumes: Vec<VolumeInfo> = spellings
        .iter()
        .enumerate()
        .map(|(i, spelling)| {
            let root = tmp.path().join(format!("vol{i}"));
            touch(&root.join(spelling).join("gPx").join("track.GPX"));
            volume(&root, spelling)
        })
        .collect();

    let mut model = model_over(volumes);
    assert_eq!(model.load_devices(), 3);
    assert_eq!(names(&model, &top()), spellings);
    for row in 0..3 {
        let device = model.index(row, 0, &top());
        assert_eq!(names(&model, &device), ["track"]);
    }
}

/// Only volumes with tracks appear, and no device is ever empty.
#[test]
fn devices_appear_only_with_tracks() {
    let tmp = TempDir::new().unwrap();
    let with = tmp.path().join("with");
    let empty = tmp.path().join("empty");
    let bare = tmp.path().join("bare");
    touch(&with.join("Garmin/GPX/a.gpx"));
    fs::create_dir_all(empty.join("Garmin/GPX")).unwrap();
    fs::create_dir_all(&bare).unwrap();
    let missing = tmp.path().join("unmounted");

    let mut model = model_over(vec![
        volume(&empty, "Empty"),
        volume(&with, "With"),
        volume(&bare, "Bare"),
        volume(&missing, "Gone"),
    ]);
    model.load_devices();

    assert_eq!(names(&model, &top()), ["With"]);
    for row in 0..model.row_count(&top()) {
        let device = model.index(row, 0, &top());
        assert!(model.row_count(&device) > 0);
    }
}

/// Every handle's row points back at itself, and `parent` inverts `index`.
#[test]
fn row_and_parent_round_trip() {
    let tmp = TempDir::new().unwrap();
    let a = tmp.path().join("a");
    let b = tmp.path().join("b");
    touch(&a.join("Garmin/GPX/one.gpx"));
    touch(&a.join("Garmin/GPX/two.gpx"));
    touch(&b.join("Garmin/GPX/three.gpx"));

    let mut model = model_over(vec![volume(&a, "A"), volume(&b, "B")]);
    model.load_devices();

    let handles = all_handles(&model);
    assert_eq!(handles.len(), 5);
    for handle in handles {
        let parent = model.parent(&handle);
        assert!(handle.row() < model.row_count(&parent));
        assert_eq!(model.index(handle.row(), 0, &parent), handle);
        assert_eq!(model.parent(&model.index(handle.row(), 0, &parent)), parent);
    }
}

/// Paths come back only for file nodes.
#[test]
fn path_extraction_only_for_tracks() {
    let tmp = TempDir::new().unwrap();
    touch(&tmp.path().join("Garmin/GPX/Weser.gpx"));

    let mut model = model_over(vec![volume(tmp.path(), "Edge")]);
    model.load_devices();

    for handle in all_handles(&model) {
        let is_track = model.parent(&handle).is_valid();
        assert_eq!(model.path_from_index(&handle).is_some(), is_track);
    }
    assert_eq!(model.path_from_index(&top()), None);
}

/// Rescans replace the tree and announce themselves to subscribers.
#[test]
fn rescan_replaces_tree_and_notifies() {
    let tmp = TempDir::new().unwrap();
    touch(&tmp.path().join("Garmin/GPX/Weser.gpx"));

    let mut model = model_over(vec![volume(tmp.path(), "Edge")]);
    let events = model.subscribe();

    model.load_devices();
    let stale = model.index(0, 0, &top());
    touch(&tmp.path().join("Garmin/GPX/Aller.gpx"));
    model.load_devices();

    let device = model.index(0, 0, &top());
    assert_eq!(names(&model, &device), ["Aller", "Weser"]);
    assert_eq!(model.data(&stale, Role::Name), None);
    assert_eq!(model.tree().node_count(), 4);

    let received: Vec<ModelEvent> = events.try_iter().collect();
    assert_eq!(
        received,
        [
            ModelEvent::ResetBegun,
            ModelEvent::ResetEnded { devices: 1 },
            ModelEvent::ResetBegun,
            ModelEvent::ResetEnded { devices: 1 },
        ]
    );

    fs::remove_dir_all(tmp.path().join("Garmin")).unwrap();
    assert_eq!(model.load_devices(), 0);
    assert_eq!(model.tree().node_count(), 1);
}
