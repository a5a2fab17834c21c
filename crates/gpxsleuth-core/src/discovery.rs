/// Device discovery: volume → convention folder → track files.
///
/// For every mounted volume this looks for `<root>/<device_folder>/<track_folder>`
/// (case-insensitive at both levels) and collects the files inside it whose
/// extension matches `track_extension`. Nothing below the two fixed levels is
/// explored.
///
/// Listings go through `jwalk` restricted to a single level, run serially on
/// the calling thread, sorted by file name, and never follow links. Hidden
/// entries (dot-prefixed names, plus the hidden attribute on Windows) are
/// skipped at every level, which keeps macOS `._*` AppleDouble files off
/// the tree. Sorting
/// makes the choice between case-variant duplicates (`Garmin` vs `garmin`)
/// deterministic: the first pair in sorted order that yields a track wins.
///
/// Unreadable locations are logged at `debug` and treated as absent.
use crate::config::DiscoveryConfig;
use crate::error::DiscoveryError;
use crate::platform::VolumeInfo;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A track file found inside a device's track folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredTrack {
    /// File name up to its first `.`.
    pub name: String,
    pub path: PathBuf,
}

/// A volume that carries at least one track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    /// Display label of the volume.
    pub label: String,
    /// Absolute path of the matched track folder.
    pub folder: PathBuf,
    /// Never empty.
    pub tracks: Vec<DiscoveredTrack>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Dir,
    File,
}

/// Run discovery over `volumes`, preserving their order.
pub fn discover(volumes: &[VolumeInfo], config: &DiscoveryConfig) -> Vec<DiscoveredDevice> {
    volumes
        .iter()
        .filter_map(|volume| discover_volume(volume, config))
        .collect()
}

/// Find the track folder on a single volume. `None` if the volume has no
/// convention folder or the folder holds no tracks.
pub fn discover_volume(volume: &VolumeInfo, config: &DiscoveryConfig) -> Option<DiscoveredDevice> {
    for device_dir in matching_dirs(&volume.root, &config.device_folder) {
        for track_dir in matching_dirs(&device_dir, &config.track_folder) {
            let tracks = track_files(&track_dir, &config.track_extension);
            if !tracks.is_empty() {
                return Some(DiscoveredDevice {
                    label: volume.label.clone(),
                    folder: track_dir,
                    tracks,
                });
            }
            debug!("No tracks in {}", track_dir.display());
        }
    }
    None
}

/// Regular files in `folder` whose extension matches `extension`, in sorted
/// name order. Symlinks are skipped.
pub fn track_files(folder: &Path, extension: &str) -> Vec<DiscoveredTrack> {
    list_entries(folder, EntryKind::File)
        .into_iter()
        .filter(|(name, _)| has_extension(name, extension))
        .map(|(name, path)| DiscoveredTrack {
            name: base_name(&name).to_string(),
            path,
        })
        .collect()
}

/// Subdirectories of `dir` whose name equals `wanted` ignoring ASCII case.
fn matching_dirs(dir: &Path, wanted: &str) -> Vec<PathBuf> {
    list_entries(dir, EntryKind::Dir)
        .into_iter()
        .filter(|(name, _)| name.eq_ignore_ascii_case(wanted))
        .map(|(_, path)| path)
        .collect()
}

/// Like [`read_level`], but an unreadable directory yields an empty listing.
fn list_entries(dir: &Path, kind: EntryKind) -> Vec<(String, PathBuf)> {
    read_level(dir, kind).unwrap_or_else(|err| {
        debug!("Skipping: {err}");
        Vec::new()
    })
}

/// One level of `dir`, filtered to `kind`, sorted by name. Symlinks and
/// hidden entries are never reported as either kind.
fn read_level(dir: &Path, kind: EntryKind) -> Result<Vec<(String, PathBuf)>, DiscoveryError> {
    if !dir.is_dir() {
        return Err(DiscoveryError::Listing {
            path: dir.to_path_buf(),
            message: "not a directory".into(),
        });
    }

    let walker = jwalk::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .skip_hidden(false)
        .follow_links(false)
        .sort(true)
        .parallelism(jwalk::Parallelism::Serial);

    let mut entries = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|err| DiscoveryError::Listing {
            path: dir.to_path_buf(),
            message: err.to_string(),
        })?;
        let file_type = entry.file_type();
        let wanted = match kind {
            EntryKind::Dir => file_type.is_dir(),
            EntryKind::File => file_type.is_file(),
        };
        if !wanted || file_type.is_symlink() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || has_hidden_attribute(&entry) {
            continue;
        }
        entries.push((name, entry.path()));
    }
    Ok(entries)
}

#[cfg(windows)]
fn has_hidden_attribute(entry: &jwalk::DirEntry<((), ())>) -> bool {
    use std::os::windows::fs::MetadataExt;
    use windows::Win32::Storage::FileSystem::FILE_ATTRIBUTE_HIDDEN;
    entry
        .metadata()
        .is_ok_and(|meta| meta.file_attributes() & FILE_ATTRIBUTE_HIDDEN.0 != 0)
}

#[cfg(not(windows))]
fn has_hidden_attribute(_entry: &jwalk::DirEntry<((), ())>) -> bool {
    false
}

/// Text after the last `.` equals `extension`, ignoring ASCII case.
fn has_extension(file_name: &str, extension: &str) -> bool {
    file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(extension))
}

/// File name up to its first `.`, so `Weser.2020.gpx` becomes `Weser`.
fn base_name(file_name: &str) -> &str {
    file_name
        .split_once('.')
        .map_or(file_name, |(base, _)| base)
}
