/// Mounted-volume enumeration.
///
/// Lists every real filesystem currently mounted on the host with its root
/// path and a display label. Pseudo filesystems and system mount points are
/// left out on Linux; on Windows network drives are skipped.
use crate::error::DiscoveryError;
use std::path::PathBuf;

/// A mounted volume as seen by discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeInfo {
    /// Mount point, e.g. `/Volumes/Edge`, `/media/me/GARMIN`, `E:\`.
    pub root: PathBuf,
    /// Human-readable volume label.
    pub label: String,
    /// Filesystem name (e.g. "vfat", "NTFS"). Empty when unknown.
    pub filesystem: String,
}

/// Enumerate mounted volumes on this host.
pub fn enumerate_volumes() -> Result<Vec<VolumeInfo>, DiscoveryError> {
    imp::enumerate_volumes()
}

#[cfg(target_os = "linux")]
mod imp {
    use super::VolumeInfo;
    use crate::error::DiscoveryError;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    const MOUNT_TABLE: &str = "/proc/self/mounts";

    /// Filesystem types that never hold user files.
    const PSEUDO_FS_TYPES: &[&str] = &[
        "proc", "sysfs", "devtmpfs", "tmpfs", "cgroup", "cgroup2", "overlay", "squashfs",
        "devpts", "securityfs", "pstore", "efivarfs", "bpf", "autofs", "mqueue", "hugetlbfs",
        "debugfs", "tracefs", "fusectl", "configfs", "ramfs", "rpc_pipefs", "nfsd", "nsfs",
        "binfmt_misc", "fuse.portal", "fuse.gvfsd-fuse",
    ];

    pub(super) fn enumerate_volumes() -> Result<Vec<VolumeInfo>, DiscoveryError> {
        let table = std::fs::read_to_string(MOUNT_TABLE).map_err(|source| {
            DiscoveryError::MountTable {
                path: PathBuf::from(MOUNT_TABLE),
                source,
            }
        })?;
        let labels = label_map();
        let volumes = parse_mount_table(&table, |device, mount_point| {
            resolve_label(device, mount_point, &labels)
        });
        tracing::debug!("Detected {} mounted volumes", volumes.len());
        Ok(volumes)
    }

    /// Parse `/proc/mounts` syntax into volumes, labelling each with `label_for`.
    pub(super) fn parse_mount_table(
        table: &str,
        label_for: impl Fn(&str, &str) -> String,
    ) -> Vec<VolumeInfo> {
        let mut volumes: Vec<VolumeInfo> = Vec::new();
        for line in table.lines() {
            let mut fields = line.split_whitespace();
            let (Some(device), Some(mount_point), Some(fs_type)) =
                (fields.next(), fields.next(), fields.next())
            else {
                continue;
            };
            if PSEUDO_FS_TYPES.contains(&fs_type) {
                continue;
            }

            let mount_point = unescape_octal(mount_point);
            if is_system_mount_point(&mount_point) {
                continue;
            }
            // Bind mounts can list the same point twice.
            if volumes.iter().any(|v| v.root == Path::new(&mount_point)) {
                continue;
            }

            let device = unescape_octal(device);
            volumes.push(VolumeInfo {
                label: label_for(&device, &mount_point),
                root: PathBuf::from(mount_point),
                filesystem: fs_type.to_string(),
            });
        }
        volumes
    }

    fn is_system_mount_point(mount_point: &str) -> bool {
        let under = |prefix: &str| {
            mount_point == prefix || mount_point.starts_with(&format!("{prefix}/"))
        };
        if under("/proc") || under("/sys") || under("/dev") {
            return true;
        }
        under("/run") && !under("/run/media")
    }

    /// Map canonical device paths to labels from `/dev/disk/by-label`.
    fn label_map() -> HashMap<PathBuf, String> {
        let mut map = HashMap::new();
        let Ok(entries) = std::fs::read_dir("/dev/disk/by-label") else {
            return map;
        };
        for entry in entries.flatten() {
            if let Ok(device) = std::fs::canonicalize(entry.path()) {
                let label = unescape_hex(&entry.file_name().to_string_lossy());
                map.insert(device, label);
            }
        }
        map
    }

    /// Label priority: filesystem label, then mount point base name.
    fn resolve_label(device: &str, mount_point: &str, labels: &HashMap<PathBuf, String>) -> String {
        if let Some(label) = std::fs::canonicalize(device)
            .ok()
            .and_then(|canonical| labels.get(&canonical))
        {
            return label.clone();
        }
        fallback_label(mount_point)
    }

    pub(super) fn fallback_label(mount_point: &str) -> String {
        match Path::new(mount_point).file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => "System".to_string(),
        }
    }

    /// Decode the `\ooo` octal escapes the kernel uses for spaces, tabs and
    /// backslashes in mount table fields.
    pub(super) fn unescape_octal(field: &str) -> String {
        decode_escapes(field, |s| {
            let digits = s.get(..3)?;
            if !digits.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
                return None;
            }
            Some((u8::from_str_radix(digits, 8).ok()?, 3))
        })
    }

    /// Decode the `\xHH` escapes udev uses in `/dev/disk/by-label` names.
    pub(super) fn unescape_hex(name: &str) -> String {
        decode_escapes(name, |s| {
            let digits = s.strip_prefix('x')?.get(..2)?;
            Some((u8::from_str_radix(digits, 16).ok()?, 3))
        })
    }

    /// Replace each `\` escape that `decode` understands with its byte.
    /// `decode` receives the text after the backslash and returns the byte
    /// and how many characters it consumed.
    fn decode_escapes(input: &str, decode: impl Fn(&str) -> Option<(u8, usize)>) -> String {
        let mut bytes = Vec::with_capacity(input.len());
        let mut rest = input;
        while let Some(pos) = rest.find('\\') {
            bytes.extend_from_slice(rest[..pos].as_bytes());
            let after = &rest[pos + 1..];
            match decode(after) {
                Some((byte, consumed)) => {
                    bytes.push(byte);
                    rest = &after[consumed..];
                }
                None => {
                    bytes.push(b'\\');
                    rest = after;
                }
            }
        }
        bytes.extend_from_slice(rest.as_bytes());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

#[cfg(target_os = "macos")]
mod imp {
    use super::VolumeInfo;
    use crate::error::DiscoveryError;
    use std::path::PathBuf;

    /// The boot volume plus everything mounted under `/Volumes`.
    pub(super) fn enumerate_volumes() -> Result<Vec<VolumeInfo>, DiscoveryError> {
        let mut volumes = vec![VolumeInfo {
            root: PathBuf::from("/"),
            label: "System".to_string(),
            filesystem: String::new(),
        }];

        let entries = std::fs::read_dir("/Volumes").map_err(|source| DiscoveryError::MountTable {
            path: PathBuf::from("/Volumes"),
            source,
        })?;
        let mut mounted: Vec<VolumeInfo> = entries
            .flatten()
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
            .map(|entry| VolumeInfo {
                label: entry.file_name().to_string_lossy().into_owned(),
                root: entry.path(),
                filesystem: String::new(),
            })
            .collect();
        mounted.sort_by(|a, b| a.root.cmp(&b.root));
        volumes.extend(mounted);

        tracing::debug!("Detected {} mounted volumes", volumes.len());
        Ok(volumes)
    }
}

#[cfg(windows)]
mod imp {
    use super::VolumeInfo;
    use crate::error::DiscoveryError;
    use std::ffi::OsString;
    use std::os::windows::ffi::OsStringExt;
    use std::path::PathBuf;
    use windows::Win32::Storage::FileSystem::{
        GetDriveTypeW, GetLogicalDriveStringsW, GetVolumeInformationW,
    };

    // Drive type constant from the Windows API.
    const DRIVE_REMOTE_VAL: u32 = 4;

    /// Enumerate local drives via `GetLogicalDriveStringsW`.
    pub(super) fn enumerate_volumes() -> Result<Vec<VolumeInfo>, DiscoveryError> {
        let mut volumes = Vec::new();

        // GetLogicalDriveStringsW returns null-separated drive root strings.
        let mut buffer = [0u16; 256];
        let len = unsafe { GetLogicalDriveStringsW(Some(&mut buffer)) };
        if len == 0 {
            return Err(DiscoveryError::Platform(
                "GetLogicalDriveStringsW returned 0".to_string(),
            ));
        }

        let full = OsString::from_wide(&buffer[..len as usize]);
        let full_str = full.to_string_lossy();

        for root in full_str.split('\0').filter(|s| !s.is_empty()) {
            let root_wide: Vec<u16> = root.encode_utf16().chain(std::iter::once(0)).collect();
            let root_pcwstr = windows::core::PCWSTR(root_wide.as_ptr());

            if unsafe { GetDriveTypeW(root_pcwstr) } == DRIVE_REMOTE_VAL {
                continue;
            }

            let mut label_buf = [0u16; 256];
            let mut fs_buf = [0u16; 256];
            let has_volume_info = unsafe {
                GetVolumeInformationW(
                    root_pcwstr,
                    Some(&mut label_buf),
                    None,
                    None,
                    None,
                    Some(&mut fs_buf),
                )
                .is_ok()
            };
            let (label, filesystem) = if has_volume_info {
                (wide_to_string(&label_buf), wide_to_string(&fs_buf))
            } else {
                (String::new(), String::new())
            };

            let label = if label.is_empty() {
                root.trim_end_matches('\\').to_string()
            } else {
                label
            };

            volumes.push(VolumeInfo {
                root: PathBuf::from(root),
                label,
                filesystem,
            });
        }

        tracing::debug!("Detected {} mounted volumes", volumes.len());
        Ok(volumes)
    }

    fn wide_to_string(buf: &[u16]) -> String {
        let end = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
        String::from_utf16_lossy(&buf[..end])
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos", windows)))]
mod imp {
    use super::VolumeInfo;
    use crate::error::DiscoveryError;

    pub(super) fn enumerate_volumes() -> Result<Vec<VolumeInfo>, DiscoveryError> {
        Ok(Vec::new())
    }
}
