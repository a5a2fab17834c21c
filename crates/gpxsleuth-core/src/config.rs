/// Discovery configuration: the folder convention and track extension.
///
/// Defaults match the Garmin layout (`<volume>/Garmin/GPX/*.gpx`). All
/// comparisons against these names ignore ASCII case only, so the case used
/// here does not matter for ASCII names. Non-ASCII letters must match
/// exactly (`Ä` does not match `ä`).
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Top-level folder on a volume, e.g. `Garmin`.
    pub device_folder: String,
    /// Subfolder of `device_folder` holding the tracks, e.g. `GPX`.
    pub track_folder: String,
    /// Track file extension without the dot.
    pub track_extension: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            device_folder: "garmin".into(),
            track_folder: "gpx".into(),
            track_extension: "gpx".into(),
        }
    }
}

impl DiscoveryConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("device_folder", &self.device_folder),
            ("track_folder", &self.track_folder),
            ("track_extension", &self.track_extension),
        ];
        match fields.into_iter().find(|(_, value)| value.trim().is_empty()) {
            Some((name, _)) => Err(ConfigError::EmptyField(name)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = DiscoveryConfig::from_json_str(r#"{ "track_extension": "fit" }"#).unwrap();
        assert_eq!(config.device_folder, "garmin");
        assert_eq!(config.track_folder, "gpx");
        assert_eq!(config.track_extension, "fit");
    }

    #[test]
    fn test_empty_field_rejected() {
        let err = DiscoveryConfig::from_json_str(r#"{ "track_folder": " " }"#).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyField("track_folder")));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            DiscoveryConfig::from_json_str("{ nope"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gpxsleuth.json");
        std::fs::write(&path, r#"{ "device_folder": "Wahoo" }"#).unwrap();

        let config = DiscoveryConfig::load(&path).unwrap();
        assert_eq!(config.device_folder, "Wahoo");

        let missing = DiscoveryConfig::load(&dir.path().join("absent.json"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
