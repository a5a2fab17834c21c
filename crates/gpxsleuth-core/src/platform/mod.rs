/// Platform-specific functionality: mounted-volume enumeration.
pub mod volumes;

pub use volumes::{enumerate_volumes, VolumeInfo};
