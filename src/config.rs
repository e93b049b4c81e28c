//! Run configuration, loadable from YAML.

use std::fs;
use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::identity::RegistryConfig;
use crate::integration::SamplingPolicy;
use crate::tracker::{EvictionPolicy, TrackerConfig, Zone};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OccupancyConfig {
    /// Frame width in pixels, used to derive the zone
    pub frame_width: u32,
    /// Frame height in pixels, used to derive the zone
    pub frame_height: u32,
    /// The zone leaves `1/margin_divisor` of each dimension free on every side
    pub margin_divisor: u32,
    /// Process every n-th received frame
    pub sample_every: u32,
    /// Maximum feature distance for recognising a stored identity
    pub match_threshold: f32,
    /// Maximum feature distance for treating an unknown face as already seen
    pub duplicate_threshold: f32,
    /// Evict tracks idle this long, forcing an Exit. `None` keeps them forever.
    pub idle_timeout_secs: Option<f64>,
    /// Run feature extraction on a background worker
    pub offload_extraction: bool,
}

impl Default for OccupancyConfig {
    fn default() -> Self {
        Self {
            frame_width: 1020,
            frame_height: 600,
            margin_divisor: 6,
            sample_every: 1,
            match_threshold: 0.6,
            duplicate_threshold: 0.6,
            idle_timeout_secs: None,
            offload_extraction: false,
        }
    }
}

impl OccupancyConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: OccupancyConfig =
            serde_yaml::from_str(&contents).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "frame dimensions must be positive, got {}x{}",
                self.frame_width, self.frame_height
            )));
        }
        if self.margin_divisor < 3 {
            return Err(ConfigError::Invalid(format!(
                "margin_divisor must be at least 3, got {}",
                self.margin_divisor
            )));
        }
        if self.sample_every == 0 {
            return Err(ConfigError::Invalid("sample_every must be at least 1".into()));
        }
        for (name, value) in [
            ("match_threshold", self.match_threshold),
            ("duplicate_threshold", self.duplicate_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if let Some(secs) = self.idle_timeout_secs {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "idle_timeout_secs must be positive, got {secs}"
                )));
            }
        }
        Ok(())
    }

    pub fn zone(&self) -> Zone {
        Zone::from_frame(self.frame_width, self.frame_height, self.margin_divisor)
    }

    pub fn sampling(&self) -> SamplingPolicy {
        SamplingPolicy::every(self.sample_every)
    }

    pub fn eviction(&self) -> EvictionPolicy {
        match self.idle_timeout_secs {
            Some(secs) => EvictionPolicy::IdleTimeout(Duration::milliseconds((secs * 1000.0) as i64)),
            None => EvictionPolicy::Never,
        }
    }

    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            zone: self.zone(),
            eviction: self.eviction(),
        }
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            match_threshold: self.match_threshold,
            duplicate_threshold: self.duplicate_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_match_reference_geometry() {
        let cfg = OccupancyConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.zone(), Zone::new((170.0, 100.0), (850.0, 500.0)));
        assert_eq!(cfg.eviction(), EvictionPolicy::Never);
        assert_eq!(cfg.registry_config(), RegistryConfig::default());
    }

    #[test]
    fn test_load_reads_partial_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"sample_every: 3\nduplicate_threshold: 0.45\nidle_timeout_secs: 2.5\n")
            .unwrap();
        let cfg = OccupancyConfig::load(temp.path()).unwrap();
        assert_eq!(cfg.sample_every, 3);
        assert_eq!(cfg.match_threshold, 0.6);
        assert_eq!(cfg.registry_config().duplicate_threshold, 0.45);
        assert_eq!(
            cfg.eviction(),
            EvictionPolicy::IdleTimeout(Duration::milliseconds(2500))
        );
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"margin_divisor: 2\n").unwrap();
        assert!(matches!(
            OccupancyConfig::load(temp.path()),
            Err(ConfigError::Invalid(_))
        ));

        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"frame_width: [1, 2]\n").unwrap();
        assert!(matches!(
            OccupancyConfig::load(temp.path()),
            Err(ConfigError::Yaml { .. })
        ));
    }
}
