//! # Configuration System
//!
//! YAML configuration for channel-link generation:
//!
//! - Scenario (deployment type, site layout, wrap-around, spatial consistency)
//! - Link registry options (fast fading, interferer small-scale parameters)
//! - Logging
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path specified via `GSCM_CONFIG` environment variable
//! 2. `./gscm.yaml` (current directory)
//! 3. `~/.config/gscm/config.yaml` (user config)
//! 4. `/etc/gscm/config.yaml` (system config)
//!
//! ## Example Configuration
//!
//! ```yaml
//! scenario:
//!   scenario: UMa
//!   inter_site_distance_m: 500.0
//!   num_sites: 7
//!   wrap_around: true
//!   spatial_consistency: true
//!   seed: 0
//!
//! registry:
//!   fast_fading: true
//!   interferer_small_scale: false
//!
//! logging:
//!   level: debug
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::observe::LogConfig;
use crate::scenario::{FactoryHall, Scenario};
use crate::types::{GscmError, Point2};

/// Error type for configuration operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("config not found: {0}")]
    NotFound(String),
    #[error("failed to read config: {0}")]
    ReadError(String),
    #[error("failed to parse config: {0}")]
    ParseError(String),
    #[error("invalid config: {0}")]
    ValidationError(String),
    #[error("wrap-around does not support {sites} sites with {sectors} sectors")]
    UnsupportedLayout { sites: usize, sectors: usize },
}

impl From<ConfigError> for GscmError {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::UnsupportedLayout { sites, sectors } => GscmError::UnsupportedLayout { sites, sectors },
            other => GscmError::Config(other.to_string()),
        }
    }
}

/// Bounding rectangle of the deployment area in metres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extents {
    pub min: Point2,
    pub max: Point2,
}

impl Extents {
    pub fn new(min: Point2, max: Point2) -> Self {
        Self { min, max }
    }

    pub fn is_empty(&self) -> bool {
        !(self.max[0] > self.min[0] && self.max[1] > self.min[1])
    }
}

/// Scenario configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Deployment scenario
    pub scenario: Scenario,
    /// Inter-site distance in metres (None for a free deployment)
    pub inter_site_distance_m: Option<f64>,
    /// Number of sites in the regular layout
    pub num_sites: usize,
    /// Sectors per site
    pub num_sectors: usize,
    /// Toroidal wrap-around of site positions
    pub wrap_around: bool,
    /// Spatially consistent randomness
    pub spatial_consistency: bool,
    /// Seed of every random stream in the scenario
    pub seed: u64,
    /// Deployment extents (inferred from the site layout when absent)
    pub extents: Option<Extents>,
    /// Indoor-factory hall and clutter
    pub factory_hall: FactoryHall,
    /// Absolute time of arrival for NLOS links
    pub absolute_delay: bool,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            scenario: Scenario::UMa,
            inter_site_distance_m: Some(500.0),
            num_sites: 7,
            num_sectors: 3,
            wrap_around: false,
            spatial_consistency: false,
            seed: 0,
            extents: None,
            factory_hall: FactoryHall::default(),
            absolute_delay: false,
        }
    }
}

/// Link registry configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Generate small-scale parameters
    pub fast_fading: bool,
    /// Generate small-scale parameters for same-role (interferer) links
    pub interferer_small_scale: bool,
    /// Sample rate of the path filters in Hz
    pub filter_sample_rate_hz: f64,
    /// Taps on each side of a path filter peak
    pub filter_half_length: usize,
    /// Force every BS–UE link to LOS (`true`) or NLOS (`false`)
    pub los_override: Option<bool>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            fast_fading: true,
            interferer_small_scale: false,
            filter_sample_rate_hz: 30.72e6,
            filter_half_length: 8,
            los_override: None,
        }
    }
}

/// Complete configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GscmConfig {
    /// Configuration version
    pub version: String,
    pub scenario: ScenarioConfig,
    pub registry: RegistryConfig,
    pub logging: LogConfig,
}

impl Default for GscmConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            scenario: ScenarioConfig::default(),
            registry: RegistryConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl GscmConfig {
    /// Load configuration from the default search path.
    ///
    /// Returns the default config if no file is found.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var("GSCM_CONFIG") {
            if Path::new(&path).exists() {
                return Self::load_from(Path::new(&path));
            }
        }

        for path in &Self::config_search_paths() {
            if path.exists() {
                return Self::load_from(path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        let config = Self::parse(&content)?;
        tracing::debug!(path = %path.display(), scenario = %config.scenario.scenario, "loaded configuration");
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))
    }

    /// Get configuration search paths.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./gscm.yaml")];

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "gscm") {
            paths.push(config_dir.config_dir().join("config.yaml"));
        }

        paths.push(PathBuf::from("/etc/gscm/config.yaml"));
        paths
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sc = &self.scenario;

        if let Some(isd) = sc.inter_site_distance_m {
            if !(isd.is_finite() && isd > 0.0) {
                return Err(ConfigError::ValidationError(
                    "inter_site_distance_m must be positive".to_string(),
                ));
            }
        }

        if sc.wrap_around {
            if sc.inter_site_distance_m.is_none() {
                return Err(ConfigError::ValidationError(
                    "wrap_around requires inter_site_distance_m".to_string(),
                ));
            }
            let supported = matches!((sc.num_sites, sc.num_sectors), (3, 3) | (7, _) | (19, _));
            if !supported {
                return Err(ConfigError::UnsupportedLayout {
                    sites: sc.num_sites,
                    sectors: sc.num_sectors,
                });
            }
        }

        if let Some(ext) = sc.extents {
            if ext.is_empty() {
                return Err(ConfigError::ValidationError("extents are empty".to_string()));
            }
        } else if sc.spatial_consistency && sc.inter_site_distance_m.is_none() {
            return Err(ConfigError::ValidationError(
                "spatial_consistency needs extents or inter_site_distance_m".to_string(),
            ));
        }

        let hall = &sc.factory_hall;
        if !(hall.clutter_density > 0.0 && hall.clutter_density < 1.0) {
            return Err(ConfigError::ValidationError(
                "clutter_density must lie in (0, 1)".to_string(),
            ));
        }
        if hall.length_m <= 0.0 || hall.width_m <= 0.0 || hall.height_m <= 0.0 || hall.clutter_size_m <= 0.0 {
            return Err(ConfigError::ValidationError(
                "factory hall dimensions must be positive".to_string(),
            ));
        }

        if !(self.registry.filter_sample_rate_hz > 0.0) {
            return Err(ConfigError::ValidationError(
                "filter_sample_rate_hz must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Generate example configuration YAML.
    pub fn example_yaml() -> String {
        let config = Self {
            scenario: ScenarioConfig {
                wrap_around: true,
                spatial_consistency: true,
                ..Default::default()
            },
            ..Default::default()
        };
        serde_yaml::to_string(&config).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::LogLevel;

    #[test]
    fn test_default_config() {
        let config = GscmConfig::default();
        assert_eq!(config.scenario.scenario, Scenario::UMa);
        assert!(config.registry.fast_fading);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
scenario:
  scenario: InF-DH
  inter_site_distance_m: null
  spatial_consistency: true
  seed: 42
  extents:
    min: [0.0, 0.0]
    max: [120.0, 60.0]
  factory_hall:
    clutter_density: 0.6
    clutter_height_m: 8.0

registry:
  interferer_small_scale: true

logging:
  level: debug
"#;

        let config = GscmConfig::parse(yaml).unwrap();
        assert_eq!(config.scenario.scenario, Scenario::InFDH);
        assert_eq!(config.scenario.inter_site_distance_m, None);
        assert_eq!(config.scenario.seed, 42);
        assert_eq!(config.scenario.extents, Some(Extents::new([0.0, 0.0], [120.0, 60.0])));
        assert_eq!(config.scenario.factory_hall.clutter_density, 0.6);
        // Unlisted hall fields keep their defaults
        assert_eq!(config.scenario.factory_hall.length_m, 120.0);
        assert!(config.registry.interferer_small_scale);
        assert!(config.registry.fast_fading);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_scenario_rejected() {
        let yaml = "scenario:\n  scenario: Suburban\n";
        assert!(matches!(GscmConfig::parse(yaml), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_validation() {
        let mut config = GscmConfig::default();
        config.scenario.wrap_around = true;
        config.scenario.num_sites = 5;
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnsupportedLayout { sites: 5, sectors: 3 })
        );

        config.scenario.num_sites = 19;
        assert!(config.validate().is_ok());

        config.scenario.extents = Some(Extents::new([10.0, 0.0], [10.0, 5.0]));
        assert!(config.validate().is_err());

        config.scenario.extents = None;
        config.scenario.wrap_around = false;
        config.scenario.inter_site_distance_m = None;
        config.scenario.spatial_consistency = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_example_yaml() {
        let yaml = GscmConfig::example_yaml();
        assert!(yaml.contains("scenario:"));
        assert!(yaml.contains("registry:"));
        let parsed = GscmConfig::parse(&yaml).unwrap();
        assert!(parsed.scenario.wrap_around);
    }

    #[test]
    fn test_config_error_into_gscm_error() {
        let err: GscmError = ConfigError::ValidationError("x".into()).into();
        assert_eq!(err, GscmError::Config("invalid config: x".into()));

        let err: GscmError = ConfigError::UnsupportedLayout { sites: 4, sectors: 1 }.into();
        assert_eq!(err, GscmError::UnsupportedLayout { sites: 4, sectors: 1 });
    }

    #[test]
    fn test_config_search_paths() {
        let paths = GscmConfig::config_search_paths();
        assert!(!paths.is_empty());
        assert!(paths[0].ends_with("gscm.yaml"));
    }
}
