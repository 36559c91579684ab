//! Configuration persistence
//!
//! Loads the planner configuration from a TOML file, or from the postcard
//! binary copy written by [`ConfigStore::save_binary`] when no TOML file is
//! available.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str;

use synchron_core::config::{PlannerConfig, CONFIG_VERSION};

use crate::toml::{parse_config, ParseError};

/// Maximum TOML config size
const MAX_TOML_SIZE: usize = 8192;

/// Maximum serialized config size (binary)
const MAX_CONFIG_SIZE: usize = 2048;

/// Configuration persistence errors
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// File does not exist
    NotFound,
    /// Other file system failure
    Io,
    /// File exceeds the size limit
    TooLarge,
    /// Invalid UTF-8 in TOML data
    InvalidUtf8,
    /// TOML parsing failed
    TomlParse(ParseError),
    /// Deserialization failed
    Deserialize,
    /// Serialization failed
    Serialize,
    /// Config version mismatch
    VersionMismatch { found: u8 },
}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => ConfigError::NotFound,
            _ => ConfigError::Io,
        }
    }
}

impl From<ParseError> for ConfigError {
    fn from(e: ParseError) -> Self {
        ConfigError::TomlParse(e)
    }
}

/// Configuration persistence manager
///
/// Knows where the TOML source and its binary copy live.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    toml_path: PathBuf,
    binary_path: PathBuf,
}

impl ConfigStore {
    pub fn new(toml_path: impl Into<PathBuf>, binary_path: impl Into<PathBuf>) -> Self {
        Self {
            toml_path: toml_path.into(),
            binary_path: binary_path.into(),
        }
    }

    pub fn toml_path(&self) -> &Path {
        &self.toml_path
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Load configuration
    ///
    /// Tries to load TOML config first, falls back to binary postcard format.
    pub fn load(&self) -> Result<PlannerConfig, ConfigError> {
        info!("Loading planner configuration");

        match self.load_toml() {
            Ok(config) => {
                info!("Loaded configuration from TOML");
                return Ok(config);
            }
            Err(ConfigError::NotFound) => {
                debug!("No TOML config found, trying binary format");
            }
            Err(e) => {
                warn!("Failed to load TOML config: {:?}, trying binary", e);
            }
        }

        self.load_binary()
    }

    /// Load configuration from TOML format
    pub fn load_toml(&self) -> Result<PlannerConfig, ConfigError> {
        let data = read_limited(&self.toml_path, MAX_TOML_SIZE)?;
        debug!("Read {} bytes of TOML", data.len());

        let toml_str = str::from_utf8(&data).map_err(|_| ConfigError::InvalidUtf8)?;
        let config = parse_config(toml_str)?;

        log_config_summary(&config);
        Ok(config)
    }

    /// Load configuration from binary postcard format
    pub fn load_binary(&self) -> Result<PlannerConfig, ConfigError> {
        let data = read_limited(&self.binary_path, MAX_CONFIG_SIZE)?;
        debug!("Read {} bytes of binary config", data.len());

        let config: PlannerConfig =
            postcard::from_bytes(&data).map_err(|_| ConfigError::Deserialize)?;

        if config.version != CONFIG_VERSION {
            warn!(
                "Config version mismatch: found {}, expected {}",
                config.version, CONFIG_VERSION
            );
            return Err(ConfigError::VersionMismatch {
                found: config.version,
            });
        }

        log_config_summary(&config);
        Ok(config)
    }

    /// Store configuration in binary postcard format
    pub fn save_binary(&self, config: &PlannerConfig) -> Result<(), ConfigError> {
        let data = postcard::to_allocvec(config).map_err(|_| ConfigError::Serialize)?;
        if data.len() > MAX_CONFIG_SIZE {
            return Err(ConfigError::TooLarge);
        }

        fs::write(&self.binary_path, &data)?;
        debug!("Wrote {} bytes of binary config", data.len());
        Ok(())
    }
}

fn read_limited(path: &Path, limit: usize) -> Result<Vec<u8>, ConfigError> {
    if fs::metadata(path)?.len() > limit as u64 {
        return Err(ConfigError::TooLarge);
    }
    Ok(fs::read(path)?)
}

/// Log a summary of the loaded configuration
pub fn log_config_summary(config: &PlannerConfig) {
    info!("Configuration loaded successfully");
    debug!("  cycle time {}s", config.cycle_time);
    debug!(
        "  {} axes ({} enabled)",
        config.axes.len(),
        config.enabled_count()
    );
    for axis in config.axes.iter() {
        debug!(
            "  {}: a_max {} jerk limited {}",
            axis.name.as_str(),
            axis.max_acceleration,
            axis.max_jerk.is_some()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tracing::span::{Attributes, Id, Record};
    use tracing::{Event, Metadata, Subscriber};

    /// Subscriber that only counts events
    struct EventCounter(Arc<AtomicUsize>);

    impl Subscriber for EventCounter {
        fn enabled(&self, _: &Metadata<'_>) -> bool {
            true
        }

        fn new_span(&self, _: &Attributes<'_>) -> Id {
            Id::from_u64(1)
        }

        fn record(&self, _: &Id, _: &Record<'_>) {}

        fn record_follows_from(&self, _: &Id, _: &Id) {}

        fn event(&self, _: &Event<'_>) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }

        fn enter(&self, _: &Id) {}

        fn exit(&self, _: &Id) {}
    }

    /// Store with paths unique to one test
    fn temp_store(name: &str) -> ConfigStore {
        let dir = std::env::temp_dir();
        let prefix = format!("synchron-{}-{}", process::id(), name);
        let store = ConfigStore::new(
            dir.join(format!("{}.toml", prefix)),
            dir.join(format!("{}.bin", prefix)),
        );
        let _ = fs::remove_file(store.toml_path());
        let _ = fs::remove_file(store.binary_path());
        store
    }

    #[test]
    fn test_load_toml() {
        let store = temp_store("toml");
        fs::write(store.toml_path(), include_str!("../planner.toml")).unwrap();

        let config = store.load().unwrap();
        assert_eq!(config.axes.len(), 3);
        assert_eq!(config.axes[0].name.as_str(), "x");

        fs::remove_file(store.toml_path()).unwrap();
    }

    #[test]
    fn test_binary_round_trip() {
        let store = temp_store("binary");
        let config = parse_config(include_str!("../planner.toml")).unwrap();

        store.save_binary(&config).unwrap();
        assert_eq!(store.load_binary().unwrap(), config);

        // No TOML file, so load falls back to the binary copy
        assert_eq!(store.load().unwrap(), config);

        fs::remove_file(store.binary_path()).unwrap();
    }

    #[test]
    fn test_invalid_toml_falls_back_to_binary() {
        let store = temp_store("fallback");
        let config = PlannerConfig::default();
        store.save_binary(&config).unwrap();
        fs::write(store.toml_path(), "version = \"one\"").unwrap();

        assert!(matches!(store.load_toml(), Err(ConfigError::TomlParse(_))));
        assert_eq!(store.load().unwrap(), config);

        fs::remove_file(store.toml_path()).unwrap();
        fs::remove_file(store.binary_path()).unwrap();
    }

    #[test]
    fn test_binary_version_mismatch() {
        let store = temp_store("version");
        let config = PlannerConfig {
            version: 7,
            ..PlannerConfig::default()
        };
        store.save_binary(&config).unwrap();

        assert_eq!(
            store.load_binary(),
            Err(ConfigError::VersionMismatch { found: 7 })
        );

        fs::remove_file(store.binary_path()).unwrap();
    }

    #[test]
    fn test_missing_files() {
        let store = temp_store("missing");
        assert_eq!(store.load(), Err(ConfigError::NotFound));
    }

    #[test]
    fn test_corrupt_binary() {
        let store = temp_store("corrupt");
        fs::write(store.binary_path(), [0xff_u8; 3]).unwrap();
        assert_eq!(store.load_binary(), Err(ConfigError::Deserialize));

        fs::remove_file(store.binary_path()).unwrap();
    }

    #[test]
    fn test_invalid_utf8() {
        let store = temp_store("utf8");
        fs::write(store.toml_path(), [0xc3_u8, 0x28]).unwrap();
        assert_eq!(store.load_toml(), Err(ConfigError::InvalidUtf8));

        fs::remove_file(store.toml_path()).unwrap();
    }

    #[cfg(not(feature = "defmt"))]
    #[test]
    fn test_load_logs_through_tracing() {
        let store = temp_store("logging");
        fs::write(store.toml_path(), include_str!("../planner.toml")).unwrap();

        let events = Arc::new(AtomicUsize::new(0));
        let counter = EventCounter(events.clone());
        let config = tracing::subscriber::with_default(counter, || store.load());
        assert!(config.is_ok());
        // Load messages plus the summary with one line per axis
        assert!(events.load(Ordering::Relaxed) >= 3 + config.unwrap().axes.len());

        fs::remove_file(store.toml_path()).unwrap();
    }
}
