//! Settings access for the engine.
//!
//! The engine never invents paths: the root config file, server root and
//! configuration directory come from a [`SettingsProvider`] collaborator,
//! injected rather than reached for so tests can substitute fixed values.
//! A missing key is a caller error ([`EngineError::MissingSetting`]).
//!
//! [`YamlSettingsStore`] is the shipped provider: a flat string map
//! persisted as YAML next to the tool's other data.

use anyhow::{Context, Result as AnyResult};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use std::fs;

use crate::error::{EngineError, Result};

/// Well-known setting keys the engine depends on.
pub mod keys {
    /// Absolute path of the root configuration file (e.g. `httpd.conf`).
    pub const CONF_FILE: &str = "ConfFile";
    /// Absolute path of the server root (`ServerRoot` directive value).
    pub const SERVER_ROOT: &str = "ServerRoot";
    /// Absolute path of the root configuration directory.
    pub const CONF_DIRECTORY: &str = "ConfDirectory";
}

/// Read-only string lookup supplied by the hosting layer.
pub trait SettingsProvider: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// The resolved paths the engine needs for one request. Rebuilt per call;
/// the underlying store can change between requests.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub conf_file: Utf8PathBuf,
    pub server_root: Utf8PathBuf,
    pub conf_directory: Utf8PathBuf,
}

impl EngineSettings {
    /// Reads all required keys, failing on the first missing one.
    pub fn from_provider(provider: &dyn SettingsProvider) -> Result<Self> {
        Ok(Self {
            conf_file: require(provider, keys::CONF_FILE)?,
            server_root: require(provider, keys::SERVER_ROOT)?,
            conf_directory: require(provider, keys::CONF_DIRECTORY)?,
        })
    }
}

fn require(provider: &dyn SettingsProvider, key: &str) -> Result<Utf8PathBuf> {
    provider
        .get(key)
        .map(Utf8PathBuf::from)
        .ok_or_else(|| EngineError::MissingSetting(key.to_string()))
}

/// File-backed settings store persisting a flat string map as YAML.
#[derive(Debug, Clone)]
pub struct YamlSettingsStore {
    path: Utf8PathBuf,
    values: IndexMap<String, String>,
}

impl YamlSettingsStore {
    /// Loads the store from `path`, starting empty when the file does not
    /// exist yet.
    pub fn load<P: AsRef<Utf8Path>>(path: P) -> AnyResult<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            tracing::warn!("Settings file not found at {}, starting empty", path);
            return Ok(Self {
                path,
                values: IndexMap::new(),
            });
        }

        let file_contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings file: {}", path))?;

        let values: IndexMap<String, String> = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse settings file: {}", path))?;

        tracing::info!("Loaded {} setting(s) from {}", values.len(), path);
        Ok(Self { path, values })
    }

    /// Sets a value and persists the whole store.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> AnyResult<()> {
        self.values.insert(key.into(), value.into());
        self.save()
    }

    fn save(&self) -> AnyResult<()> {
        let yaml_string =
            serde_yaml_ng::to_string(&self.values).context("Failed to serialize settings")?;

        fs::write(&self.path, yaml_string)
            .with_context(|| format!("Failed to write settings file: {}", self.path))?;

        tracing::debug!("Saved settings to {}", self.path);
        Ok(())
    }
}

impl SettingsProvider for YamlSettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn store_round_trips_values() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("settings.yaml")).unwrap();

        let mut store = YamlSettingsStore::load(&path).unwrap();
        store.set(keys::CONF_FILE, "/etc/httpd/conf/httpd.conf").unwrap();
        store.set(keys::SERVER_ROOT, "/etc/httpd").unwrap();

        let reloaded = YamlSettingsStore::load(&path).unwrap();
        assert_eq!(
            reloaded.get(keys::CONF_FILE).as_deref(),
            Some("/etc/httpd/conf/httpd.conf")
        );
        assert_eq!(reloaded.get(keys::SERVER_ROOT).as_deref(), Some("/etc/httpd"));
    }

    #[test]
    fn missing_key_is_a_caller_error() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("settings.yaml")).unwrap();
        let store = YamlSettingsStore::load(&path).unwrap();

        let err = EngineSettings::from_provider(&store).unwrap_err();
        assert!(matches!(err, EngineError::MissingSetting(key) if key == keys::CONF_FILE));
    }

    #[test]
    fn settings_resolve_when_all_keys_present() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("settings.yaml")).unwrap();

        let mut store = YamlSettingsStore::load(&path).unwrap();
        store.set(keys::CONF_FILE, "/etc/httpd/conf/httpd.conf").unwrap();
        store.set(keys::SERVER_ROOT, "/etc/httpd").unwrap();
        store.set(keys::CONF_DIRECTORY, "/etc/httpd/conf").unwrap();

        let settings = EngineSettings::from_provider(&store).unwrap();
        assert_eq!(settings.conf_directory, "/etc/httpd/conf");
    }
}
