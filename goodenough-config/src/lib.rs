//! Configuration loader for the goodenough symbol server.
//!
//! `defaults/goodenough.default.toml` is embedded into the binary so the documented defaults
//! and runtime behavior stay in sync. Users layer their own files on top via [`Loader`] before
//! deserializing into [`GoodEnoughConfig`]. Editor settings pushed over LSP arrive later as
//! [`ClientSettings`] and are applied over the loaded [`FeaturesConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_TOML: &str = include_str!("../defaults/goodenough.default.toml");

/// Settings section the editor extension contributes.
pub const CLIENT_SETTINGS_SECTION: &str = "goodEnoughScala";

/// Top-level configuration consumed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GoodEnoughConfig {
    pub features: FeaturesConfig,
    pub indexing: IndexingConfig,
}

/// Toggles the editor can also flip at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FeaturesConfig {
    pub hover_enabled: bool,
    pub analytics_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IndexingConfig {
    pub debounce_ms: u64,
    pub just_changed_ms: u64,
    pub file_source: FileSource,
    pub extensions: Vec<String>,
}

impl IndexingConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn just_changed_grace(&self) -> Duration {
        Duration::from_millis(self.just_changed_ms)
    }
}

/// Where the server reads file contents from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileSource {
    /// Ask the editor through custom requests.
    Client,
    /// Walk the workspace folders directly.
    Disk,
}

/// Builds a [`GoodEnoughConfig`] from the embedded defaults plus whatever the server was
/// started with. Later layers win.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    pub fn new() -> Self {
        let defaults = File::from_str(DEFAULT_TOML, FileFormat::Toml);
        Self {
            builder: Config::builder().add_source(defaults),
        }
    }

    /// Layer the TOML file passed as `--config`. Building fails if it does not exist.
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        self.layer(path.as_ref(), true)
    }

    /// Layer a TOML file that may be absent, such as a per-user settings file.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Self {
        self.layer(path.as_ref(), false)
    }

    /// Pin one dotted key, e.g. `indexing.file_source` from `--file-source`. Overrides sit
    /// above every file layer.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<GoodEnoughConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }

    fn layer(mut self, path: &Path, required: bool) -> Self {
        let file = File::from(path).format(FileFormat::Toml).required(required);
        self.builder = self.builder.add_source(file);
        self
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// The embedded defaults with nothing layered on top.
pub fn load_defaults() -> Result<GoodEnoughConfig, ConfigError> {
    Loader::new().build()
}

/// The `goodEnoughScala` settings section as the editor sends it. Absent keys leave the
/// current value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSettings {
    pub hover_enabled: Option<bool>,
    pub analytics_enabled: Option<bool>,
}

impl ClientSettings {
    /// Parse the section itself, e.g. one item of a `workspace/configuration` response.
    /// Anything malformed yields empty settings.
    pub fn from_section(value: &serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    /// Parse the `didChangeConfiguration` payload, which wraps the section by name.
    pub fn from_notification(settings: &serde_json::Value) -> Self {
        settings
            .get(CLIENT_SETTINGS_SECTION)
            .map(Self::from_section)
            .unwrap_or_default()
    }

    pub fn apply(&self, features: &mut FeaturesConfig) {
        if let Some(enabled) = self.hover_enabled {
            features.hover_enabled = enabled;
        }
        if let Some(enabled) = self.analytics_enabled {
            features.analytics_enabled = enabled;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert!(config.features.hover_enabled);
        assert!(config.features.analytics_enabled);
        assert_eq!(config.indexing.debounce(), Duration::from_millis(150));
        assert_eq!(config.indexing.just_changed_grace(), Duration::from_millis(500));
        assert_eq!(config.indexing.file_source, FileSource::Client);
        assert_eq!(
            config.indexing.extensions,
            ["scala", "sbt", "sc", "routes", "scala.html"]
        );
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("indexing.file_source", "disk")
            .expect("override to apply")
            .set_override("indexing.debounce_ms", 40)
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.indexing.file_source, FileSource::Disk);
        assert_eq!(config.indexing.debounce_ms, 40);
    }

    #[test]
    fn user_files_layer_over_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[features]\nhover_enabled = false").unwrap();

        let config = Loader::new().with_file(file.path()).build().unwrap();
        assert!(!config.features.hover_enabled);
        assert!(config.features.analytics_enabled);
    }

    #[test]
    fn overrides_win_over_the_config_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[indexing]\nfile_source = \"client\"\ndebounce_ms = 90").unwrap();

        let config = Loader::new()
            .with_file(file.path())
            .set_override("indexing.file_source", "disk")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.indexing.file_source, FileSource::Disk);
        assert_eq!(config.indexing.debounce_ms, 90);
    }

    #[test]
    fn missing_optional_file_is_ignored() {
        let config = Loader::new()
            .with_optional_file("/definitely/not/here.toml")
            .build()
            .unwrap();
        assert_eq!(config, load_defaults().unwrap());
        assert!(Loader::new()
            .with_file("/definitely/not/here.toml")
            .build()
            .is_err());
    }

    #[test]
    fn client_settings_apply_only_present_keys() {
        let mut features = load_defaults().unwrap().features;
        let settings = ClientSettings::from_notification(&json!({
            "goodEnoughScala": { "hoverEnabled": false }
        }));
        settings.apply(&mut features);
        assert!(!features.hover_enabled);
        assert!(features.analytics_enabled);
    }

    #[test]
    fn malformed_client_settings_fall_back_to_nothing() {
        assert_eq!(
            ClientSettings::from_notification(&json!({ "other": {} })),
            ClientSettings::default()
        );
        assert_eq!(
            ClientSettings::from_section(&json!({ "hoverEnabled": "yes" })),
            ClientSettings::default()
        );
        assert_eq!(
            ClientSettings::from_section(&json!(null)),
            ClientSettings::default()
        );
    }
}
