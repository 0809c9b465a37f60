use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
};
use serde::{Serialize, de::DeserializeOwned};
use std::path::Path;

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

pub struct LogtallyConfig {
    figment: Figment,
}

impl LogtallyConfig {
    pub fn load_defaults() -> Result<Self> {
        Self::load(None, None::<&()>)
    }

    /// Build the layered configuration
    ///
    /// Priority, lowest first: embedded defaults, user config, repository
    /// config, `custom_config`, `LOGTALLY_*` environment variables, then
    /// `cli_overrides`.
    pub fn load<T: Serialize>(custom_config: Option<&str>, cli_overrides: Option<T>) -> Result<Self> {
        tracing::trace!("CONFIG LOAD: Starting");

        let user_base = Self::user_config_base_path();
        let mut figment = Figment::new()
            .merge(Toml::string(DEFAULT_CONFIG))
            // User config - support multiple formats
            .merge(Toml::file(format!("{user_base}.toml")))
            .merge(Json::file(format!("{user_base}.json")))
            .merge(Yaml::file(format!("{user_base}.yaml")))
            // Repository config - support multiple formats
            .merge(Toml::file("logtally.toml"))
            .merge(Json::file("logtally.json"))
            .merge(Yaml::file("logtally.yaml"));

        if let Some(custom_path) = custom_config {
            tracing::trace!("CONFIG LOAD: Using custom config {}", custom_path);
            figment = match Path::new(custom_path).extension().and_then(|ext| ext.to_str()) {
                Some("json") => figment.merge(Json::file(custom_path)),
                Some("yaml") | Some("yml") => figment.merge(Yaml::file(custom_path)),
                _ => figment.merge(Toml::file(custom_path)),
            };
        }

        // Environment variables, e.g. LOGTALLY_PARALLEL__MAX_THREADS=4
        figment = figment.merge(Env::prefixed("LOGTALLY_").split("__"));

        if let Some(overrides) = cli_overrides {
            tracing::trace!("CONFIG LOAD: Applying CLI overrides");
            figment = figment.merge(Serialized::defaults(overrides));
        }

        Ok(LogtallyConfig { figment })
    }

    /// Deserialize one section (e.g. `"scan"`) into a typed struct
    pub fn section<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.figment
            .extract_inner(path)
            .with_context(|| format!("Invalid configuration section '{path}'"))
    }

    /// Get a nested object/section as JSON
    pub fn get_section(&self, path: &str) -> Result<serde_json::Value> {
        Ok(self.figment.extract_inner(path)?)
    }

    /// Get the full merged configuration as a structured value
    pub fn get_full_config(&self) -> Result<serde_json::Value> {
        Ok(self.figment.extract()?)
    }

    fn user_config_base_path() -> String {
        match std::env::var("HOME") {
            Ok(home) => format!("{home}/.config/logtally/config"),
            Err(_) => "~/.config/logtally/config".to_string(),
        }
    }
}
