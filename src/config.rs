//! Configuration for the hashrel CLI.
//!
//! Loaded from an optional `hashrel.toml`, then overridden by environment
//! variables (a `.env` file next to the config is honored).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "hashrel.toml";

const ENV_DATA: &str = "HASHREL_DATA";
const ENV_TYPE: &str = "HASHREL_TYPE";
const ENV_ID_FIELD: &str = "HASHREL_ID_FIELD";
const ENV_LOG: &str = "HASHREL_LOG";

fn default_id_field() -> String {
    "id".to_string()
}

fn default_log_filter() -> String {
    "hashrel=info".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// JSON file holding an array of records
    #[serde(default)]
    pub data: Option<PathBuf>,

    /// Record type name used in error messages
    #[serde(default)]
    pub type_name: Option<String>,

    /// Identifier field of the records
    #[serde(default = "default_id_field")]
    pub id_field: String,

    /// Tracing filter used when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: None,
            type_name: None,
            id_field: default_id_field(),
            log_filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Load configuration from a directory.
    ///
    /// A missing config file is not an error; defaults are used instead.
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        let env_path = dir.join(".env");
        if env_path.exists() {
            let _ = dotenvy::from_path(&env_path);
        }

        let config_path = dir.join(CONFIG_FILE_NAME);
        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::parse(&content)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Type name to report, falling back to the data file's stem.
    pub fn resolved_type_name(&self) -> String {
        if let Some(name) = &self.type_name {
            return name.clone();
        }
        self.data
            .as_deref()
            .and_then(Path::file_stem)
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Record".to_string())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(data) = std::env::var(ENV_DATA) {
            if !data.is_empty() {
                self.data = Some(PathBuf::from(data));
            }
        }

        if let Ok(type_name) = std::env::var(ENV_TYPE) {
            if !type_name.is_empty() {
                self.type_name = Some(type_name);
            }
        }

        if let Ok(id_field) = std::env::var(ENV_ID_FIELD) {
            if !id_field.is_empty() {
                self.id_field = id_field;
            }
        }

        if let Ok(filter) = std::env::var(ENV_LOG) {
            if !filter.is_empty() {
                self.log_filter = filter;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.id_field, "id");
        assert_eq!(config.log_filter, "hashrel=info");
        assert!(config.data.is_none());
        assert_eq!(config.resolved_type_name(), "Record");
    }

    #[test]
    fn test_parse_partial_file() {
        let config = Config::parse(
            r#"
            data = "fixtures/countries.json"
            id_field = "code"
            "#,
        )
        .unwrap();
        assert_eq!(config.data, Some(PathBuf::from("fixtures/countries.json")));
        assert_eq!(config.id_field, "code");
        assert_eq!(config.log_filter, "hashrel=info");
        assert_eq!(config.resolved_type_name(), "countries");
    }

    #[test]
    fn test_parse_rejects_bad_toml() {
        assert!(Config::parse("id_field = [").is_err());
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "type_name = \"Country\"\n",
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        if std::env::var(ENV_TYPE).is_err() {
            assert_eq!(config.resolved_type_name(), "Country");
        }
    }
}
