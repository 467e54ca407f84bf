//! Layered CLI configuration: defaults, optional TOML file, `NETSTATE_*` env.

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File as ConfigFile};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "netstate.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
    /// Directory holding the sled database.
    pub data_dir: PathBuf,
    pub log_level: String,
    /// `pretty` or `plain`.
    pub log_format: String,
}

impl CliConfig {
    /// Load configuration. An explicit `config_path` must exist; otherwise
    /// `netstate.toml` in the working directory is used when present.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let resolved_path = match config_path {
            Some(path) => {
                if !path.exists() {
                    bail!(
                        "Configuration file {} not found (specified via --config)",
                        path.display()
                    );
                }
                Some(path.to_path_buf())
            }
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                path.exists().then_some(path)
            }
        };

        let mut builder = Config::builder()
            .set_default("data_dir", "./netstate-data")?
            .set_default("log_level", "info")?
            .set_default("log_format", "pretty")?;

        if let Some(path) = &resolved_path {
            builder = builder.add_source(ConfigFile::from(path.as_path()));
        }

        builder = builder.add_source(Environment::with_prefix("NETSTATE"));

        builder
            .build()?
            .try_deserialize()
            .context("invalid netstate configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn file_values_override_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "data_dir = \"/var/lib/netstate\"\nlog_format = \"plain\"\n").unwrap();

        let config = CliConfig::load(Some(&path)).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/netstate"));
        assert_eq!(config.log_format, "plain");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = CliConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
