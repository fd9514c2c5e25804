//! Configuration Loader (Figment-based)
//!
//! Merge order, lowest precedence first:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/cosmomap/config.toml)
//! 3. Project config (`cosmomap.toml` or the `--config` path)
//! 4. `COSMOMAP_*` environment variables
//! 5. Documented plain environment variables (COSMOS_ENDPOINT, COSMOS_KEY,
//!    DATABASES, SAMPLE_SIZE, OUTPUT_DIR, VALIDATE_RELATIONSHIPS)
//!
//! CLI flags are applied on top by the driver.

use std::env;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use tracing::debug;

use crate::types::{MapError, Result};

use super::types::Config;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate the merged configuration. An explicitly given
    /// config path must exist; the default project file is optional.
    pub fn load(config_path: Option<&Path>) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global) = Self::global_config_path()
            && global.exists()
        {
            debug!("Loading global config from {}", global.display());
            figment = figment.merge(Toml::file(&global));
        }

        match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(MapError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                debug!("Loading config from {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
            None => {
                let default_path = Self::project_config_path();
                if default_path.exists() {
                    debug!("Loading project config from {}", default_path.display());
                    figment = figment.merge(Toml::file(&default_path));
                }
            }
        }

        figment = figment.merge(Env::prefixed("COSMOMAP_").split("__").lowercase(true));

        let mut config: Config = figment
            .extract()
            .map_err(|e| MapError::Config(format!("configuration error: {}", e)))?;

        Self::apply_plain_env(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// The handful of plain (unprefixed) variables the tool documents
    fn apply_plain_env(config: &mut Config) {
        if let Ok(endpoint) = env::var("COSMOS_ENDPOINT")
            && !endpoint.is_empty()
        {
            config.cosmos.endpoint = Some(endpoint);
        }
        if let Ok(key) = env::var("COSMOS_KEY")
            && !key.is_empty()
        {
            config.cosmos.key = Some(key);
        }
        if let Ok(databases) = env::var("DATABASES")
            && !databases.is_empty()
        {
            config.analysis.databases = databases
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(sample_size) = env::var("SAMPLE_SIZE")
            && let Ok(parsed) = sample_size.parse::<usize>()
        {
            config.analysis.sample_size = parsed;
        }
        if let Ok(dir) = env::var("OUTPUT_DIR")
            && !dir.is_empty()
        {
            config.output.dir = PathBuf::from(dir);
        }
        if let Ok(validate) = env::var("VALIDATE_RELATIONSHIPS") {
            match validate.to_lowercase().as_str() {
                "1" | "true" | "yes" => config.analysis.validate_relationships = true,
                "0" | "false" | "no" => config.analysis.validate_relationships = false,
                _ => {}
            }
        }
    }

    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "cosmomap").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn project_config_path() -> PathBuf {
        PathBuf::from("cosmomap.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_load_defaults_without_files() {
        let config = ConfigLoader::load(None).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.analysis.sample_size, 100);
    }

    #[test]
    fn test_explicit_missing_path_errors() {
        let missing = Path::new("/definitely/not/here/cosmomap.toml");
        assert!(matches!(
            ConfigLoader::load(Some(missing)),
            Err(MapError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            r#"
[cosmos]
endpoint = "https://acct.documents.azure.com"

[analysis]
sample_size = 25
databases = ["shop"]

[output]
format = "html"
"#
        )
        .unwrap();

        let config = ConfigLoader::load(Some(file.path())).unwrap();
        assert_eq!(
            config.cosmos.endpoint.as_deref(),
            Some("https://acct.documents.azure.com")
        );
        assert_eq!(config.analysis.sample_size, 25);
        assert_eq!(config.analysis.databases, vec!["shop"]);
        assert_eq!(config.output.format, "html");
    }

    #[test]
    fn test_plain_env_overrides() {
        // SAFETY: test-local environment mutation; the other tests in this
        // module do not assert on these settings
        unsafe {
            env::set_var("OUTPUT_DIR", "env-output");
            env::set_var("VALIDATE_RELATIONSHIPS", "false");
        }
        let config = ConfigLoader::load(None).unwrap();
        assert_eq!(config.output.dir, PathBuf::from("env-output"));
        assert!(!config.analysis.validate_relationships);
        unsafe {
            env::remove_var("OUTPUT_DIR");
            env::remove_var("VALIDATE_RELATIONSHIPS");
        }
    }
}
