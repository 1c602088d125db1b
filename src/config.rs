use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;

use crate::prelude::*;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings read from a `shellfish.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directories searched for programs instead of `PATH`.
    pub search_path: Option<Vec<PathBuf>>,
    /// Decode captured output as text by default.
    pub text: bool,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log: Option<String>,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn registry(&self) -> Registry {
        match &self.search_path {
            Some(dirs) => Registry::new(dirs.iter().cloned()),
            None => Registry::from_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn parses_every_key() {
        let config = Config::from_toml(
            r#"
            search_path = ["/opt/bin", "/bin"]
            text = true
            log = "shellfish=debug"
            "#,
        )
        .unwrap();

        assert!(config.text);
        assert_eq!(config.log.as_deref(), Some("shellfish=debug"));
        assert_eq!(
            config.registry().dirs(),
            [PathBuf::from("/opt/bin"), PathBuf::from("/bin")]
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            Config::from_toml("colour = true"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Config::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { path, .. } if path == Path::new("/definitely/not/here.toml")));
    }
}
