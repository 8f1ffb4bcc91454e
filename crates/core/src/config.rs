//! Locating and parsing `meteorg.toml`. CLI flags and env vars are layered
//! on top of the file by the service.

use std::env;
use std::fs;
use std::path::PathBuf;

use serde::de::DeserializeOwned;

use crate::APP_NAME;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Named by `--config` or the config env var
    Explicit(PathBuf),
    /// Discovered in one of the search directories
    Discovered(PathBuf),
    Defaults,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            ConfigSource::Explicit(p) | ConfigSource::Discovered(p) => Some(p),
            ConfigSource::Defaults => None,
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.path() {
            Some(p) => write!(f, "{}", p.display()),
            None => write!(f, "(defaults)"),
        }
    }
}

/// Find `filename` in the usual places, first hit wins: the path named by
/// `env_var`, the working directory, the user config dir, then `/etc/meteorg/`.
pub fn find_config_file(env_var: &str, filename: &str) -> ConfigSource {
    let discovered = |dir: PathBuf| ConfigSource::Discovered(dir.join(filename));
    let candidates = [
        env::var_os(env_var).map(|p| ConfigSource::Explicit(PathBuf::from(p))),
        Some(discovered(PathBuf::new())),
        user_config_dir().map(|dir| discovered(dir.join(APP_NAME))),
        Some(discovered(PathBuf::from("/etc").join(APP_NAME))),
    ];

    candidates
        .into_iter()
        .flatten()
        .find(|candidate| candidate.path().is_some_and(|p| p.is_file()))
        .unwrap_or(ConfigSource::Defaults)
}

fn user_config_dir() -> Option<PathBuf> {
    env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}

/// Load and parse a TOML configuration file
///
/// # Returns
/// * `Ok(config)` - Parsed config, or `T::default()` when no file was found
/// * `Err(e)` - Failed to read or parse the config file
pub fn load_config<T: DeserializeOwned + Default>(source: &ConfigSource) -> anyhow::Result<T> {
    match source.path() {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            let config: T = toml::from_str(&content)?;
            log::debug!("parsed config from {}", path.display());
            Ok(config)
        }
        None => Ok(T::default()),
    }
}
