//! Configuration loading for fu-ls.
//!
//! Read from `$FU_LS_CONFIG` when set, otherwise `~/.fu/config.toml`. A missing
//! file is not an error; every section is optional and falls back to defaults.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use fu_frontend::FrontEndConfig;
use fu_lsp::DiagnosticsConfig;
use serde::Deserialize;
use thiserror::Error;

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "FU_LS_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FuConfig {
    pub diagnostics: Option<DiagnosticsConfig>,
    /// External compiler used for parsing.
    pub frontend: Option<FrontEndConfig>,
}

impl FuConfig {
    /// Load from the default location.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    /// Load from `path`. `Ok(None)` if the file does not exist.
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file");
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|source| {
            tracing::warn!("Failed to read config at {:?}: {}", path, source);
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Self = toml::from_str(&content).map_err(|source| {
            tracing::warn!("Failed to parse config at {:?}: {}", path, source);
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;

        if let Some(frontend) = config.frontend.as_mut() {
            frontend.command = expand_env_vars(&frontend.command);
            for arg in &mut frontend.args {
                *arg = expand_env_vars(arg);
            }
        }
        Ok(Some(config))
    }

    /// The `[diagnostics]` section, or defaults when absent.
    #[must_use]
    pub fn diagnostics(&self) -> DiagnosticsConfig {
        self.diagnostics.clone().unwrap_or_default()
    }
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    resolve_config_path(env::var_os(CONFIG_ENV), dirs::home_dir())
}

fn resolve_config_path(explicit: Option<OsString>, home: Option<PathBuf>) -> Option<PathBuf> {
    match explicit.filter(|p| !p.is_empty()) {
        Some(path) => Some(PathBuf::from(path)),
        None => home.map(|home| home.join(".fu").join("config.toml")),
    }
}

/// Replace `${VAR}` with the variable's value. Unset variables become empty;
/// an unterminated `${` is kept literally.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    expand_vars_with(value, |var| env::var(var).ok())
}

fn expand_vars_with(value: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let var = &after[..end];
        if !var.is_empty() {
            out.push_str(&lookup(var).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}
