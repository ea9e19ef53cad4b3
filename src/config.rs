//! Layered key-value configuration consumed by artifact-path substitution
//! (see [`crate::probe`]) and exposed to hosts for their own settings.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use figment::providers::{Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config(pub HashMap<String, String>);

impl Config {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Load configuration.
    ///
    /// With an explicit path, that single file is loaded with no layering.
    /// Otherwise layers are merged lowest to highest priority:
    ///   1. `/etc/kiln/kiln.toml`             (system-wide)
    ///   2. `$XDG_CONFIG_HOME/kiln/kiln.toml` (per-user, skipped when root)
    ///   3. `./kiln.toml`                     (project-local, highest priority)
    /// Any layer that does not exist is silently skipped; if none exist,
    /// an empty configuration is returned.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            let figment = Figment::new().merge(Toml::file(path));
            return figment
                .extract()
                .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)));
        }

        let mut figment = Figment::new();
        for layer in config_layers() {
            if layer.exists() {
                figment = figment.merge(Toml::file(&layer));
            }
        }

        figment
            .extract()
            .map_err(|e| Error::Config(format!("failed to parse configuration: {}", e)))
    }
}

fn config_layers() -> Vec<PathBuf> {
    let mut layers = vec![PathBuf::from("/etc/kiln/kiln.toml")];
    if let Some(xdg) = xdg_config_path() {
        layers.push(xdg);
    }
    layers.push(PathBuf::from("./kiln.toml"));
    layers
}

/// Non-root per-user config path under `$XDG_CONFIG_HOME` (or `~/.config`).
/// Returns `None` when running as root, matching the privilege-aware
/// default used throughout this tool's filesystem layout.
fn xdg_config_path() -> Option<PathBuf> {
    let uid = unsafe { libc::getuid() };
    if uid == 0 {
        return None;
    }

    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .ok()
        .or_else(|| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")).ok())
        .map(|p| p.join("kiln/kiln.toml"))
}
