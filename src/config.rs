use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

const CONFIG_DIR: &str = "django-setup";
const CONFIG_FILE: &str = "config.toml";

/// Optional user configuration, `<config dir>/django-setup/config.toml` by default.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SetupConfig {
    /// Names reserved in addition to the built-in set.
    pub extra_reserved_names: Vec<String>,
    /// Directory whose files override embedded templates of the same name.
    pub template_dir: Option<String>,
    /// Fixed answer for the Tailwind question; `None` asks.
    pub tailwind: Option<bool>,
    pub tools: ToolNames,
}

/// Executables used for each external collaborator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolNames {
    pub uv: String,
    pub npm: String,
    pub npx: String,
    pub snap: String,
    pub apt: String,
    pub sudo: String,
}

impl Default for ToolNames {
    fn default() -> Self {
        Self {
            uv: "uv".to_owned(),
            npm: "npm".to_owned(),
            npx: "npx".to_owned(),
            snap: "snap".to_owned(),
            apt: "apt".to_owned(),
            sudo: "sudo".to_owned(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSource {
    Explicit,
    UserDefault,
    Builtin,
}

impl ConfigSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigSource::Explicit => "explicit",
            ConfigSource::UserDefault => "user-default",
            ConfigSource::Builtin => "built-in",
        }
    }
}

#[derive(Debug)]
pub struct LoadedConfig {
    pub config: SetupConfig,
    pub path: Option<Utf8PathBuf>,
    pub source: ConfigSource,
}

/// Resolve and load configuration: an explicit file must exist, the user
/// default is used when present, otherwise built-in defaults apply.
pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let path = Utf8PathBuf::from_path_buf(path.to_path_buf())
            .map_err(|_| anyhow!("config path must be valid UTF-8"))?;
        let config = load_from_path(&path)?;
        return Ok(LoadedConfig {
            config,
            path: Some(path),
            source: ConfigSource::Explicit,
        });
    }

    if let Some(path) = default_path() {
        if path.exists() {
            let config = load_from_path(&path)?;
            return Ok(LoadedConfig {
                config,
                path: Some(path),
                source: ConfigSource::UserDefault,
            });
        }
    }

    Ok(LoadedConfig {
        config: SetupConfig::default(),
        path: None,
        source: ConfigSource::Builtin,
    })
}

pub fn default_path() -> Option<Utf8PathBuf> {
    let dir = dirs::config_dir()?;
    let dir = Utf8PathBuf::from_path_buf(dir).ok()?;
    Some(dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load a configuration file from disk and deserialize it.
pub fn load_from_path(path: &Utf8Path) -> Result<SetupConfig> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading config {}", path))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path))
}
