use std::fs;

use anyhow::{Context, Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "templates"]
struct Embedded;

/// Boilerplate text, embedded by default. Files under an override directory
/// replace the embedded template with the same relative name.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    override_dir: Option<Utf8PathBuf>,
}

impl TemplateSet {
    pub fn embedded() -> Self {
        Self::default()
    }

    pub fn with_overrides(dir: Utf8PathBuf) -> Self {
        Self {
            override_dir: Some(dir),
        }
    }

    pub fn get(&self, name: &str) -> Result<String> {
        if let Some(dir) = &self.override_dir {
            let candidate = dir.join(name);
            if candidate.is_file() {
                tracing::debug!("using template override {}", candidate);
                return fs::read_to_string(&candidate)
                    .with_context(|| format!("reading template {}", candidate));
            }
        }

        let file = Embedded::get(name).ok_or_else(|| anyhow!("embedded template `{}` missing", name))?;
        std::str::from_utf8(file.data.as_ref())
            .with_context(|| format!("decoding embedded template `{}`", name))
            .map(|value| value.to_owned())
    }

    /// Fetch `name` and substitute each `__KEY__` placeholder.
    pub fn render(&self, name: &str, vars: &[(&str, &str)]) -> Result<String> {
        let mut text = self.get(name)?;
        for (key, value) in vars {
            text = text.replace(&format!("__{}__", key), value);
        }
        Ok(text)
    }

    pub fn override_dir(&self) -> Option<&Utf8Path> {
        self.override_dir.as_deref()
    }
}
