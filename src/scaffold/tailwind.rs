use std::fs;
use std::io;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde_json::{Map, Value};

use super::ScaffoldPlan;
use crate::config::ToolNames;
use crate::error::FileSystemError;
use crate::paths::InstallPath;
use crate::templates::TemplateSet;
use crate::tools::ToolInvocation;

pub const INPUT_CSS: &str = "static/css/tailwind.css";
pub const OUTPUT_CSS: &str = "static/css/output.css";
pub const CONFIG_JS: &str = "tailwind.config.js";
pub const PACKAGE_JSON: &str = "package.json";

/// v4 dropped `tailwindcss init` and the JS config file.
const TAILWIND_PACKAGE: &str = "tailwindcss@3";

/// Project and app template dirs only; a `./**` glob would walk `node_modules`.
const CONTENT_GLOBS: &[&str] = &["./templates/**/*.html", "./*/templates/**/*.html"];

static CONTENT_ARRAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"content:\s*\[[^\]]*\]").expect("content pattern is valid")
});

/// npm commands that install Tailwind and generate its config.
pub fn install_commands(tools: &ToolNames, install: &InstallPath) -> Vec<ToolInvocation> {
    vec![
        ToolInvocation::new(&tools.npm, ["init", "-y"]).in_dir(install.as_path()),
        ToolInvocation::new(&tools.npm, ["install", "--save-dev", TAILWIND_PACKAGE])
            .in_dir(install.as_path()),
        ToolInvocation::new(&tools.npx, ["tailwindcss", "init"]).in_dir(install.as_path()),
    ]
}

pub fn plan(templates: &TemplateSet) -> Result<ScaffoldPlan> {
    Ok(ScaffoldPlan::new().file(INPUT_CSS, templates.get("tailwind/tailwind.css")?))
}

/// Point the `content` globs of a generated config at the Django templates.
/// Returns `None` when the config has no `content` array to rewrite.
pub fn configure_content(config_js: &str) -> Option<String> {
    if !CONTENT_ARRAY.is_match(config_js) {
        return None;
    }
    let globs = CONTENT_GLOBS
        .iter()
        .map(|glob| format!("    \"{glob}\",\n"))
        .collect::<String>();
    let replacement = format!("content: [\n{globs}  ]");
    Some(
        CONTENT_ARRAY
            .replace(config_js, regex::NoExpand(&replacement))
            .into_owned(),
    )
}

/// Add `build:css` and `watch:css` npm scripts, keeping any the user already has.
pub fn add_build_scripts(package_json: &str) -> Result<String> {
    let mut doc: Value = serde_json::from_str(package_json).context("parsing package.json")?;
    let root = doc
        .as_object_mut()
        .context("package.json is not a JSON object")?;
    let scripts = root
        .entry("scripts")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .context("package.json has a non-object `scripts` entry")?;

    let build = format!("tailwindcss -i ./{INPUT_CSS} -o ./{OUTPUT_CSS} --minify");
    let watch = format!("tailwindcss -i ./{INPUT_CSS} -o ./{OUTPUT_CSS} --watch");
    scripts
        .entry("build:css")
        .or_insert_with(|| Value::String(build));
    scripts
        .entry("watch:css")
        .or_insert_with(|| Value::String(watch));

    let mut out = serde_json::to_string_pretty(&doc).context("serializing package.json")?;
    out.push('\n');
    Ok(out)
}

/// Files touched by [`wire`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Wiring {
    pub config_updated: bool,
    pub scripts_updated: bool,
}

/// Rewrite the generated config and package manifest in place. Missing files
/// are skipped with a warning rather than treated as fatal.
pub fn wire(install: &InstallPath) -> Result<Wiring> {
    let mut wiring = Wiring::default();

    let config_path = install.join(CONFIG_JS);
    match read_optional(&config_path)? {
        Some(text) => match configure_content(&text) {
            Some(updated) => {
                fs::write(&config_path, updated)
                    .map_err(|source| FileSystemError::new(&config_path, source))?;
                wiring.config_updated = true;
            }
            None => tracing::warn!("{} has no `content` array; leaving it untouched", config_path),
        },
        None => tracing::warn!("{} not found; content globs not configured", config_path),
    }

    let package_path = install.join(PACKAGE_JSON);
    match read_optional(&package_path)? {
        Some(text) => {
            let updated = add_build_scripts(&text)
                .with_context(|| format!("updating {}", package_path))?;
            fs::write(&package_path, updated)
                .map_err(|source| FileSystemError::new(&package_path, source))?;
            wiring.scripts_updated = true;
        }
        None => tracing::warn!("{} not found; build scripts not added", package_path),
    }

    Ok(wiring)
}

fn read_optional(path: &camino::Utf8Path) -> Result<Option<String>, FileSystemError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(FileSystemError::new(path, source)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::{PathValidator, ReservedNames};
    use camino::Utf8PathBuf;

    const GENERATED: &str = "/** @type {import('tailwindcss').Config} */\nmodule.exports = {\n  content: [],\n  theme: {\n    extend: {},\n  },\n  plugins: [],\n}\n";

    fn install_in(dir: &tempfile::TempDir) -> InstallPath {
        let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        PathValidator::new(base, ReservedNames::default())
            .validate("webroot")
            .unwrap()
    }

    #[test]
    fn content_globs_replace_empty_array() {
        let updated = configure_content(GENERATED).unwrap();
        assert!(updated.contains("\"./templates/**/*.html\""));
        assert!(updated.contains("\"./*/templates/**/*.html\""));
        assert!(!updated.contains("./**/templates"));
        assert!(updated.contains("plugins: []"));
        assert!(!updated.contains("content: []"));
        assert!(configure_content("module.exports = {}").is_none());
    }

    #[test]
    fn build_scripts_are_added_without_clobbering() {
        let json = r#"{"name": "site", "scripts": {"test": "echo", "build:css": "custom"}}"#;
        let updated: Value = serde_json::from_str(&add_build_scripts(json).unwrap()).unwrap();
        let scripts = &updated["scripts"];
        assert_eq!(scripts["test"], "echo");
        assert_eq!(scripts["build:css"], "custom");
        assert!(
            scripts["watch:css"]
                .as_str()
                .unwrap()
                .contains("-o ./static/css/output.css --watch")
        );

        let fresh: Value = serde_json::from_str(&add_build_scripts(r#"{"name": "site"}"#).unwrap()).unwrap();
        assert!(fresh["scripts"]["build:css"].as_str().unwrap().ends_with("--minify"));
        assert!(add_build_scripts("[]").is_err());
    }

    #[test]
    fn commands_run_inside_install_dir() {
        let dir = tempfile::tempdir().unwrap();
        let install = install_in(&dir);
        let commands = install_commands(&ToolNames::default(), &install);
        let rendered: Vec<String> = commands.iter().map(ToolInvocation::render).collect();
        assert_eq!(
            rendered,
            vec![
                "npm init -y",
                "npm install --save-dev tailwindcss@3",
                "npx tailwindcss init",
            ]
        );
        assert!(commands.iter().all(|c| c.cwd.as_deref() == Some(install.as_path())));
    }

    #[test]
    fn wire_updates_existing_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let install = install_in(&dir);
        assert_eq!(wire(&install).unwrap(), Wiring::default());

        fs::write(install.join(CONFIG_JS), GENERATED).unwrap();
        fs::write(install.join(PACKAGE_JSON), "{\"name\": \"site\"}").unwrap();
        let wiring = wire(&install).unwrap();
        assert!(wiring.config_updated && wiring.scripts_updated);
        assert!(
            fs::read_to_string(install.join(PACKAGE_JSON))
                .unwrap()
                .contains("build:css")
        );
    }
}
