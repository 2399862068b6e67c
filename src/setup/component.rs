use crate::config::ToolNames;
use crate::tools::{ToolInvocation, ToolRunner};

/// Installation state of a requirement
#[derive(Debug, Clone, PartialEq)]
pub enum InstallState {
    NotInstalled,
    Installed { version: Option<String> },
}

/// An external dependency: how to detect it, how to install it, and what to ask first.
#[derive(Debug, Clone)]
pub struct Requirement {
    pub name: String,
    pub probe: ToolInvocation,
    pub install: Vec<ToolInvocation>,
    pub prompt: String,
    /// Shown when there is no installer or the user declines.
    pub hint: Option<String>,
}

impl Requirement {
    pub fn new(name: impl Into<String>, probe: ToolInvocation) -> Self {
        let name = name.into();
        Self {
            prompt: format!("Do you want to install '{}'?", name),
            name,
            probe,
            install: Vec::new(),
            hint: None,
        }
    }

    pub fn installed_by(mut self, steps: Vec<ToolInvocation>) -> Self {
        self.install = steps;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Detect installation state (side-effect free)
    pub fn detect(&self, runner: &dyn ToolRunner) -> InstallState {
        match runner.probe(&self.probe) {
            Some(version) if version.is_empty() => InstallState::Installed { version: None },
            Some(version) => InstallState::Installed {
                version: Some(version),
            },
            None => InstallState::NotInstalled,
        }
    }

    /// `snapd`, installed through apt.
    pub fn snapd(tools: &ToolNames) -> Self {
        Requirement::new("snapd", ToolInvocation::new(&tools.snap, ["--version"])).installed_by(vec![
            ToolInvocation::new(&tools.sudo, [tools.apt.as_str(), "update"]),
            ToolInvocation::new(&tools.sudo, [tools.apt.as_str(), "install", "snapd", "-y"]),
        ])
    }

    /// The `uv` environment manager, installed as the `astral-uv` snap.
    pub fn uv(tools: &ToolNames) -> Self {
        Requirement::new("uv", ToolInvocation::new(&tools.uv, ["--version"]))
            .installed_by(vec![ToolInvocation::new(
                &tools.sudo,
                [tools.snap.as_str(), "install", "astral-uv", "--classic"],
            )])
            .with_prompt("Do you want to install 'uv' (snap package 'astral-uv')?")
    }

    /// `npm` has no installer here; the user must provide it.
    pub fn npm(tools: &ToolNames) -> Self {
        Requirement::new("npm", ToolInvocation::new(&tools.npm, ["--version"]))
            .with_hint("please install Node.js and npm to set up Tailwind CSS")
    }
}
