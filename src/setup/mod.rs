mod component;

pub use component::{InstallState, Requirement};

use crate::error::SetupError;
use crate::prompt::Prompter;
use crate::tools::ToolRunner;

/// Make sure `requirement` is present: probe it, and if missing ask before
/// running its installer. Declining or a failed install aborts the run.
pub fn ensure(
    requirement: &Requirement,
    runner: &dyn ToolRunner,
    prompter: &mut dyn Prompter,
) -> Result<InstallState, SetupError> {
    let state = requirement.detect(runner);
    if let InstallState::Installed { version } = &state {
        match version {
            Some(v) => println!("[skip] '{}' already installed ({})", requirement.name, v),
            None => println!("[skip] '{}' already installed", requirement.name),
        }
        return Ok(state);
    }

    println!("[warn] '{}' is not found, it needs to be installed.", requirement.name);

    if requirement.install.is_empty() {
        return Err(SetupError::Unavailable {
            name: requirement.name.clone(),
            hint: requirement
                .hint
                .clone()
                .unwrap_or_else(|| "install it and rerun".to_owned()),
        });
    }

    if !prompter.confirm(&requirement.prompt)? {
        return Err(SetupError::Declined {
            name: requirement.name.clone(),
        });
    }

    for step in &requirement.install {
        runner.run(step)?;
    }

    tracing::info!("'{}' installed", requirement.name);
    println!("[ok] '{}' installed successfully.", requirement.name);
    Ok(InstallState::Installed { version: None })
}
