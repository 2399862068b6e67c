//! Typed failures for the setup pipeline.
//!
//! Only [`InvalidPath::is_retryable`] failures lead to a re-prompt; everything
//! else aborts the run.

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Rejections raised while validating the installation directory.
#[derive(Debug, Error)]
pub enum InvalidPath {
    #[error("directory names cannot contain spaces (`{input}`); use hyphens or underscores instead")]
    ContainsSpace { input: String },

    #[error("no installation directory given")]
    Empty,

    #[error("the directory `{path}` already exists and is not empty")]
    NotEmpty { path: Utf8PathBuf },

    #[error("`{path}` already exists and is not a directory")]
    NotADirectory { path: Utf8PathBuf },

    #[error("the directory name `{name}` is reserved and cannot be used")]
    ReservedName { name: String },

    #[error("home directory is unavailable or not valid UTF-8")]
    NoHome,

    #[error("failed to create or inspect `{path}`")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
}

impl InvalidPath {
    /// Whether the user should be asked for another directory.
    pub fn is_retryable(&self) -> bool {
        matches!(self, InvalidPath::ReservedName { .. } | InvalidPath::Empty)
    }
}

/// An external command could not be run or exited unsuccessfully.
#[derive(Debug, Error)]
pub enum ToolFailure {
    #[error("`{name}` was not found; is it installed and on PATH?")]
    Missing { name: String },

    #[error("`{command}` failed ({}){}", exit_label(.exit_code), tail_suffix(.stderr_tail))]
    Exit {
        name: String,
        command: String,
        exit_code: Option<i32>,
        stderr_tail: Vec<String>,
    },

    #[error("failed to run `{command}`")]
    Io {
        command: String,
        #[source]
        source: io::Error,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_owned(),
    }
}

fn tail_suffix(tail: &[String]) -> String {
    if tail.is_empty() {
        String::new()
    } else {
        format!(":\n  {}", tail.join("\n  "))
    }
}

/// I/O failure while scaffolding, carrying the offending path.
#[derive(Debug, Error)]
#[error("filesystem error at `{path}`")]
pub struct FileSystemError {
    pub path: Utf8PathBuf,
    #[source]
    pub source: io::Error,
}

impl FileSystemError {
    pub fn new(path: impl Into<Utf8PathBuf>, source: io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// Failures while ensuring external requirements are present.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("installation of `{name}` aborted by the user")]
    Declined { name: String },

    #[error("`{name}` is required but not installed; {hint}")]
    Unavailable { name: String, hint: String },

    #[error(transparent)]
    Tool(#[from] ToolFailure),

    #[error("reading from the terminal")]
    Prompt(#[from] io::Error),
}

/// Project or app names the project generator would reject.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidName {
    #[error("{kind} name `{name}` must start with a letter or underscore and contain only letters, digits and underscores")]
    NotIdentifier { kind: &'static str, name: String },

    #[error("{kind} name `{name}` conflicts with a Python keyword or module")]
    Conflicts { kind: &'static str, name: String },

    #[error("app name `{name}` must differ from the project name")]
    SameAsProject { name: String },
}
