use std::io::{self, BufRead, BufReader, Write};
use std::process::{Command as ProcessCommand, Stdio};
use std::thread;
use std::time::Instant;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::ToolFailure;
use crate::logging::Transcript;

/// Lines of stderr kept for failure reports.
const STDERR_TAIL: usize = 10;

/// One external command: program, arguments, optional stdin and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
    pub cwd: Option<Utf8PathBuf>,
}

impl ToolInvocation {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            stdin: None,
            cwd: None,
        }
    }

    #[cfg(test)]
    pub fn with_stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn in_dir(mut self, dir: &Utf8Path) -> Self {
        self.cwd = Some(dir.to_owned());
        self
    }

    /// Shell-like rendering for logs and error messages.
    pub fn render(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|arg| {
                if arg.chars().any(|c| c.is_whitespace()) {
                    let escaped = arg.replace('"', "\\\"");
                    format!("\"{}\"", escaped)
                } else {
                    arg.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Runs external commands on behalf of the setup pipeline.
pub trait ToolRunner {
    /// Run to completion; a missing executable or non-zero exit is a failure.
    fn run(&self, invocation: &ToolInvocation) -> Result<(), ToolFailure>;

    /// Run silently and report the first line of stdout on success.
    fn probe(&self, invocation: &ToolInvocation) -> Option<String>;
}

/// [`ToolRunner`] backed by real child processes.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    dry_run: bool,
    transcript: Transcript,
}

impl SystemRunner {
    pub fn new(dry_run: bool, transcript: Transcript) -> Self {
        Self {
            dry_run,
            transcript,
        }
    }
}

impl ToolRunner for SystemRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<(), ToolFailure> {
        let render = invocation.render();
        println!("  -> {}", render);

        if self.dry_run {
            println!("     (dry-run) skipped");
            return Ok(());
        }

        let start = Instant::now();
        let output = run_streaming(invocation)?;
        let status = if output.success { "ok" } else { "error" };
        self.transcript
            .record(&render, status, &output.stdout, &output.stderr.join("\n"));

        if output.success {
            tracing::debug!("`{}` completed in {:.2?}", render, start.elapsed());
            println!("     [ok]");
            return Ok(());
        }

        let skip = output.stderr.len().saturating_sub(STDERR_TAIL);
        Err(ToolFailure::Exit {
            name: invocation.program.clone(),
            command: render,
            exit_code: output.code,
            stderr_tail: output.stderr.into_iter().skip(skip).collect(),
        })
    }

    fn probe(&self, invocation: &ToolInvocation) -> Option<String> {
        let mut command = ProcessCommand::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stderr(Stdio::null());
        if let Some(dir) = &invocation.cwd {
            command.current_dir(dir);
        }

        let output = command.output().ok()?;
        if !output.status.success() {
            tracing::debug!("probe `{}` exited with {}", invocation.render(), output.status);
            return None;
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Some(stdout.lines().next().unwrap_or_default().trim().to_owned())
    }
}

struct Captured {
    success: bool,
    code: Option<i32>,
    stdout: String,
    stderr: Vec<String>,
}

fn run_streaming(invocation: &ToolInvocation) -> Result<Captured, ToolFailure> {
    let render = invocation.render();
    let mut command = ProcessCommand::new(&invocation.program);
    command
        .args(&invocation.args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if invocation.stdin.is_some() {
        command.stdin(Stdio::piped());
    }
    if let Some(dir) = &invocation.cwd {
        command.current_dir(dir);
    }

    let mut child = command.spawn().map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ToolFailure::Missing {
                name: invocation.program.clone(),
            }
        } else {
            ToolFailure::Io {
                command: render.clone(),
                source,
            }
        }
    })?;

    let stdout_handle = child.stdout.take().map(|pipe| {
        thread::spawn(move || {
            let mut captured = String::new();
            for line in BufReader::new(pipe).lines().map_while(Result::ok) {
                println!("     stdout | {}", line);
                captured.push_str(&line);
                captured.push('\n');
            }
            captured
        })
    });

    let stderr_handle = child.stderr.take().map(|pipe| {
        thread::spawn(move || {
            let mut lines = Vec::new();
            for line in BufReader::new(pipe).lines().map_while(Result::ok) {
                println!("     stderr | {}", line);
                lines.push(line);
            }
            lines
        })
    });

    if let (Some(input), Some(mut pipe)) = (&invocation.stdin, child.stdin.take()) {
        // The child may exit without draining stdin; its status decides the outcome.
        if let Err(err) = pipe.write_all(input.as_bytes()) {
            tracing::debug!("writing stdin to `{}`: {}", render, err);
        }
    }

    let stdout = stdout_handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();
    let stderr = stderr_handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();

    let status = child.wait().map_err(|source| ToolFailure::Io {
        command: render.clone(),
        source,
    })?;

    Ok(Captured {
        success: status.success(),
        code: status.code(),
        stdout,
        stderr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_quotes_whitespace_arguments() {
        let invocation = ToolInvocation::new("uv", ["run", "say \"hi\" there"]);
        assert_eq!(invocation.render(), "uv run \"say \\\"hi\\\" there\"");
        assert_eq!(
            ToolInvocation::new("npm", ["init", "-y"]).render(),
            "npm init -y"
        );
    }

    #[test]
    fn builders_set_stdin_and_dir() {
        let invocation = ToolInvocation::new("sh", Vec::<String>::new())
            .with_stdin("exit 0\n")
            .in_dir(Utf8Path::new("/tmp"));
        assert_eq!(invocation.stdin.as_deref(), Some("exit 0\n"));
        assert_eq!(invocation.cwd.as_deref(), Some(Utf8Path::new("/tmp")));
    }

    #[test]
    fn missing_executable_is_reported() {
        let runner = SystemRunner::default();
        let err = runner
            .run(&ToolInvocation::new(
                "definitely-not-a-real-tool-4711",
                Vec::<String>::new(),
            ))
            .unwrap_err();
        assert!(matches!(err, ToolFailure::Missing { ref name } if name == "definitely-not-a-real-tool-4711"));
        assert!(
            runner
                .probe(&ToolInvocation::new("definitely-not-a-real-tool-4711", ["--version"]))
                .is_none()
        );
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_keeps_stderr_tail() {
        let runner = SystemRunner::default();
        let script = "for i in 1 2 3 4 5 6 7 8 9 10 11 12; do echo line$i >&2; done; exit 3";
        let err = runner
            .run(&ToolInvocation::new("sh", ["-c", script]))
            .unwrap_err();
        match err {
            ToolFailure::Exit {
                name,
                exit_code,
                stderr_tail,
                ..
            } => {
                assert_eq!(name, "sh");
                assert_eq!(exit_code, Some(3));
                assert_eq!(stderr_tail.len(), STDERR_TAIL);
                assert_eq!(stderr_tail.first().map(String::as_str), Some("line3"));
                assert_eq!(stderr_tail.last().map(String::as_str), Some("line12"));
            }
            other => panic!("unexpected failure: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn feeds_stdin_and_honours_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let cwd = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let runner = SystemRunner::default();
        runner
            .run(
                &ToolInvocation::new("sh", Vec::<String>::new())
                    .with_stdin("echo piped > out.txt\n")
                    .in_dir(&cwd),
            )
            .unwrap();
        let written = std::fs::read_to_string(dir.path().join("out.txt")).unwrap();
        assert_eq!(written.trim(), "piped");
    }

    #[cfg(unix)]
    #[test]
    fn probe_returns_first_stdout_line() {
        let runner = SystemRunner::default();
        let version = runner.probe(&ToolInvocation::new("sh", ["-c", "echo 'tool 1.2.3'; echo more"]));
        assert_eq!(version.as_deref(), Some("tool 1.2.3"));
        assert!(runner.probe(&ToolInvocation::new("sh", ["-c", "exit 1"])).is_none());
    }

    #[test]
    fn dry_run_does_not_spawn() {
        let runner = SystemRunner::new(true, Transcript::default());
        runner
            .run(&ToolInvocation::new(
                "definitely-not-a-real-tool-4711",
                Vec::<String>::new(),
            ))
            .unwrap();
    }
}
