pub mod django;
pub mod tailwind;

use std::fs::OpenOptions;
use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::FileSystemError;
use crate::util;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Dir,
    File(String),
}

/// Ordered relative paths mapped to file contents or bare directories.
#[derive(Debug, Clone, Default)]
pub struct ScaffoldPlan {
    entries: Vec<(Utf8PathBuf, Entry)>,
}

impl ScaffoldPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dir(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.entries.push((path.into(), Entry::Dir));
        self
    }

    pub fn file(mut self, path: impl Into<Utf8PathBuf>, contents: impl Into<String>) -> Self {
        self.entries.push((path.into(), Entry::File(contents.into())));
        self
    }

    pub fn entries(&self) -> &[(Utf8PathBuf, Entry)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    AlreadyExisted,
}

/// Per-entry outcome of applying a plan.
#[derive(Debug, Default)]
pub struct ScaffoldReport {
    entries: Vec<(Utf8PathBuf, Outcome)>,
}

impl ScaffoldReport {
    pub fn entries(&self) -> &[(Utf8PathBuf, Outcome)] {
        &self.entries
    }

    #[cfg(test)]
    pub fn outcome(&self, path: &Utf8Path) -> Option<Outcome> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == path)
            .map(|(_, outcome)| *outcome)
    }

    pub fn created(&self) -> usize {
        self.count(Outcome::Created)
    }

    pub fn skipped(&self) -> usize {
        self.count(Outcome::AlreadyExisted)
    }

    fn count(&self, wanted: Outcome) -> usize {
        self.entries.iter().filter(|(_, outcome)| *outcome == wanted).count()
    }
}

/// Applies plans below a base directory. Existing files are never touched.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScaffoldWriter {
    dry_run: bool,
}

impl ScaffoldWriter {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Stops at the first I/O error; entries written before it stay on disk.
    pub fn apply(&self, base: &Utf8Path, plan: &ScaffoldPlan) -> Result<ScaffoldReport, FileSystemError> {
        let mut report = ScaffoldReport::default();
        for (relative, entry) in plan.entries() {
            let target = base.join(relative);
            let outcome = match entry {
                Entry::Dir => self.ensure_dir(&target)?,
                Entry::File(contents) => self.ensure_file(&target, contents)?,
            };
            tracing::debug!("{} {:?}", target, outcome);
            report.entries.push((relative.clone(), outcome));
        }
        Ok(report)
    }

    fn ensure_dir(&self, target: &Utf8Path) -> Result<Outcome, FileSystemError> {
        if self.dry_run {
            return Ok(if target.is_dir() {
                Outcome::AlreadyExisted
            } else {
                Outcome::Created
            });
        }

        let created = util::fs::ensure_dir(target.as_std_path())
            .map_err(|source| FileSystemError::new(target, source))?;
        Ok(if created {
            Outcome::Created
        } else {
            Outcome::AlreadyExisted
        })
    }

    fn ensure_file(&self, target: &Utf8Path, contents: &str) -> Result<Outcome, FileSystemError> {
        if self.dry_run {
            return Ok(if target.exists() {
                Outcome::AlreadyExisted
            } else {
                Outcome::Created
            });
        }

        if let Some(parent) = target.parent() {
            util::fs::ensure_dir(parent.as_std_path())
                .map_err(|source| FileSystemError::new(parent, source))?;
        }

        // `create_new` refuses to clobber a file that appeared since the plan was built.
        let mut file = match OpenOptions::new().write(true).create_new(true).open(target) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                return Ok(Outcome::AlreadyExisted);
            }
            Err(source) => return Err(FileSystemError::new(target, source)),
        };
        file.write_all(contents.as_bytes())
            .map_err(|source| FileSystemError::new(target, source))?;
        Ok(Outcome::Created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn base(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    fn sample_plan() -> ScaffoldPlan {
        ScaffoldPlan::new()
            .dir("templates/partials")
            .file("templates/base.html", "<!-- base -->")
            .file("deep/nested/only/file.txt", "implied parents")
    }

    #[test]
    fn creates_directories_and_implied_parents() {
        let dir = TempDir::new().unwrap();
        let report = ScaffoldWriter::default().apply(&base(&dir), &sample_plan()).unwrap();

        assert_eq!(report.created(), 3);
        assert_eq!(report.skipped(), 0);
        assert!(dir.path().join("templates/partials").is_dir());
        assert_eq!(
            fs::read_to_string(dir.path().join("deep/nested/only/file.txt")).unwrap(),
            "implied parents"
        );
    }

    #[test]
    fn second_run_skips_everything_and_keeps_edits() {
        let dir = TempDir::new().unwrap();
        let writer = ScaffoldWriter::default();
        writer.apply(&base(&dir), &sample_plan()).unwrap();

        let edited = dir.path().join("templates/base.html");
        fs::write(&edited, "user edit").unwrap();

        let report = writer.apply(&base(&dir), &sample_plan()).unwrap();
        assert_eq!(report.created(), 0);
        assert_eq!(report.skipped(), 3);
        assert_eq!(
            report.outcome(Utf8Path::new("templates/base.html")),
            Some(Outcome::AlreadyExisted)
        );
        assert_eq!(fs::read_to_string(&edited).unwrap(), "user edit");
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let report = ScaffoldWriter::new(true).apply(&base(&dir), &sample_plan()).unwrap();
        assert_eq!(report.created(), 3);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn reports_offending_path_on_failure() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("blocker"), "a file, not a directory").unwrap();
        let plan = ScaffoldPlan::new()
            .file("first.txt", "ok")
            .file("blocker/inner.txt", "cannot be written");

        let err = ScaffoldWriter::default().apply(&base(&dir), &plan).unwrap_err();
        assert!(err.path.ends_with("blocker"));
        // No rollback of earlier entries.
        assert!(dir.path().join("first.txt").exists());
    }
}
