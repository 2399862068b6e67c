use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

use crate::error::InvalidPath;
use crate::util;

/// Directory basenames that collide with Django or tool-internal names.
pub const DEFAULT_RESERVED: &[&str] = &[
    "test",
    "django",
    "site",
    "admin",
    "main",
    "manage",
    "static",
    "templates",
    "media",
];

/// Case-insensitive set of reserved directory names.
#[derive(Debug, Clone)]
pub struct ReservedNames(BTreeSet<String>);

impl ReservedNames {
    /// Defaults plus any configured extras. Defaults can't be removed.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: BTreeSet<String> = DEFAULT_RESERVED.iter().map(|s| (*s).to_owned()).collect();
        names.extend(extra.into_iter().map(|s| s.as_ref().to_lowercase()));
        Self(names)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(&name.to_lowercase())
    }
}

impl Default for ReservedNames {
    fn default() -> Self {
        Self::with_extra(std::iter::empty::<&str>())
    }
}

/// Absolute, validated installation directory. Every later step works
/// relative to this path instead of the process working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPath(Utf8PathBuf);

impl InstallPath {
    pub fn as_path(&self) -> &Utf8Path {
        &self.0
    }

    pub fn join(&self, relative: impl AsRef<Utf8Path>) -> Utf8PathBuf {
        self.0.join(relative)
    }
}

impl fmt::Display for InstallPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<Utf8Path> for InstallPath {
    fn as_ref(&self) -> &Utf8Path {
        &self.0
    }
}

/// Resolves user input against an explicit base directory.
#[derive(Debug, Clone)]
pub struct PathValidator {
    base: Utf8PathBuf,
    home: Option<Utf8PathBuf>,
    reserved: ReservedNames,
}

impl PathValidator {
    /// A leading `~` is rejected until a home is supplied with [`Self::with_home`].
    pub fn new(base: Utf8PathBuf, reserved: ReservedNames) -> Self {
        Self {
            base,
            home: None,
            reserved,
        }
    }

    pub fn with_home(mut self, home: Option<Utf8PathBuf>) -> Self {
        self.home = home;
        self
    }

    /// Run every check without touching the filesystem.
    pub fn check(&self, raw: &str) -> Result<InstallPath, InvalidPath> {
        let input = raw.trim();
        if input.is_empty() {
            return Err(InvalidPath::Empty);
        }
        if input.chars().any(char::is_whitespace) {
            return Err(InvalidPath::ContainsSpace {
                input: input.to_owned(),
            });
        }

        let expanded = expand_home(input, self.home.as_deref())?;
        let resolved = normalize(&self.base.join(expanded));

        match fs::metadata(&resolved) {
            Ok(meta) if meta.is_dir() => {
                let occupied = util::fs::has_entries(resolved.as_std_path()).map_err(|source| {
                    InvalidPath::Io {
                        path: resolved.clone(),
                        source,
                    }
                })?;
                if occupied {
                    return Err(InvalidPath::NotEmpty { path: resolved });
                }
            }
            Ok(_) => return Err(InvalidPath::NotADirectory { path: resolved }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(InvalidPath::Io {
                    path: resolved,
                    source,
                });
            }
        }

        if let Some(name) = resolved.file_name() {
            if self.reserved.contains(name) {
                return Err(InvalidPath::ReservedName {
                    name: name.to_owned(),
                });
            }
        }

        Ok(InstallPath(resolved))
    }

    /// Check the input, then create the directory and any missing ancestors.
    pub fn validate(&self, raw: &str) -> Result<InstallPath, InvalidPath> {
        let path = self.check(raw)?;
        util::fs::ensure_dir(path.as_path().as_std_path()).map_err(|source| InvalidPath::Io {
            path: path.as_path().to_owned(),
            source,
        })?;
        tracing::debug!("installation directory ready at {}", path);
        Ok(path)
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(input: &str, home: Option<&Utf8Path>) -> Result<Utf8PathBuf, InvalidPath> {
    let rest = if input == "~" {
        ""
    } else if let Some(rest) = input.strip_prefix("~/") {
        rest
    } else {
        return Ok(Utf8PathBuf::from(input));
    };

    let home = home.ok_or(InvalidPath::NoHome)?;
    Ok(home.join(rest))
}

pub fn home_dir() -> Option<Utf8PathBuf> {
    dirs::home_dir().and_then(|dir| Utf8PathBuf::from_path_buf(dir).ok())
}

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Utf8Path) -> Utf8PathBuf {
    let mut out = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn validator(root: &TempDir) -> PathValidator {
        let base = Utf8PathBuf::from_path_buf(root.path().to_path_buf()).unwrap();
        PathValidator::new(base, ReservedNames::default()).with_home(None)
    }

    fn entry_count(root: &TempDir) -> usize {
        fs::read_dir(root.path()).unwrap().count()
    }

    #[test]
    fn creates_relative_directory_against_base() {
        let root = TempDir::new().unwrap();
        let path = validator(&root).validate("sites/blog_site").unwrap();

        assert!(path.as_path().is_absolute());
        assert!(path.as_path().ends_with("sites/blog_site"));
        assert!(path.as_path().is_dir());
    }

    #[test]
    fn accepts_existing_empty_directory() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("empty")).unwrap();
        let path = validator(&root).validate("empty").unwrap();
        assert!(path.as_path().is_dir());
    }

    #[test]
    fn rejects_whitespace_without_creating_anything() {
        let root = TempDir::new().unwrap();
        for input in ["my project", "a\tb", "dir/with space/x"] {
            let err = validator(&root).validate(input).unwrap_err();
            assert!(matches!(err, InvalidPath::ContainsSpace { .. }), "{input:?}");
        }
        assert_eq!(entry_count(&root), 0);
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let root = TempDir::new().unwrap();
        let path = validator(&root).validate("  padded  \n").unwrap();
        assert!(path.as_path().ends_with("padded"));
    }

    #[test]
    fn rejects_reserved_names_case_insensitively() {
        let root = TempDir::new().unwrap();
        let validator = validator(&root);
        for input in ["admin", "Static", "nested/TEMPLATES", "django", "./media"] {
            let err = validator.validate(input).unwrap_err();
            assert!(matches!(err, InvalidPath::ReservedName { .. }), "{input:?}");
            assert!(err.is_retryable());
        }
        assert_eq!(entry_count(&root), 0);

        // Re-prompting with a non-reserved name succeeds.
        assert!(validator.validate("admin_site").is_ok());
    }

    #[test]
    fn configured_extras_extend_reserved_set() {
        let root = TempDir::new().unwrap();
        let base = Utf8PathBuf::from_path_buf(root.path().to_path_buf()).unwrap();
        let validator = PathValidator::new(base, ReservedNames::with_extra(["Blog"])).with_home(None);
        assert!(matches!(
            validator.check("blog"),
            Err(InvalidPath::ReservedName { .. })
        ));
        assert!(matches!(
            validator.check("admin"),
            Err(InvalidPath::ReservedName { .. })
        ));
    }

    #[test]
    fn rejects_non_empty_directory() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("taken")).unwrap();
        fs::write(root.path().join("taken/readme.txt"), "hi").unwrap();

        let err = validator(&root).validate("taken").unwrap_err();
        assert!(matches!(err, InvalidPath::NotEmpty { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn rejects_existing_file() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("file"), "").unwrap();
        let err = validator(&root).validate("file").unwrap_err();
        assert!(matches!(err, InvalidPath::NotADirectory { .. }));
    }

    #[test]
    fn empty_input_is_retryable() {
        let root = TempDir::new().unwrap();
        let err = validator(&root).validate("   ").unwrap_err();
        assert!(matches!(err, InvalidPath::Empty));
        assert!(err.is_retryable());
    }

    #[test]
    fn check_does_not_create() {
        let root = TempDir::new().unwrap();
        let path = validator(&root).check("later").unwrap();
        assert!(!path.as_path().exists());
    }

    #[test]
    fn normalizes_dot_segments() {
        let root = TempDir::new().unwrap();
        let path = validator(&root).check("a/./b/../c").unwrap();
        assert!(path.as_path().ends_with("a/c"));
        assert!(!path.as_path().as_str().contains(".."));
    }

    #[test]
    fn expands_home_prefix() {
        let home = Utf8Path::new("/home/dev");
        assert_eq!(expand_home("~", Some(home)).unwrap(), home);
        assert_eq!(
            expand_home("~/sites/blog", Some(home)).unwrap(),
            Utf8PathBuf::from("/home/dev/sites/blog")
        );
        assert_eq!(expand_home("rel", None).unwrap(), Utf8PathBuf::from("rel"));
        assert!(matches!(expand_home("~/x", None), Err(InvalidPath::NoHome)));
    }
}
