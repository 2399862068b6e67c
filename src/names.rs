use std::sync::LazyLock;

use regex::Regex;

use crate::error::InvalidName;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// Names `django-admin` refuses because they shadow keywords or importable modules.
const CONFLICTING: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield", "django", "test", "site", "os", "sys", "json", "string",
    "random", "time", "logging", "email", "http", "types", "typing", "code",
];

/// Project name plus optional app name, both valid Python package identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectNames {
    project: String,
    app: Option<String>,
}

impl ProjectNames {
    pub fn new(project: &str, app: Option<&str>) -> Result<Self, InvalidName> {
        check("project", project)?;
        if let Some(app) = app {
            check("app", app)?;
            if app == project {
                return Err(InvalidName::SameAsProject {
                    name: app.to_owned(),
                });
            }
        }

        Ok(Self {
            project: project.to_owned(),
            app: app.map(str::to_owned),
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn app(&self) -> Option<&str> {
        self.app.as_deref()
    }
}

fn check(kind: &'static str, name: &str) -> Result<(), InvalidName> {
    if !IDENTIFIER.is_match(name) {
        return Err(InvalidName::NotIdentifier {
            kind,
            name: name.to_owned(),
        });
    }
    if CONFLICTING.contains(&name) {
        return Err(InvalidName::Conflicts {
            kind,
            name: name.to_owned(),
        });
    }
    Ok(())
}
