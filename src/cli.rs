use std::path::PathBuf;

use clap::Parser;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "django-setup",
    version,
    about = "Bootstrap a Django project with uv, boilerplate templates and optional Tailwind CSS"
)]
pub struct Cli {
    /// Name of the Django project to create.
    pub project_name: String,
    /// Name of the Django app to create within the project.
    pub app_name: Option<String>,
    /// Skip Tailwind CSS installation.
    #[arg(long = "no-tailwind")]
    pub no_tailwind: bool,
    /// Installation directory; prompted for interactively when omitted.
    #[arg(short = 'd', long = "dir")]
    pub dir: Option<String>,
    /// Answer yes to every confirmation.
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,
    #[arg(short = 'n', long = "dry-run")]
    pub dry_run: bool,
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// Append a transcript of every external command to this file.
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Helper entry point so `main` can stay minimal.
pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_name_is_optional() {
        let cli = Cli::try_parse_from(["django-setup", "blog"]).unwrap();
        assert_eq!(cli.project_name, "blog");
        assert!(cli.app_name.is_none());
        assert!(!cli.no_tailwind);
    }

    #[test]
    fn parses_flags_and_app() {
        let cli = Cli::try_parse_from([
            "django-setup",
            "blog",
            "posts",
            "--no-tailwind",
            "--dir",
            "/tmp/site",
            "-y",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.app_name.as_deref(), Some("posts"));
        assert!(cli.no_tailwind);
        assert!(cli.yes);
        assert_eq!(cli.dir.as_deref(), Some("/tmp/site"));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn project_name_is_required() {
        assert!(Cli::try_parse_from(["django-setup"]).is_err());
    }
}
