use anyhow::{Context, Result, anyhow};
use camino::Utf8PathBuf;

use crate::cli::Cli;
use crate::config::{self, SetupConfig};
use crate::logging::Transcript;
use crate::names::ProjectNames;
use crate::paths::{self, InstallPath, PathValidator, ReservedNames};
use crate::prompt::{Prompter, StdioPrompter};
use crate::scaffold::{self, ScaffoldReport, ScaffoldWriter, django, tailwind};
use crate::setup::{self, Requirement};
use crate::templates::TemplateSet;
use crate::tools::{SystemRunner, ToolInvocation, ToolRunner};

const DIRECTORY_PROMPT: &str =
    "Enter the installation directory (relative or absolute path) for your Django project: ";

/// How the CSS pipeline question gets answered.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TailwindChoice {
    Skip,
    Install,
    Ask,
}

impl TailwindChoice {
    fn resolve(no_tailwind: bool, configured: Option<bool>) -> Self {
        match (no_tailwind, configured) {
            (true, _) | (false, Some(false)) => TailwindChoice::Skip,
            (false, Some(true)) => TailwindChoice::Install,
            (false, None) => TailwindChoice::Ask,
        }
    }
}

/// What a run produced.
#[derive(Debug)]
pub struct Summary {
    pub install: InstallPath,
    pub scaffold: ScaffoldReport,
    pub tailwind: bool,
}

pub fn run(cli: Cli) -> Result<()> {
    let names = ProjectNames::new(&cli.project_name, cli.app_name.as_deref())?;

    let loaded = config::load(cli.config.as_deref())?;
    match &loaded.path {
        Some(path) => tracing::debug!("using config {} ({})", path, loaded.source.as_str()),
        None => tracing::debug!("using {} config", loaded.source.as_str()),
    }
    let config = loaded.config;

    let cwd = current_working_dir()?;
    let home = paths::home_dir();
    let templates = match &config.template_dir {
        Some(dir) => {
            let dir = paths::expand_home(dir, home.as_deref())?;
            TemplateSet::with_overrides(cwd.join(dir))
        }
        None => TemplateSet::embedded(),
    };
    if let Some(dir) = templates.override_dir() {
        tracing::info!("template overrides from {}", dir);
    }

    let log_file = cli
        .log_file
        .map(|path| {
            Utf8PathBuf::from_path_buf(path).map_err(|_| anyhow!("log file path must be valid UTF-8"))
        })
        .transpose()?;
    let runner = SystemRunner::new(cli.dry_run, Transcript::new(log_file));
    let mut prompter = StdioPrompter::new(cli.yes);

    let mut orchestrator = Orchestrator {
        runner: &runner,
        prompter: &mut prompter,
        config: &config,
        templates,
        base: cwd,
        home,
        dry_run: cli.dry_run,
    };
    let summary = orchestrator.execute(
        &names,
        cli.dir.as_deref(),
        TailwindChoice::resolve(cli.no_tailwind, config.tailwind),
    )?;

    print_summary(&names, &summary, cli.dry_run);
    Ok(())
}

/// Sequences requirement checks, directory selection, project generation,
/// boilerplate and the optional CSS pipeline. The first failure ends the run.
pub struct Orchestrator<'a> {
    pub runner: &'a dyn ToolRunner,
    pub prompter: &'a mut dyn Prompter,
    pub config: &'a SetupConfig,
    pub templates: TemplateSet,
    /// Relative installation paths resolve against this directory.
    pub base: Utf8PathBuf,
    /// Target of a leading `~`; `None` makes such input an error.
    pub home: Option<Utf8PathBuf>,
    pub dry_run: bool,
}

impl Orchestrator<'_> {
    pub fn execute(
        &mut self,
        names: &ProjectNames,
        preset_dir: Option<&str>,
        css: TailwindChoice,
    ) -> Result<Summary> {
        let config = self.config;
        let tools = &config.tools;

        println!("Checking prerequisites");
        setup::ensure(&Requirement::snapd(tools), self.runner, &mut *self.prompter)?;
        setup::ensure(&Requirement::uv(tools), self.runner, &mut *self.prompter)?;

        let install = self.choose_install_path(preset_dir)?;
        println!("Installing into {}", install);

        println!("Initializing uv environment");
        for step in environment_commands(&tools.uv, &install) {
            self.runner.run(&step)?;
        }

        println!("Generating Django project `{}`", names.project());
        for step in generator_commands(&tools.uv, names, &install) {
            self.runner.run(&step)?;
        }

        let writer = ScaffoldWriter::new(self.dry_run);
        let plan = django::plan(&self.templates, names)?;
        println!("Writing boilerplate ({} entries)", plan.len());
        let report = writer
            .apply(install.as_path(), &plan)
            .context("writing Django boilerplate")?;
        print_report(&report, self.dry_run);

        let tailwind = self.css_pipeline(&install, &writer, css)?;

        Ok(Summary {
            install,
            scaffold: report,
            tailwind,
        })
    }

    fn choose_install_path(&mut self, preset: Option<&str>) -> Result<InstallPath> {
        let reserved = ReservedNames::with_extra(&self.config.extra_reserved_names);
        let validator = PathValidator::new(self.base.clone(), reserved).with_home(self.home.clone());
        let mut preset = preset.map(str::to_owned);

        loop {
            let raw = match preset.take() {
                Some(raw) => raw,
                None => self.prompter.ask(DIRECTORY_PROMPT)?,
            };

            let outcome = if self.dry_run {
                validator.check(&raw)
            } else {
                validator.validate(&raw)
            };

            match outcome {
                Ok(path) => return Ok(path),
                Err(err) if err.is_retryable() => {
                    println!("[warn] {}. Please choose another name.", err);
                }
                Err(err) => {
                    return Err(err).context("choosing the installation directory");
                }
            }
        }
    }

    /// Returns whether Tailwind was set up.
    fn css_pipeline(
        &mut self,
        install: &InstallPath,
        writer: &ScaffoldWriter,
        choice: TailwindChoice,
    ) -> Result<bool> {
        let wanted = match choice {
            TailwindChoice::Skip => false,
            TailwindChoice::Install => true,
            TailwindChoice::Ask => self.prompter.confirm("Do you want to install Tailwind CSS?")?,
        };
        if !wanted {
            println!(
                "Skipping Tailwind CSS installation. Only {} has been created.",
                django::STYLE_CSS
            );
            return Ok(false);
        }

        let config = self.config;
        let tools = &config.tools;
        setup::ensure(&Requirement::npm(tools), self.runner, &mut *self.prompter)?;

        println!("Installing Tailwind CSS");
        for step in tailwind::install_commands(tools, install) {
            self.runner.run(&step)?;
        }

        let report = writer
            .apply(install.as_path(), &tailwind::plan(&self.templates)?)
            .context("writing Tailwind stylesheet")?;
        print_report(&report, self.dry_run);

        if self.dry_run {
            println!(
                "  (dry-run) would configure {} and {}",
                tailwind::CONFIG_JS,
                tailwind::PACKAGE_JSON
            );
        } else {
            let wiring = tailwind::wire(install)?;
            if wiring.config_updated {
                println!("  updated {}", tailwind::CONFIG_JS);
            }
            if wiring.scripts_updated {
                println!("  updated {}", tailwind::PACKAGE_JSON);
            }
        }
        Ok(true)
    }
}

/// `uv init` and `uv add django`, run inside the installation directory.
pub fn environment_commands(uv: &str, install: &InstallPath) -> Vec<ToolInvocation> {
    vec![
        ToolInvocation::new(uv, ["init"]).in_dir(install.as_path()),
        ToolInvocation::new(uv, ["add", "django"]).in_dir(install.as_path()),
    ]
}

/// `startproject` into the installation directory, then `startapp` when an app is named.
pub fn generator_commands(uv: &str, names: &ProjectNames, install: &InstallPath) -> Vec<ToolInvocation> {
    let mut steps = vec![
        ToolInvocation::new(uv, ["run", "django-admin", "startproject", names.project(), "."])
            .in_dir(install.as_path()),
    ];
    if let Some(app) = names.app() {
        steps.push(
            ToolInvocation::new(uv, ["run", "python", "manage.py", "startapp", app])
                .in_dir(install.as_path()),
        );
    }
    steps
}

fn print_report(report: &ScaffoldReport, dry_run: bool) {
    let verb = if dry_run { "would create" } else { "created" };
    for (path, outcome) in report.entries() {
        match outcome {
            scaffold::Outcome::Created => println!("  {} {}", verb, path),
            scaffold::Outcome::AlreadyExisted => println!("  [skip] {} already exists", path),
        }
    }
}

fn print_summary(names: &ProjectNames, summary: &Summary, dry_run: bool) {
    if dry_run {
        println!(
            "\n[dry-run] {} entries would be created, {} already exist; nothing was changed.",
            summary.scaffold.created(),
            summary.scaffold.skipped()
        );
        return;
    }

    println!(
        "\n[ok] Django project `{}` is ready in {} ({} created, {} already existed).",
        names.project(),
        summary.install,
        summary.scaffold.created(),
        summary.scaffold.skipped()
    );
    println!("Next steps:");
    println!("  cd {}", summary.install);
    if summary.tailwind {
        println!("  npm run build:css");
    }
    println!("  uv run python manage.py runserver");
}

pub fn current_working_dir() -> Result<Utf8PathBuf> {
    let cwd = std::env::current_dir().context("determining current directory")?;
    Utf8PathBuf::from_path_buf(cwd).map_err(|_| anyhow!("current directory is not valid UTF-8"))
}
