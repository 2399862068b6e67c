use anyhow::Result;

use super::ScaffoldPlan;
use crate::names::ProjectNames;
use crate::templates::TemplateSet;

const APP_PAGES: &[&str] = &["index", "about", "contact", "privacy", "portfolio"];

pub const STYLE_CSS: &str = "static/css/style.css";

/// Project-level boilerplate plus, when an app is named, its templates and modules.
pub fn plan(templates: &TemplateSet, names: &ProjectNames) -> Result<ScaffoldPlan> {
    let project_vars = [("PROJECT_NAME", names.project())];
    let env = templates.get("django/env")?;

    let mut plan = ScaffoldPlan::new()
        .dir("templates/partials")
        .dir("static/css")
        .dir("static/js")
        .dir("static/img")
        .file(
            "templates/base.html",
            templates.render("django/base.html", &project_vars)?,
        )
        .file(STYLE_CSS, templates.get("django/style.css")?)
        .file(".env", env.clone())
        .file(".env-template", env);

    if let Some(app) = names.app() {
        let vars = [("PROJECT_NAME", names.project()), ("APP_NAME", app)];
        let page_dir = format!("{app}/templates/{app}");
        plan = plan.dir(page_dir.as_str());
        for page in APP_PAGES {
            plan = plan.file(
                format!("{page_dir}/{page}.html"),
                templates.render(&format!("django/app/{page}.html"), &vars)?,
            );
        }
        plan = plan
            .file(
                format!("{app}/urls.py"),
                templates.render("django/app/urls.py", &vars)?,
            )
            .file(
                format!("{app}/forms.py"),
                templates.render("django/app/forms.py", &vars)?,
            );
    }

    Ok(plan)
}
