mod cli;
mod config;
mod error;
mod logging;
mod names;
mod paths;
mod prompt;
mod runner;
mod scaffold;
mod setup;
mod templates;
mod tools;
mod util;

fn main() -> anyhow::Result<()> {
    let app = cli::parse();
    logging::init(app.verbose);
    runner::run(app)
}
