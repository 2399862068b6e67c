use std::io::Write;
use std::sync::OnceLock;

use camino::Utf8PathBuf;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

static INIT: OnceLock<()> = OnceLock::new();

/// Initialize logging backends using `tracing`. `RUST_LOG` wins over `-v`.
pub fn init(verbose: u8) {
    INIT.get_or_init(|| {
        let level = match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        let subscriber = Registry::default()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr));
        if tracing::subscriber::set_global_default(subscriber).is_err() {
            // Ignore error if a subscriber is already set (e.g., tests).
        }
    });
}

/// Plain-text record of every external command, appended to `--log-file`.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    path: Option<Utf8PathBuf>,
}

impl Transcript {
    pub fn new(path: Option<Utf8PathBuf>) -> Self {
        Self { path }
    }

    pub fn record(&self, command: &str, status: &str, stdout: &str, stderr: &str) {
        let Some(path) = &self.path else {
            return;
        };

        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let mut content = format!(
            "\n== command: {} ==\ntime: {}\nstatus: {}\n",
            command, timestamp, status
        );
        if !stdout.is_empty() {
            content.push_str(&format!("stdout:\n{}\n", stdout));
        }
        if !stderr.is_empty() {
            content.push_str(&format!("stderr:\n{}\n", stderr));
        }

        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
        {
            Ok(mut file) => {
                if let Err(err) = file.write_all(content.as_bytes()) {
                    tracing::warn!("could not append to log file {}: {}", path, err);
                }
            }
            Err(err) => tracing::warn!("could not open log file {}: {}", path, err),
        }
    }
}
