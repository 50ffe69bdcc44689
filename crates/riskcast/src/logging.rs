use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default directives when `RUST_LOG` is unset.
pub fn default_filter(level: &str) -> String {
    format!("riskcast={level},riskcast_core=warn")
}

/// Open `path` for appending, creating missing parent directories.
fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Initialize tracing for the command-line tool.
///
/// Logs go to stderr so that a report written to stdout stays clean JSON. With
/// `log_file` they are appended to that file instead, without ANSI colours.
/// `RUST_LOG` overrides `level` when set.
pub fn init_logging(level: &str, log_file: Option<&Path>) -> color_eyre::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    match log_file {
        Some(path) => {
            let file = open_log_file(path)?;
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false)
                        .with_target(true),
                )
                .init();
            tracing::info!("logging initialized (log_path={})", path.display());
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true),
                )
                .init();
        }
    }
    Ok(())
}
