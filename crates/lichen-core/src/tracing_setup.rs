use std::fs::OpenOptions;
use std::path::PathBuf;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize tracing for the TUI process.
///
/// The terminal owns stdout, so there is no console layer; logging goes to a
/// file. `LICHEN_LOG_FILE` overrides the default location under the user's
/// local data directory. Level filtering follows `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = log_file_path().and_then(|log_path| {
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match OpenOptions::new().create(true).append(true).open(&log_path) {
            Ok(file) => Some(
                fmt::layer()
                    .with_writer(file)
                    .with_ansi(false)
                    .with_target(true)
                    .boxed(),
            ),
            Err(err) => {
                eprintln!("failed to open log file {}: {}", log_path.display(), err);
                None
            }
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();
}

fn log_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("LICHEN_LOG_FILE") {
        return Some(PathBuf::from(path));
    }
    dirs::data_local_dir().map(|dir| dir.join("lichen").join("lichen.log"))
}
