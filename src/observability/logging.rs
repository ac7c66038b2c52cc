use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FILE_PREFIX: &str = "esg-reports.log";
const DEFAULT_FILTER: &str = "esg_report_client=info,warn";

/// Console logging on stderr plus a daily-rotated JSON file under `log_dir`.
///
/// When `log_dir` cannot be created, logging continues on the console only.
/// A second call keeps the first subscriber.
pub fn init_logging(log_dir: &Path) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // stdout is reserved for command output
    let console = fmt::layer().with_target(true).with_writer(std::io::stderr);

    let file = match std::fs::create_dir_all(log_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            // Flushes on drop; the process lifetime owns it
            std::mem::forget(guard);
            Some(fmt::layer().json().with_current_span(false).with_writer(writer))
        }
        Err(e) => {
            eprintln!("⚠️  Log directory {} unavailable ({}), logging to console only", log_dir.display(), e);
            None
        }
    };

    let _ = tracing_subscriber::registry().with(filter).with(file).with(console).try_init();
}
