use std::path::Path;
use tracing::info;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging: daily-rotated file plus console. The console layer
/// writes to stderr so log lines never interleave with the interactive
/// prompt on stdout. Falls back to console-only when the log directory is
/// not writable. Level is controlled via RUST_LOG, default `info`.
pub fn init_service_logging(log_dir: &str, service_name: &str) -> Result<(), anyhow::Error> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let probe = format!("{log_dir}/.write_probe");
    let can_write_logs = std::fs::create_dir_all(log_dir)
        .and_then(|_| std::fs::File::create(&probe))
        .map(|_| std::fs::remove_file(&probe))
        .is_ok();

    let (console_writer, console_guard) = non_blocking(std::io::stderr());

    if can_write_logs {
        let console_layer = fmt::layer()
            .with_writer(console_writer)
            .with_ansi(true)
            .with_target(false)
            .with_thread_ids(false)
            .with_line_number(false);

        let _ = archive_previous_log(log_dir, service_name);

        let file_appender = rolling::daily(log_dir, format!("{service_name}.log"));
        let (file_writer, file_guard) = non_blocking(file_appender);

        let file_layer = fmt::layer()
            .with_writer(file_writer)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .with(console_layer)
            .init();

        // Guards must outlive the process for the non-blocking writers to flush.
        std::mem::forget(file_guard);
        std::mem::forget(console_guard);

        info!("Logging initialized - writing to {log_dir}/{service_name}.log");
    } else {
        let console_layer = fmt::layer()
            .with_writer(console_writer)
            .with_ansi(true)
            .with_target(false)
            .with_thread_ids(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();

        std::mem::forget(console_guard);

        info!("Logging initialized - console only (log directory not writable)");
    }

    Ok(())
}

/// Move any log file left by a previous run aside with a timestamp so each
/// session starts with a fresh file.
fn archive_previous_log(log_dir: &str, service_name: &str) -> Result<(), anyhow::Error> {
    let log_file = format!("{log_dir}/{service_name}.log");
    if Path::new(&log_file).exists() {
        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let backup_file = format!("{log_dir}/{service_name}.{timestamp}.log");
        std::fs::rename(&log_file, &backup_file)?;
        info!("Previous log file moved to: {backup_file}");
    }
    Ok(())
}
