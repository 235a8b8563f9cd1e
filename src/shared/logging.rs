use std::path::Path;
use tracing::info;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Sets up the global subscriber: a daily-rolling file under `log_dir` and,
/// when `console` is set, coloured stdout. `RUST_LOG` overrides the `info`
/// default.
pub fn init_logging(log_dir: &str, service_name: &str, console: bool) -> Result<(), anyhow::Error> {
    let _ = rotate_logs_on_startup(log_dir, service_name);
    std::fs::create_dir_all(log_dir)?;

    let file_appender = rolling::daily(log_dir, format!("{service_name}.log"));
    let (non_blocking_file, file_guard) = non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Console output is optional so CLI commands can keep stdout for events.
    let console_layer = if console {
        let (non_blocking_stdout, stdout_guard) = non_blocking(std::io::stdout());
        std::mem::forget(stdout_guard);
        Some(
            fmt::layer()
                .with_writer(non_blocking_stdout)
                .with_ansi(true)
                .with_target(false),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    // Guards must live for the whole process.
    std::mem::forget(file_guard);

    info!("Logging initialized - logs will be written to {log_dir}/{service_name}.log");
    Ok(())
}

pub fn rotate_logs_on_startup(log_dir: &str, service_name: &str) -> Result<(), anyhow::Error> {
    let log_file = format!("{log_dir}/{service_name}.log");
    let log_path = Path::new(&log_file);

    if log_path.exists() {
        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let backup_file = format!("{log_dir}/{service_name}.{timestamp}.log");
        std::fs::rename(&log_file, &backup_file)?;
    }

    Ok(())
}
