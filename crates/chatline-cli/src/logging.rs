use anyhow::Result;
use chatline_core::config::ClientConfig;
use chatline_infrastructure::ChatlinePaths;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_PREFIX: &str = "chatline.log";

/// Installs the global subscriber.
///
/// Logs always go to a daily file under `logs/`; `verbose` adds stderr.
/// `RUST_LOG` wins over the configured level. The returned guard flushes the
/// file writer and must be held until exit.
pub fn init(paths: &ChatlinePaths, config: &ClientConfig, verbose: bool) -> Result<WorkerGuard> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => match config.log_level.parse::<EnvFilter>() {
            Ok(filter) => filter,
            Err(e) => {
                eprintln!(
                    "WARN: log_level '{}' is not a valid tracing filter ({}); falling back to 'info'",
                    config.log_level, e
                );
                EnvFilter::new("info")
            }
        },
    };

    let logs_dir = paths.logs_dir();
    std::fs::create_dir_all(&logs_dir)?;
    let file_appender = tracing_appender::rolling::daily(&logs_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = verbose.then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .with(stderr_layer)
        .init();

    Ok(guard)
}
