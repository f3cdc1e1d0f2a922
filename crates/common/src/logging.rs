use tracing_appender::non_blocking::WorkerGuard;
use tracing_core::Level;
use tracing_subscriber::{filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// Install the global tracing subscriber.
///
/// When a log directory is configured, events are written to a file
/// that rolls over daily, and the returned guard must be kept alive
/// until the process exits so buffered lines get flushed.
pub fn init(config: &Config) -> Option<WorkerGuard> {
    let target_filters = Targets::new()
        .with_target("sqlx", Level::WARN)
        .with_target("sea_orm", Level::WARN)
        .with_default(config.logging.level);

    match &config.log_dir {
        Some(log_dir) => {
            let appender = tracing_appender::rolling::daily(log_dir, &config.log_leader);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            let fmt = fmt::format().with_target(false).compact();

            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_ansi(false)
                        .event_format(fmt)
                        .with_writer(writer),
                )
                .with(target_filters)
                .init();

            Some(guard)
        }
        None => {
            let fmt = fmt::format().with_target(false).compact();

            tracing_subscriber::registry()
                .with(fmt::layer().event_format(fmt))
                .with(target_filters)
                .init();

            None
        }
    }
}
