use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// 设置日志：控制台 + 按天滚动的文件日志
///
/// 返回的 guard 必须在整个程序生命周期内保持存活，否则文件日志会丢失。
pub fn setup_logging() -> anyhow::Result<WorkerGuard> {
    let file_appender = RollingFileAppender::new(Rotation::DAILY, "log", "grid_quant.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .try_init()?;

    Ok(guard)
}
