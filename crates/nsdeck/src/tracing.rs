use color_eyre::Result;
use color_eyre::eyre::Context;
use tracing::Level;
use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_error::ErrorLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Initialize the tracing subscriber to log to stderr
///
/// Stdout is kept for command output. The returned [`WorkerGuard`] must be held for the life of
/// the program so buffered lines are flushed on shutdown. The level defaults to `INFO` and can be
/// changed with `RUST_LOG`.
pub fn init_tracing() -> Result<WorkerGuard> {
    let (non_blocking, guard) = non_blocking(std::io::stderr());

    let env_filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(non_blocking))
        .with(env_filter)
        .with(ErrorLayer::default())
        .try_init()
        .wrap_err("failed to install tracing subscriber")?;

    Ok(guard)
}
