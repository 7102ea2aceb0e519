//! Run logging: console output plus the append-only per-OS run log.

mod logger;
mod subscriber;
mod types;
mod utils;

pub use logger::Logger;
pub use subscriber::{RecordLayer, init_subscriber};
pub use types::{Log, TaskEntry, TaskStatus};
pub use utils::{terminal_columns, version};

/// Create a Logger backed by a thread-local subscriber whose [`RecordLayer`]
/// writes to a file inside a fresh temp dir.
///
/// The returned guard must be kept alive for the duration of the test;
/// dropping it restores the previous thread-local dispatcher.
#[cfg(test)]
#[allow(clippy::expect_used)]
pub(crate) fn isolated_logger() -> (
    Logger,
    tempfile::TempDir,
    tracing::dispatcher::DefaultGuard,
) {
    use tracing_subscriber::{Layer as _, filter::LevelFilter, layer::SubscriberExt as _};
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let path = tmp.path().join("logs").join("test.log");
    let layer = RecordLayer::open(&path);
    let log = Logger::new(&path);
    let subscriber = tracing_subscriber::registry().with(layer.with_filter(LevelFilter::DEBUG));
    let guard = tracing::dispatcher::set_default(&tracing::Dispatch::new(subscriber));
    (log, tmp, guard)
}
