//! Tracing subscriber setup: console formatter, run-log layer, initialisation.
use std::fs;
use std::io::Write as _;
use std::path::Path;
use std::sync::Mutex;

use super::utils::{format_local_datetime, strip_ansi, version};

/// Target used for stage headers.
pub(super) const STAGE_TARGET: &str = "bootstrap::stage";
/// Target used for dry-run action lines.
pub(super) const DRY_RUN_TARGET: &str = "bootstrap::dry_run";

/// Extracts the `message` field from a [`tracing::Event`].
#[derive(Default)]
struct MessageExtractor {
    message: String,
}

impl tracing::field::Visit for MessageExtractor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

#[derive(Debug)]
enum Sink {
    File(fs::File),
    Stderr,
}

/// A [`tracing_subscriber::Layer`] that appends every event to the per-OS
/// run log as `[YYYY-MM-DD HH:MM:SS] <tag> message`.
///
/// The file is opened in append mode and never truncated. When it cannot be
/// opened, or a later write fails, lines go to stderr instead.
#[derive(Debug)]
pub struct RecordLayer {
    sink: Mutex<Sink>,
}

impl RecordLayer {
    /// Open `path` for appending (creating parent directories) and write the
    /// run banner.
    #[must_use]
    pub fn open(path: &Path) -> Self {
        let file = path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| fs::OpenOptions::new().create(true).append(true).open(path));
        let sink = match file {
            Ok(f) => Sink::File(f),
            Err(e) => {
                writeln!(
                    std::io::stderr(),
                    "warning: cannot open run log {}: {e}; logging to stderr",
                    path.display()
                )
                .ok();
                Sink::Stderr
            }
        };
        let layer = Self {
            sink: Mutex::new(sink),
        };
        layer.write_line(&format!(
            "[{}] ===== bootstrap {} run started =====",
            format_local_datetime(),
            version()
        ));
        layer
    }

    fn write_line(&self, line: &str) {
        let mut sink = self
            .sink
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Sink::File(f) = &mut *sink {
            if writeln!(f, "{line}").is_ok() {
                return;
            }
            *sink = Sink::Stderr;
        }
        writeln!(std::io::stderr(), "{line}").ok();
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for RecordLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let metadata = event.metadata();
        let mut extractor = MessageExtractor::default();
        event.record(&mut extractor);
        let msg = strip_ansi(&extractor.message);
        let ts = format_local_datetime();

        let tag = match (*metadata.level(), metadata.target()) {
            (tracing::Level::INFO, STAGE_TARGET) => "==>",
            (tracing::Level::INFO, DRY_RUN_TARGET) => "[dry run]",
            (tracing::Level::ERROR, _) => "[error]",
            (tracing::Level::WARN, _) => "[warn]",
            (tracing::Level::DEBUG | tracing::Level::TRACE, _) => "[debug]",
            _ => "[info]",
        };
        self.write_line(&format!("[{ts}] {tag} {msg}"));
    }
}

/// Console formatter: colored level markers, bold stage headers.
struct ConsoleFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let mut extractor = MessageExtractor::default();
        event.record(&mut extractor);
        let msg = &extractor.message;

        match *metadata.level() {
            tracing::Level::ERROR => writeln!(writer, "\x1b[31mERROR\x1b[0m {msg}"),
            tracing::Level::WARN => writeln!(writer, "\x1b[33mWARN\x1b[0m  {msg}"),
            tracing::Level::INFO if metadata.target() == STAGE_TARGET => {
                writeln!(writer, "\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m")
            }
            tracing::Level::INFO if metadata.target() == DRY_RUN_TARGET => {
                writeln!(writer, "  \x1b[33m[DRY RUN]\x1b[0m {msg}")
            }
            tracing::Level::INFO => writeln!(writer, "  {msg}"),
            _ => writeln!(writer, "  \x1b[2m{msg}\x1b[0m"),
        }
    }
}

/// Initialise the global [`tracing`] subscriber.
///
/// Console output goes to stdout (info and below) and stderr (warnings and
/// errors); `debug` is shown only when `verbose`. Every event at `DEBUG` and
/// above is appended to `log_path`. Call once at startup.
pub fn init_subscriber(verbose: bool, log_path: &Path) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    #[cfg(windows)]
    enable_ansi_support::enable_ansi_support().ok();

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let make_writer = std::io::stderr
        .with_max_level(tracing::Level::WARN)
        .and(std::io::stdout.with_min_level(tracing::Level::INFO));

    let console_layer = fmt::layer()
        .event_format(ConsoleFormatter)
        .with_writer(make_writer)
        .with_filter(console_level);

    let record_layer = RecordLayer::open(log_path).with_filter(LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(record_layer)
        .try_init()
        .ok();
}
