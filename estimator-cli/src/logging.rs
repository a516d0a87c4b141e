//! Tracing setup for the `estimator` binary.
//!
//! Log records go to stderr so command output on stdout stays clean, and
//! optionally to a file. The level can be changed after start-up, once the
//! config file has been read.

use std::{
    fs::File,
    io::{self, IsTerminal, Write},
    path::Path,
    sync::{Arc, Mutex, MutexGuard, OnceLock},
};

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{
        FmtContext, MakeWriter,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    reload,
    util::SubscriberInitExt,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";
const DIM: &str = "\x1b[2m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

fn level_color(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "\x1b[1;31m",
        Level::WARN => "\x1b[1;33m",
        Level::INFO => "\x1b[1;32m",
        Level::DEBUG => "\x1b[1;34m",
        Level::TRACE => "\x1b[1;35m",
    }
}

/// `<local time> <LEVEL> <target> <fields>`, colored only when the writer
/// supports ANSI.
struct EstimatorFormat;

impl<S, N> FormatEvent<S, N> for EstimatorFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let timestamp = Local::now().format(TIMESTAMP_FORMAT);

        if writer.has_ansi_escapes() {
            write!(
                writer,
                "{DIM}{timestamp}{RESET} {}{:>5}{RESET} {CYAN}{}{RESET} ",
                level_color(meta.level()),
                meta.level(),
                meta.target()
            )?;
        } else {
            write!(writer, "{timestamp} {:>5} {} ", meta.level(), meta.target())?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Log file that can be opened after the subscriber is installed.
/// Until then, writes are dropped.
#[derive(Clone, Default)]
struct LogFile(Arc<Mutex<Option<File>>>);

impl LogFile {
    fn guard(&self) -> MutexGuard<'_, Option<File>> {
        // A poisoned slot still holds a usable file handle.
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn replace(
        &self,
        file: File,
    ) {
        *self.guard() = Some(file);
    }
}

struct LogFileWriter<'a>(MutexGuard<'a, Option<File>>);

impl Write for LogFileWriter<'_> {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        self.0.as_mut().map_or(Ok(buf.len()), |file| file.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.as_mut().map_or(Ok(()), |file| file.flush())
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogFileWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LogFileWriter(self.guard())
    }
}

struct LoggingHandles {
    filter: reload::Handle<EnvFilter, Registry>,
    file: LogFile,
}

static HANDLES: OnceLock<LoggingHandles> = OnceLock::new();

fn handles() -> Result<&'static LoggingHandles> {
    HANDLES
        .get()
        .ok_or_else(|| anyhow!("logging not yet initialized"))
}

/// True when `RUST_LOG` is set; the config file must not override it then.
pub fn env_filter_present() -> bool {
    std::env::var_os(EnvFilter::DEFAULT_ENV).is_some()
}

/// Replaces the active filter. Takes a bare level (`warn`, `debug`, ...)
/// or a full directive such as `estimator_core=debug,sqlx=warn`.
pub fn set_log_level(level: &str) -> Result<()> {
    let filter =
        EnvFilter::try_new(level).with_context(|| format!("invalid log level '{level}'"))?;
    handles()?
        .filter
        .reload(filter)
        .context("log filter reload failed")
}

/// Starts appending log records to `path`. The directory must exist.
pub fn enable_file_logging(path: &Path) -> Result<()> {
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file '{}'", path.display()))?;
    handles()?.file.replace(file);
    Ok(())
}

/// Installs the global subscriber. Later calls are no-ops.
///
/// The initial filter is `RUST_LOG` when set, otherwise `default_level`.
/// An unparsable `default_level` falls back to `warn`.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let (filter_layer, filter_handle) = reload::Layer::new(filter);
    let file = LogFile::default();

    let installed = tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(EstimatorFormat)
                .with_ansi(io::stderr().is_terminal())
                .with_writer(io::stderr),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(EstimatorFormat)
                .with_ansi(false)
                .with_writer(file.clone()),
        )
        .try_init()
        .is_ok();

    if installed {
        let _ = HANDLES.set(LoggingHandles {
            filter: filter_handle,
            file,
        });
    }
}
