//! Process-wide tracing setup for the CLI.
//!
//! Log records go to stderr so that command output on stdout stays clean
//! for piping. A log file can be attached after start-up once the
//! configuration has been read.

use anyhow::Result;
use chrono::Local;
use std::{
    fs::File,
    io::{self, IsTerminal, Write},
    path::Path,
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError},
};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        FmtContext, MakeWriter,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// Fallback filter when neither `RUST_LOG` nor the configuration sets one.
pub const DEFAULT_LEVEL: &str = "info";

// --- Formatter ---

/// `<local timestamp> <LEVEL> <file:line> <fields>`, coloured when the
/// writer supports ANSI escapes.
struct LocalFmt;

impl<S, N> FormatEvent<S, N> for LocalFmt
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
        let ansi = writer.has_ansi_escapes();

        let timestamp = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
        if ansi {
            write!(writer, "\x1b[2m{timestamp}\x1b[0m ")?;
        } else {
            write!(writer, "{timestamp} ")?;
        }

        let colour = match *meta.level() {
            Level::ERROR => "\x1b[1;31m",
            Level::WARN => "\x1b[1;33m",
            Level::INFO => "\x1b[1;32m",
            Level::DEBUG => "\x1b[1;34m",
            Level::TRACE => "\x1b[1;35m",
        };
        if ansi {
            write!(writer, "{colour}{:>5}\x1b[0m ", meta.level())?;
        } else {
            write!(writer, "{:>5} ", meta.level())?;
        }

        let file = meta.file().map(|f| {
            f.strip_prefix("src/")
                .or_else(|| f.strip_prefix("src\\"))
                .unwrap_or(f)
        });
        if let (Some(file), Some(line)) = (file, meta.line()) {
            if ansi {
                write!(writer, "\x1b[36m{file}:{line}\x1b[0m ")?;
            } else {
                write!(writer, "{file}:{line} ")?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

// --- Late-bound file writer ---

/// A MakeWriter that can be pointed at a file after initialization.
/// While no file is set, all writes are discarded.
#[derive(Clone)]
struct FileSlot(Arc<Mutex<Option<File>>>);

struct SlotWriter<'a>(MutexGuard<'a, Option<File>>);

impl Write for SlotWriter<'_> {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        match &mut *self.0 {
            Some(f) => f.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut *self.0 {
            Some(f) => f.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for FileSlot {
    type Writer = SlotWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SlotWriter(self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

// --- Statics ---

static FILE_SLOT: OnceLock<Arc<Mutex<Option<File>>>> = OnceLock::new();

/// `RUST_LOG` wins over `level`; an unparsable `level` falls back to
/// [`DEFAULT_LEVEL`].
fn make_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

// --- Public API ---

/// Starts appending log output to `path`, replacing any open log file.
/// The directory must already exist.
pub fn enable_file_logging(path: &Path) -> Result<()> {
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| anyhow::anyhow!("cannot open log file '{}': {e}", path.display()))?;

    match FILE_SLOT.get() {
        Some(slot) => {
            *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(file);
            Ok(())
        }
        None => anyhow::bail!("logging not yet initialized"),
    }
}

/// Initializes logging. Call once at startup; later calls are no-ops.
///
/// - Stderr: coloured when attached to a terminal, plain when redirected.
/// - File: inactive until [`enable_file_logging`] is called.
/// - Level: `RUST_LOG` if set, otherwise `level`.
pub fn init_logging(level: &str) {
    let file_inner: Arc<Mutex<Option<File>>> = Arc::new(Mutex::new(None));
    let _ = FILE_SLOT.set(file_inner.clone());

    let stderr_layer = tracing_subscriber::fmt::layer()
        .event_format(LocalFmt)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr);

    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(LocalFmt)
        .with_ansi(false)
        .with_writer(FileSlot(file_inner));

    let _ = tracing_subscriber::registry()
        .with(make_filter(level))
        .with(stderr_layer)
        .with(file_layer)
        .try_init();
}
