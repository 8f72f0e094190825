//! Structured logging: JSONL records in a daily-rolling file.
//!
//! stdout is reserved for command output (version strings, `--json`
//! reports), so records go to a log file — or to stderr when no writable
//! location exists — and never to stdout.

use anyhow::Result;
use serde_json::{Map, Value};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::Event;
use tracing::field::Field;
use tracing::span::{Attributes, Id, Record};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::{Context as LayerContext, Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

const ENV_LOG_PATH: &str = "SLIPWAY_LOG_PATH";
const ENV_LOG_DIR: &str = "SLIPWAY_LOG_DIR";
const FILE_SUFFIX: &str = ".jsonl";

/// Keeps the non-blocking log worker alive. Dropping it flushes whatever
/// is still queued, so hold it until the program exits.
pub struct LogGuard {
    _worker: tracing_appender::non_blocking::WorkerGuard,
}

/// Install the global subscriber: `filter` in front of a JSONL layer.
///
/// `service` names the log file; `log_dir` is the configured directory, if
/// any. Environment overrides and platform defaults are applied here — see
/// [`LogSink`] resolution below.
pub fn init(service: &str, log_dir: Option<&Path>, filter: EnvFilter) -> Result<LogGuard> {
    let (writer, worker) = match resolve_sink(service, log_dir) {
        Ok(sink) => sink.open(),
        Err(reason) => {
            // stderr, never stdout — stdout carries command output.
            eprintln!("Warning: {reason}. Logging to stderr instead.");
            tracing_appender::non_blocking(std::io::stderr())
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(JsonlLayer::new(writer))
        .init();

    tracing::debug!("logging initialized");

    Ok(LogGuard { _worker: worker })
}

/// Build the log filter from CLI flags and the environment.
///
/// `--quiet` beats `--verbose` beats `RUST_LOG` beats the configured level.
pub fn env_filter(quiet: bool, verbose: u8, default_level: &str) -> EnvFilter {
    let directive = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => {
            return EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level));
        }
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    EnvFilter::new(directive)
}

// ============================================================================
// JSONL layer
// ============================================================================

/// One JSON object per event, fields flattened into the top level.
///
/// Span fields are folded in root-first, so an inner span (and finally the
/// event itself) wins any name collision.
struct JsonlLayer<W> {
    writer: W,
}

impl<W> JsonlLayer<W> {
    const fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<S, W> Layer<S> for JsonlLayer<W>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    W: for<'writer> tracing_subscriber::fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: LayerContext<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut fields = FieldVisitor::default();
        attrs.record(&mut fields);
        span.extensions_mut().insert(SpanValues(fields.0));
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: LayerContext<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut fields = FieldVisitor::default();
        values.record(&mut fields);

        let mut ext = span.extensions_mut();
        if let Some(SpanValues(existing)) = ext.get_mut::<SpanValues>() {
            existing.extend(fields.0);
        } else {
            ext.insert(SpanValues(fields.0));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: LayerContext<'_, S>) {
        let meta = event.metadata();
        let mut entry = Map::new();
        entry.insert("timestamp".into(), rfc3339_now().into());
        entry.insert("level".into(), meta.level().as_str().to_lowercase().into());
        entry.insert("target".into(), meta.target().into());

        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(values) = span.extensions().get::<SpanValues>() {
                    entry.extend(values.0.clone());
                }
            }
        }

        let mut fields = FieldVisitor::default();
        event.record(&mut fields);
        entry.extend(fields.0);

        let mut out = self.writer.make_writer();
        if serde_json::to_writer(&mut out, &Value::Object(entry)).is_ok() {
            let _ = out.write_all(b"\n");
        }
    }
}

/// Span fields captured at creation, stashed in the span's extensions.
#[derive(Clone, Debug)]
struct SpanValues(Map<String, Value>);

#[derive(Default)]
struct FieldVisitor(Map<String, Value>);

impl FieldVisitor {
    fn put(&mut self, field: &Field, value: impl Into<Value>) {
        self.0.insert(field.name().to_owned(), value.into());
    }
}

impl tracing::field::Visit for FieldVisitor {
    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, value);
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, value);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        // NaN and infinities have no JSON form; drop them.
        if let Some(number) = serde_json::Number::from_f64(value) {
            self.put(field, number);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value);
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.put(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, format!("{value:?}"));
    }
}

/// RFC 3339 UTC timestamp with millisecond precision, from `std::time`
/// alone (no date crate).
fn rfc3339_now() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    let secs = since_epoch.as_secs();
    let millis = since_epoch.subsec_millis();
    let (year, month, day) = civil_from_days((secs / 86_400) as i64);
    let clock = secs % 86_400;

    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{millis:03}Z",
        clock / 3600,
        clock % 3600 / 60,
        clock % 60
    )
}

/// Civil (year, month, day) from days since 1970-01-01.
///
/// Howard Hinnant's `civil_from_days`, valid for the full range a `u64`
/// epoch second count can reach.
const fn civil_from_days(days: i64) -> (i32, u32, u32) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u32;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let mut year = yoe as i64 + era * 400;
    if month <= 2 {
        year += 1;
    }
    (year as i32, month, day)
}

// ============================================================================
// Sink resolution
// ============================================================================

/// A directory and file name for the rolling appender.
#[derive(Clone, Debug)]
struct LogSink {
    dir: PathBuf,
    file: String,
}

impl LogSink {
    /// A sink at an explicit file path.
    fn at_path(path: &Path) -> Result<Self, String> {
        let file = path
            .file_name()
            .ok_or_else(|| format!("{ENV_LOG_PATH} must name a file"))?
            .to_str()
            .ok_or_else(|| format!("{ENV_LOG_PATH} must be valid UTF-8"))?
            .to_owned();
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_writable(dir, &file)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            file,
        })
    }

    /// A sink named `<service>.jsonl` inside `dir`.
    fn in_dir(dir: PathBuf, service: &str) -> Result<Self, String> {
        let file = format!("{service}{FILE_SUFFIX}");
        ensure_writable(&dir, &file)?;
        Ok(Self { dir, file })
    }

    /// The first writable default location: `logs/` under the XDG local
    /// data directory, then the working directory.
    fn first_writable(service: &str) -> Result<Self, String> {
        let mut candidates = Vec::new();
        if let Some(dirs) = directories::ProjectDirs::from("", "", service) {
            candidates.push(dirs.data_local_dir().join("logs"));
        }
        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd);
        }

        candidates
            .into_iter()
            .find_map(|dir| Self::in_dir(dir, service).ok())
            .ok_or_else(|| "no writable log directory found".to_owned())
    }

    /// Start the daily-rolling, non-blocking writer for this sink.
    fn open(
        &self,
    ) -> (
        tracing_appender::non_blocking::NonBlocking,
        tracing_appender::non_blocking::WorkerGuard,
    ) {
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&self.dir, &self.file))
    }

    #[cfg(test)]
    fn path(&self) -> PathBuf {
        self.dir.join(&self.file)
    }
}

/// Pick the log destination: `SLIPWAY_LOG_PATH`, then `SLIPWAY_LOG_DIR`,
/// then the configured directory, then platform defaults.
fn resolve_sink(service: &str, config_dir: Option<&Path>) -> Result<LogSink, String> {
    choose_sink(
        service,
        std::env::var_os(ENV_LOG_PATH).map(PathBuf::from),
        std::env::var_os(ENV_LOG_DIR).map(PathBuf::from),
        config_dir,
    )
}

fn choose_sink(
    service: &str,
    path_override: Option<PathBuf>,
    dir_override: Option<PathBuf>,
    config_dir: Option<&Path>,
) -> Result<LogSink, String> {
    if let Some(path) = path_override {
        return LogSink::at_path(&path);
    }
    if let Some(dir) = dir_override.or_else(|| config_dir.map(Path::to_path_buf)) {
        return LogSink::in_dir(dir, service);
    }
    LogSink::first_writable(service)
}

fn ensure_writable(dir: &Path, file: &str) -> Result<(), String> {
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("cannot create log directory {}: {e}", dir.display()))?;
    let probe = dir.join(file);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&probe)
        .map_err(|e| format!("cannot open log file {}: {e}", probe.display()))?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
