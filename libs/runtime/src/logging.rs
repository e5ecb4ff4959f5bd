//! Subscriber setup from [`LoggingConfig`].
//!
//! Console output is human-readable; file output is JSON lines written
//! through a size-rotated file. Each non-`default` section claims a target
//! prefix (e.g. `availability` or `sea_orm`) and may route to its own file.

use std::{
    io::{self, IsTerminal, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry,
};

use crate::config::{LoggingConfig, Section};

const DEFAULT_SECTION: &str = "default";
const DEFAULT_MAX_SIZE_MB: u64 = 100;
const DEFAULT_MAX_BACKUPS: usize = 3;

/// Unknown names fall back to `info`.
fn parse_level(s: &str) -> LevelFilter {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" | "warning" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" | "none" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

/// True if `target` is `prefix` or lives under `prefix::`.
fn matches_prefix(target: &str, prefix: &str) -> bool {
    target
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

// -------- rotating file writer --------

type SharedRotate = Arc<Mutex<FileRotate<AppendTimestamp>>>;

#[derive(Clone)]
struct RotatingFile(SharedRotate);

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?
            .flush()
    }
}

fn open_rotating(path: &Path, section: &Section) -> io::Result<RotatingFile> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) * 1024 * 1024;
    let backups = section.max_backups.unwrap_or(DEFAULT_MAX_BACKUPS);

    let rot = FileRotate::new(
        path,
        AppendTimestamp::default(FileLimit::MaxFiles(backups)),
        ContentLimit::BytesSurpassed(max_bytes as usize),
        Compression::None,
        #[cfg(unix)]
        None,
    );
    Ok(RotatingFile(Arc::new(Mutex::new(rot))))
}

/// Relative log paths live under `base_dir` (normally `server.home_dir`).
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

// -------- per-target file routing --------

/// Sink that discards everything, used for targets with no file.
#[derive(Clone)]
enum RoutedWriter {
    File(RotatingFile),
    Discard,
}

impl Write for RoutedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            RoutedWriter::File(f) => f.write(buf),
            RoutedWriter::Discard => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            RoutedWriter::File(f) => f.flush(),
            RoutedWriter::Discard => Ok(()),
        }
    }
}

#[derive(Clone, Default)]
struct FileRouter {
    fallback: Option<RotatingFile>,
    // Longest prefix first so `availability::infra` beats `availability`.
    by_prefix: Vec<(String, RotatingFile)>,
}

impl FileRouter {
    fn is_empty(&self) -> bool {
        self.fallback.is_none() && self.by_prefix.is_empty()
    }

    fn route(&self, target: &str) -> RoutedWriter {
        self.by_prefix
            .iter()
            .find(|(prefix, _)| matches_prefix(target, prefix))
            .map(|(_, f)| f.clone())
            .or_else(|| self.fallback.clone())
            .map_or(RoutedWriter::Discard, RoutedWriter::File)
    }
}

impl<'a> fmt::MakeWriter<'a> for FileRouter {
    type Writer = RoutedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.fallback
            .clone()
            .map_or(RoutedWriter::Discard, RoutedWriter::File)
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        self.route(meta.target())
    }
}

// -------- filter construction --------

/// Per-target levels for console and file. `Targets` picks the most specific
/// matching prefix, so subsystem sections override the default.
struct Plan {
    console: Targets,
    file: Targets,
    router: FileRouter,
}

fn build_plan(cfg: &LoggingConfig, base_dir: &Path) -> Plan {
    let default = cfg.get(DEFAULT_SECTION);

    let mut console = Targets::new().with_default(
        default.map_or(LevelFilter::INFO, |s| parse_level(&s.console_level)),
    );
    let mut file = Targets::new().with_default(LevelFilter::OFF);
    let mut router = FileRouter::default();

    if let Some(section) = default.filter(|s| !s.file.trim().is_empty()) {
        if let Some(writer) = open_section_file(DEFAULT_SECTION, section, base_dir) {
            router.fallback = Some(writer);
            file = file.with_default(parse_level(&section.file_level));
        }
    }

    let mut subsystems: Vec<(&String, &Section)> = cfg
        .iter()
        .filter(|(name, _)| name.as_str() != DEFAULT_SECTION)
        .collect();
    subsystems.sort_by_key(|(name, _)| std::cmp::Reverse(name.len()));

    for (name, section) in subsystems {
        console = console.with_target(name.clone(), parse_level(&section.console_level));

        let file_level = if section.file.trim().is_empty() {
            // Shares the default file, at its own level.
            if router.fallback.is_some() {
                parse_level(&section.file_level)
            } else {
                LevelFilter::OFF
            }
        } else {
            match open_section_file(name, section, base_dir) {
                Some(writer) => {
                    router.by_prefix.push((name.clone(), writer));
                    parse_level(&section.file_level)
                }
                None => LevelFilter::OFF,
            }
        };
        file = file.with_target(name.clone(), file_level);
    }

    Plan {
        console,
        file,
        router,
    }
}

fn open_section_file(name: &str, section: &Section, base_dir: &Path) -> Option<RotatingFile> {
    let path = resolve_log_path(&section.file, base_dir);
    match open_rotating(&path, section) {
        Ok(writer) => Some(writer),
        Err(e) => {
            eprintln!(
                "Failed to open log file for '{}': {} ({})",
                name,
                path.display(),
                e
            );
            None
        }
    }
}

// -------- public init --------

/// Install the global subscriber. Calling it twice is harmless: the second
/// install is ignored.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    // Bridge `log` records (sqlx, sea-orm) into `tracing` first.
    let _ = tracing_log::LogTracer::init();

    let plan = build_plan(cfg, base_dir);
    let ansi = io::stderr().is_terminal();

    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(ansi)
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(plan.console);

    let file_layer = (!plan.router.is_empty()).then(|| {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(plan.router)
            .with_filter(plan.file)
    });

    let _ = Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init();
}
