use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry,
};

use crate::config::{LoggingConfig, Section, DEFAULT_SECTION};

const DEFAULT_MAX_SIZE_MB: u64 = 100;
const DEFAULT_MAX_BACKUPS: usize = 3;

/// Unknown names fall back to `info`.
fn parse_level(s: &str) -> LevelFilter {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "warn" | "warning" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" | "none" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

fn named_sections(cfg: &LoggingConfig) -> impl Iterator<Item = (&String, &Section)> {
    cfg.iter().filter(|(k, _)| k.as_str() != DEFAULT_SECTION)
}

fn has_file(section: &Section) -> bool {
    !section.file.trim().is_empty()
}

fn console_targets(cfg: &LoggingConfig) -> Targets {
    let default = cfg
        .get(DEFAULT_SECTION)
        .map_or(LevelFilter::INFO, |s| parse_level(&s.console_level));
    named_sections(cfg).fold(Targets::new().with_default(default), |t, (target, s)| {
        t.with_target(target.clone(), parse_level(&s.console_level))
    })
}

/// A named section without a file keeps its target out of the default file.
fn file_targets(cfg: &LoggingConfig) -> Targets {
    let default = cfg
        .get(DEFAULT_SECTION)
        .filter(|s| has_file(s))
        .map_or(LevelFilter::OFF, |s| parse_level(&s.file_level));
    named_sections(cfg).fold(Targets::new().with_default(default), |t, (target, s)| {
        let level = if has_file(s) {
            parse_level(&s.file_level)
        } else {
            LevelFilter::OFF
        };
        t.with_target(target.clone(), level)
    })
}

// -------- rotating files --------

#[derive(Clone)]
struct RotatingFile(Arc<Mutex<FileRotate<AppendTimestamp>>>);

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

/// Relative paths resolve against `base_dir` (the home dir).
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn open_rotating(path: &Path, section: &Section) -> io::Result<RotatingFile> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) * 1024 * 1024;
    let rot = FileRotate::new(
        path,
        AppendTimestamp::default(FileLimit::MaxFiles(
            section.max_backups.unwrap_or(DEFAULT_MAX_BACKUPS),
        )),
        ContentLimit::BytesSurpassed(usize::try_from(max_bytes).unwrap_or(usize::MAX)),
        Compression::None,
        #[cfg(unix)]
        None,
    );
    Ok(RotatingFile(Arc::new(Mutex::new(rot))))
}

/// Picks the file of the most specific section whose target prefixes the
/// record's target, falling back to the default file.
struct FileRouter {
    default: Option<RotatingFile>,
    /// Longest prefix first.
    by_target: Vec<(String, RotatingFile)>,
}

/// Returns true for `target == prefix` or `target` inside module `prefix::`.
fn matches_prefix(target: &str, prefix: &str) -> bool {
    target
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

impl FileRouter {
    fn from_config(cfg: &LoggingConfig, base_dir: &Path) -> Self {
        let open = |name: &str, section: &Section| {
            let path = resolve_log_path(&section.file, base_dir);
            match open_rotating(&path, section) {
                Ok(f) => Some(f),
                Err(e) => {
                    // The subscriber is not installed yet.
                    eprintln!(
                        "failed to open log file '{}' for '{name}': {e}",
                        path.display()
                    );
                    None
                }
            }
        };

        let default = cfg
            .get(DEFAULT_SECTION)
            .filter(|s| has_file(s))
            .and_then(|s| open(DEFAULT_SECTION, s));

        let mut by_target: Vec<_> = named_sections(cfg)
            .filter(|(_, s)| has_file(s))
            .filter_map(|(name, s)| open(name, s).map(|f| (name.clone(), f)))
            .collect();
        by_target.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        Self { default, by_target }
    }

    fn is_empty(&self) -> bool {
        self.default.is_none() && self.by_target.is_empty()
    }

    fn resolve(&self, target: &str) -> Option<RotatingFile> {
        self.by_target
            .iter()
            .find(|(prefix, _)| matches_prefix(target, prefix))
            .map(|(_, f)| f.clone())
            .or_else(|| self.default.clone())
    }
}

/// Writer that discards output when no file is routed.
struct RoutedWriter(Option<RotatingFile>);

impl Write for RoutedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.0 {
            Some(f) => f.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.0 {
            Some(f) => f.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> fmt::MakeWriter<'a> for FileRouter {
    type Writer = RoutedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RoutedWriter(self.default.clone())
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        RoutedWriter(self.resolve(meta.target()))
    }
}

// -------- public init --------

/// Install the global subscriber: a console layer on stderr and, when any
/// section names a file, a JSON layer writing through rotating files.
/// Calling it twice is harmless; the first subscriber stays.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    // Bridge `log` records before the subscriber goes in.
    let _ = tracing_log::LogTracer::init();

    let console = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(console_targets(cfg));

    let router = FileRouter::from_config(cfg, base_dir);
    let file = (!router.is_empty()).then(|| {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(router)
            .with_filter(file_targets(cfg))
    });

    let _ = Registry::default().with(console).with(file).try_init();
}
