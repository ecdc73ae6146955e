//! Logging bootstrap and safety policy.
//!
//! # Responsibility
//! - Initialize a daily-rotated log file, mirrored to stderr, exactly once
//!   per process.
//! - Emit stable, metadata-only diagnostic events.
//!
//! # Invariants
//! - Logging init is idempotent for the same level and file.
//! - Re-initialization with a different level or file is rejected.
//! - Log lines never carry person names or survey answers, only ids.

use flexi_logger::{
    Age, Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

const DEFAULT_LOG_BASENAME: &str = "debug";
const DEFAULT_LOG_SUFFIX: &str = "log";
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();
static PANIC_HOOK_INSTALLED: OnceCell<()> = OnceCell::new();

struct LoggingState {
    level: &'static str,
    log_file: PathBuf,
    _logger: LoggerHandle,
}

/// Initializes logging to `log_file`, keeping `keep_days` rotated files.
///
/// A relative `log_file` is resolved against the current directory.
///
/// # Errors
/// - `level` is not one of `trace|debug|info|warn|error`.
/// - `log_file` is empty or its directory cannot be created.
/// - Logging is already active with a different level or file.
/// - The logger backend fails to start.
pub fn init_logging(level: &str, log_file: &Path, keep_days: usize) -> Result<(), String> {
    let normalized_level = normalize_level(level)?;
    let normalized_file = normalize_log_file(log_file)?;

    let state = LOGGING_STATE.get_or_try_init(|| -> Result<LoggingState, String> {
        let directory = normalized_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&directory).map_err(|err| {
            format!(
                "failed to create log directory `{}`: {err}",
                directory.display()
            )
        })?;

        let basename = normalized_file
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(DEFAULT_LOG_BASENAME);
        let suffix = normalized_file
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or(DEFAULT_LOG_SUFFIX);

        let logger = Logger::try_with_str(normalized_level)
            .map_err(|err| format!("invalid log level `{normalized_level}`: {err}"))?
            .log_to_file(
                FileSpec::default()
                    .directory(directory.as_path())
                    .basename(basename)
                    .suffix(suffix)
                    .suppress_timestamp(),
            )
            .rotate(
                Criterion::Age(Age::Day),
                Naming::Timestamps,
                Cleanup::KeepLogFiles(keep_days.max(1)),
            )
            .duplicate_to_stderr(duplicate_for(normalized_level))
            .write_mode(WriteMode::BufferAndFlush)
            .append()
            .format_for_files(flexi_logger::detailed_format)
            .format_for_stderr(flexi_logger::detailed_format)
            .start()
            .map_err(|err| format!("failed to start logger: {err}"))?;

        install_panic_hook_once();

        info!(
            "event=app_start module=core status=ok platform={} version={}",
            std::env::consts::OS,
            env!("CARGO_PKG_VERSION")
        );
        info!(
            "event=logging_init module=core status=ok level={} log_file={} keep_days={}",
            normalized_level,
            normalized_file.display(),
            keep_days
        );

        Ok(LoggingState {
            level: normalized_level,
            log_file: normalized_file.clone(),
            _logger: logger,
        })
    })?;

    if state.log_file != normalized_file {
        return Err(format!(
            "logging already initialized at `{}`; refusing to switch to `{}`",
            state.log_file.display(),
            normalized_file.display()
        ));
    }
    if state.level != normalized_level {
        return Err(format!(
            "logging already initialized with level `{}`; refusing to switch to `{}`",
            state.level, normalized_level
        ));
    }

    Ok(())
}

/// Returns `(level, log_file)` when logging is active.
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    LOGGING_STATE
        .get()
        .map(|state| (state.level, state.log_file.clone()))
}

fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" | "critical" => Ok("error"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error"
        )),
    }
}

fn normalize_log_file(log_file: &Path) -> Result<PathBuf, String> {
    if log_file.as_os_str().is_empty() {
        return Err("log file path cannot be empty".to_string());
    }
    if log_file.is_absolute() {
        return Ok(log_file.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(log_file))
        .map_err(|err| format!("cannot resolve relative log file path: {err}"))
}

fn duplicate_for(level: &str) -> Duplicate {
    match level {
        "trace" => Duplicate::Trace,
        "debug" => Duplicate::Debug,
        "info" => Duplicate::Info,
        "warn" => Duplicate::Warn,
        _ => Duplicate::Error,
    }
}

fn install_panic_hook_once() {
    if PANIC_HOOK_INSTALLED.get().is_some() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_payload_summary(panic_info);
        error!(
            "event=panic_captured module=core status=error location={} payload={}",
            location, payload
        );
        previous_hook(panic_info);
    }));

    let _ = PANIC_HOOK_INSTALLED.set(());
}

fn panic_payload_summary(info: &std::panic::PanicHookInfo<'_>) -> String {
    let payload = if let Some(message) = info.payload().downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = info.payload().downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    };

    sanitize_message(&payload, MAX_PANIC_PAYLOAD_CHARS)
}

fn sanitize_message(value: &str, max_chars: usize) -> String {
    let normalized = value.replace(['\n', '\r'], " ");
    let mut truncated = normalized.chars().take(max_chars).collect::<String>();
    if normalized.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}
