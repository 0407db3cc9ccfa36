//! # filelog
//! Audit logging to size-bounded rolling files, behind the `log` facade.
//!
//! ## Usage
//! ```toml
//! // Cargo.toml
//! ...
//! [dependencies]
//! filelog = "0.1.0"
//! ```
//!
//! ```rust
//! use filelog::{LogDestination, logger_config};
//!
//! let dir = std::env::temp_dir().join("filelog_doc_usage");
//! let _ = std::fs::remove_dir_all(&dir);
//! let _guard = logger_config()
//!     .with_destination(
//!         LogDestination::new(&dir, "audit", ".log")
//!             .with_max_files(10)
//!             .with_max_file_size(10 * 1024 * 1024),
//!     )
//!     .with_name("audit")
//!     .init_global()
//!     .expect("Unable to configure audit log");
//!
//! log::info!("user=alice action=login outcome=success");
//! drop(_guard); // closes the active file
//! assert!(std::fs::read_to_string(dir.join("audit.log")).unwrap().ends_with("outcome=success\n"));
//! ```
//!
//! ## Environment configuration
//! Without an explicit destination, `FILELOG_DIRECTORY`, `FILELOG_FILE_NAME`,
//! `FILELOG_FILE_EXTENSION`, `FILELOG_MAX_FILES` and `FILELOG_MAX_FILE_SIZE_MB`
//! are read (defaults: `logs`, `audit`, `.log`, unlimited, unlimited).
//!
//! Diagnostics of the writer itself (target `filelog_core`) are printed to
//! stderr instead of the audit file.

mod config;
mod utils;

use std::sync::{Arc, LazyLock, RwLock};

use log::{LevelFilter, Log};

pub use config::{ConfigError, DestinationEnv};
pub use filelog_core::{
    CredentialContext, FileLogSet, LogDestination, RollingFileWriter, ServiceIdentity, StreamState,
};

use utils::{format_console, format_log};

/// Target used by the writer for its own diagnostics.
const INTERNAL_TARGET: &str = "filelog_core";

/// Logger currently installed by [`ConfigBuilder::init_global`].
static GLOBAL_LOGGER: LazyLock<RwLock<Option<Arc<FileLogger>>>> = LazyLock::new(|| {
    log::set_boxed_logger(Box::new(GlobalLogger)).ok();
    RwLock::new(None)
});

struct GlobalLogger;

impl Log for GlobalLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        GLOBAL_LOGGER
            .read()
            .map(|logger| logger.as_ref().is_some_and(|l| l.enabled(metadata)))
            .unwrap_or(false)
    }

    fn log(&self, record: &log::Record) {
        let logger = GLOBAL_LOGGER.read().ok().and_then(|l| l.clone());
        if let Some(logger) = logger {
            logger.log(record);
        }
    }

    fn flush(&self) {}
}

/// Writes `log` records as lines of a rolling audit file.
pub struct FileLogger {
    writer: Arc<RollingFileWriter>,
    name: Option<String>,
    level: LevelFilter,
}

impl FileLogger {
    pub fn writer(&self) -> &Arc<RollingFileWriter> {
        &self.writer
    }
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = record.args().to_string();
        // Writer diagnostics may be emitted while the writer holds its lock.
        if record.target().starts_with(INTERNAL_TARGET) {
            eprintln!(
                "{}",
                format_console(&message, record.level(), record.target())
            );
            return;
        }
        let line = format_log(&message, record.level(), self.name.as_deref());
        self.writer.write_record(&line);
    }

    fn flush(&self) {}
}

/// Keeps the global audit file open. Dropping it closes the file.
pub struct LoggerGuard {
    logger: Arc<FileLogger>,
}

impl LoggerGuard {
    pub fn writer(&self) -> &Arc<RollingFileWriter> {
        self.logger.writer()
    }
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        if let Ok(mut global) = GLOBAL_LOGGER.write()
            && global
                .as_ref()
                .is_some_and(|current| Arc::ptr_eq(current, &self.logger))
        {
            *global = None;
        }
        self.logger.writer.close();
    }
}

/// Builder for configuring and initializing the logger.
pub struct ConfigBuilder {
    destination: Option<LogDestination>,
    context: Option<Arc<dyn CredentialContext>>,
    header: Option<String>,
    log_level: LevelFilter,
    name: Option<String>,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            destination: None,
            context: None,
            header: None,
            log_level: LevelFilter::Info,
            name: None,
        }
    }
}

impl ConfigBuilder {
    /// Builds a logger without installing it.
    pub fn build(self) -> Result<FileLogger, ConfigError> {
        let Self {
            destination,
            context,
            header,
            log_level,
            name,
        } = self;
        let destination = match destination {
            Some(destination) => destination,
            None => DestinationEnv::load()?.destination(),
        };
        config::validate(&destination)?;
        let writer = match context {
            Some(context) => RollingFileWriter::with_context(destination, context),
            None => RollingFileWriter::new(destination),
        };
        writer.set_header(header);
        Ok(FileLogger {
            writer: Arc::new(writer),
            name,
            level: log_level,
        })
    }

    /// Sets where the audit files go.
    pub fn with_destination(self, destination: LogDestination) -> Self {
        Self {
            destination: Some(destination),
            ..self
        }
    }
    /// Reads the destination from `FILELOG_*` variables.
    pub fn with_destination_from_env(self) -> Result<Self, ConfigError> {
        Ok(Self {
            destination: Some(DestinationEnv::load()?.destination()),
            ..self
        })
    }
    /// Creates files through `context`.
    pub fn with_context(self, context: Arc<dyn CredentialContext>) -> Self {
        Self {
            context: Some(context),
            ..self
        }
    }
    /// Sets a header written at the top of every new file.
    pub fn with_header(self, header: &str) -> Self {
        Self {
            header: Some(header.into()),
            ..self
        }
    }
    /// Sets the maximum level.
    pub fn with_level(self, log_level: LevelFilter) -> Self {
        Self { log_level, ..self }
    }
    /// Sets a log name
    pub fn with_name(self, name: &str) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }
    /// Maybe sets a log name
    pub fn maybe_with_name(self, name: Option<&str>) -> Self {
        Self {
            name: name.map(String::from),
            ..self
        }
    }
    /// Installs the logger as the global `log` backend.
    /// Returns a guard that closes the audit file when dropped.
    #[must_use = "LoggerGuard must be kept alive, dropping it closes the audit file. Do \"let _guard = logger_config().init_global()?;\""]
    pub fn init_global(self) -> Result<LoggerGuard, ConfigError> {
        let logger = Arc::new(self.build()?);
        let previous = GLOBAL_LOGGER
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .replace(Arc::clone(&logger));
        // Outside the lock: releasing may log through the global logger.
        if let Some(previous) = previous {
            previous.writer.release_file();
        }
        log::set_max_level(logger.level);
        Ok(LoggerGuard { logger })
    }
}

/// Returns a default ConfigBuilder for configuring the logger.
pub fn logger_config() -> ConfigBuilder {
    ConfigBuilder::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, Record};
    use std::{fs, path::PathBuf};

    fn test_dir(name: &str) -> PathBuf {
        let dir = PathBuf::from(format!("/tmp/filelog_test_{name}"));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn emit(logger: &FileLogger, level: Level, target: &str, message: &str) {
        logger.log(
            &Record::builder()
                .args(format_args!("{message}"))
                .level(level)
                .target(target)
                .build(),
        );
    }

    #[test]
    fn test_logger_writes_formatted_lines() {
        let dir = test_dir("logger_lines");
        let logger = logger_config()
            .with_destination(LogDestination::new(&dir, "audit", ".log"))
            .with_name("security")
            .with_header("# security audit")
            .build()
            .unwrap();
        emit(&logger, Level::Info, "app", "user=alice action=login");
        emit(&logger, Level::Error, "app", "user=bob action=delete outcome=denied");

        let content = fs::read_to_string(dir.join("audit.log")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "# security audit");
        assert!(lines[1].ends_with(" security INFO] user=alice action=login"));
        assert!(lines[2].ends_with(" security ERROR] user=bob action=delete outcome=denied"));
    }

    #[test]
    fn test_logger_filters_level() {
        let dir = test_dir("logger_level");
        let logger = logger_config()
            .with_destination(LogDestination::new(&dir, "audit", ".log"))
            .with_level(LevelFilter::Warn)
            .build()
            .unwrap();
        emit(&logger, Level::Info, "app", "ignored");
        emit(&logger, Level::Warn, "app", "kept");
        let content = fs::read_to_string(dir.join("audit.log")).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("kept"));
    }

    #[test]
    fn test_logger_keeps_writer_diagnostics_out_of_file() {
        let dir = test_dir("logger_internal");
        let logger = logger_config()
            .with_destination(LogDestination::new(&dir, "audit", ".log"))
            .build()
            .unwrap();
        emit(&logger, Level::Warn, "filelog_core", "unable to roll");
        assert!(!dir.join("audit.log").exists());
        assert_eq!(logger.writer().state(), StreamState::Uninitialized);
    }

    #[test]
    fn test_build_rejects_empty_name() {
        let result = logger_config()
            .with_destination(LogDestination::new("/tmp", "", ".log"))
            .build();
        assert!(matches!(result, Err(ConfigError::EmptyFileName)));
    }

    #[test]
    fn test_init_global_and_guard() {
        let dir = test_dir("logger_global");
        let guard = logger_config()
            .with_destination(
                LogDestination::new(&dir, "audit", ".log").with_max_file_size(1024),
            )
            .init_global()
            .unwrap();
        log::info!("global record");
        log::debug!("below level");
        let writer = Arc::clone(guard.writer());
        assert_eq!(writer.state(), StreamState::Active);
        drop(guard);
        assert_eq!(writer.state(), StreamState::Closed);
        log::info!("after guard");

        let content = fs::read_to_string(dir.join("audit.log")).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.ends_with("INFO] global record\n"));
    }
}
