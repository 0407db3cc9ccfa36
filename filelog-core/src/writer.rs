use std::{
    fs::File,
    io::{self, BufWriter, Sink, Write},
    mem,
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, Local};

use crate::{
    config::LogDestination,
    context::{CredentialContext, ServiceIdentity},
    file_set::FileLogSet,
    helpers::{LINE_SEPARATOR, NEWLINE_WIDTH, try_to_close},
};

/// Lifecycle of the writer's output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// No file open; the next write creates one.
    Uninitialized,
    Active,
    /// Closed for good; writes are discarded.
    Closed,
    /// Creating or writing the file failed; writes are discarded until the
    /// writer is updated or released.
    Failed,
}

struct OpenFile {
    stream: BufWriter<File>,
    path: PathBuf,
    bytes_written: u64,
    created_at: DateTime<Local>,
}

enum Output {
    File(OpenFile),
    Discard(Sink),
}

fn discard() -> Output {
    Output::Discard(io::sink())
}

struct Inner {
    file_set: FileLogSet,
    max_file_size: u64,
    header: Option<String>,
    state: StreamState,
    output: Output,
}

/// Size-bounded rolling file writer shared by every thread producing records.
///
/// All operations are serialized by one lock, rollover included: the thread
/// whose record crosses the size budget renames the active file, prunes old
/// ones and opens the new file before writing. Failures never reach the
/// caller; they are logged under the `filelog_core` target and the writer
/// falls back to discarding records.
pub struct RollingFileWriter {
    context: Arc<dyn CredentialContext>,
    inner: Mutex<Inner>,
}

impl RollingFileWriter {
    pub fn new(destination: LogDestination) -> Self {
        Self::with_context(destination, Arc::new(ServiceIdentity))
    }

    /// Creates files through `context`, e.g. to switch to the service identity.
    pub fn with_context(destination: LogDestination, context: Arc<dyn CredentialContext>) -> Self {
        let file_set = FileLogSet::new(
            destination.directory,
            destination.base_file_name,
            destination.file_extension,
            destination.max_files,
        );
        Self {
            context,
            inner: Mutex::new(Inner {
                file_set,
                max_file_size: destination.max_file_size_bytes,
                header: None,
                state: StreamState::Uninitialized,
                output: discard(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `text` and a line separator.
    ///
    /// The size check counts one byte per character, so files holding
    /// non-ASCII text may run a few bytes over the budget.
    pub fn write_record(&self, text: &str) {
        let pending = (text.chars().count() + LINE_SEPARATOR.len()) as u64;
        let mut inner = self.lock();
        inner.write(self.context.as_ref(), pending, None, |out| {
            out.write_all(text.as_bytes())?;
            out.write_all(LINE_SEPARATOR.as_bytes())
        });
    }

    /// Appends a pre-encoded record that already ends with a platform newline.
    ///
    /// The trailing newline is replaced by [`LINE_SEPARATOR`]. When this call
    /// opens a fresh file, `header` is written once above the record.
    pub fn write_record_bytes(&self, bytes: &[u8], header: Option<&str>) {
        let body = &bytes[..bytes.len().saturating_sub(NEWLINE_WIDTH)];
        let pending = (body.len() + LINE_SEPARATOR.len()) as u64;
        let mut inner = self.lock();
        inner.write(self.context.as_ref(), pending, header, |out| {
            out.write_all(body)?;
            out.write_all(LINE_SEPARATOR.as_bytes())
        });
    }

    /// Flushes and closes the current file. Later writes are discarded.
    pub fn close(&self) {
        let mut inner = self.lock();
        if inner.state == StreamState::Closed {
            return;
        }
        inner.release_output();
        inner.state = StreamState::Closed;
    }

    /// Flushes and closes the current file but keeps the writer usable: the
    /// next write starts a new active file.
    pub fn release_file(&self) {
        let mut inner = self.lock();
        match inner.state {
            StreamState::Active | StreamState::Failed => {
                inner.release_output();
                inner.state = StreamState::Uninitialized;
            }
            StreamState::Uninitialized | StreamState::Closed => {}
        }
    }

    /// Applies a new destination. Moving the active file closes the current one.
    pub fn update(&self, destination: &LogDestination) {
        let mut inner = self.lock();
        inner.max_file_size = destination.max_file_size_bytes;
        let changed = inner.file_set.update(
            &destination.directory,
            &destination.base_file_name,
            &destination.file_extension,
            destination.max_files,
        );
        match inner.state {
            StreamState::Active if changed => {
                inner.release_output();
                inner.state = StreamState::Uninitialized;
            }
            StreamState::Failed => inner.state = StreamState::Uninitialized,
            _ => {}
        }
    }

    /// Header written at the top of every new file.
    pub fn set_header(&self, header: Option<String>) {
        self.lock().header = header;
    }

    /// Bytes written to the current file, 0 when none is open.
    pub fn current_count(&self) -> u64 {
        match &self.lock().output {
            Output::File(open) => open.bytes_written,
            Output::Discard(_) => 0,
        }
    }

    pub fn state(&self) -> StreamState {
        self.lock().state
    }

    pub fn destination(&self) -> LogDestination {
        let inner = self.lock();
        LogDestination {
            directory: inner.file_set.directory().to_path_buf(),
            base_file_name: inner.file_set.file_name().to_string(),
            file_extension: inner.file_set.file_extension().to_string(),
            max_files: inner.file_set.max_files(),
            max_file_size_bytes: inner.max_file_size,
        }
    }

    pub fn active_path(&self) -> PathBuf {
        self.lock().file_set.active_path()
    }
}

impl Inner {
    fn write(
        &mut self,
        ctx: &dyn CredentialContext,
        pending: u64,
        header: Option<&str>,
        record: impl FnOnce(&mut dyn Write) -> io::Result<()>,
    ) {
        let header_len = header.or(self.header.as_deref()).map_or(0, header_width);
        let fresh = self.prepare(ctx, pending, header_len);
        let header = if fresh {
            header.or(self.header.as_deref())
        } else {
            None
        };
        let result = match &mut self.output {
            Output::File(open) => write_to(open, header, pending, record),
            Output::Discard(sink) => {
                let _ = record(sink);
                return;
            }
        };
        if let Err(e) = result {
            log::warn!(
                target: "filelog_core",
                "unable to write to {}: {e}; discarding records until the writer is reset",
                self.file_set.active_path().display()
            );
            self.release_output();
            self.state = StreamState::Failed;
        }
    }

    /// Makes sure a file that can take `pending` more bytes is open.
    /// Returns true when a new file was opened; it then also takes the
    /// `header_len` bytes of header.
    fn prepare(&mut self, ctx: &dyn CredentialContext, pending: u64, header_len: u64) -> bool {
        let opened = match self.state {
            StreamState::Uninitialized => self.open_new_file(ctx),
            StreamState::Active => {
                let full = match &self.output {
                    Output::File(open) => {
                        self.max_file_size > 0
                            && open.bytes_written > 0
                            && open.bytes_written + pending > self.max_file_size
                    }
                    Output::Discard(_) => false,
                };
                full && self.open_new_file(ctx)
            }
            StreamState::Closed | StreamState::Failed => false,
        };
        let max = self.max_file_size;
        if opened && max > 0 && pending <= max && header_len + pending > max {
            log::warn!(
                target: "filelog_core",
                "header of {header_len} bytes leaves no room for a {pending}-byte record; {} will exceed {max} bytes",
                self.file_set.active_path().display()
            );
        }
        opened
    }

    fn open_new_file(&mut self, ctx: &dyn CredentialContext) -> bool {
        self.release_output();
        match self.file_set.create_new_file(ctx) {
            Ok(file) => {
                self.output = Output::File(OpenFile {
                    stream: BufWriter::new(file),
                    path: self.file_set.active_path(),
                    bytes_written: 0,
                    created_at: Local::now(),
                });
                self.state = StreamState::Active;
                true
            }
            Err(e) => {
                log::warn!(
                    target: "filelog_core",
                    "unable to create log file {}: {e}; discarding records until the writer is reset",
                    self.file_set.active_path().display()
                );
                self.state = StreamState::Failed;
                false
            }
        }
    }

    fn release_output(&mut self) {
        if let Output::File(open) = mem::replace(&mut self.output, discard()) {
            log::debug!(
                target: "filelog_core",
                "closing {} ({} bytes, opened {})",
                open.path.display(),
                open.bytes_written,
                open.created_at.format("%Y-%m-%dT%H:%M:%S")
            );
            try_to_close(open.stream);
        }
    }
}

/// Bytes a header line counts for, separator included.
fn header_width(header: &str) -> u64 {
    (header.chars().count() + LINE_SEPARATOR.len()) as u64
}

fn write_to(
    open: &mut OpenFile,
    header: Option<&str>,
    pending: u64,
    record: impl FnOnce(&mut dyn Write) -> io::Result<()>,
) -> io::Result<()> {
    if let Some(header) = header {
        open.stream.write_all(header.as_bytes())?;
        open.stream.write_all(LINE_SEPARATOR.as_bytes())?;
        open.bytes_written += header_width(header);
    }
    record(&mut open.stream)?;
    open.stream.flush()?;
    open.bytes_written += pending;
    Ok(())
}
