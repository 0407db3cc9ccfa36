//! Stateless filesystem helpers shared by the file set and the writer.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use regex::Regex;

use crate::error::DirectoryError;

/// Line separator appended to every record.
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// Width of the line ending already carried by pre-encoded records.
pub const NEWLINE_WIDTH: usize = LINE_SEPARATOR.len();

/// Creates `dir` (and its parents) if needed and checks that it is a directory.
///
/// Write access is left to the open of the log file itself: permission bits
/// do not tell whether this process may create files there.
pub fn validate_directory(dir: &Path) -> Result<PathBuf, DirectoryError> {
    if let Err(source) = fs::create_dir_all(dir) {
        // Someone else may have created it between our check and our mkdir.
        if !dir.is_dir() {
            if dir.exists() {
                return Err(DirectoryError::NotADirectory(dir.to_path_buf()));
            }
            return Err(DirectoryError::CreateFailed {
                path: dir.to_path_buf(),
                source,
            });
        }
    }
    let metadata = fs::metadata(dir).map_err(|source| DirectoryError::CreateFailed {
        path: dir.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(DirectoryError::NotADirectory(dir.to_path_buf()));
    }
    Ok(dir.to_path_buf())
}

/// Names of the entries in `directory` matching `pattern`. Empty on any error.
///
/// Directories are listed too so that pruning reports the ones it cannot
/// remove instead of silently skipping them.
pub fn find_files(directory: &Path, pattern: &Regex) -> Vec<String> {
    let Ok(entries) = fs::read_dir(directory) else {
        return Vec::new();
    };
    entries
        .flatten()
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| pattern.is_match(name))
        .collect()
}

/// Pattern for `<base>_yy.MM.dd_HH.mm.ss.<N><extension>`.
///
/// Capture 1 is the timestamp, capture 2 the counter.
pub fn compile_rolled_file_name(base_name: &str, extension: &str) -> Regex {
    let pattern = format!(
        r"^{}_(\d{{2}}\.\d{{2}}\.\d{{2}}_\d{{2}}\.\d{{2}}\.\d{{2}})\.(\d+){}$",
        regex::escape(base_name),
        regex::escape(extension)
    );
    Regex::new(&pattern).expect("escaped rolled file name pattern is valid")
}

/// Best-effort delete of a file (or an empty directory).
pub fn delete_file(path: &Path) -> bool {
    let result = if path.is_dir() {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Ok(()) => true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!(target: "filelog_core", "unable to delete {}: no such file", path.display());
            false
        }
        Err(e) if e.kind() == io::ErrorKind::DirectoryNotEmpty => {
            log::warn!(target: "filelog_core", "unable to delete {}: directory not empty", path.display());
            false
        }
        Err(e) => {
            log::warn!(target: "filelog_core", "unable to delete {}: {e}", path.display());
            false
        }
    }
}

/// Flushes and drops `closable`, reporting whether the flush went through.
pub fn try_to_close<W: Write>(mut closable: W) -> bool {
    match closable.flush() {
        Ok(()) => true,
        Err(e) => {
            log::debug!(target: "filelog_core", "ignoring error while closing stream: {e}");
            false
        }
    }
}
