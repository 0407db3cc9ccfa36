use std::{io, path::PathBuf};

use thiserror::Error;

/// Why a log directory could not be used.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("unable to create log directory {}: {source}", .path.display())]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("log directory path {} exists but is not a directory", .0.display())]
    NotADirectory(PathBuf),
}

impl From<DirectoryError> for io::Error {
    fn from(err: DirectoryError) -> Self {
        let kind = match &err {
            DirectoryError::CreateFailed { source, .. } => source.kind(),
            DirectoryError::NotADirectory(_) => io::ErrorKind::NotADirectory,
        };
        io::Error::new(kind, err)
    }
}
