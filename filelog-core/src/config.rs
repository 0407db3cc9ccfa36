use std::path::PathBuf;

/// Where a writer puts its records and how much it keeps.
///
/// `(directory, base_file_name, file_extension)` identifies the active file;
/// changing any of them makes the writer start a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDestination {
    pub directory: PathBuf,
    pub base_file_name: String,
    /// Appended verbatim, include the dot (`".log"`).
    pub file_extension: String,
    /// Rolled files to keep. 0 keeps everything.
    pub max_files: u32,
    /// Size budget of one file. 0 never rolls.
    pub max_file_size_bytes: u64,
}

impl LogDestination {
    pub fn new(
        directory: impl Into<PathBuf>,
        base_file_name: impl Into<String>,
        file_extension: impl Into<String>,
    ) -> Self {
        Self {
            directory: directory.into(),
            base_file_name: base_file_name.into(),
            file_extension: file_extension.into(),
            max_files: 0,
            max_file_size_bytes: 0,
        }
    }

    pub fn with_max_files(self, max_files: u32) -> Self {
        Self { max_files, ..self }
    }

    pub fn with_max_file_size(self, max_file_size_bytes: u64) -> Self {
        Self {
            max_file_size_bytes,
            ..self
        }
    }

    pub fn active_path(&self) -> PathBuf {
        self.directory
            .join(format!("{}{}", self.base_file_name, self.file_extension))
    }
}
