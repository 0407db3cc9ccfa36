use derive_from_env::FromEnv;
use filelog_core::LogDestination;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid FILELOG_* environment configuration: {0}")]
    Env(String),

    #[error("log file name must not be empty")]
    EmptyFileName,
}

/// Log destination read from `FILELOG_*` environment variables.
#[derive(FromEnv, Debug, Clone)]
#[from_env(prefix = "FILELOG")]
#[allow(non_snake_case)]
pub struct DestinationEnv {
    #[from_env(default = "logs")]
    pub DIRECTORY: String,
    #[from_env(default = "audit")]
    pub FILE_NAME: String,
    #[from_env(default = ".log")]
    pub FILE_EXTENSION: String,
    #[from_env(default = "0")]
    pub MAX_FILES: u32,
    #[from_env(default = "0")]
    pub MAX_FILE_SIZE_MB: u64,
}

impl DestinationEnv {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_env().map_err(|e| ConfigError::Env(format!("{e:?}")))
    }

    pub fn destination(&self) -> LogDestination {
        LogDestination::new(&self.DIRECTORY, &self.FILE_NAME, &self.FILE_EXTENSION)
            .with_max_files(self.MAX_FILES)
            .with_max_file_size(self.MAX_FILE_SIZE_MB.saturating_mul(1024 * 1024))
    }
}

pub(crate) fn validate(destination: &LogDestination) -> Result<(), ConfigError> {
    if destination.base_file_name.is_empty() {
        return Err(ConfigError::EmptyFileName);
    }
    Ok(())
}
