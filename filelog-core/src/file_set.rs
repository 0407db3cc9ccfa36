use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::{
    context::CredentialContext,
    helpers::{compile_rolled_file_name, delete_file, find_files, validate_directory},
};

/// Where records go, and which previous files may be pruned.
///
/// The active file is always `<directory>/<file_name><file_extension>`. Previous
/// files are renamed to `<file_name>_yy.MM.dd_HH.mm.ss.<N><file_extension>`.
#[derive(Debug)]
pub struct FileLogSet {
    directory: PathBuf,
    file_name: String,
    file_extension: String,
    max_files: u32,
    rolled_pattern: Regex,
    last_date_string: Option<String>,
    last_counter: u32,
}

impl FileLogSet {
    pub fn new(
        directory: impl Into<PathBuf>,
        file_name: impl Into<String>,
        file_extension: impl Into<String>,
        max_files: u32,
    ) -> Self {
        let file_name = file_name.into();
        let file_extension = file_extension.into();
        let rolled_pattern = compile_rolled_file_name(&file_name, &file_extension);
        Self {
            directory: directory.into(),
            file_name,
            file_extension,
            max_files,
            rolled_pattern,
            last_date_string: None,
            last_counter: 0,
        }
    }

    /// Swaps the configuration. Returns true when the directory, file name or
    /// extension changed, i.e. when the active file moved.
    pub fn update(
        &mut self,
        directory: &Path,
        file_name: &str,
        file_extension: &str,
        max_files: u32,
    ) -> bool {
        self.max_files = max_files;
        let name_changed = self.file_name != file_name || self.file_extension != file_extension;
        let changed = name_changed || self.directory != directory;
        if name_changed {
            self.file_name = file_name.to_string();
            self.file_extension = file_extension.to_string();
            self.rolled_pattern = compile_rolled_file_name(file_name, file_extension);
        }
        if changed {
            self.directory = directory.to_path_buf();
            self.last_date_string = None;
            self.last_counter = 0;
        }
        changed
    }

    /// Rolls any existing active file out of the way, prunes old rolled files and
    /// opens a fresh active file for appending.
    ///
    /// A failed rename is logged and creation goes on; the returned file then
    /// appends to the old active file.
    pub fn create_new_file(&mut self, ctx: &dyn CredentialContext) -> io::Result<File> {
        ctx.run_as_service(&mut || self.roll_and_create())
    }

    fn roll_and_create(&mut self) -> io::Result<File> {
        validate_directory(&self.directory)?;
        let active = self.active_path();
        if active.is_file() {
            let rolled = self.next_rolled_path(Utc::now());
            match fs::rename(&active, &rolled) {
                Ok(()) => log::debug!(
                    target: "filelog_core",
                    "rolled {} to {}",
                    active.display(),
                    rolled.display()
                ),
                Err(e) => log::warn!(
                    target: "filelog_core",
                    "unable to roll {} to {}: {e}; appending to the existing file",
                    active.display(),
                    rolled.display()
                ),
            }
        }
        self.prune();
        File::options().create(true).append(true).open(&active)
    }

    fn next_rolled_path(&mut self, now: DateTime<Utc>) -> PathBuf {
        let date = date_string(now);
        let mut counter = match &self.last_date_string {
            Some(last) if *last == date => self.last_counter + 1,
            _ => 0,
        };
        let mut path = self.directory.join(self.rolled_file_name(&date, counter));
        while path.exists() {
            counter += 1;
            path = self.directory.join(self.rolled_file_name(&date, counter));
        }
        self.last_date_string = Some(date);
        self.last_counter = counter;
        path
    }

    fn rolled_file_name(&self, date: &str, counter: u32) -> String {
        format!(
            "{}_{date}.{counter}{}",
            self.file_name, self.file_extension
        )
    }

    fn prune(&self) {
        if self.max_files == 0 {
            return;
        }
        let files = self.rolled_files();
        let excess = files.len().saturating_sub(self.max_files as usize);
        for name in files.iter().take(excess) {
            delete_file(&self.directory.join(name));
        }
    }

    /// Rolled file names currently on disk, oldest first.
    pub fn rolled_files(&self) -> Vec<String> {
        let mut files = find_files(&self.directory, &self.rolled_pattern);
        files.sort_by_cached_key(|name| {
            self.rolled_pattern
                .captures(name)
                .map(|caps| {
                    let counter = caps[2].parse::<u64>().unwrap_or(u64::MAX);
                    (caps[1].to_string(), counter)
                })
                .unwrap_or_default()
        });
        files
    }

    pub fn active_path(&self) -> PathBuf {
        self.directory
            .join(format!("{}{}", self.file_name, self.file_extension))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn file_extension(&self) -> &str {
        &self.file_extension
    }

    pub fn max_files(&self) -> u32 {
        self.max_files
    }
}

/// Timestamp part of a rolled file name, `yy.MM.dd_HH.mm.ss`.
///
/// Always UTC: pruning orders rolled files by this text, and local time runs
/// backwards when daylight saving ends.
pub fn date_string(time: DateTime<Utc>) -> String {
    time.format("%y.%m.%d_%H.%M.%S").to_string()
}
