//! # filelog-core
//! Size-bounded rolling file writer for audit records.
//!
//! The active file is always `<directory>/<name><extension>`. When a record would
//! push it past the size budget, the file is renamed to
//! `<name>_yy.MM.dd_HH.mm.ss.<N><extension>`, the oldest rolled files beyond the
//! retention limit are deleted and a fresh active file is opened.
//!
//! ```rust
//! use filelog_core::{LogDestination, RollingFileWriter};
//!
//! let dir = std::env::temp_dir().join("filelog_doc_example");
//! let _ = std::fs::remove_dir_all(&dir);
//! let writer = RollingFileWriter::new(
//!     LogDestination::new(&dir, "audit", ".log")
//!         .with_max_files(5)
//!         .with_max_file_size(1024 * 1024),
//! );
//! writer.write_record("user=alice action=login outcome=success");
//! writer.close();
//! assert!(std::fs::read_to_string(dir.join("audit.log")).unwrap().contains("alice"));
//! ```

mod config;
mod context;
mod error;
mod file_set;
pub mod helpers;
mod writer;

pub use config::LogDestination;
pub use context::{CredentialContext, ServiceIdentity};
pub use error::DirectoryError;
pub use file_set::{FileLogSet, date_string};
pub use writer::{RollingFileWriter, StreamState};
