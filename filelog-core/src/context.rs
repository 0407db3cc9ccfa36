use std::{fs::File, io};

/// Runs log file creation under the credentials of the service that owns the logs.
///
/// Request threads may carry a restricted identity. Implementations switch to the
/// service identity around `action` so those threads can still create log files.
pub trait CredentialContext: Send + Sync {
    fn run_as_service(&self, action: &mut dyn FnMut() -> io::Result<File>) -> io::Result<File>;
}

/// Runs the action with the caller's own identity.
#[derive(Debug, Default, Clone, Copy)]
pub struct ServiceIdentity;

impl CredentialContext for ServiceIdentity {
    fn run_as_service(&self, action: &mut dyn FnMut() -> io::Result<File>) -> io::Result<File> {
        action()
    }
}
