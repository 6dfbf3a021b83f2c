use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("I/O failure on {}: {source}", path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, MonitorError>;

impl MonitorError {
    /// Classifies an I/O error raised while touching `path`.
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => MonitorError::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => {
                MonitorError::PermissionDenied(format!("{}: {source}", path.display()))
            }
            _ => MonitorError::IoFailure {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    /// Errors a sampling or ranking pass may skip over instead of aborting.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, MonitorError::PermissionDenied(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_are_classified_by_kind() {
        let path = Path::new("/var/log/app.log");

        let err = MonitorError::from_io(path, io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, MonitorError::NotFound(ref p) if p == path));

        let err = MonitorError::from_io(path, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, MonitorError::PermissionDenied(_)));
        assert!(err.is_recoverable());

        let err = MonitorError::from_io(path, io::Error::other("disk on fire"));
        assert!(matches!(err, MonitorError::IoFailure { .. }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn display_messages_are_human_readable() {
        let err = MonitorError::InvalidArgument("count must be greater than 0".into());
        assert_eq!(err.to_string(), "invalid argument: count must be greater than 0");

        let err = MonitorError::NotFound(PathBuf::from("/missing"));
        assert_eq!(err.to_string(), "not found: /missing");
    }
}
