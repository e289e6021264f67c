use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of a platform memory query.
///
/// Every variant carries the cause reported by the host. A sampler never
/// turns one of these into a zeroed snapshot.
#[derive(Debug, Error)]
pub enum PlatformQueryError {
  #[error("Unable to read {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
  #[error("Malformed {} at line {line}: {reason}", .path.display())]
  Malformed {
    path: PathBuf,
    line: usize,
    reason: String,
  },
  #[error("Missing {field} in {}", .path.display())]
  MissingField { path: PathBuf, field: &'static str },
  #[error("Unsupported platform: {0}")]
  Unsupported(String),
}

/// Coarse cause of a [`PlatformQueryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformQueryErrorKind {
  PermissionDenied,
  Unsupported,
  Malformed,
  Io,
}

impl PlatformQueryError {
  pub fn kind(&self) -> PlatformQueryErrorKind {
    match self {
      PlatformQueryError::Io { source, .. }
        if source.kind() == io::ErrorKind::PermissionDenied =>
      {
        PlatformQueryErrorKind::PermissionDenied
      }
      PlatformQueryError::Io { .. } => PlatformQueryErrorKind::Io,
      PlatformQueryError::Malformed { .. }
      | PlatformQueryError::MissingField { .. } => {
        PlatformQueryErrorKind::Malformed
      }
      PlatformQueryError::Unsupported(_) => PlatformQueryErrorKind::Unsupported,
    }
  }
}

/// Invalid sampler configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Invalid backend must be [auto,procfs,sysinfo] got: {0}")]
  InvalidBackend(String),
  #[error("Invalid page size {value:?}: {reason}")]
  InvalidPageSize { value: String, reason: String },
}
