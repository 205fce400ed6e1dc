use std::path::PathBuf;

/// Единый тип ошибок fsvigil Core.
#[derive(thiserror::Error, Debug)]
pub enum VigilError {
  #[error("Root is not an existing readable directory: {0}")]
  InvalidRoot(PathBuf),

  #[error("Watcher is already running")]
  AlreadyWatching,

  #[error("Failed to register directories for watching: {0}")]
  RegistrationFailed(String),

  #[error("Event store is unavailable: {0}")]
  StoreUnavailable(#[source] rusqlite::Error),

  #[error("Query failed: {0}")]
  QueryFailed(String),

  #[error("Unknown event type in stored record: {0}")]
  UnknownEventType(String),

  #[error("Local data directory is not available on this OS/user")]
  DataDirNotFound,

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Notify error: {0}")]
  Notify(#[from] notify::Error),

  #[error("Cannot determine file name for path: {0:?}")]
  FileNameMissing(PathBuf),
}
