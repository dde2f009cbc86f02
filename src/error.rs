use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A specialized `Result` type for `boardpass` operations.
pub type Result<T, E = PassError> = std::result::Result<T, E>;

/// The primary error type for all `boardpass` operations.
#[derive(Debug, Error)]
pub enum PassError {
  /// One or more of the required request fields was absent or blank.
  #[error("Missing required field(s): {}", .0.join(", "))]
  MissingFields(Vec<&'static str>),

  /// The request body could not be decoded as a boarding pass payload.
  #[error("Invalid request body: {0}")]
  InvalidBody(String),

  /// An error originating from the `tera` templating engine.
  #[error("Tera rendering error: {0}")]
  Tera(#[from] tera::Error),

  /// An I/O error, typically from reading templates or writing passes.
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  /// The static PNG template used by the raster renderer does not exist.
  #[error("Template image not found on server: {}", .0.display())]
  MissingTemplate(PathBuf),

  /// Decoding the template or encoding the pass image failed.
  #[error("Image error: {0}")]
  Image(#[from] image::ImageError),

  /// The configured TrueType font could not be parsed.
  #[error("Font error: {0}")]
  Font(String),

  /// No headless browser executable could be located.
  #[error("No headless browser found (tried: {})", .0.join(", "))]
  BrowserNotFound(Vec<String>),

  /// The headless browser exited unsuccessfully.
  #[error("Headless browser exited with {status}: {stderr}")]
  Browser { status: String, stderr: String },

  /// The headless browser did not finish within the configured timeout.
  #[error("Headless browser timed out after {0:?}")]
  BrowserTimeout(Duration),

  /// A blocking render task panicked or was cancelled.
  #[error("Render task failed: {0}")]
  Task(#[from] tokio::task::JoinError),

  /// An error from the file watcher, only available with the `devel` feature.
  #[cfg(feature = "devel")]
  #[error("File watcher error: {0}")]
  Watcher(#[from] notify::Error),
}

impl PassError {
  /// Whether the error was caused by the client rather than the server.
  pub fn is_client_error(&self) -> bool {
    matches!(self, PassError::MissingFields(_) | PassError::InvalidBody(_))
  }
}
