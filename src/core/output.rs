use crate::error::Result;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::{Path, PathBuf};

/// URL prefix under which stored passes are served.
pub const PASSES_ROUTE: &str = "/passes";

/// How a generated pass is handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputMode {
  /// Save under the public directory and return its URL.
  Url,
  /// Save under the system temp directory and return its URL.
  Temp,
  /// Return the PNG bytes base64 encoded.
  Base64,
  /// Return the substituted HTML page without rendering an image.
  Html,
}

impl OutputMode {
  /// Whether this mode writes image files that need to be served.
  pub fn stores_files(self) -> bool {
    matches!(self, OutputMode::Url | OutputMode::Temp)
  }
}

/// Default storage directory for `OutputMode::Temp`.
pub fn temp_pass_dir() -> PathBuf {
  std::env::temp_dir().join("boarding-passes")
}

/// A directory of rendered passes and the public URL it is served from.
#[derive(Debug, Clone)]
pub struct PassStore {
  dir: PathBuf,
  base_url: String,
}

impl PassStore {
  pub fn new(dir: impl Into<PathBuf>, base_url: &str) -> Self {
    Self {
      dir: dir.into(),
      base_url: base_url.trim_end_matches('/').to_string(),
    }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  /// Creates the storage directory if it does not exist yet.
  pub fn ensure_dir(&self) -> Result<()> {
    std::fs::create_dir_all(&self.dir)?;
    Ok(())
  }

  /// Writes `<stem>.png` and returns the URL it will be served at.
  ///
  /// An existing pass with the same name is overwritten.
  pub async fn save(&self, stem: &str, png: &[u8]) -> Result<String> {
    let file_name = format!("{stem}.png");
    let path = self.dir.join(&file_name);

    tokio::fs::create_dir_all(&self.dir).await?;
    log::info!("Saving boarding pass to: {}", path.display());
    tokio::fs::write(&path, png).await?;

    Ok(self.url_for(&file_name))
  }

  pub fn url_for(&self, file_name: &str) -> String {
    format!("{}{}/{}", self.base_url, PASSES_ROUTE, file_name)
  }
}

/// Standard, padded base64 without any `data:` URI prefix.
pub fn encode_base64(bytes: &[u8]) -> String {
  STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[tokio::test]
  async fn test_save_writes_file_and_returns_url() {
    let dir = tempdir().unwrap();
    let store = PassStore::new(dir.path().join("passes"), "https://passes.example.com/");

    let url = store.save("AF22-JaneDoe", b"png-bytes").await.unwrap();

    assert_eq!(url, "https://passes.example.com/passes/AF22-JaneDoe.png");
    let written = std::fs::read(dir.path().join("passes/AF22-JaneDoe.png")).unwrap();
    assert_eq!(written, b"png-bytes");
  }

  #[tokio::test]
  async fn test_save_overwrites_previous_pass() {
    let dir = tempdir().unwrap();
    let store = PassStore::new(dir.path(), "http://localhost:3000");

    store.save("X1-A", b"first").await.unwrap();
    store.save("X1-A", b"second").await.unwrap();

    assert_eq!(std::fs::read(dir.path().join("X1-A.png")).unwrap(), b"second");
  }

  #[test]
  fn test_encode_base64() {
    assert_eq!(encode_base64(b"\x89PNG"), "iVBORw==");
    assert_eq!(encode_base64(b""), "");
  }

  #[test]
  fn test_only_url_and_temp_store_files() {
    assert!(OutputMode::Url.stores_files());
    assert!(OutputMode::Temp.stores_files());
    assert!(!OutputMode::Base64.stores_files());
    assert!(!OutputMode::Html.stores_files());
  }
}
