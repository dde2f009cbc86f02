use boardpass::{OutputMode, PassService, RendererKind};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Directory of the template image shipped with the crate.
pub fn shipped_template_dir() -> PathBuf {
  Path::new(env!("CARGO_MANIFEST_DIR")).join("template")
}

/// Builds a raster service whose public directory lives inside `dir`.
pub fn raster_service(dir: &TempDir, template_dir: &Path, mode: OutputMode) -> PassService {
  let glob_path = dir.path().join("templates/*.html").to_str().unwrap().to_string();
  PassService::builder(&glob_path)
    .template_dir(template_dir)
    .public_dir(dir.path().join("public"))
    .base_url("https://passes.example.com")
    .renderer(RendererKind::Raster)
    .output(mode)
    .build()
    .unwrap()
}

pub const FULL_PAYLOAD: &str = r#"{
  "passenger": "Jane Doe",
  "flight": "AF 22",
  "seat": "12A",
  "airline": "Air France",
  "route": "Paris to New York",
  "gate": "B7",
  "terminal": "2E",
  "bags": 2,
  "bpNumber": "BP-0042",
  "departure": "2024-05-01 14:30"
}"#;
