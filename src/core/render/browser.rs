use super::{RenderedImage, Renderer};
use crate::core::pass::PassView;
use crate::core::template::PassTemplates;
use crate::error::{PassError, Result};

use async_trait::async_trait;
use std::ffi::OsString;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;

/// Executables probed on `PATH`, in order, when no explicit browser is configured.
pub const BROWSER_CANDIDATES: &[&str] = &["chromium", "chromium-browser", "google-chrome", "google-chrome-stable"];

/// Attribute the measuring script writes the document height into.
const HEIGHT_ATTR: &str = "data-pass-height";

/// Upper bound for the screenshot height, whatever the page reports.
pub const MAX_PAGE_HEIGHT: u32 = 16_384;

const MEASURE_SCRIPT: &str = r#"<script>(function () {
  var root = document.documentElement;
  function measure() {
    var body = document.body;
    root.setAttribute("data-pass-height", Math.ceil(Math.max(root.scrollHeight, body ? body.scrollHeight : 0)));
  }
  measure();
  window.addEventListener("load", measure);
})();</script>"#;

/// Renders the HTML template and screenshots the whole page with a headless Chromium.
///
/// Chromium's `--screenshot` only captures the viewport, so every render
/// launches the browser twice: once with `--dump-dom` to measure the page
/// height, then again with the window stretched to that height. Both runs
/// share a throwaway profile directory so concurrent renders never share state.
#[derive(Debug, Clone)]
pub struct BrowserRenderer {
  templates: PassTemplates,
  executable: Option<PathBuf>,
  search_path: Option<OsString>,
  timeout: Duration,
  window_size: (u32, u32),
}

impl BrowserRenderer {
  pub fn new(templates: PassTemplates) -> Self {
    Self {
      templates,
      executable: None,
      search_path: None,
      timeout: Duration::from_secs(30),
      window_size: (800, 400),
    }
  }

  /// Uses `path` instead of searching `PATH` for a browser.
  pub fn executable(mut self, path: impl Into<PathBuf>) -> Self {
    self.executable = Some(path.into());
    self
  }

  /// Directories searched for a browser, in `PATH` syntax. Defaults to `$PATH`.
  pub fn search_path(mut self, paths: impl Into<OsString>) -> Self {
    self.search_path = Some(paths.into());
    self
  }

  /// Limit for each browser launch.
  pub fn timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  /// Viewport width and minimum height of the screenshot.
  pub fn window_size(mut self, width: u32, height: u32) -> Self {
    self.window_size = (width, height);
    self
  }

  fn resolve_executable(&self) -> Result<PathBuf> {
    if let Some(path) = &self.executable {
      return Ok(path.clone());
    }
    let paths = self.search_path.clone().or_else(|| std::env::var_os("PATH")).unwrap_or_default();
    BROWSER_CANDIDATES
      .iter()
      .find_map(|name| find_in_path(&paths, name))
      .ok_or_else(|| PassError::BrowserNotFound(BROWSER_CANDIDATES.iter().map(|s| s.to_string()).collect()))
  }

  fn base_args(&self, profile: &Path, (width, height): (u32, u32)) -> Vec<OsString> {
    vec![
      "--headless".into(),
      "--disable-gpu".into(),
      "--no-sandbox".into(),
      "--hide-scrollbars".into(),
      "--no-first-run".into(),
      format!("--window-size={width},{height}").into(),
      flag_with_path("--user-data-dir=", profile),
    ]
  }

  fn measure_args(&self, page: &Path, profile: &Path) -> Vec<OsString> {
    let mut args = self.base_args(profile, self.window_size);
    args.push("--dump-dom".into());
    args.push(file_url(page));
    args
  }

  fn screenshot_args(&self, page: &Path, screenshot: &Path, profile: &Path, size: (u32, u32)) -> Vec<OsString> {
    let mut args = self.base_args(profile, size);
    args.push(flag_with_path("--screenshot=", screenshot));
    args.push(file_url(page));
    args
  }

  /// Runs the browser once, enforcing the timeout and a successful exit.
  async fn launch(&self, executable: &Path, args: Vec<OsString>) -> Result<Output> {
    log::debug!("Launching headless browser {}", executable.display());
    let child = Command::new(executable)
      .args(args)
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true)
      .spawn()?;

    let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
      Ok(output) => output?,
      Err(_) => return Err(PassError::BrowserTimeout(self.timeout)),
    };

    if !output.status.success() {
      return Err(PassError::Browser {
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      });
    }
    Ok(output)
  }
}

fn flag_with_path(flag: &str, path: &Path) -> OsString {
  let mut arg = OsString::from(flag);
  arg.push(path);
  arg
}

fn file_url(path: &Path) -> OsString {
  flag_with_path("file://", path)
}

fn find_in_path(paths: &OsString, name: &str) -> Option<PathBuf> {
  std::env::split_paths(paths)
    .map(|dir| dir.join(name))
    .find(|candidate| candidate.is_file())
}

/// Inserts the height measuring script before `</body>`, or appends it.
fn with_measure_script(html: &str) -> String {
  let needle = b"</body>";
  let at = html
    .as_bytes()
    .windows(needle.len())
    .rposition(|window| window.eq_ignore_ascii_case(needle))
    .unwrap_or(html.len());

  let mut out = String::with_capacity(html.len() + MEASURE_SCRIPT.len());
  out.push_str(&html[..at]);
  out.push_str(MEASURE_SCRIPT);
  out.push_str(&html[at..]);
  out
}

/// Reads the measured height back out of a `--dump-dom` serialisation.
fn measured_height(dom: &str) -> Option<u32> {
  let marker = format!("{HEIGHT_ATTR}=\"");
  let start = dom.find(&marker)? + marker.len();
  let digits: String = dom[start..].chars().take_while(char::is_ascii_digit).collect();
  digits.parse().ok()
}

/// The window height for the screenshot: never below the viewport, never above the cap.
fn screenshot_height(measured: Option<u32>, viewport: u32) -> u32 {
  measured.map_or(viewport, |h| h.clamp(viewport, MAX_PAGE_HEIGHT.max(viewport)))
}

#[async_trait]
impl Renderer for BrowserRenderer {
  fn name(&self) -> &'static str {
    "browser"
  }

  async fn render(&self, view: &PassView) -> Result<RenderedImage> {
    let html = self.templates.render_pass(view)?;
    let executable = self.resolve_executable()?;

    // Everything the browser touches lives here and is removed on drop.
    let workdir = tempfile::tempdir()?;
    let page = workdir.path().join("pass.html");
    let measure_page = workdir.path().join("measure.html");
    let screenshot = workdir.path().join("pass.png");
    let profile = workdir.path().join("profile");
    tokio::fs::write(&measure_page, with_measure_script(&html)).await?;
    tokio::fs::write(&page, html).await?;

    let dump = self.launch(&executable, self.measure_args(&measure_page, &profile)).await?;
    let measured = measured_height(&String::from_utf8_lossy(&dump.stdout));
    if measured.is_none() {
      log::warn!("Could not measure the pass page height, using the viewport height");
    }

    let (width, viewport_height) = self.window_size;
    let height = screenshot_height(measured, viewport_height);
    self
      .launch(&executable, self.screenshot_args(&page, &screenshot, &profile, (width, height)))
      .await?;

    let bytes = tokio::fs::read(&screenshot).await?;
    let (width, height) = image::ImageReader::new(Cursor::new(&bytes))
      .with_guessed_format()?
      .into_dimensions()?;

    Ok(RenderedImage {
      bytes: bytes.into(),
      width,
      height,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  fn templates() -> PassTemplates {
    let dir = tempdir().unwrap();
    let glob_path = dir.path().join("*.html").to_str().unwrap().to_string();
    PassTemplates::builder(&glob_path).build().unwrap()
  }

  fn view() -> PassView {
    PassView {
      passenger: "Jane Doe".into(),
      flight: "AF22".into(),
      seat: "12A".into(),
      ..PassView::default()
    }
  }

  #[cfg(unix)]
  fn fake_browser(dir: &Path, name: &str, script: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{script}")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
  }

  fn strings(args: Vec<OsString>) -> Vec<String> {
    args.into_iter().map(|a| a.into_string().unwrap()).collect()
  }

  #[test]
  fn test_screenshot_args() {
    let renderer = BrowserRenderer::new(templates()).window_size(1024, 512);
    let args = strings(renderer.screenshot_args(
      Path::new("/tmp/x/pass.html"),
      Path::new("/tmp/x/pass.png"),
      Path::new("/tmp/x/profile"),
      (1024, 900),
    ));

    assert!(args.contains(&"--headless".to_string()));
    assert!(args.contains(&"--window-size=1024,900".to_string()));
    assert!(args.contains(&"--screenshot=/tmp/x/pass.png".to_string()));
    assert!(args.contains(&"--user-data-dir=/tmp/x/profile".to_string()));
    assert_eq!(args.last().unwrap(), "file:///tmp/x/pass.html");
  }

  #[test]
  fn test_measure_args_use_viewport_and_dump_dom() {
    let renderer = BrowserRenderer::new(templates()).window_size(1024, 512);
    let args = strings(renderer.measure_args(Path::new("/tmp/x/measure.html"), Path::new("/tmp/x/profile")));

    assert!(args.contains(&"--dump-dom".to_string()));
    assert!(args.contains(&"--window-size=1024,512".to_string()));
    assert!(!args.iter().any(|a| a.starts_with("--screenshot")));
    assert_eq!(args.last().unwrap(), "file:///tmp/x/measure.html");
  }

  #[test]
  fn test_measure_script_goes_before_body_close() {
    let html = with_measure_script("<html><BODY>pass</BODY></html>");
    assert!(html.starts_with("<html><BODY>pass<script>"));
    assert!(html.ends_with("</script></BODY></html>"));

    let fragment = with_measure_script("<p>pass</p>");
    assert!(fragment.starts_with("<p>pass</p><script>"));
  }

  #[test]
  fn test_measured_height_from_dom() {
    assert_eq!(measured_height(r#"<html lang="en" data-pass-height="1200"><body></body></html>"#), Some(1200));
    assert_eq!(measured_height("<html><body></body></html>"), None);
    assert_eq!(measured_height(r#"<html data-pass-height=""></html>"#), None);
  }

  #[test]
  fn test_screenshot_height_bounds() {
    assert_eq!(screenshot_height(Some(1200), 400), 1200);
    assert_eq!(screenshot_height(Some(150), 400), 400);
    assert_eq!(screenshot_height(None, 400), 400);
    assert_eq!(screenshot_height(Some(100_000), 400), MAX_PAGE_HEIGHT);
  }

  #[tokio::test]
  async fn test_missing_executable_fails() {
    let renderer = BrowserRenderer::new(templates()).executable("/nonexistent/chromium");
    let err = renderer.render(&view()).await.unwrap_err();
    assert!(matches!(err, PassError::Io(_)));
  }

  #[tokio::test]
  async fn test_no_browser_on_search_path() {
    let empty = tempdir().unwrap();
    let renderer = BrowserRenderer::new(templates()).search_path(empty.path());

    match renderer.render(&view()).await.unwrap_err() {
      PassError::BrowserNotFound(tried) => assert_eq!(tried, BROWSER_CANDIDATES),
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[cfg(unix)]
  #[test]
  fn test_browser_found_on_search_path() {
    let dir = tempdir().unwrap();
    fake_browser(dir.path(), "chromium-browser", "exit 7\n");
    let renderer = BrowserRenderer::new(templates()).search_path(dir.path());

    assert_eq!(renderer.resolve_executable().unwrap(), dir.path().join("chromium-browser"));
  }

  #[cfg(unix)]
  #[tokio::test]
  async fn test_tall_page_is_captured_in_full() {
    let dir = tempdir().unwrap();
    // Stands in for what Chromium writes with an 800x1200 window.
    let shot = dir.path().join("shot.png");
    image::RgbaImage::from_pixel(800, 1200, image::Rgba([255, 255, 255, 255]))
      .save(&shot)
      .unwrap();
    let calls = dir.path().join("calls.log");
    let script = format!(
      r#"echo "$@" >> "{calls}"
for arg in "$@"; do
  case "$arg" in
    --dump-dom) echo '<html data-pass-height="1200"><body></body></html>' ;;
    --screenshot=*) cp "{shot}" "${{arg#--screenshot=}}" ;;
  esac
done
"#,
      calls = calls.display(),
      shot = shot.display()
    );
    let fake = fake_browser(dir.path(), "tall-chrome", &script);

    let renderer = BrowserRenderer::new(templates()).executable(&fake).window_size(800, 400);
    let rendered = renderer.render(&view()).await.unwrap();

    assert_eq!((rendered.width, rendered.height), (800, 1200));
    let recorded = std::fs::read_to_string(&calls).unwrap();
    let launches: Vec<&str> = recorded.lines().collect();
    assert_eq!(launches.len(), 2);
    assert!(launches[0].contains("--dump-dom"));
    assert!(launches[0].contains("--window-size=800,400"));
    assert!(launches[1].contains("--window-size=800,1200"));
  }

  #[cfg(unix)]
  #[tokio::test]
  async fn test_failing_browser_reports_stderr() {
    let dir = tempdir().unwrap();
    let fake = fake_browser(dir.path(), "fake-chrome", "echo 'cannot open display' >&2\nexit 3\n");

    let renderer = BrowserRenderer::new(templates()).executable(&fake);
    match renderer.render(&view()).await.unwrap_err() {
      PassError::Browser { stderr, .. } => assert_eq!(stderr, "cannot open display"),
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[cfg(unix)]
  #[tokio::test]
  async fn test_slow_browser_times_out() {
    let dir = tempdir().unwrap();
    let fake = fake_browser(dir.path(), "slow-chrome", "sleep 5\n");

    let renderer = BrowserRenderer::new(templates())
      .executable(&fake)
      .timeout(Duration::from_millis(100));
    let err = renderer.render(&view()).await.unwrap_err();
    assert!(matches!(err, PassError::BrowserTimeout(_)));
  }
}
