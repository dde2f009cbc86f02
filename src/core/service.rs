use crate::core::output::{OutputMode, PassStore, encode_base64, temp_pass_dir};
use crate::core::pass::PassRequest;
use crate::core::render::{BrowserRenderer, RasterRenderer, Renderer, RendererKind};
use crate::core::template::{PassTemplates, PassTemplatesBuilder};
use crate::error::Result;

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// The result of a successful generate call.
#[derive(Debug, Clone, PartialEq)]
pub enum Generated {
  /// Public URL of a stored PNG.
  Url(String),
  /// The PNG bytes, base64 encoded.
  Base64(String),
  /// The substituted HTML page.
  Html(String),
}

/// The request pipeline: validate, substitute, render, deliver.
///
/// Cheap to clone; every clone shares the same templates and renderer.
/// `OutputMode::Html` never renders an image, so it carries no renderer.
#[derive(Clone, Debug)]
pub struct PassService {
  pub(crate) templates: PassTemplates,
  pub(crate) renderer: Option<Arc<dyn Renderer>>,
  pub(crate) mode: OutputMode,
  pub(crate) store: PassStore,
}

impl PassService {
  /// Creates a new `PassServiceBuilder`.
  ///
  /// # Arguments
  ///
  /// * `templates_glob` - A glob pattern for the HTML templates.
  pub fn builder(templates_glob: &str) -> PassServiceBuilder {
    PassServiceBuilder::new(templates_glob)
  }

  pub fn output_mode(&self) -> OutputMode {
    self.mode
  }

  pub fn store(&self) -> &PassStore {
    &self.store
  }

  pub async fn generate(&self, request: PassRequest) -> Result<Generated> {
    let pass = request.validate()?;
    let view = pass.view();

    let Some(renderer) = &self.renderer else {
      log::info!("Generating HTML boarding pass for {} on {}", pass.passenger, pass.flight);
      return Ok(Generated::Html(self.templates.render_pass(&view)?));
    };

    log::info!(
      "Generating {:?} boarding pass for {} on {} ({})",
      self.mode,
      pass.passenger,
      pass.flight,
      renderer.name()
    );
    let image = renderer.render(&view).await?;
    log::debug!("Rendered {}x{} pass, {} bytes", image.width, image.height, image.bytes.len());

    match self.mode {
      OutputMode::Base64 => Ok(Generated::Base64(encode_base64(&image.bytes))),
      _ => {
        let url = self.store.save(&pass.file_stem(), &image.bytes).await?;
        log::info!("Boarding Pass URL: {}", url);
        Ok(Generated::Url(url))
      }
    }
  }
}

/// A builder for creating a configured `PassService`.
pub struct PassServiceBuilder {
  templates: PassTemplatesBuilder,
  template_dir: PathBuf,
  public_dir: PathBuf,
  base_url: String,
  kind: RendererKind,
  custom_renderer: Option<Arc<dyn Renderer>>,
  mode: OutputMode,
  font_path: Option<PathBuf>,
  chrome_path: Option<PathBuf>,
  browser_timeout: Duration,
  window_size: (u32, u32),
}

impl PassServiceBuilder {
  pub(crate) fn new(templates_glob: &str) -> Self {
    Self {
      templates: PassTemplates::builder(templates_glob),
      template_dir: PathBuf::from("template"),
      public_dir: PathBuf::from("public"),
      base_url: "http://localhost:3000".to_string(),
      kind: RendererKind::Raster,
      custom_renderer: None,
      mode: OutputMode::Url,
      font_path: None,
      chrome_path: None,
      browser_timeout: Duration::from_secs(30),
      window_size: (800, 400),
    }
  }

  /// Adds a global template variable, e.g. a default `airline`.
  pub fn add_global<S: Into<String>, T: Serialize>(mut self, key: S, value: T) -> Self {
    self.templates = self.templates.add_global(key, value);
    self
  }

  pub fn configure_tera<F>(mut self, configurator: F) -> Self
  where
    F: FnOnce(&mut tera::Tera) + 'static,
  {
    self.templates = self.templates.configure_tera(configurator);
    self
  }

  /// Directory holding the raster template image.
  pub fn template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.template_dir = dir.into();
    self
  }

  /// Passes are stored in `<dir>/passes` in `OutputMode::Url`.
  pub fn public_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.public_dir = dir.into();
    self
  }

  pub fn base_url(mut self, url: &str) -> Self {
    self.base_url = url.to_string();
    self
  }

  pub fn renderer(mut self, kind: RendererKind) -> Self {
    self.kind = kind;
    self
  }

  /// Uses a caller supplied renderer instead of one of the built-in kinds.
  pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
    self.custom_renderer = Some(renderer);
    self
  }

  pub fn output(mut self, mode: OutputMode) -> Self {
    self.mode = mode;
    self
  }

  pub fn font_path(mut self, path: impl Into<PathBuf>) -> Self {
    self.font_path = Some(path.into());
    self
  }

  pub fn chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
    self.chrome_path = Some(path.into());
    self
  }

  pub fn browser_timeout(mut self, timeout: Duration) -> Self {
    self.browser_timeout = timeout;
    self
  }

  pub fn window_size(mut self, width: u32, height: u32) -> Self {
    self.window_size = (width, height);
    self
  }

  /// Builds the templates and renderer, creating the storage directory when
  /// the output mode writes files.
  ///
  /// No renderer is built in `OutputMode::Html`, so a bad `font_path` only
  /// fails the build when images are produced.
  pub fn build(self) -> Result<PassService> {
    let templates = self.templates.build()?;

    let renderer: Option<Arc<dyn Renderer>> = match (self.mode, self.custom_renderer, self.kind) {
      (OutputMode::Html, _, _) => None,
      (_, Some(renderer), _) => Some(renderer),
      (_, None, RendererKind::Raster) => Some(Arc::new(RasterRenderer::new(
        &self.template_dir,
        self.font_path.as_deref(),
      )?)),
      (_, None, RendererKind::Browser) => {
        let (width, height) = self.window_size;
        let mut browser = BrowserRenderer::new(templates.clone())
          .timeout(self.browser_timeout)
          .window_size(width, height);
        if let Some(path) = self.chrome_path {
          browser = browser.executable(path);
        }
        Some(Arc::new(browser))
      }
    };

    let store_dir = match self.mode {
      OutputMode::Temp => temp_pass_dir(),
      _ => self.public_dir.join("passes"),
    };
    let store = PassStore::new(store_dir, &self.base_url);
    if self.mode.stores_files() {
      store.ensure_dir()?;
    }

    match &renderer {
      Some(renderer) => log::info!(
        "Boarding pass service ready: {} renderer, {:?} output",
        renderer.name(),
        self.mode
      ),
      None => log::info!("Boarding pass service ready: {:?} output", self.mode),
    }

    Ok(PassService {
      templates,
      renderer,
      mode: self.mode,
      store,
    })
  }
}
