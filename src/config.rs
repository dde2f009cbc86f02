use crate::core::output::OutputMode;
use crate::core::render::RendererKind;
use crate::core::service::{PassService, PassServiceBuilder};

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration, read from flags or the matching environment variables.
#[derive(Parser, Debug, Clone)]
#[command(name = "boardpass", version, about = "Boarding pass rendering service")]
pub struct Settings {
  #[arg(long, env = "HOST", default_value = "0.0.0.0")]
  pub host: String,

  #[arg(short, long, env = "PORT", default_value_t = 3000)]
  pub port: u16,

  /// Public URL prefix used when returning links to stored passes.
  #[arg(long, env = "BASE_URL", default_value = "http://localhost:3000")]
  pub base_url: String,

  /// Directory whose `passes/` subdirectory receives generated images.
  #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
  pub public_dir: PathBuf,

  /// Directory holding `boarding-pass-template.png` for the raster renderer.
  #[arg(long, env = "TEMPLATE_DIR", default_value = "template")]
  pub template_dir: PathBuf,

  /// Tera glob for HTML templates.
  #[arg(long, env = "TEMPLATES_GLOB", default_value = "templates/**/*.html")]
  pub templates_glob: String,

  #[arg(long, env = "RENDERER", value_enum, default_value_t = RendererKind::Raster)]
  pub renderer: RendererKind,

  #[arg(long, env = "OUTPUT_MODE", value_enum, default_value_t = OutputMode::Url)]
  pub output: OutputMode,

  /// TrueType font for the raster renderer. Defaults to the bundled DejaVu Sans.
  #[arg(long, env = "FONT_PATH")]
  pub font_path: Option<PathBuf>,

  /// Headless browser executable. Searched on PATH when unset.
  #[arg(long, env = "CHROME_PATH")]
  pub chrome_path: Option<PathBuf>,

  #[arg(long, env = "BROWSER_TIMEOUT_SECS", default_value_t = 30)]
  pub browser_timeout_secs: u64,

  /// Browser viewport as WIDTHxHEIGHT.
  #[arg(long, env = "WINDOW_SIZE", default_value = "800x400", value_parser = parse_window_size)]
  pub window_size: (u32, u32),

  /// Airline shown when a request does not name one.
  #[arg(long, env = "DEFAULT_AIRLINE")]
  pub default_airline: Option<String>,
}

impl Settings {
  /// A service builder carrying every option from these settings.
  pub fn service_builder(&self) -> PassServiceBuilder {
    let (width, height) = self.window_size;
    let mut builder = PassService::builder(&self.templates_glob)
      .template_dir(&self.template_dir)
      .public_dir(&self.public_dir)
      .base_url(&self.base_url)
      .renderer(self.renderer)
      .output(self.output)
      .browser_timeout(Duration::from_secs(self.browser_timeout_secs))
      .window_size(width, height);

    if let Some(font) = &self.font_path {
      builder = builder.font_path(font);
    }
    if let Some(chrome) = &self.chrome_path {
      builder = builder.chrome_path(chrome);
    }
    if let Some(airline) = &self.default_airline {
      builder = builder.add_global("airline", airline);
    }
    builder
  }
}

fn parse_window_size(s: &str) -> Result<(u32, u32), String> {
  let (w, h) = s
    .split_once(['x', 'X'])
    .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{s}`"))?;
  let parse = |v: &str| v.trim().parse::<u32>().map_err(|e| format!("invalid dimension `{v}`: {e}"));
  match (parse(w)?, parse(h)?) {
    (0, _) | (_, 0) => Err("window dimensions must be non-zero".to_string()),
    size => Ok(size),
  }
}
