//! Image renderers.
//!
//! A renderer turns a [`PassView`] into PNG bytes. The raster renderer draws
//! text straight onto a template image; the browser renderer screenshots the
//! HTML template through a headless Chromium process.

use crate::core::pass::PassView;
use crate::error::Result;

use async_trait::async_trait;
use bytes::Bytes;

mod browser;
mod raster;

pub use browser::BrowserRenderer;
pub use raster::{RasterRenderer, pass_lines};

/// The built-in rendering techniques.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RendererKind {
  /// Fixed-position text on a static PNG template.
  Raster,
  /// Full-page screenshot of the HTML template in headless Chromium.
  Browser,
}

/// A PNG encoded boarding pass.
#[derive(Debug, Clone)]
pub struct RenderedImage {
  pub bytes: Bytes,
  pub width: u32,
  pub height: u32,
}

#[async_trait]
pub trait Renderer: Send + Sync + std::fmt::Debug {
  /// Short identifier used in logs.
  fn name(&self) -> &'static str;

  async fn render(&self, view: &PassView) -> Result<RenderedImage>;
}
