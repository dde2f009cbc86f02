use super::{RenderedImage, Renderer};
use crate::core::pass::PassView;
use crate::error::{PassError, Result};

use ab_glyph::{FontArc, PxScale};
use async_trait::async_trait;
use image::{ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// File name of the static card inside the template directory.
pub const TEMPLATE_FILE: &str = "boarding-pass-template.png";

const BUNDLED_FONT: &[u8] = include_bytes!("../../../assets/fonts/DejaVuSans.ttf");

const TEXT_LEFT: i32 = 30;
const TEXT_TOP: i32 = 40;
const LINE_HEIGHT: i32 = 30;
const FONT_SIZE: f32 = 16.0;
const TEXT_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Draws the pass fields as fixed-position text onto a static PNG template.
#[derive(Clone)]
pub struct RasterRenderer {
  template_path: PathBuf,
  font: FontArc,
}

impl std::fmt::Debug for RasterRenderer {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RasterRenderer")
      .field("template_path", &self.template_path)
      .finish_non_exhaustive()
  }
}

impl RasterRenderer {
  /// Creates a renderer reading `boarding-pass-template.png` from `template_dir`.
  ///
  /// `font_path` selects a TrueType font; the bundled DejaVu Sans is used
  /// when it is `None`. The template image itself is read on every render so
  /// it can be swapped without a restart.
  pub fn new(template_dir: impl AsRef<Path>, font_path: Option<&Path>) -> Result<Self> {
    let font = match font_path {
      Some(path) => {
        let data = std::fs::read(path)?;
        FontArc::try_from_vec(data).map_err(|e| PassError::Font(format!("{}: {}", path.display(), e)))?
      }
      None => FontArc::try_from_slice(BUNDLED_FONT).map_err(|e| PassError::Font(e.to_string()))?,
    };

    Ok(Self {
      template_path: template_dir.as_ref().join(TEMPLATE_FILE),
      font,
    })
  }

  pub fn template_path(&self) -> &Path {
    &self.template_path
  }

  fn draw(&self, lines: &[String]) -> Result<RenderedImage> {
    if !self.template_path.exists() {
      log::error!("Template NOT found at: {}", self.template_path.display());
      return Err(PassError::MissingTemplate(self.template_path.clone()));
    }

    let mut canvas: RgbaImage = image::open(&self.template_path)?.to_rgba8();
    let scale = PxScale::from(FONT_SIZE);

    for (i, line) in lines.iter().enumerate() {
      let y = TEXT_TOP + LINE_HEIGHT * i as i32;
      draw_text_mut(&mut canvas, TEXT_COLOR, TEXT_LEFT, y, scale, &self.font, line);
    }

    let (width, height) = canvas.dimensions();
    let mut png = Vec::new();
    canvas.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    Ok(RenderedImage {
      bytes: png.into(),
      width,
      height,
    })
  }
}

/// The labelled lines drawn onto the raster template, top to bottom.
pub fn pass_lines(view: &PassView) -> Vec<String> {
  [
    ("Passenger", &view.passenger),
    ("Flight", &view.flight),
    ("Seat", &view.seat),
    ("Gate", &view.gate),
    ("Terminal", &view.terminal),
    ("Boarding Pass", &view.bp_number),
    ("Departure", &view.departure),
    ("Bags", &view.bags),
  ]
  .iter()
  .map(|(label, value)| format!("{label}: {value}"))
  .collect()
}

#[async_trait]
impl Renderer for RasterRenderer {
  fn name(&self) -> &'static str {
    "raster"
  }

  async fn render(&self, view: &PassView) -> Result<RenderedImage> {
    let lines = pass_lines(view);
    let renderer = self.clone();
    // Image work is CPU bound.
    tokio::task::spawn_blocking(move || renderer.draw(&lines)).await?
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  fn view() -> PassView {
    PassView {
      passenger: "Jane Doe".into(),
      flight: "AF22".into(),
      seat: "12A".into(),
      gate: "B7".into(),
      bags: "2".into(),
      ..PassView::default()
    }
  }

  #[test]
  fn test_pass_lines_order_and_labels() {
    let lines = pass_lines(&view());
    assert_eq!(lines.len(), 8);
    assert_eq!(lines[0], "Passenger: Jane Doe");
    assert_eq!(lines[3], "Gate: B7");
    assert_eq!(lines[5], "Boarding Pass: ");
    assert_eq!(lines[7], "Bags: 2");
  }

  #[tokio::test]
  async fn test_render_draws_onto_template() {
    let dir = tempdir().unwrap();
    let template = RgbaImage::from_pixel(400, 300, Rgba([255, 255, 255, 255]));
    template.save(dir.path().join(TEMPLATE_FILE)).unwrap();

    let renderer = RasterRenderer::new(dir.path(), None).unwrap();
    let rendered = renderer.render(&view()).await.unwrap();

    assert_eq!((rendered.width, rendered.height), (400, 300));
    let decoded = image::load_from_memory(&rendered.bytes).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (400, 300));
    // Some text pixels must have been darkened in the first line's band.
    let inked = (TEXT_LEFT as u32..200)
      .flat_map(|x| (TEXT_TOP as u32..TEXT_TOP as u32 + 20).map(move |y| (x, y)))
      .any(|(x, y)| decoded.get_pixel(x, y).0[0] < 128);
    assert!(inked);
  }

  #[tokio::test]
  async fn test_missing_template_is_reported() {
    let dir = tempdir().unwrap();
    let renderer = RasterRenderer::new(dir.path(), None).unwrap();

    let err = renderer.render(&view()).await.unwrap_err();
    assert!(matches!(err, PassError::MissingTemplate(_)));
  }

  #[test]
  fn test_invalid_font_file_is_rejected() {
    let dir = tempdir().unwrap();
    let font_path = dir.path().join("broken.ttf");
    std::fs::write(&font_path, b"not a font").unwrap();

    let err = RasterRenderer::new(dir.path(), Some(&font_path)).unwrap_err();
    assert!(matches!(err, PassError::Font(_)));
  }
}
