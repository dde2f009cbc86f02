use crate::error::{PassError, Result};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use std::sync::Arc;
use tera::Tera;

/// Reloads the pass templates whenever a file under the template directory changes.
///
/// The watcher is held in the struct to keep it alive. When it is dropped
/// the background notification thread exits.
#[derive(Debug)]
pub(crate) struct TemplateWatcher {
  _watcher: RecommendedWatcher,
}

impl TemplateWatcher {
  pub(crate) fn start(tera: Arc<RwLock<Tera>>, template_glob: &str) -> Result<Self> {
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
      let event = match res {
        Ok(event) => event,
        Err(e) => {
          log::error!("File watch error: {:?}", e);
          return;
        }
      };

      if !(event.kind.is_modify() || event.kind.is_create()) {
        return;
      }

      let template_changed = event
        .paths
        .iter()
        .any(|path| matches!(path.extension().and_then(|s| s.to_str()), Some("html" | "tera" | "jinja")));

      if template_changed {
        log::info!("Template change detected: {:?}", event.paths);
        if let Err(e) = tera.write().full_reload() {
          log::error!("Failed to reload templates: {}", e);
        }
      }
    })?;

    let template_watch_path = base_path_from_glob(template_glob);
    if std::path::Path::new(template_watch_path).exists() {
      log::debug!("Watching template path: {}", template_watch_path);
      watcher
        .watch(std::path::Path::new(template_watch_path), RecursiveMode::Recursive)
        .map_err(PassError::Watcher)?;
    } else {
      log::warn!("Template path to watch does not exist, skipping: {}", template_watch_path);
    }

    Ok(Self { _watcher: watcher })
  }
}

/// Extracts the non-glob base path from a glob pattern.
///
/// `notify` cannot watch a glob, so we watch the deepest parent directory
/// that contains no glob characters.
fn base_path_from_glob(glob: &str) -> &str {
  if let Some(first_glob_char_index) = glob.find(['*', '?', '{', '[']) {
    let before_glob = &glob[..first_glob_char_index];
    match before_glob.rfind('/') {
      Some(0) => "/",
      Some(last_separator_index) => &glob[..last_separator_index],
      None => ".",
    }
  } else {
    let path = std::path::Path::new(glob);
    if path.is_dir() {
      glob
    } else {
      path.parent().map_or(".", |p| p.to_str().unwrap_or("."))
    }
  }
}
