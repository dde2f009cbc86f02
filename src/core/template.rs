use crate::core::pass::PassView;
use crate::error::{PassError, Result};

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tera::{Context, Tera};

#[cfg(feature = "devel")]
use crate::core::reload::TemplateWatcher;

/// Name under which the boarding pass page is looked up in Tera.
pub const PASS_TEMPLATE: &str = "boarding_pass.html";

/// Shipped page, registered when the template glob does not provide one.
const BUILTIN_PASS_TEMPLATE: &str = include_str!("../../templates/boarding_pass.html");

/// The HTML side of pass rendering, designed to be shared across threads.
///
/// It holds the Tera templating engine and the global context merged into
/// every render. It is created using the `PassTemplates::builder()` method.
#[derive(Clone, Debug)]
pub struct PassTemplates {
  /// The Tera instance, wrapped for thread-safe access and mutability (for reloads).
  pub(crate) tera: Arc<RwLock<Tera>>,
  /// Values available to every render, overridable per request.
  pub(crate) global_context: Arc<Context>,
  #[cfg(feature = "devel")]
  pub(crate) _watcher: Arc<TemplateWatcher>,
}

impl PassTemplates {
  /// Creates a new `PassTemplatesBuilder`.
  ///
  /// # Arguments
  ///
  /// * `templates_glob` - A glob pattern (e.g., "templates/**/*.html") for Tera to find templates.
  pub fn builder(templates_glob: &str) -> PassTemplatesBuilder {
    PassTemplatesBuilder::new(templates_glob)
  }

  /// Renders the boarding pass page for `view`.
  ///
  /// Globals are applied first and the request values on top of them. An
  /// empty `airline` on the request leaves a global default in place.
  pub fn render_pass(&self, view: &PassView) -> Result<String> {
    let mut user_context = Context::from_serialize(view)?;
    if view.airline.is_empty() && self.global_context.contains_key("airline") {
      user_context.remove("airline");
    }
    self.render_with_context(PASS_TEMPLATE, user_context)
  }

  /// Merges `user_context` over the globals and renders `tpl` to a string.
  pub(crate) fn render_with_context(&self, tpl: &str, user_context: Context) -> Result<String> {
    let tera = self.tera.read();

    let mut final_context = (*self.global_context).clone();
    final_context.extend(user_context);

    tera.render(tpl, &final_context).map_err(PassError::Tera)
  }
}

/// A builder for creating a configured `PassTemplates` instance.
pub struct PassTemplatesBuilder {
  templates_glob: String,
  globals: Context,
  // Escape hatch for registering filters and functions before the first render.
  tera_configurator: Option<Box<dyn FnOnce(&mut Tera)>>,
}

impl PassTemplatesBuilder {
  pub(crate) fn new(templates_glob: &str) -> Self {
    Self {
      templates_glob: templates_glob.to_string(),
      globals: Context::new(),
      tera_configurator: None,
    }
  }

  /// Adds a global variable that will be available to all templates.
  ///
  /// # Arguments
  ///
  /// * `key` - The name of the variable in the template (e.g., "airline").
  /// * `value` - Any value that can be serialized.
  pub fn add_global<S: Into<String>, T: Serialize>(mut self, key: S, value: T) -> Self {
    self.globals.insert(&key.into(), &value);
    self
  }

  /// Provides a closure to run for advanced configuration of the `Tera` instance.
  pub fn configure_tera<F>(mut self, configurator: F) -> Self
  where
    F: FnOnce(&mut Tera) + 'static,
  {
    self.tera_configurator = Some(Box::new(configurator));
    self
  }

  /// Consumes the builder to construct the final `PassTemplates`.
  ///
  /// With the `devel` feature enabled this also starts watching the template
  /// directory and reloads Tera whenever a template changes.
  pub fn build(self) -> Result<PassTemplates> {
    let mut tera = Tera::new(&self.templates_glob)?;

    if !tera.get_template_names().any(|name| name == PASS_TEMPLATE) {
      log::debug!(
        "No {} matched by {}, using the built-in template",
        PASS_TEMPLATE,
        self.templates_glob
      );
      tera.add_raw_template(PASS_TEMPLATE, BUILTIN_PASS_TEMPLATE)?;
    }

    if let Some(configurator) = self.tera_configurator {
      configurator(&mut tera);
    }

    let tera = Arc::new(RwLock::new(tera));

    Ok(PassTemplates {
      #[cfg(feature = "devel")]
      _watcher: Arc::new(TemplateWatcher::start(Arc::clone(&tera), &self.templates_glob)?),
      tera,
      global_context: Arc::new(self.globals),
    })
  }
}
