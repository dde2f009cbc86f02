//! # boardpass
//!
//! A small Actix Web service that turns flight and passenger data into a
//! boarding pass.
//!
//! ## Features
//!
//! - **Two renderers:** draw text onto a static PNG template, or screenshot
//!   the Tera HTML template with a headless Chromium.
//! - **Four outputs:** a public URL to the stored PNG (public or temp
//!   directory), the base64 encoded PNG, or the HTML page itself.
//! - **Template globals:** site-wide values such as a default airline.
//! - **Template reload (`devel`):** edits to the HTML templates are picked up
//!   without a restart.
//!
//! ## Quickstart
//!
//! ```rust,no_run
//! use actix_web::{App, HttpServer};
//! use boardpass::{OutputMode, PassService};
//!
//! #[actix_web::main]
//! async fn main() -> std::io::Result<()> {
//!   let service = PassService::builder("templates/**/*.html")
//!     .add_global("airline", "Snap Air")
//!     .output(OutputMode::Base64)
//!     .build()
//!     .expect("Failed to build boarding pass service");
//!
//!   HttpServer::new(move || {
//!     App::new()
//!       .wrap(boardpass::actix::cors())
//!       .configure(|cfg| service.configure_routes(cfg))
//!   })
//!   .bind(("127.0.0.1", 3000))?
//!   .run()
//!   .await
//! }
//! ```

pub mod actix;
pub mod config;
pub mod core;
pub mod error;

pub use crate::config::Settings;
pub use crate::core::output::OutputMode;
pub use crate::core::pass::{BoardingPass, PassRequest, PassView, Scalar};
pub use crate::core::render::{Renderer, RendererKind};
pub use crate::core::service::{Generated, PassService, PassServiceBuilder};
pub use crate::core::template::{PassTemplates, PassTemplatesBuilder};
pub use crate::error::{PassError, Result};
