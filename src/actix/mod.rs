use crate::core::output::PASSES_ROUTE;
use crate::core::service::{Generated, PassService};
use crate::error::PassError;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{
  HttpRequest, HttpResponse, Responder, ResponseError,
  body::BoxBody,
  http::{StatusCode, header::ContentType},
  web::{self, ServiceConfig},
};
use serde::Serialize;

mod handlers;

/// Success body for image outputs.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessBody<'a> {
  pub status: &'static str,
  pub image_url: &'a str,
}

/// Body of every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
  pub status: &'static str,
  pub message: String,
}

impl Responder for Generated {
  type Body = BoxBody;

  fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
    match self {
      Generated::Html(html) => HttpResponse::build(StatusCode::OK)
        .content_type(ContentType::html())
        .body(html),
      Generated::Url(value) | Generated::Base64(value) => HttpResponse::Ok().json(SuccessBody {
        status: "success",
        image_url: &value,
      }),
    }
  }
}

impl ResponseError for PassError {
  fn status_code(&self) -> StatusCode {
    if self.is_client_error() {
      StatusCode::BAD_REQUEST
    } else {
      StatusCode::INTERNAL_SERVER_ERROR
    }
  }

  fn error_response(&self) -> HttpResponse<BoxBody> {
    // Server side failures are logged in full but reported generically.
    let message = match self {
      PassError::MissingFields(_) | PassError::InvalidBody(_) => self.to_string(),
      PassError::MissingTemplate(_) => "Template image not found on server".to_string(),
      _ => "Generation failed".to_string(),
    };

    HttpResponse::build(self.status_code()).json(ErrorBody {
      status: "error",
      message,
    })
  }
}

/// Permissive CORS, so browser front ends on any origin can call the service.
pub fn cors() -> Cors {
  Cors::permissive()
}

impl PassService {
  /// Registers the service state, the JSON extractor config and all routes.
  ///
  /// Stored passes are served under `/passes` when the output mode writes
  /// files.
  pub fn configure_routes(&self, cfg: &mut ServiceConfig) {
    let json_config = web::JsonConfig::default()
      .error_handler(|err, _req| PassError::InvalidBody(err.to_string()).into());

    cfg
      .app_data(web::Data::new(self.clone()))
      .app_data(json_config)
      .route("/", web::get().to(handlers::health))
      .route("/generate-boarding-pass", web::post().to(handlers::generate_boarding_pass));

    if self.mode.stores_files() {
      log::info!("Serving stored passes from {} at {}", self.store.dir().display(), PASSES_ROUTE);
      cfg.service(Files::new(PASSES_ROUTE, self.store.dir()));
    }
  }
}
