use crate::core::pass::PassRequest;
use crate::core::service::{Generated, PassService};
use crate::error::PassError;

use actix_web::web;

pub(crate) async fn health() -> &'static str {
  "Boarding Pass Generator is Running"
}

pub(crate) async fn generate_boarding_pass(
  service: web::Data<PassService>,
  payload: web::Json<PassRequest>,
) -> Result<Generated, PassError> {
  log::info!("Incoming payload: {:?}", payload);

  service.generate(payload.into_inner()).await.inspect_err(|err| {
    if err.is_client_error() {
      log::warn!("Rejected boarding pass request: {}", err);
    } else {
      log::error!("ERROR GENERATING PASS: {}", err);
    }
  })
}
