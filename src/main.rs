use actix_web::{App, HttpServer, middleware::Logger};
use anyhow::Context;
use boardpass::Settings;
use clap::Parser;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

  let settings = Settings::parse();
  let service = settings
    .service_builder()
    .build()
    .context("Failed to build boarding pass service")?;

  log::info!("Boarding Pass Server running on port {}", settings.port);

  HttpServer::new(move || {
    App::new()
      .wrap(Logger::default())
      .wrap(boardpass::actix::cors())
      .configure(|cfg| service.configure_routes(cfg))
  })
  .bind((settings.host.as_str(), settings.port))
  .with_context(|| format!("Failed to bind {}:{}", settings.host, settings.port))?
  .run()
  .await?;

  Ok(())
}
