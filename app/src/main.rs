// app/src/main.rs

use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use techonline::config::LogFormat;
use techonline::store::{seed, MemoryStore, PgStore, ShopStore};
use techonline::web::configure_app_routes;
use techonline::{AppConfig, AppError, AppState};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Text => builder.init(),
  }
}

async fn build_store(config: &AppConfig) -> Result<Arc<dyn ShopStore>, AppError> {
  match config.database_url.as_deref() {
    Some(url) => {
      let store = PgStore::connect(url).await?;
      store.apply_schema().await?;
      tracing::info!("Connected to PostgreSQL and applied schema.");
      Ok(Arc::new(store))
    }
    None => {
      tracing::warn!("DATABASE_URL not set; using the in-memory store. Data is lost on restart.");
      Ok(Arc::new(MemoryStore::new()))
    }
  }
}

fn to_io_error(err: impl std::fmt::Display) -> std::io::Error {
  std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  let config = AppConfig::from_env();
  init_tracing(config.as_ref().map_or(LogFormat::Text, |c| c.log_format));

  let config = config.map_err(|e| {
    tracing::error!(error = %e, "Failed to load application configuration.");
    to_io_error(e)
  })?;
  tracing::info!(config = ?config, "Starting TechOnline server...");

  let store = build_store(&config).await.map_err(|e| {
    tracing::error!(error = %e, "Failed to initialise the store.");
    to_io_error(e)
  })?;

  if config.seed_db {
    match seed::seed_demo_catalog(store.as_ref()).await {
      Ok(count) => tracing::info!(count = count, "Demo catalog seeded."),
      Err(e) => tracing::error!(error = ?e, "Failed to seed demo catalog."),
    }
  }

  let server_address = config.bind_address();
  let app_state = AppState::new(config, store);
  tracing::info!(
    flows = app_state.flows.len(),
    api_keys = app_state.api_keys.len(),
    "Application state ready."
  );

  tracing::info!("Binding server to {}...", server_address);
  HttpServer::new(move || {
    App::new()
      .app_data(web::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
