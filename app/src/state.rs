// app/src/state.rs

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::pipelines;
use crate::services::api_keys::ApiKeyRegistry;
use crate::services::token_service::TokenSigner;
use crate::store::ShopStore;
use flowline::FlowRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn ShopStore>,
  pub flows: Arc<FlowRegistry<AppError>>,
  pub config: Arc<AppConfig>,
  pub api_keys: Arc<ApiKeyRegistry>,
  pub tokens: TokenSigner,
}

impl AppState {
  /// Wires the shared services and registers every flow.
  pub fn new(config: AppConfig, store: Arc<dyn ShopStore>) -> Self {
    let flows = Arc::new(FlowRegistry::<AppError>::new());
    pipelines::register_all_pipelines(&flows);
    Self {
      store,
      flows,
      api_keys: Arc::new(ApiKeyRegistry::with_admin_keys(config.admin_api_keys.iter().cloned())),
      tokens: TokenSigner::new(config.jwt_secret.as_bytes(), config.token_ttl_hours),
      config: Arc::new(config),
    }
  }
}
