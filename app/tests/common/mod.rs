// app/tests/common/mod.rs
#![allow(dead_code)]

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{web, App};
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::sync::Arc;
use techonline::store::MemoryStore;
use techonline::web::configure_app_routes;
use techonline::{AppConfig, AppState};
use uuid::Uuid;

pub const ADMIN_KEY: &str = "integration-admin-key";
pub const JWT_SECRET: &str = "integration-test-secret-0123456789";
pub const PASSWORD: &str = "correct-horse-battery";

static TRACING: Lazy<()> = Lazy::new(|| {
  let filter = tracing_subscriber::EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
  let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING);
}

pub fn test_config() -> AppConfig {
  AppConfig::from_lookup(|name| match name {
    "JWT_SECRET" => Some(JWT_SECRET.to_string()),
    "ADMIN_API_KEYS" => Some(ADMIN_KEY.to_string()),
    _ => None,
  })
  .expect("test configuration should be valid")
}

/// Fresh application state over an empty in-memory store.
pub fn test_state() -> AppState {
  setup_tracing();
  AppState::new(test_config(), Arc::new(MemoryStore::new()))
}

pub fn bearer(token: &str) -> (&'static str, String) {
  ("Authorization", format!("Bearer {}", token))
}

pub fn admin() -> (&'static str, String) {
  ("Authorization", format!("API-Key {}", ADMIN_KEY))
}

/// Sends one request through the full route table and decodes the JSON body.
pub async fn send(state: &AppState, req: TestRequest) -> (StatusCode, Value) {
  let app = test::init_service(
    App::new()
      .app_data(web::Data::new(state.clone()))
      .configure(configure_app_routes),
  )
  .await;
  let resp = test::call_service(&app, req.to_request()).await;
  let status = resp.status();
  let body = test::read_body(resp).await;
  let json = if body.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&body).expect("response body should be JSON")
  };
  (status, json)
}

pub fn uuid_at(value: &Value, pointer: &str) -> Uuid {
  let raw = value
    .pointer(pointer)
    .and_then(Value::as_str)
    .unwrap_or_else(|| panic!("no uuid at {} in {}", pointer, value));
  Uuid::parse_str(raw).expect("valid uuid")
}

pub struct TestCustomer {
  pub id: Uuid,
  pub email: String,
  pub token: String,
}

pub async fn register(state: &AppState, email: &str) -> TestCustomer {
  let (status, body) = send(
    state,
    TestRequest::post().uri("/api/v1/auth/register").set_json(json!({
      "email": email,
      "password": PASSWORD,
      "first_name": "Ada",
      "last_name": "Lovelace",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
  TestCustomer {
    id: uuid_at(&body, "/data/customer/id"),
    email: email.to_string(),
    token: body["data"]["access_token"].as_str().expect("token").to_string(),
  }
}

pub async fn create_product(state: &AppState, name: &str, price_cents: i64, stock: i32) -> Uuid {
  let (status, body) = send(
    state,
    TestRequest::post()
      .uri("/api/v1/products")
      .insert_header(admin())
      .set_json(json!({
        "name": name,
        "description": format!("{} description", name),
        "category": "accessories",
        "price_cents": price_cents,
        "stock_quantity": stock,
      })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "create product failed: {}", body);
  uuid_at(&body, "/data/id")
}

pub async fn create_cart(state: &AppState, customer: &TestCustomer) -> Uuid {
  let (status, body) = send(
    state,
    TestRequest::post()
      .uri("/api/v1/carts")
      .insert_header(bearer(&customer.token)),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "create cart failed: {}", body);
  uuid_at(&body, "/data/id")
}

pub async fn add_to_cart(
  state: &AppState,
  customer: &TestCustomer,
  cart_id: Uuid,
  product_id: Uuid,
  quantity: i32,
) -> (StatusCode, Value) {
  send(
    state,
    TestRequest::post()
      .uri(&format!("/api/v1/carts/{}/add_product", cart_id))
      .insert_header(bearer(&customer.token))
      .set_json(json!({ "product_id": product_id, "quantity": quantity })),
  )
  .await
}

pub async fn checkout(state: &AppState, customer: &TestCustomer, cart_id: Uuid) -> (StatusCode, Value) {
  send(
    state,
    TestRequest::post()
      .uri("/api/v1/orders")
      .insert_header(bearer(&customer.token))
      .set_json(json!({ "cart_id": cart_id })),
  )
  .await
}

pub async fn transition(state: &AppState, order_id: Uuid, status: &str) -> (StatusCode, Value) {
  send(
    state,
    TestRequest::put()
      .uri(&format!("/api/v1/orders/{}/status", order_id))
      .insert_header(admin())
      .set_json(json!({ "status": status })),
  )
  .await
}
