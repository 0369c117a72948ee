// app/src/web/routes.rs

use crate::errors::AppError;
use crate::web::handlers::{
  auth_handlers, cart_handlers, customer_handlers, order_handlers, product_handlers, review_handlers,
  stock_handlers,
};
use crate::web::response;
use actix_web::{web, HttpResponse};

async fn health_check_handler() -> HttpResponse {
  response::ok(serde_json::json!({ "status": "ok" }), "Service is healthy.")
}

/// Extractor failures (bad JSON, bad path ids, bad query strings) become `invalid_request`.
fn configure_extractor_errors(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(
      web::JsonConfig::default()
        .error_handler(|err, _req| AppError::InvalidRequest(format!("Invalid JSON body: {}", err)).into()),
    )
    .app_data(
      web::PathConfig::default()
        .error_handler(|err, _req| AppError::InvalidRequest(format!("Invalid path parameter: {}", err)).into()),
    )
    .app_data(
      web::QueryConfig::default()
        .error_handler(|err, _req| AppError::InvalidRequest(format!("Invalid query string: {}", err)).into()),
    );
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  configure_extractor_errors(cfg);
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/auth")
          .route("/login", web::post().to(auth_handlers::login_handler))
          .route("/register", web::post().to(auth_handlers::register_handler))
          .route("/me", web::get().to(auth_handlers::me_handler))
          .route("/profile", web::get().to(auth_handlers::profile_handler))
          .route("/profile", web::put().to(auth_handlers::update_profile_handler))
          .route("/change-password", web::put().to(auth_handlers::change_password_handler))
          .route("/api-keys", web::post().to(auth_handlers::issue_api_key_handler)),
      )
      .service(
        web::scope("/customers")
          .route("", web::get().to(customer_handlers::list_customers_handler))
          .route("/{customer_id}", web::get().to(customer_handlers::get_customer_handler))
          .route("/{customer_id}", web::put().to(customer_handlers::update_customer_handler))
          .route("/{customer_id}", web::delete().to(customer_handlers::delete_customer_handler))
          .route("/{customer_id}/cart", web::get().to(customer_handlers::customer_cart_handler))
          .route("/{customer_id}/orders", web::get().to(customer_handlers::customer_orders_handler))
          .route("/{customer_id}/reviews", web::get().to(customer_handlers::customer_reviews_handler)),
      )
      .service(
        web::scope("/carts")
          .route("", web::get().to(cart_handlers::list_carts_handler))
          .route("", web::post().to(cart_handlers::create_cart_handler))
          .route("/{cart_id}", web::get().to(cart_handlers::get_cart_handler))
          .route("/{cart_id}", web::put().to(cart_handlers::replace_cart_handler))
          .route("/{cart_id}", web::delete().to(cart_handlers::delete_cart_handler))
          .route("/{cart_id}/add_product", web::post().to(cart_handlers::add_product_handler))
          .route(
            "/{cart_id}/remove_product/{product_id}",
            web::delete().to(cart_handlers::remove_product_handler),
          )
          .route("/{cart_id}/update_quantity", web::put().to(cart_handlers::update_quantity_handler))
          .route("/{cart_id}/clear", web::delete().to(cart_handlers::clear_cart_handler)),
      )
      .service(
        web::scope("/orders")
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("", web::post().to(order_handlers::create_order_handler))
          // Must precede "/{order_id}".
          .route("/status-summary", web::get().to(order_handlers::order_status_summary_handler))
          .route("/by-status/{status}", web::get().to(order_handlers::orders_by_status_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
          .route("/{order_id}/validate", web::get().to(order_handlers::validate_order_handler))
          .route("/{order_id}/items", web::get().to(order_handlers::order_items_handler))
          .route(
            "/{order_id}/status/transitions",
            web::get().to(order_handlers::order_transitions_handler),
          )
          .route("/{order_id}/status", web::put().to(order_handlers::transition_order_handler)),
      )
      .service(
        web::scope("/products")
          .route("", web::get().to(product_handlers::list_products_handler))
          .route("", web::post().to(product_handlers::create_product_handler))
          .route("/{product_id}", web::get().to(product_handlers::get_product_handler))
          .route("/{product_id}", web::put().to(product_handlers::update_product_handler))
          .route("/{product_id}/reviews", web::get().to(review_handlers::list_reviews_handler))
          .route("/{product_id}/reviews", web::post().to(review_handlers::create_review_handler)),
      )
      .service(
        web::scope("/reviews")
          .route("/{review_id}", web::get().to(review_handlers::get_review_handler))
          .route("/{review_id}", web::put().to(review_handlers::update_review_handler))
          .route("/{review_id}", web::delete().to(review_handlers::delete_review_handler))
          .route("/{review_id}/approve", web::put().to(review_handlers::approve_review_handler))
          .route("/{review_id}/reject", web::put().to(review_handlers::reject_review_handler))
          .route("/{review_id}/helpful", web::put().to(review_handlers::mark_review_helpful_handler)),
      )
      .service(
        web::scope("/stock")
          .route("/check/{product_id}", web::get().to(stock_handlers::check_stock_handler))
          .route("/low-stock", web::get().to(stock_handlers::low_stock_handler))
          .route("/out-of-stock", web::get().to(stock_handlers::out_of_stock_handler))
          .route("/summary", web::get().to(stock_handlers::stock_summary_handler)),
      )
      .service(web::scope("/search").route("/products", web::get().to(product_handlers::search_products_handler))),
  );
}
