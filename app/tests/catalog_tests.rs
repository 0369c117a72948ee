// app/tests/catalog_tests.rs

mod common;

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use common::*;
use serde_json::{json, Value};

fn names(body: &Value) -> Vec<String> {
  body["data"]
    .as_array()
    .unwrap()
    .iter()
    .map(|p| p["name"].as_str().unwrap().to_string())
    .collect()
}

#[actix_web::test]
async fn catalog_filters_and_sorting() {
  let state = test_state();
  create_product(&state, "Alpha Cable", 300, 0).await;
  create_product(&state, "Beta Mouse", 2_000, 4).await;
  create_product(&state, "Gamma Screen", 15_000, 2).await;

  let (status, body) = send(&state, TestRequest::get().uri("/api/v1/products?sort_by=price")).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(names(&body), ["Alpha Cable", "Beta Mouse", "Gamma Screen"]);

  let (_, body) = send(&state, TestRequest::get().uri("/api/v1/products?in_stock=true&sort_by=name")).await;
  assert_eq!(names(&body), ["Beta Mouse", "Gamma Screen"]);

  let (_, body) = send(
    &state,
    TestRequest::get().uri("/api/v1/products?min_price_cents=1000&max_price_cents=5000"),
  )
  .await;
  assert_eq!(names(&body), ["Beta Mouse"]);

  let (_, body) = send(&state, TestRequest::get().uri("/api/v1/products?sort_by=name&limit=1&offset=1")).await;
  assert_eq!(names(&body), ["Beta Mouse"]);

  let (status, _) = send(
    &state,
    TestRequest::get().uri("/api/v1/products?min_price_cents=5000&max_price_cents=1000"),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = send(&state, TestRequest::get().uri("/api/v1/products?sort_by=popularity")).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "invalid_request");
}

#[actix_web::test]
async fn search_matches_name_description_and_category() {
  let state = test_state();
  create_product(&state, "Mechanical Keyboard", 9_000, 3).await;
  create_product(&state, "Mouse Pad", 900, 3).await;

  let (status, body) = send(&state, TestRequest::get().uri("/api/v1/search/products?q=KEYBOARD")).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(names(&body), ["Mechanical Keyboard"]);

  // Every test product shares the "accessories" category.
  let (_, body) = send(&state, TestRequest::get().uri("/api/v1/search/products?q=accessor")).await;
  assert_eq!(body["data"].as_array().unwrap().len(), 2);

  let (status, _) = send(&state, TestRequest::get().uri("/api/v1/search/products?q=%20")).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn product_writes_require_admin() {
  let state = test_state();
  let customer = register(&state, "shopper@example.com").await;

  let payload = json!({ "name": "Rogue", "price_cents": 100, "stock_quantity": 1 });
  let (status, _) = send(
    &state,
    TestRequest::post()
      .uri("/api/v1/products")
      .insert_header(bearer(&customer.token))
      .set_json(&payload),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _) = send(&state, TestRequest::post().uri("/api/v1/products").set_json(&payload)).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, _) = send(
    &state,
    TestRequest::post()
      .uri("/api/v1/products")
      .insert_header(admin())
      .set_json(json!({ "name": "Bad", "price_cents": -1, "stock_quantity": 1 })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = send(&state, TestRequest::get().uri(&format!("/api/v1/products/{}", uuid::Uuid::new_v4()))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn reviews_are_validated_unique_and_marked_verified_after_purchase() {
  let state = test_state();
  let buyer = register(&state, "reviewer@example.com").await;
  let browser = register(&state, "browser@example.com").await;
  let product = create_product(&state, "Earbuds", 5_000, 10).await;
  let reviews_uri = format!("/api/v1/products/{}/reviews", product);

  let cart = create_cart(&state, &buyer).await;
  add_to_cart(&state, &buyer, cart, product, 1).await;
  let (status, _) = checkout(&state, &buyer, cart).await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, body) = send(
    &state,
    TestRequest::post()
      .uri(&reviews_uri)
      .insert_header(bearer(&buyer.token))
      .set_json(json!({ "rate": 6, "text": "Too good" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "invalid_request");

  let (status, body) = send(
    &state,
    TestRequest::post()
      .uri(&reviews_uri)
      .insert_header(bearer(&buyer.token))
      .set_json(json!({ "rate": 5, "text": "Great sound", "title": "Love them" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{}", body);
  assert_eq!(body["data"]["is_verified"], true);
  assert_eq!(body["data"]["is_approved"], true);

  let (status, _) = send(
    &state,
    TestRequest::post()
      .uri(&reviews_uri)
      .insert_header(bearer(&buyer.token))
      .set_json(json!({ "rate": 1, "text": "Changed my mind" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, body) = send(
    &state,
    TestRequest::post()
      .uri(&reviews_uri)
      .insert_header(bearer(&browser.token))
      .set_json(json!({ "rate": 2, "text": "Never bought them" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["data"]["is_verified"], false);

  let (status, body) = send(&state, TestRequest::get().uri(&reviews_uri)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"].as_array().unwrap().len(), 2);

  let (_, body) = send(&state, TestRequest::get().uri(&format!("/api/v1/products/{}", product))).await;
  assert_eq!(body["data"]["rating"], 3.5);
}

#[actix_web::test]
async fn anonymous_cannot_review() {
  let state = test_state();
  let product = create_product(&state, "Stand", 1_000, 1).await;
  let (status, body) = send(
    &state,
    TestRequest::post()
      .uri(&format!("/api/v1/products/{}/reviews", product))
      .set_json(json!({ "rate": 4, "text": "Nice" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["error"], "unauthenticated");
}

#[actix_web::test]
async fn prices_above_the_ceiling_are_rejected() {
  let state = test_state();
  let (status, body) = send(
    &state,
    TestRequest::post()
      .uri("/api/v1/products")
      .insert_header(admin())
      .set_json(json!({ "name": "Overflow", "price_cents": i64::MAX / 2, "stock_quantity": 3 })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "invalid_request");

  let product = create_product(&state, "Flagship", techonline::models::product::MAX_PRICE_CENTS, 3).await;
  let (status, body) = send(
    &state,
    TestRequest::put()
      .uri(&format!("/api/v1/products/{}", product))
      .insert_header(admin())
      .set_json(json!({ "price_cents": techonline::models::product::MAX_PRICE_CENTS + 1 })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
}
