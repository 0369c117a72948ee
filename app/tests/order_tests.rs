// app/tests/order_tests.rs

mod common;

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use common::*;
use serde_json::json;

#[actix_web::test]
async fn checkout_scenario_from_empty_cart_to_rejected_jump() {
  let state = test_state();
  let customer = register(&state, "scenario@example.com").await;
  let p1 = create_product(&state, "P1", 1_000, 10).await;
  let p2 = create_product(&state, "P2", 500, 10).await;
  let cart = create_cart(&state, &customer).await;

  let (status, body) = checkout(&state, &customer, cart).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "invalid_request");

  add_to_cart(&state, &customer, cart, p1, 2).await;
  add_to_cart(&state, &customer, cart, p2, 1).await;
  let (status, body) = checkout(&state, &customer, cart).await;
  assert_eq!(status, StatusCode::CREATED, "{}", body);
  assert_eq!(body["data"]["total_amount_cents"], 2_500);
  assert_eq!(body["data"]["order_status"], "pending");
  assert_eq!(uuid_at(&body, "/data/cart_id"), cart);
  let order = uuid_at(&body, "/data/id");

  let (status, body) = transition(&state, order, "shipped").await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["error"], "invalid_transition");
}

#[actix_web::test]
async fn second_checkout_of_the_same_cart_conflicts() {
  let state = test_state();
  let customer = register(&state, "twice@example.com").await;
  let product = create_product(&state, "Charger", 2_500, 10).await;
  let cart = create_cart(&state, &customer).await;
  add_to_cart(&state, &customer, cart, product, 1).await;

  let (status, body) = checkout(&state, &customer, cart).await;
  assert_eq!(status, StatusCode::CREATED);
  let first = uuid_at(&body, "/data/id");

  let (status, body) = checkout(&state, &customer, cart).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["error"], "conflict");

  let (status, body) = send(
    &state,
    TestRequest::get()
      .uri(&format!("/api/v1/orders/{}", first))
      .insert_header(bearer(&customer.token)),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["total_amount_cents"], 2_500);
  assert_eq!(body["data"]["order_status"], "pending");
}

#[actix_web::test]
async fn price_change_does_not_touch_existing_order() {
  let state = test_state();
  let customer = register(&state, "frozen@example.com").await;
  let product = create_product(&state, "Laptop", 100_000, 3).await;
  let cart = create_cart(&state, &customer).await;
  add_to_cart(&state, &customer, cart, product, 2).await;
  let (_, body) = checkout(&state, &customer, cart).await;
  let order = uuid_at(&body, "/data/id");

  let (status, _) = send(
    &state,
    TestRequest::put()
      .uri(&format!("/api/v1/products/{}", product))
      .insert_header(admin())
      .set_json(json!({ "price_cents": 150_000 })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (_, body) = send(
    &state,
    TestRequest::get()
      .uri(&format!("/api/v1/orders/{}/items", order))
      .insert_header(bearer(&customer.token)),
  )
  .await;
  assert_eq!(body["data"][0]["price_cents"], 100_000);

  let (_, body) = send(
    &state,
    TestRequest::get()
      .uri(&format!("/api/v1/orders/{}", order))
      .insert_header(bearer(&customer.token)),
  )
  .await;
  assert_eq!(body["data"]["total_amount_cents"], 200_000);
}

#[actix_web::test]
async fn checkout_reserves_stock_and_cancel_releases_it() {
  let state = test_state();
  let customer = register(&state, "stock-order@example.com").await;
  let product = create_product(&state, "Dock", 9_000, 5).await;
  let cart = create_cart(&state, &customer).await;
  add_to_cart(&state, &customer, cart, product, 4).await;
  let (_, body) = checkout(&state, &customer, cart).await;
  let order = uuid_at(&body, "/data/id");

  let (_, body) = send(&state, TestRequest::get().uri(&format!("/api/v1/products/{}", product))).await;
  assert_eq!(body["data"]["stock_quantity"], 1);

  let (status, body) = transition(&state, order, "cancelled").await;
  assert_eq!(status, StatusCode::OK, "{}", body);
  assert_eq!(body["data"]["order_status"], "cancelled");

  let (_, body) = send(&state, TestRequest::get().uri(&format!("/api/v1/products/{}", product))).await;
  assert_eq!(body["data"]["stock_quantity"], 5);

  let (status, body) = transition(&state, order, "paid").await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["error"], "invalid_transition");
}

#[actix_web::test]
async fn full_lifecycle_and_transition_listing() {
  let state = test_state();
  let customer = register(&state, "lifecycle@example.com").await;
  let product = create_product(&state, "Router", 12_000, 5).await;
  let cart = create_cart(&state, &customer).await;
  add_to_cart(&state, &customer, cart, product, 1).await;
  let (_, body) = checkout(&state, &customer, cart).await;
  let order = uuid_at(&body, "/data/id");

  let transitions_uri = format!("/api/v1/orders/{}/status/transitions", order);
  let (status, body) = send(
    &state,
    TestRequest::get().uri(&transitions_uri).insert_header(bearer(&customer.token)),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["current_status"], "pending");
  assert_eq!(body["data"]["valid_transitions"], json!(["paid", "cancelled"]));

  for next in ["paid", "shipped", "delivered"] {
    let (status, body) = transition(&state, order, next).await;
    assert_eq!(status, StatusCode::OK, "{} -> {}", next, body);
    assert_eq!(body["data"]["order_status"], next);
  }

  let (_, body) = send(
    &state,
    TestRequest::get().uri(&transitions_uri).insert_header(bearer(&customer.token)),
  )
  .await;
  assert_eq!(body["data"]["current_status"], "delivered");
  assert_eq!(body["data"]["valid_transitions"], json!([]));
}

#[actix_web::test]
async fn customers_cannot_change_status_or_see_foreign_orders() {
  let state = test_state();
  let customer = register(&state, "buyer@example.com").await;
  let other = register(&state, "other@example.com").await;
  let product = create_product(&state, "Tablet", 30_000, 5).await;
  let cart = create_cart(&state, &customer).await;
  add_to_cart(&state, &customer, cart, product, 1).await;
  let (_, body) = checkout(&state, &customer, cart).await;
  let order = uuid_at(&body, "/data/id");

  let (status, body) = send(
    &state,
    TestRequest::put()
      .uri(&format!("/api/v1/orders/{}/status", order))
      .insert_header(bearer(&customer.token))
      .set_json(json!({ "status": "paid" })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["error"], "forbidden");

  for uri in [
    format!("/api/v1/orders/{}", order),
    format!("/api/v1/orders/{}/items", order),
    format!("/api/v1/orders/{}/status/transitions", order),
    format!("/api/v1/customers/{}/orders", customer.id),
  ] {
    let (status, _) = send(&state, TestRequest::get().uri(&uri).insert_header(bearer(&other.token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
  }

  // Checking out someone else's cart is refused as well.
  let cart2 = create_cart(&state, &customer).await;
  add_to_cart(&state, &customer, cart2, product, 1).await;
  let (status, _) = checkout(&state, &other, cart2).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn unknown_status_is_invalid_request() {
  let state = test_state();
  let (status, body) = transition(&state, uuid::Uuid::new_v4(), "teleported").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "invalid_request");

  let (status, _) = transition(&state, uuid::Uuid::new_v4(), "paid").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn order_listing_is_scoped_to_the_caller() {
  let state = test_state();
  let alice = register(&state, "alice@example.com").await;
  let bob = register(&state, "bob@example.com").await;
  let product = create_product(&state, "Lamp", 4_000, 10).await;
  for buyer in [&alice, &bob] {
    let cart = create_cart(&state, buyer).await;
    add_to_cart(&state, buyer, cart, product, 1).await;
    let (status, _) = checkout(&state, buyer, cart).await;
    assert_eq!(status, StatusCode::CREATED);
  }

  let (status, body) = send(
    &state,
    TestRequest::get().uri("/api/v1/orders").insert_header(bearer(&alice.token)),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let orders = body["data"].as_array().unwrap();
  assert_eq!(orders.len(), 1);
  assert_eq!(uuid_at(&orders[0], "/customer_id"), alice.id);

  let (_, body) = send(&state, TestRequest::get().uri("/api/v1/orders").insert_header(admin())).await;
  assert_eq!(body["data"].as_array().unwrap().len(), 2);

  let (_, body) = send(
    &state,
    TestRequest::get()
      .uri("/api/v1/orders?status=paid")
      .insert_header(admin()),
  )
  .await;
  assert!(body["data"].as_array().unwrap().is_empty());

  let (status, body) = send(
    &state,
    TestRequest::get()
      .uri("/api/v1/orders/status-summary")
      .insert_header(admin()),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["pending"], 2);
  assert_eq!(body["data"]["delivered"], 0);
}

#[actix_web::test]
async fn deleting_a_converted_cart_keeps_the_order() {
  let state = test_state();
  let customer = register(&state, "keep@example.com").await;
  let product = create_product(&state, "Fan", 2_000, 10).await;
  let cart = create_cart(&state, &customer).await;
  add_to_cart(&state, &customer, cart, product, 2).await;
  let (_, body) = checkout(&state, &customer, cart).await;
  let order = uuid_at(&body, "/data/id");

  let (status, _) = send(
    &state,
    TestRequest::delete()
      .uri(&format!("/api/v1/carts/{}", cart))
      .insert_header(bearer(&customer.token)),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (status, body) = send(
    &state,
    TestRequest::get()
      .uri(&format!("/api/v1/orders/{}", order))
      .insert_header(bearer(&customer.token)),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["total_amount_cents"], 4_000);
  assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn admin_lists_orders_by_status() {
  let state = test_state();
  let customer = register(&state, "bystatus@example.com").await;
  let product = create_product(&state, "Router", 9_000, 10).await;
  let mut orders = Vec::new();
  for _ in 0..2 {
    let cart = create_cart(&state, &customer).await;
    add_to_cart(&state, &customer, cart, product, 1).await;
    let (_, body) = checkout(&state, &customer, cart).await;
    orders.push(uuid_at(&body, "/data/id"));
  }
  transition(&state, orders[0], "paid").await;

  let (status, body) = send(&state, TestRequest::get().uri("/api/v1/orders/by-status/paid").insert_header(admin())).await;
  assert_eq!(status, StatusCode::OK, "{}", body);
  assert_eq!(body["data"]["status"], "paid");
  assert_eq!(body["data"]["count"], 1);
  assert_eq!(uuid_at(&body, "/data/orders/0/id"), orders[0]);

  let (status, body) = send(
    &state,
    TestRequest::get().uri("/api/v1/orders/by-status/lost").insert_header(admin()),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "invalid_request");

  let (status, _) = send(
    &state,
    TestRequest::get()
      .uri("/api/v1/orders/by-status/pending")
      .insert_header(bearer(&customer.token)),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn order_validation_reports_warnings_to_its_owner() {
  let state = test_state();
  let customer = register(&state, "validate@example.com").await;
  let other = register(&state, "outsider@example.com").await;
  let product = create_product(&state, "Workstation", 900_000, 5).await;
  let cart = create_cart(&state, &customer).await;
  add_to_cart(&state, &customer, cart, product, 2).await;
  let (_, body) = checkout(&state, &customer, cart).await;
  let order = uuid_at(&body, "/data/id");
  let uri = format!("/api/v1/orders/{}/validate", order);

  let (status, body) = send(&state, TestRequest::get().uri(&uri).insert_header(bearer(&customer.token))).await;
  assert_eq!(status, StatusCode::OK, "{}", body);
  assert_eq!(uuid_at(&body, "/data/order_id"), order);
  assert_eq!(body["data"]["is_valid"], true);
  assert_eq!(body["data"]["errors"], json!([]));
  assert_eq!(body["data"]["warnings"].as_array().unwrap().len(), 1);

  let (status, _) = send(&state, TestRequest::get().uri(&uri).insert_header(bearer(&other.token))).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}
