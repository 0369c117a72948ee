// app/src/web/handlers/review_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{NewReview, Principal, Review, ReviewUpdate};
use crate::services::ownership::{self, Action};
use crate::state::AppState;
use crate::web::extractors::{AdminCaller, CustomerCaller, OptionalCaller};
use crate::web::response;

#[derive(Deserialize, Debug)]
pub struct ReviewPayload {
  pub rate: i32,
  pub text: String,
  #[serde(default)]
  pub title: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ReviewListQuery {
  /// Only honoured for administrators.
  pub approved_only: Option<bool>,
}

fn review_not_found() -> AppError {
  AppError::NotFound("Review not found.".to_string())
}

async fn load_review(app_state: &AppState, review_id: Uuid) -> Result<Review, AppError> {
  app_state.store.get_review(review_id).await?.ok_or_else(review_not_found)
}

/// Unapproved reviews exist only for their author and administrators.
fn visible_to(review: &Review, principal: &Principal) -> bool {
  review.is_approved || principal.is_admin() || principal.customer_id() == Some(review.customer_id)
}

#[instrument(name = "handler::list_reviews", skip(app_state, caller))]
pub async fn list_reviews_handler(
  app_state: web::Data<AppState>,
  caller: OptionalCaller,
  path: web::Path<Uuid>,
  query: web::Query<ReviewListQuery>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  if app_state.store.get_product(product_id).await?.is_none() {
    return Err(AppError::NotFound("Product not found.".to_string()));
  }
  let approved_only = !caller.principal.is_admin() || query.approved_only.unwrap_or(true);
  let reviews = app_state.store.list_reviews(product_id, approved_only).await?;
  Ok(response::ok(reviews, "Reviews retrieved."))
}

#[instrument(name = "handler::create_review", skip(app_state, caller, payload))]
pub async fn create_review_handler(
  app_state: web::Data<AppState>,
  caller: CustomerCaller,
  path: web::Path<Uuid>,
  payload: web::Json<ReviewPayload>,
) -> Result<HttpResponse, AppError> {
  ownership::require(&caller.principal, Action::ReviewWrite, None)?;
  // Reviews are authored by customers; an admin key has no customer identity.
  let customer_id = caller
    .principal
    .customer_id()
    .ok_or_else(|| AppError::Forbidden("Only customers can write reviews.".to_string()))?;
  let payload = payload.into_inner();
  let new_review = NewReview {
    product_id: path.into_inner(),
    customer_id,
    rate: payload.rate,
    text: payload.text.trim().to_string(),
    title: payload.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
  };
  new_review.validate().map_err(AppError::InvalidRequest)?;

  let review = app_state.store.insert_review(new_review).await?;
  info!(review_id = %review.id, product_id = %review.product_id, verified = review.is_verified, "Review created.");
  Ok(response::created(review, "Review created."))
}

#[instrument(name = "handler::get_review", skip(app_state, caller))]
pub async fn get_review_handler(
  app_state: web::Data<AppState>,
  caller: OptionalCaller,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let review = load_review(&app_state, path.into_inner()).await?;
  if !visible_to(&review, &caller.principal) {
    return Err(review_not_found());
  }
  Ok(response::ok(review, "Review retrieved."))
}

#[instrument(name = "handler::update_review", skip(app_state, caller, payload))]
pub async fn update_review_handler(
  app_state: web::Data<AppState>,
  caller: CustomerCaller,
  path: web::Path<Uuid>,
  payload: web::Json<ReviewUpdate>,
) -> Result<HttpResponse, AppError> {
  let review = load_review(&app_state, path.into_inner()).await?;
  ownership::require(&caller.principal, Action::ReviewUpdate, Some(review.customer_id))?;

  let payload = payload.into_inner();
  let update = ReviewUpdate {
    rate: payload.rate,
    text: payload.text.map(|t| t.trim().to_string()),
    title: payload.title.map(|t| t.trim().to_string()),
  };
  if update.is_empty() {
    return Err(AppError::InvalidRequest("No fields to update.".to_string()));
  }
  update.validate().map_err(AppError::InvalidRequest)?;

  let review = app_state
    .store
    .update_review(review.id, update)
    .await?
    .ok_or_else(review_not_found)?;
  info!(review_id = %review.id, rate = review.rate, "Review updated.");
  Ok(response::ok(review, "Review updated."))
}

#[instrument(name = "handler::delete_review", skip(app_state, caller))]
pub async fn delete_review_handler(
  app_state: web::Data<AppState>,
  caller: CustomerCaller,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let review = load_review(&app_state, path.into_inner()).await?;
  ownership::require(&caller.principal, Action::ReviewDelete, Some(review.customer_id))?;
  if !app_state.store.delete_review(review.id).await? {
    return Err(review_not_found());
  }
  info!(review_id = %review.id, product_id = %review.product_id, "Review deleted.");
  Ok(response::ok(json!({}), "Review deleted."))
}

async fn moderate(
  app_state: &AppState,
  principal: &Principal,
  review_id: Uuid,
  approved: bool,
) -> Result<Review, AppError> {
  ownership::require(principal, Action::ReviewModerate, None)?;
  let review = app_state
    .store
    .set_review_approval(review_id, approved)
    .await?
    .ok_or_else(review_not_found)?;
  info!(review_id = %review.id, approved = approved, "Review moderated.");
  Ok(review)
}

#[instrument(name = "handler::approve_review", skip(app_state, caller))]
pub async fn approve_review_handler(
  app_state: web::Data<AppState>,
  caller: AdminCaller,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let review = moderate(&app_state, &caller.principal, path.into_inner(), true).await?;
  Ok(response::ok(review, "Review approved."))
}

#[instrument(name = "handler::reject_review", skip(app_state, caller))]
pub async fn reject_review_handler(
  app_state: web::Data<AppState>,
  caller: AdminCaller,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let review = moderate(&app_state, &caller.principal, path.into_inner(), false).await?;
  Ok(response::ok(review, "Review rejected."))
}

#[instrument(name = "handler::mark_review_helpful", skip(app_state, caller))]
pub async fn mark_review_helpful_handler(
  app_state: web::Data<AppState>,
  caller: CustomerCaller,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  ownership::require(&caller.principal, Action::ReviewVote, None)?;
  let review = load_review(&app_state, path.into_inner()).await?;
  if !visible_to(&review, &caller.principal) {
    return Err(review_not_found());
  }
  let review = app_state
    .store
    .add_helpful_vote(review.id)
    .await?
    .ok_or_else(review_not_found)?;
  Ok(response::ok(
    json!({ "review_id": review.id, "helpful_count": review.helpful_count }),
    "Review marked as helpful.",
  ))
}
