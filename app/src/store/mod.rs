// app/src/store/mod.rs

//! Persistence boundary. Handlers and flow steps only see [`ShopStore`];
//! `PgStore` backs production and `MemoryStore` backs tests and local runs.
//!
//! Invariants every implementation enforces atomically:
//! - a customer owns at most one open cart;
//! - a cart edit sees the latest lines and commits them in one step;
//! - a cart converts into at most one order, and conversion reserves stock;
//! - an order status change is a compare-and-set on the previous status.

use crate::errors::Result;
use crate::models::{
  Cart, Customer, CustomerUpdate, NewCustomer, NewProduct, NewReview, Order, OrderFilter, OrderStatus, Product,
  ProductFilter, ProductUpdate, Review, ReviewUpdate,
};
use async_trait::async_trait;
use uuid::Uuid;

pub mod memory;
pub mod postgres;
pub mod seed;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// A change to an open cart's lines, run against the stored cart while the
/// store holds it exclusively. An `Err` leaves the cart untouched.
pub type CartEdit = Box<dyn FnOnce(&mut Cart) -> Result<()> + Send>;

#[async_trait]
pub trait ShopStore: Send + Sync {
  // --- customers ---
  /// `Conflict` when the email is taken.
  async fn insert_customer(&self, new: NewCustomer) -> Result<Customer>;
  async fn get_customer(&self, id: Uuid) -> Result<Option<Customer>>;
  async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>>;
  async fn list_customers(&self, limit: i64, offset: i64) -> Result<Vec<Customer>>;
  async fn update_customer(&self, id: Uuid, update: CustomerUpdate) -> Result<Option<Customer>>;
  async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool>;
  /// Removes the customer with their carts and reviews. Orders are kept.
  async fn delete_customer(&self, id: Uuid) -> Result<bool>;

  // --- catalog ---
  async fn insert_product(&self, new: NewProduct) -> Result<Product>;
  async fn get_product(&self, id: Uuid) -> Result<Option<Product>>;
  async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>>;
  async fn update_product(&self, id: Uuid, update: ProductUpdate) -> Result<Option<Product>>;
  /// The whole catalog, lowest stock first. Feeds the stock reports.
  async fn all_products(&self) -> Result<Vec<Product>>;

  // --- carts ---
  /// `Conflict` when the customer already has an open cart.
  async fn create_cart(&self, customer_id: Uuid) -> Result<Cart>;
  async fn get_cart(&self, id: Uuid) -> Result<Option<Cart>>;
  async fn open_cart_for(&self, customer_id: Uuid) -> Result<Option<Cart>>;
  /// All carts, or only those of `customer_id`.
  async fn list_carts(&self, customer_id: Option<Uuid>) -> Result<Vec<Cart>>;
  /// Applies `edit` to an open cart atomically. `NotFound` / `Conflict` if missing / converted.
  async fn update_cart(&self, cart_id: Uuid, edit: CartEdit) -> Result<Cart>;
  /// Never touches an order created from the cart.
  async fn delete_cart(&self, id: Uuid) -> Result<bool>;

  // --- orders ---
  /// Converts the cart into a pending order and reserves stock, atomically.
  async fn create_order_from_cart(&self, cart_id: Uuid) -> Result<Order>;
  async fn get_order(&self, id: Uuid) -> Result<Option<Order>>;
  async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>>;
  /// Moves `id` from `from` to `to`. A lost race reports `InvalidTransition`
  /// from the status actually found. Cancelling releases reserved stock.
  async fn transition_order_status(&self, id: Uuid, from: OrderStatus, to: OrderStatus) -> Result<Order>;
  async fn order_status_counts(&self) -> Result<Vec<(OrderStatus, i64)>>;

  // --- reviews ---
  /// `Conflict` on a second review by the same customer. Refreshes the product rating.
  async fn insert_review(&self, new: NewReview) -> Result<Review>;
  async fn get_review(&self, id: Uuid) -> Result<Option<Review>>;
  async fn list_reviews(&self, product_id: Uuid, approved_only: bool) -> Result<Vec<Review>>;
  async fn list_customer_reviews(&self, customer_id: Uuid) -> Result<Vec<Review>>;
  /// The next three refresh the product rating.
  async fn update_review(&self, id: Uuid, update: ReviewUpdate) -> Result<Option<Review>>;
  async fn set_review_approval(&self, id: Uuid, approved: bool) -> Result<Option<Review>>;
  async fn delete_review(&self, id: Uuid) -> Result<bool>;
  async fn add_helpful_vote(&self, id: Uuid) -> Result<Option<Review>>;
}
