// app/src/store/memory.rs

//! `ShopStore` held entirely in memory. Every operation runs inside one
//! critical section, which gives it the same atomicity as the SQL store.

use crate::errors::{AppError, Result};
use crate::models::review::average_rate;
use crate::models::{
  Cart, Customer, CustomerUpdate, NewCustomer, NewProduct, NewReview, Order, OrderFilter, OrderStatus, Product,
  ProductFilter, ProductSort, ProductUpdate, Review, ReviewUpdate,
};
use crate::services::order_lifecycle;
use crate::store::{CartEdit, ShopStore};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
  customers: HashMap<Uuid, Customer>,
  products: HashMap<Uuid, Product>,
  carts: HashMap<Uuid, Cart>,
  orders: HashMap<Uuid, Order>,
  reviews: Vec<Review>,
}

impl Tables {
  fn refresh_rating(&mut self, product_id: Uuid) {
    let rating = average_rate(
      self
        .reviews
        .iter()
        .filter(|r| r.product_id == product_id && r.is_approved)
        .map(|r| r.rate),
    );
    if let Some(product) = self.products.get_mut(&product_id) {
      product.rating = rating;
    }
  }

  fn has_purchased(&self, customer_id: Uuid, product_id: Uuid) -> bool {
    self
      .orders
      .values()
      .any(|o| o.customer_id == customer_id && o.items.iter().any(|i| i.product_id == product_id))
  }

  /// Edits one review in place and refreshes its product's rating.
  fn edit_review<F: FnOnce(&mut Review)>(&mut self, id: Uuid, edit: F) -> Option<Review> {
    let review = self.reviews.iter_mut().find(|r| r.id == id)?;
    edit(review);
    let updated = review.clone();
    self.refresh_rating(updated.product_id);
    Some(updated)
  }
}

fn newest_first(reviews: &mut [Review]) {
  reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
}

#[derive(Default)]
pub struct MemoryStore {
  tables: Mutex<Tables>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

fn page<T>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
  items
    .into_iter()
    .skip(offset.max(0) as usize)
    .take(limit.max(0) as usize)
    .collect()
}

#[async_trait]
impl ShopStore for MemoryStore {
  async fn insert_customer(&self, new: NewCustomer) -> Result<Customer> {
    let mut t = self.tables.lock();
    if t.customers.values().any(|c| c.email == new.email) {
      return Err(AppError::Conflict("A customer with this email already exists.".to_string()));
    }
    let now = Utc::now();
    let customer = Customer {
      id: Uuid::new_v4(),
      first_name: new.first_name,
      last_name: new.last_name,
      email: new.email,
      password_hash: new.password_hash,
      address: new.address,
      created_at: now,
      updated_at: now,
    };
    t.customers.insert(customer.id, customer.clone());
    Ok(customer)
  }

  async fn get_customer(&self, id: Uuid) -> Result<Option<Customer>> {
    Ok(self.tables.lock().customers.get(&id).cloned())
  }

  async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>> {
    Ok(self.tables.lock().customers.values().find(|c| c.email == email).cloned())
  }

  async fn list_customers(&self, limit: i64, offset: i64) -> Result<Vec<Customer>> {
    let mut all: Vec<Customer> = self.tables.lock().customers.values().cloned().collect();
    all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.email.cmp(&b.email)));
    Ok(page(all, limit, offset))
  }

  async fn update_customer(&self, id: Uuid, update: CustomerUpdate) -> Result<Option<Customer>> {
    let mut t = self.tables.lock();
    let Some(customer) = t.customers.get_mut(&id) else {
      return Ok(None);
    };
    if let Some(first_name) = update.first_name {
      customer.first_name = first_name;
    }
    if let Some(last_name) = update.last_name {
      customer.last_name = last_name;
    }
    if let Some(address) = update.address {
      customer.address = Some(address);
    }
    customer.updated_at = Utc::now();
    Ok(Some(customer.clone()))
  }

  async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool> {
    let mut t = self.tables.lock();
    let Some(customer) = t.customers.get_mut(&id) else {
      return Ok(false);
    };
    customer.password_hash = password_hash.to_string();
    customer.updated_at = Utc::now();
    Ok(true)
  }

  async fn delete_customer(&self, id: Uuid) -> Result<bool> {
    let mut t = self.tables.lock();
    if t.customers.remove(&id).is_none() {
      return Ok(false);
    }
    t.carts.retain(|_, cart| cart.customer_id != id);
    let touched: Vec<Uuid> = t.reviews.iter().filter(|r| r.customer_id == id).map(|r| r.product_id).collect();
    t.reviews.retain(|r| r.customer_id != id);
    for product_id in touched {
      t.refresh_rating(product_id);
    }
    Ok(true)
  }

  async fn insert_product(&self, new: NewProduct) -> Result<Product> {
    let now = Utc::now();
    let product = Product {
      id: Uuid::new_v4(),
      name: new.name,
      description: new.description,
      category: new.category,
      price_cents: new.price_cents,
      stock_quantity: new.stock_quantity,
      rating: 0.0,
      created_at: now,
      updated_at: now,
    };
    self.tables.lock().products.insert(product.id, product.clone());
    Ok(product)
  }

  async fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
    Ok(self.tables.lock().products.get(&id).cloned())
  }

  async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
    let needle = filter.search.as_ref().map(|s| s.to_lowercase());
    let mut hits: Vec<Product> = self
      .tables
      .lock()
      .products
      .values()
      .filter(|p| filter.accepts(p))
      .filter(|p| needle.as_deref().map_or(true, |n| p.matches_text(n)))
      .cloned()
      .collect();
    match filter.sort_by {
      ProductSort::Name => hits.sort_by(|a, b| a.name.cmp(&b.name)),
      ProductSort::Price => hits.sort_by(|a, b| a.price_cents.cmp(&b.price_cents).then_with(|| a.name.cmp(&b.name))),
      ProductSort::Rating => hits.sort_by(|a, b| b.rating.total_cmp(&a.rating).then_with(|| a.name.cmp(&b.name))),
      ProductSort::Newest => hits.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.name.cmp(&b.name))),
    }
    Ok(page(hits, filter.limit, filter.offset))
  }

  async fn update_product(&self, id: Uuid, update: ProductUpdate) -> Result<Option<Product>> {
    let mut t = self.tables.lock();
    let Some(product) = t.products.get_mut(&id) else {
      return Ok(None);
    };
    if let Some(name) = update.name {
      product.name = name;
    }
    if let Some(description) = update.description {
      product.description = Some(description);
    }
    if let Some(category) = update.category {
      product.category = Some(category);
    }
    if let Some(price_cents) = update.price_cents {
      product.price_cents = price_cents;
    }
    if let Some(stock_quantity) = update.stock_quantity {
      product.stock_quantity = stock_quantity;
    }
    product.updated_at = Utc::now();
    Ok(Some(product.clone()))
  }

  async fn all_products(&self) -> Result<Vec<Product>> {
    let mut products: Vec<Product> = self.tables.lock().products.values().cloned().collect();
    products.sort_by(|a, b| a.stock_quantity.cmp(&b.stock_quantity).then_with(|| a.name.cmp(&b.name)));
    Ok(products)
  }

  async fn create_cart(&self, customer_id: Uuid) -> Result<Cart> {
    let mut t = self.tables.lock();
    if !t.customers.contains_key(&customer_id) {
      return Err(AppError::NotFound("Customer not found.".to_string()));
    }
    if t.carts.values().any(|c| c.customer_id == customer_id && c.is_open()) {
      return Err(AppError::Conflict("Customer already has an open cart.".to_string()));
    }
    let cart = Cart::new(customer_id);
    t.carts.insert(cart.id, cart.clone());
    Ok(cart)
  }

  async fn get_cart(&self, id: Uuid) -> Result<Option<Cart>> {
    Ok(self.tables.lock().carts.get(&id).cloned())
  }

  async fn open_cart_for(&self, customer_id: Uuid) -> Result<Option<Cart>> {
    Ok(
      self
        .tables
        .lock()
        .carts
        .values()
        .find(|c| c.customer_id == customer_id && c.is_open())
        .cloned(),
    )
  }

  async fn list_carts(&self, customer_id: Option<Uuid>) -> Result<Vec<Cart>> {
    let mut carts: Vec<Cart> = self
      .tables
      .lock()
      .carts
      .values()
      .filter(|c| customer_id.map_or(true, |id| c.customer_id == id))
      .cloned()
      .collect();
    carts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    Ok(carts)
  }

  async fn update_cart(&self, cart_id: Uuid, edit: CartEdit) -> Result<Cart> {
    let mut t = self.tables.lock();
    let cart = t
      .carts
      .get_mut(&cart_id)
      .ok_or_else(|| AppError::NotFound("Cart not found.".to_string()))?;
    cart.ensure_open()?;
    let mut draft = cart.clone();
    edit(&mut draft)?;
    draft.updated_at = Utc::now();
    *cart = draft;
    Ok(cart.clone())
  }

  async fn delete_cart(&self, id: Uuid) -> Result<bool> {
    Ok(self.tables.lock().carts.remove(&id).is_some())
  }

  async fn create_order_from_cart(&self, cart_id: Uuid) -> Result<Order> {
    let mut t = self.tables.lock();
    let cart = t
      .carts
      .get(&cart_id)
      .ok_or_else(|| AppError::NotFound("Cart not found.".to_string()))?;
    let order = order_lifecycle::snapshot_order(cart, Utc::now())?;

    for item in &order.items {
      let product = t
        .products
        .get(&item.product_id)
        .ok_or_else(|| AppError::InvalidRequest("A product in the cart no longer exists.".to_string()))?;
      if product.stock_quantity < item.quantity {
        return Err(AppError::InvalidRequest(format!(
          "Insufficient stock for '{}'. Only {} available.",
          product.name, product.stock_quantity
        )));
      }
    }
    for item in &order.items {
      if let Some(product) = t.products.get_mut(&item.product_id) {
        product.stock_quantity -= item.quantity;
      }
    }
    if let Some(cart) = t.carts.get_mut(&cart_id) {
      cart.order_id = Some(order.id);
      cart.updated_at = order.created_at;
    }
    t.orders.insert(order.id, order.clone());
    Ok(order)
  }

  async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
    Ok(self.tables.lock().orders.get(&id).cloned())
  }

  async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
    let mut orders: Vec<Order> = self
      .tables
      .lock()
      .orders
      .values()
      .filter(|o| filter.accepts(o))
      .cloned()
      .collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    Ok(page(orders, filter.limit, filter.offset))
  }

  async fn transition_order_status(&self, id: Uuid, from: OrderStatus, to: OrderStatus) -> Result<Order> {
    let mut t = self.tables.lock();
    let order = t
      .orders
      .get_mut(&id)
      .ok_or_else(|| AppError::NotFound("Order not found.".to_string()))?;
    if order.order_status != from {
      return Err(AppError::InvalidTransition {
        from: order.order_status,
        to,
      });
    }
    order.order_status = to;
    order.updated_at = Utc::now();
    let updated = order.clone();

    if to == OrderStatus::Cancelled {
      for item in &updated.items {
        if let Some(product) = t.products.get_mut(&item.product_id) {
          product.stock_quantity += item.quantity;
        }
      }
    }
    Ok(updated)
  }

  async fn order_status_counts(&self) -> Result<Vec<(OrderStatus, i64)>> {
    let t = self.tables.lock();
    Ok(
      OrderStatus::ALL
        .iter()
        .map(|status| {
          let count = t.orders.values().filter(|o| o.order_status == *status).count() as i64;
          (*status, count)
        })
        .collect(),
    )
  }

  async fn insert_review(&self, new: NewReview) -> Result<Review> {
    let mut t = self.tables.lock();
    if !t.products.contains_key(&new.product_id) {
      return Err(AppError::NotFound("Product not found.".to_string()));
    }
    if t
      .reviews
      .iter()
      .any(|r| r.customer_id == new.customer_id && r.product_id == new.product_id)
    {
      return Err(AppError::Conflict("You have already reviewed this product.".to_string()));
    }
    let is_verified = t.has_purchased(new.customer_id, new.product_id);
    let review = Review {
      id: Uuid::new_v4(),
      product_id: new.product_id,
      customer_id: new.customer_id,
      rate: new.rate,
      text: new.text,
      title: new.title,
      is_approved: true,
      is_verified,
      helpful_count: 0,
      created_at: Utc::now(),
    };
    t.reviews.push(review.clone());
    t.refresh_rating(review.product_id);
    Ok(review)
  }

  async fn get_review(&self, id: Uuid) -> Result<Option<Review>> {
    Ok(self.tables.lock().reviews.iter().find(|r| r.id == id).cloned())
  }

  async fn list_reviews(&self, product_id: Uuid, approved_only: bool) -> Result<Vec<Review>> {
    let mut reviews: Vec<Review> = self
      .tables
      .lock()
      .reviews
      .iter()
      .filter(|r| r.product_id == product_id && (!approved_only || r.is_approved))
      .cloned()
      .collect();
    newest_first(&mut reviews);
    Ok(reviews)
  }

  async fn list_customer_reviews(&self, customer_id: Uuid) -> Result<Vec<Review>> {
    let mut reviews: Vec<Review> = self
      .tables
      .lock()
      .reviews
      .iter()
      .filter(|r| r.customer_id == customer_id)
      .cloned()
      .collect();
    newest_first(&mut reviews);
    Ok(reviews)
  }

  async fn update_review(&self, id: Uuid, update: ReviewUpdate) -> Result<Option<Review>> {
    Ok(self.tables.lock().edit_review(id, |review| update.apply_to(review)))
  }

  async fn set_review_approval(&self, id: Uuid, approved: bool) -> Result<Option<Review>> {
    Ok(self.tables.lock().edit_review(id, |review| review.is_approved = approved))
  }

  async fn delete_review(&self, id: Uuid) -> Result<bool> {
    let mut t = self.tables.lock();
    let Some(idx) = t.reviews.iter().position(|r| r.id == id) else {
      return Ok(false);
    };
    let removed = t.reviews.remove(idx);
    t.refresh_rating(removed.product_id);
    Ok(true)
  }

  async fn add_helpful_vote(&self, id: Uuid) -> Result<Option<Review>> {
    let mut t = self.tables.lock();
    let Some(review) = t.reviews.iter_mut().find(|r| r.id == id) else {
      return Ok(None);
    };
    review.helpful_count = review.helpful_count.saturating_add(1);
    Ok(Some(review.clone()))
  }
}
