// app/src/store/postgres.rs

//! PostgreSQL-backed `ShopStore` (sqlx).

use crate::errors::{AppError, Result};
use crate::models::{
  Cart, CartItem, Customer, CustomerUpdate, NewCustomer, NewProduct, NewReview, Order, OrderFilter, OrderItem,
  OrderStatus, Product, ProductFilter, ProductSort, ProductUpdate, Review, ReviewUpdate,
};
use crate::services::order_lifecycle;
use crate::store::{CartEdit, ShopStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument};
use uuid::Uuid;

const SCHEMA: &str = include_str!("../../schema.sql");

const CUSTOMER_COLUMNS: &str = "id, first_name, last_name, email, password_hash, address, created_at, updated_at";
const PRODUCT_COLUMNS: &str =
  "id, name, description, category, price_cents, stock_quantity, rating, created_at, updated_at";
const CART_COLUMNS: &str = "id, customer_id, order_id, created_at, updated_at";
const ORDER_COLUMNS: &str = "id, customer_id, cart_id, total_amount_cents, order_status, created_at, updated_at";
const REVIEW_COLUMNS: &str =
  "id, product_id, customer_id, rate, text, title, is_approved, is_verified, helpful_count, created_at";

#[derive(FromRow)]
struct CartRow {
  id: Uuid,
  customer_id: Uuid,
  order_id: Option<Uuid>,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl CartRow {
  fn into_cart(self, items: Vec<CartItem>) -> Cart {
    Cart {
      id: self.id,
      customer_id: self.customer_id,
      order_id: self.order_id,
      items,
      created_at: self.created_at,
      updated_at: self.updated_at,
    }
  }
}

/// Unique violations become `Conflict`, missing foreign rows `NotFound`.
fn map_constraint(err: sqlx::Error, conflict: &str, missing: &str) -> AppError {
  if let sqlx::Error::Database(db_err) = &err {
    if db_err.is_unique_violation() {
      return AppError::Conflict(conflict.to_string());
    }
    if db_err.is_foreign_key_violation() {
      return AppError::NotFound(missing.to_string());
    }
  }
  AppError::Sqlx(err)
}

fn like_pattern(raw: &str) -> String {
  let escaped = raw.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
  format!("%{}%", escaped)
}

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub async fn connect(database_url: &str) -> Result<Self> {
    let pool = PgPoolOptions::new().max_connections(10).connect(database_url).await?;
    info!("Successfully connected to the database.");
    Ok(Self { pool })
  }

  pub fn from_pool(pool: PgPool) -> Self {
    Self { pool }
  }

  #[instrument(name = "PgStore::apply_schema", skip(self), err(Display))]
  pub async fn apply_schema(&self) -> Result<()> {
    sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
    info!("Database schema applied.");
    Ok(())
  }

  async fn cart_items(conn: &mut PgConnection, cart_id: Uuid) -> Result<Vec<CartItem>> {
    let items = sqlx::query_as::<_, CartItem>(
      "SELECT product_id, quantity, price_cents FROM cart_items WHERE cart_id = $1 ORDER BY position",
    )
    .bind(cart_id)
    .fetch_all(conn)
    .await?;
    Ok(items)
  }

  async fn hydrate_carts(&self, rows: Vec<CartRow>) -> Result<Vec<Cart>> {
    let mut conn = self.pool.acquire().await?;
    let mut carts = Vec::with_capacity(rows.len());
    for row in rows {
      let items = Self::cart_items(&mut conn, row.id).await?;
      carts.push(row.into_cart(items));
    }
    Ok(carts)
  }

  async fn order_items(conn: &mut PgConnection, order_id: Uuid) -> Result<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(
      "SELECT order_id, product_id, quantity, price_cents FROM order_items WHERE order_id = $1 ORDER BY position",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(items)
  }

  async fn hydrate_orders(&self, mut orders: Vec<Order>) -> Result<Vec<Order>> {
    let mut conn = self.pool.acquire().await?;
    for order in orders.iter_mut() {
      order.items = Self::order_items(&mut conn, order.id).await?;
    }
    Ok(orders)
  }

  /// Runs one `UPDATE reviews ... WHERE id = $1 RETURNING` and refreshes the rating in the same transaction.
  async fn edit_review<'q>(
    &self,
    query: sqlx::query::QueryAs<'q, Postgres, Review, sqlx::postgres::PgArguments>,
  ) -> Result<Option<Review>> {
    let mut tx = self.pool.begin().await?;
    let review = query.fetch_optional(&mut *tx).await?;
    if let Some(review) = &review {
      Self::refresh_rating(&mut tx, review.product_id).await?;
    }
    tx.commit().await?;
    Ok(review)
  }

  async fn refresh_rating(conn: &mut PgConnection, product_id: Uuid) -> Result<()> {
    sqlx::query(
      "UPDATE products SET rating = COALESCE(
         (SELECT AVG(rate)::float8 FROM reviews WHERE product_id = $1 AND is_approved), 0)
       WHERE id = $1",
    )
    .bind(product_id)
    .execute(conn)
    .await?;
    Ok(())
  }
}

#[async_trait]
impl ShopStore for PgStore {
  async fn insert_customer(&self, new: NewCustomer) -> Result<Customer> {
    let sql = format!(
      "INSERT INTO customers (id, first_name, last_name, email, password_hash, address)
       VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
      CUSTOMER_COLUMNS
    );
    sqlx::query_as::<_, Customer>(&sql)
      .bind(Uuid::new_v4())
      .bind(&new.first_name)
      .bind(&new.last_name)
      .bind(&new.email)
      .bind(&new.password_hash)
      .bind(&new.address)
      .fetch_one(&self.pool)
      .await
      .map_err(|e| map_constraint(e, "A customer with this email already exists.", "Customer not found."))
  }

  async fn get_customer(&self, id: Uuid) -> Result<Option<Customer>> {
    let sql = format!("SELECT {} FROM customers WHERE id = $1", CUSTOMER_COLUMNS);
    Ok(sqlx::query_as::<_, Customer>(&sql).bind(id).fetch_optional(&self.pool).await?)
  }

  async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>> {
    let sql = format!("SELECT {} FROM customers WHERE email = $1", CUSTOMER_COLUMNS);
    Ok(sqlx::query_as::<_, Customer>(&sql).bind(email).fetch_optional(&self.pool).await?)
  }

  async fn list_customers(&self, limit: i64, offset: i64) -> Result<Vec<Customer>> {
    let sql = format!(
      "SELECT {} FROM customers ORDER BY created_at, email LIMIT $1 OFFSET $2",
      CUSTOMER_COLUMNS
    );
    Ok(
      sqlx::query_as::<_, Customer>(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?,
    )
  }

  async fn update_customer(&self, id: Uuid, update: CustomerUpdate) -> Result<Option<Customer>> {
    let sql = format!(
      "UPDATE customers SET
         first_name = COALESCE($2, first_name),
         last_name = COALESCE($3, last_name),
         address = COALESCE($4, address),
         updated_at = now()
       WHERE id = $1 RETURNING {}",
      CUSTOMER_COLUMNS
    );
    Ok(
      sqlx::query_as::<_, Customer>(&sql)
        .bind(id)
        .bind(update.first_name)
        .bind(update.last_name)
        .bind(update.address)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE customers SET password_hash = $2, updated_at = now() WHERE id = $1")
      .bind(id)
      .bind(password_hash)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn delete_customer(&self, id: Uuid) -> Result<bool> {
    let mut tx = self.pool.begin().await?;
    let reviewed: Vec<Uuid> = sqlx::query_scalar("SELECT product_id FROM reviews WHERE customer_id = $1")
      .bind(id)
      .fetch_all(&mut *tx)
      .await?;
    let deleted = sqlx::query("DELETE FROM customers WHERE id = $1")
      .bind(id)
      .execute(&mut *tx)
      .await?
      .rows_affected()
      > 0;
    for product_id in reviewed {
      Self::refresh_rating(&mut tx, product_id).await?;
    }
    tx.commit().await?;
    Ok(deleted)
  }

  async fn insert_product(&self, new: NewProduct) -> Result<Product> {
    let sql = format!(
      "INSERT INTO products (id, name, description, category, price_cents, stock_quantity)
       VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
      PRODUCT_COLUMNS
    );
    Ok(
      sqlx::query_as::<_, Product>(&sql)
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.category)
        .bind(new.price_cents)
        .bind(new.stock_quantity)
        .fetch_one(&self.pool)
        .await?,
    )
  }

  async fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
    let sql = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
    Ok(sqlx::query_as::<_, Product>(&sql).bind(id).fetch_optional(&self.pool).await?)
  }

  #[instrument(name = "PgStore::list_products", skip(self), err(Display))]
  async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM products WHERE TRUE", PRODUCT_COLUMNS));
    if let Some(search) = &filter.search {
      let pattern = like_pattern(search);
      qb.push(" AND (name ILIKE ")
        .push_bind(pattern.clone())
        .push(" OR description ILIKE ")
        .push_bind(pattern.clone())
        .push(" OR category ILIKE ")
        .push_bind(pattern)
        .push(")");
    }
    if let Some(category) = &filter.category {
      qb.push(" AND LOWER(category) = LOWER(").push_bind(category.clone()).push(")");
    }
    if let Some(min) = filter.min_price_cents {
      qb.push(" AND price_cents >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price_cents {
      qb.push(" AND price_cents <= ").push_bind(max);
    }
    match filter.in_stock {
      Some(true) => {
        qb.push(" AND stock_quantity > 0");
      }
      Some(false) => {
        qb.push(" AND stock_quantity = 0");
      }
      None => {}
    }
    qb.push(match filter.sort_by {
      ProductSort::Name => " ORDER BY name",
      ProductSort::Price => " ORDER BY price_cents, name",
      ProductSort::Rating => " ORDER BY rating DESC, name",
      ProductSort::Newest => " ORDER BY created_at DESC, name",
    });
    qb.push(" LIMIT ").push_bind(filter.limit);
    qb.push(" OFFSET ").push_bind(filter.offset);

    Ok(qb.build_query_as::<Product>().fetch_all(&self.pool).await?)
  }

  async fn update_product(&self, id: Uuid, update: ProductUpdate) -> Result<Option<Product>> {
    let sql = format!(
      "UPDATE products SET
         name = COALESCE($2, name),
         description = COALESCE($3, description),
         category = COALESCE($4, category),
         price_cents = COALESCE($5, price_cents),
         stock_quantity = COALESCE($6, stock_quantity),
         updated_at = now()
       WHERE id = $1 RETURNING {}",
      PRODUCT_COLUMNS
    );
    Ok(
      sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .bind(update.name)
        .bind(update.description)
        .bind(update.category)
        .bind(update.price_cents)
        .bind(update.stock_quantity)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn all_products(&self) -> Result<Vec<Product>> {
    let sql = format!("SELECT {} FROM products ORDER BY stock_quantity, name", PRODUCT_COLUMNS);
    Ok(sqlx::query_as::<_, Product>(&sql).fetch_all(&self.pool).await?)
  }

  async fn create_cart(&self, customer_id: Uuid) -> Result<Cart> {
    let sql = format!(
      "INSERT INTO carts (id, customer_id) VALUES ($1, $2) RETURNING {}",
      CART_COLUMNS
    );
    let row = sqlx::query_as::<_, CartRow>(&sql)
      .bind(Uuid::new_v4())
      .bind(customer_id)
      .fetch_one(&self.pool)
      .await
      .map_err(|e| map_constraint(e, "Customer already has an open cart.", "Customer not found."))?;
    Ok(row.into_cart(Vec::new()))
  }

  async fn get_cart(&self, id: Uuid) -> Result<Option<Cart>> {
    let sql = format!("SELECT {} FROM carts WHERE id = $1", CART_COLUMNS);
    let row = sqlx::query_as::<_, CartRow>(&sql).bind(id).fetch_optional(&self.pool).await?;
    match row {
      Some(row) => Ok(self.hydrate_carts(vec![row]).await?.pop()),
      None => Ok(None),
    }
  }

  async fn open_cart_for(&self, customer_id: Uuid) -> Result<Option<Cart>> {
    let sql = format!(
      "SELECT {} FROM carts WHERE customer_id = $1 AND order_id IS NULL",
      CART_COLUMNS
    );
    let row = sqlx::query_as::<_, CartRow>(&sql)
      .bind(customer_id)
      .fetch_optional(&self.pool)
      .await?;
    match row {
      Some(row) => Ok(self.hydrate_carts(vec![row]).await?.pop()),
      None => Ok(None),
    }
  }

  async fn list_carts(&self, customer_id: Option<Uuid>) -> Result<Vec<Cart>> {
    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM carts", CART_COLUMNS));
    if let Some(customer_id) = customer_id {
      qb.push(" WHERE customer_id = ").push_bind(customer_id);
    }
    qb.push(" ORDER BY created_at, id");
    let rows = qb.build_query_as::<CartRow>().fetch_all(&self.pool).await?;
    self.hydrate_carts(rows).await
  }

  /// The row lock is taken before the lines are read, so concurrent edits queue up.
  #[instrument(name = "PgStore::update_cart", skip(self, edit), err(Display))]
  async fn update_cart(&self, cart_id: Uuid, edit: CartEdit) -> Result<Cart> {
    let mut tx = self.pool.begin().await?;
    let sql = format!("SELECT {} FROM carts WHERE id = $1 FOR UPDATE", CART_COLUMNS);
    let row = sqlx::query_as::<_, CartRow>(&sql)
      .bind(cart_id)
      .fetch_optional(&mut *tx)
      .await?
      .ok_or_else(|| AppError::NotFound("Cart not found.".to_string()))?;
    let items = Self::cart_items(&mut tx, cart_id).await?;
    let mut cart = row.into_cart(items);
    cart.ensure_open()?;
    edit(&mut cart)?;

    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
      .bind(cart_id)
      .execute(&mut *tx)
      .await?;
    for (position, item) in cart.items.iter().enumerate() {
      sqlx::query(
        "INSERT INTO cart_items (cart_id, product_id, quantity, price_cents, position) VALUES ($1, $2, $3, $4, $5)",
      )
      .bind(cart_id)
      .bind(item.product_id)
      .bind(item.quantity)
      .bind(item.price_cents)
      .bind(position as i32)
      .execute(&mut *tx)
      .await
      .map_err(|e| map_constraint(e, "Duplicate cart line.", "Product not found."))?;
    }
    let sql = format!("UPDATE carts SET updated_at = now() WHERE id = $1 RETURNING {}", CART_COLUMNS);
    let row = sqlx::query_as::<_, CartRow>(&sql).bind(cart_id).fetch_one(&mut *tx).await?;
    tx.commit().await?;
    Ok(row.into_cart(cart.items))
  }

  async fn delete_cart(&self, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM carts WHERE id = $1").bind(id).execute(&self.pool).await?;
    Ok(result.rows_affected() > 0)
  }

  #[instrument(name = "PgStore::create_order_from_cart", skip(self), err(Display))]
  async fn create_order_from_cart(&self, cart_id: Uuid) -> Result<Order> {
    let mut tx = self.pool.begin().await?;
    let sql = format!("SELECT {} FROM carts WHERE id = $1 FOR UPDATE", CART_COLUMNS);
    let row = sqlx::query_as::<_, CartRow>(&sql)
      .bind(cart_id)
      .fetch_optional(&mut *tx)
      .await?
      .ok_or_else(|| AppError::NotFound("Cart not found.".to_string()))?;
    let items = Self::cart_items(&mut tx, cart_id).await?;
    let order = order_lifecycle::snapshot_order(&row.into_cart(items), Utc::now())?;

    for item in &order.items {
      let reserved = sqlx::query(
        "UPDATE products SET stock_quantity = stock_quantity - $2, updated_at = now()
         WHERE id = $1 AND stock_quantity >= $2",
      )
      .bind(item.product_id)
      .bind(item.quantity)
      .execute(&mut *tx)
      .await?
      .rows_affected();
      if reserved == 0 {
        return Err(AppError::InvalidRequest(
          "Insufficient stock for a product in the cart.".to_string(),
        ));
      }
    }

    sqlx::query(
      "INSERT INTO orders (id, customer_id, cart_id, total_amount_cents, order_status, created_at, updated_at)
       VALUES ($1, $2, $3, $4, $5, $6, $6)",
    )
    .bind(order.id)
    .bind(order.customer_id)
    .bind(order.cart_id)
    .bind(order.total_amount_cents)
    .bind(order.order_status)
    .bind(order.created_at)
    .execute(&mut *tx)
    .await
    .map_err(|e| map_constraint(e, "Cart has already been converted into an order.", "Cart not found."))?;

    for (position, item) in order.items.iter().enumerate() {
      sqlx::query(
        "INSERT INTO order_items (order_id, product_id, quantity, price_cents, position) VALUES ($1, $2, $3, $4, $5)",
      )
      .bind(item.order_id)
      .bind(item.product_id)
      .bind(item.quantity)
      .bind(item.price_cents)
      .bind(position as i32)
      .execute(&mut *tx)
      .await?;
    }

    sqlx::query("UPDATE carts SET order_id = $2, updated_at = now() WHERE id = $1")
      .bind(cart_id)
      .bind(order.id)
      .execute(&mut *tx)
      .await?;
    tx.commit().await?;
    Ok(order)
  }

  async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
    let sql = format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS);
    let order = sqlx::query_as::<_, Order>(&sql).bind(id).fetch_optional(&self.pool).await?;
    match order {
      Some(order) => Ok(self.hydrate_orders(vec![order]).await?.pop()),
      None => Ok(None),
    }
  }

  async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM orders WHERE TRUE", ORDER_COLUMNS));
    if let Some(customer_id) = filter.customer_id {
      qb.push(" AND customer_id = ").push_bind(customer_id);
    }
    if let Some(status) = filter.status {
      qb.push(" AND order_status = ").push_bind(status);
    }
    qb.push(" ORDER BY created_at DESC, id LIMIT ").push_bind(filter.limit);
    qb.push(" OFFSET ").push_bind(filter.offset);
    let orders = qb.build_query_as::<Order>().fetch_all(&self.pool).await?;
    self.hydrate_orders(orders).await
  }

  #[instrument(name = "PgStore::transition_order_status", skip(self), err(Display))]
  async fn transition_order_status(&self, id: Uuid, from: OrderStatus, to: OrderStatus) -> Result<Order> {
    let mut tx = self.pool.begin().await?;
    let current: OrderStatus = sqlx::query_scalar("SELECT order_status FROM orders WHERE id = $1 FOR UPDATE")
      .bind(id)
      .fetch_optional(&mut *tx)
      .await?
      .ok_or_else(|| AppError::NotFound("Order not found.".to_string()))?;
    if current != from {
      return Err(AppError::InvalidTransition { from: current, to });
    }

    let sql = format!(
      "UPDATE orders SET order_status = $2, updated_at = now() WHERE id = $1 RETURNING {}",
      ORDER_COLUMNS
    );
    let mut order = sqlx::query_as::<_, Order>(&sql)
      .bind(id)
      .bind(to)
      .fetch_one(&mut *tx)
      .await?;

    if to == OrderStatus::Cancelled {
      sqlx::query(
        "UPDATE products p SET stock_quantity = p.stock_quantity + oi.quantity, updated_at = now()
         FROM order_items oi WHERE oi.order_id = $1 AND p.id = oi.product_id",
      )
      .bind(id)
      .execute(&mut *tx)
      .await?;
    }
    order.items = Self::order_items(&mut tx, id).await?;
    tx.commit().await?;
    Ok(order)
  }

  async fn order_status_counts(&self) -> Result<Vec<(OrderStatus, i64)>> {
    let rows: Vec<(OrderStatus, i64)> =
      sqlx::query_as("SELECT order_status, COUNT(*) FROM orders GROUP BY order_status")
        .fetch_all(&self.pool)
        .await?;
    Ok(
      OrderStatus::ALL
        .iter()
        .map(|status| {
          let count = rows.iter().find(|(s, _)| s == status).map_or(0, |(_, c)| *c);
          (*status, count)
        })
        .collect(),
    )
  }

  async fn insert_review(&self, new: NewReview) -> Result<Review> {
    let mut tx = self.pool.begin().await?;
    let sql = format!(
      "INSERT INTO reviews (id, product_id, customer_id, rate, text, title, is_verified)
       VALUES ($1, $2, $3, $4, $5, $6, EXISTS (
         SELECT 1 FROM orders o JOIN order_items oi ON oi.order_id = o.id
         WHERE o.customer_id = $3 AND oi.product_id = $2))
       RETURNING {}",
      REVIEW_COLUMNS
    );
    let review = sqlx::query_as::<_, Review>(&sql)
      .bind(Uuid::new_v4())
      .bind(new.product_id)
      .bind(new.customer_id)
      .bind(new.rate)
      .bind(&new.text)
      .bind(&new.title)
      .fetch_one(&mut *tx)
      .await
      .map_err(|e| map_constraint(e, "You have already reviewed this product.", "Product not found."))?;
    Self::refresh_rating(&mut tx, new.product_id).await?;
    tx.commit().await?;
    Ok(review)
  }

  async fn get_review(&self, id: Uuid) -> Result<Option<Review>> {
    let sql = format!("SELECT {} FROM reviews WHERE id = $1", REVIEW_COLUMNS);
    Ok(sqlx::query_as::<_, Review>(&sql).bind(id).fetch_optional(&self.pool).await?)
  }

  async fn list_reviews(&self, product_id: Uuid, approved_only: bool) -> Result<Vec<Review>> {
    let sql = format!(
      "SELECT {} FROM reviews WHERE product_id = $1 AND (is_approved OR NOT $2) ORDER BY created_at DESC, id",
      REVIEW_COLUMNS
    );
    Ok(
      sqlx::query_as::<_, Review>(&sql)
        .bind(product_id)
        .bind(approved_only)
        .fetch_all(&self.pool)
        .await?,
    )
  }

  async fn list_customer_reviews(&self, customer_id: Uuid) -> Result<Vec<Review>> {
    let sql = format!(
      "SELECT {} FROM reviews WHERE customer_id = $1 ORDER BY created_at DESC, id",
      REVIEW_COLUMNS
    );
    Ok(
      sqlx::query_as::<_, Review>(&sql)
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?,
    )
  }

  async fn update_review(&self, id: Uuid, update: ReviewUpdate) -> Result<Option<Review>> {
    // An empty title clears it; an absent one keeps it.
    let sql = format!(
      "UPDATE reviews SET
         rate = COALESCE($2, rate),
         text = COALESCE($3, text),
         title = CASE WHEN $4::text IS NULL THEN title ELSE NULLIF($4, '') END
       WHERE id = $1 RETURNING {}",
      REVIEW_COLUMNS
    );
    let query = sqlx::query_as::<_, Review>(&sql)
      .bind(id)
      .bind(update.rate)
      .bind(update.text)
      .bind(update.title);
    self.edit_review(query).await
  }

  async fn set_review_approval(&self, id: Uuid, approved: bool) -> Result<Option<Review>> {
    let sql = format!("UPDATE reviews SET is_approved = $2 WHERE id = $1 RETURNING {}", REVIEW_COLUMNS);
    let query = sqlx::query_as::<_, Review>(&sql).bind(id).bind(approved);
    self.edit_review(query).await
  }

  async fn delete_review(&self, id: Uuid) -> Result<bool> {
    let mut tx = self.pool.begin().await?;
    let product_id: Option<Uuid> = sqlx::query_scalar("DELETE FROM reviews WHERE id = $1 RETURNING product_id")
      .bind(id)
      .fetch_optional(&mut *tx)
      .await?;
    if let Some(product_id) = product_id {
      Self::refresh_rating(&mut tx, product_id).await?;
    }
    tx.commit().await?;
    Ok(product_id.is_some())
  }

  async fn add_helpful_vote(&self, id: Uuid) -> Result<Option<Review>> {
    let sql = format!(
      "UPDATE reviews SET helpful_count = helpful_count + 1 WHERE id = $1 RETURNING {}",
      REVIEW_COLUMNS
    );
    Ok(sqlx::query_as::<_, Review>(&sql).bind(id).fetch_optional(&self.pool).await?)
  }
}
