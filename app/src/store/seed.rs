// app/src/store/seed.rs

//! Demo catalog inserted when `SEED_DB=true`.

use crate::models::{NewProduct, ProductFilter};
use crate::store::ShopStore;
use anyhow::Context;
use tracing::info;

const DEMO_PRODUCTS: &[(&str, &str, &str, i64, i32)] = &[
  ("Mechanical Keyboard", "Hot-swappable switches, aluminium case.", "peripherals", 12_900, 25),
  ("Wireless Mouse", "Ergonomic, 70 days of battery.", "peripherals", 4_900, 60),
  ("27\" 4K Monitor", "IPS panel, USB-C power delivery.", "displays", 39_900, 10),
  ("USB-C Dock", "Dual display, gigabit ethernet.", "accessories", 17_500, 15),
  ("Noise Cancelling Headphones", "Over-ear, 30h battery.", "audio", 24_900, 20),
];

/// Inserts the demo catalog unless the store already has products.
pub async fn seed_demo_catalog(store: &dyn ShopStore) -> anyhow::Result<usize> {
  let existing = store
    .list_products(&ProductFilter {
      limit: 1,
      ..Default::default()
    })
    .await
    .context("checking for an existing catalog")?;
  if !existing.is_empty() {
    info!("Catalog already present, skipping seed.");
    return Ok(0);
  }

  for (name, description, category, price_cents, stock_quantity) in DEMO_PRODUCTS {
    store
      .insert_product(NewProduct {
        name: name.to_string(),
        description: Some(description.to_string()),
        category: Some(category.to_string()),
        price_cents: *price_cents,
        stock_quantity: *stock_quantity,
      })
      .await
      .with_context(|| format!("inserting demo product '{}'", name))?;
  }
  info!(count = DEMO_PRODUCTS.len(), "Demo catalog seeded.");
  Ok(DEMO_PRODUCTS.len())
}
