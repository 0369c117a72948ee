// app/src/lib.rs

//! TechOnline storefront: catalog, customer accounts, carts, orders and reviews
//! behind a JSON API. Multi-step writes run as `flowline` flows; reads go
//! straight to the [`store::ShopStore`].

pub mod config;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod store;
pub mod web;

pub use crate::config::AppConfig;
pub use crate::errors::{AppError, Result};
pub use crate::state::AppState;
