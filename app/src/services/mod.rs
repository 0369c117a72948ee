// app/src/services/mod.rs

pub mod api_keys;
pub mod auth_service;
pub mod credentials;
pub mod order_lifecycle;
pub mod ownership;
pub mod stock_levels;
pub mod token_service;
