//! Business logic which the routes call into.
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod errors;
pub mod health;
pub mod openai;
pub mod orders;
pub mod sessions;
