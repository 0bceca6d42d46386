//! Defines data models (structs) which map directly to rows in the database.
pub mod appuser;
pub mod order;
pub mod order_item;
pub mod password;
pub mod product;
pub mod shop;
