//! Constants (primary environment variables/secrets) used across the application.
pub mod api;
pub mod cart;
pub mod db;
pub mod openai;
pub mod passwords;
pub mod redis;
mod secrets;
pub mod sessions;
