//! Small helpers shared by the routes and services.
pub mod email;
pub mod httperror;
pub mod tokens;
