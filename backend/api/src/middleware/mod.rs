//! Middleware layered onto the router.
pub mod logging;
pub mod session;
