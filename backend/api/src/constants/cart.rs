//! Constants for guest carts.

/// Seconds a cart survives without being modified.
pub const CART_TIMEOUT: u32 = 3 * 24 * 60 * 60;
/// Name of the cookie carrying the cart token.
pub const CART_COOKIE: &str = "cart";
