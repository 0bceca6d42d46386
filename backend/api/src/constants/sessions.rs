//! Constants related to authentication and session handling.

/// Timeout for authenticated sessions in seconds.
pub const SESSION_TIMEOUT: u32 = 7 * 24 * 60 * 60;
/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";
/// Header which must echo the session's CSRF token on state-changing requests.
pub const CSRF_HEADER: &str = "X-CSRF-Token";
