//! Random tokens identifying carts and sessions.
use core::fmt::Write as _;

/// Raw bytes of entropy in a token.
const TOKEN_BYTES: usize = 24;

/// Generates a new 24-byte hex encoded token using a CSPRNG.
pub fn generate_token() -> Result<String, getrandom::Error> {
    let mut token_buf = [0_u8; TOKEN_BYTES];
    getrandom::fill(&mut token_buf)?;
    Ok(token_buf
        .into_iter()
        .fold(String::with_capacity(TOKEN_BYTES * 2), |mut acc, x| {
            // Writing to a String cannot fail.
            let _ = write!(acc, "{x:02x}");
            acc
        }))
}

/// Whether a client supplied value could have come from `generate_token`.
/// Anything else is treated as if no token had been sent.
pub fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_BYTES * 2 && token.bytes().all(|b| b.is_ascii_hexdigit())
}
