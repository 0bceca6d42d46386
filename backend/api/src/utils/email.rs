use std::sync::LazyLock;

use regex::Regex;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+(\.[a-zA-Z0-9-]+)+$").expect("Email regex invalid")
});

/// An email address which has passed syntax validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl TryFrom<&str> for EmailAddress {
    type Error = ();
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::try_from(s.to_owned())
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = ();
    fn try_from(s: String) -> Result<Self, Self::Error> {
        if EMAIL_REGEX.is_match(&s) {
            Ok(Self(s))
        } else {
            Err(())
        }
    }
}

impl From<EmailAddress> for String {
    fn from(addr: EmailAddress) -> Self {
        let EmailAddress(s) = addr;
        s
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::EmailAddress;

    #[test]
    fn accepts_ordinary_addresses() {
        assert!(EmailAddress::try_from("mario.rossi+shop@example.it").is_ok());
        assert!(EmailAddress::try_from("a_b@sub.domain.com").is_ok());
    }

    #[test]
    fn rejects_malformed_addresses() {
        let candidates = [
            "",
            "plainaddress",
            "@example.com",
            "mario@",
            "mario@localhost",
            "a b@c.de",
        ];
        for candidate in candidates {
            assert!(
                EmailAddress::try_from(candidate).is_err(),
                "{candidate:?} should be rejected"
            );
        }
    }
}
