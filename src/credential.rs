//! Email-shaped credential required by the lookup service.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::UnpaywallError;

/// HTML5 "valid e-mail address" grammar.
#[allow(clippy::expect_used)]
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email regex is valid") // Static pattern, safe to panic
});

/// A validated email address sent with every lookup for attribution.
///
/// `Debug` and `Display` only show the redacted form, so the raw address never
/// ends up in logs or error messages by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Validates `value` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns [`UnpaywallError::InvalidCredential`] when `value` is not a
    /// valid email address. No trimming is applied.
    pub fn parse(value: impl Into<String>) -> Result<Self, UnpaywallError> {
        let value = value.into();
        if EMAIL_PATTERN.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(UnpaywallError::invalid_credential(value))
        }
    }

    /// Returns the raw email address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the address with all but the first character of the local part hidden.
    #[must_use]
    pub fn redacted(&self) -> String {
        match self.0.split_once('@') {
            Some((local, domain)) => {
                let first = local.chars().next().map(String::from).unwrap_or_default();
                format!("{first}***@{domain}")
            }
            None => "***".to_string(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.redacted()).finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl std::str::FromStr for Credential {
    type Err = UnpaywallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
