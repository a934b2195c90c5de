use std::{
    fmt::{Debug, Formatter},
    str::FromStr,
};
use thiserror::Error;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Bearer token must not be blank")]
pub struct BlankBearerTokenError;

/// Bearer token issued by the backend on sign in.
///
/// The client treats it as an opaque secret and sends it back verbatim.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: String) -> Result<Self, BlankBearerTokenError> {
        if token.trim().is_empty() {
            return Err(BlankBearerTokenError);
        }

        Ok(Self(token))
    }

    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl FromStr for BearerToken {
    type Err = BlankBearerTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_owned())
    }
}

impl Debug for BearerToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("BearerToken").field(&"[redacted]").finish()
    }
}
