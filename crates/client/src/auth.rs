//! Bearer token sources.
//!
//! Obtaining and refreshing OAuth tokens is left to the caller; the client
//! only asks an [`AuthProvider`] for the current token before each request.

use std::future::Future;
use std::pin::Pin;

/// Environment variable read by [`StaticToken::from_env`].
pub const ACCESS_TOKEN_ENV: &str = "GPHOTOS_ACCESS_TOKEN";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("no access token configured")]
    MissingToken,

    #[error("token provider failed: {0}")]
    Provider(String),
}

/// Supplies the bearer token attached to every request.
pub trait AuthProvider: Send + Sync {
    fn access_token<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<String, AuthError>> + Send + 'a>>;
}

/// A fixed, already-issued access token.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Result<Self, AuthError> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        Ok(Self(token))
    }

    /// Reads the token from `GPHOTOS_ACCESS_TOKEN`.
    pub fn from_env() -> Result<Self, AuthError> {
        match std::env::var(ACCESS_TOKEN_ENV) {
            Ok(token) => Self::new(token),
            Err(_) => Err(AuthError::MissingToken),
        }
    }
}

// Keep the token out of debug output.
impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticToken(..)")
    }
}

impl AuthProvider for StaticToken {
    fn access_token<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<String, AuthError>> + Send + 'a>> {
        Box::pin(async move { Ok(self.0.clone()) })
    }
}
