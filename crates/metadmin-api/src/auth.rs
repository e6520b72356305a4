// Bearer-token authentication
//
// The backend issues an opaque token from `users/authenticate`; every
// later request carries it as `Authorization: Bearer {token}`.

use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{ApiClient, HttpMethod};
use crate::error::Error;
use crate::query::QueryParams;

/// Path of the login endpoint, relative to the `/v1/` base.
pub const AUTHENTICATE_PATH: &str = "users/authenticate";

/// An authenticated session: just the bearer token.
///
/// The token is kept behind [`SecretString`] so it never shows up in
/// `Debug` output or logs.
#[derive(Debug, Clone)]
pub struct AuthSession {
    token: SecretString,
}

impl AuthSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
        }
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }

    /// A session only counts if its token is non-empty.
    pub fn is_valid(&self) -> bool {
        !self.token.expose_secret().is_empty()
    }

    /// `Authorization` header value, marked sensitive.
    pub fn bearer_header(&self) -> Result<HeaderValue, Error> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.token.expose_secret()))
            .map_err(|e| Error::Authentication {
                message: format!("invalid token header value: {e}"),
            })?;
        value.set_sensitive(true);
        Ok(value)
    }

    /// Token equality without exposing either token outside this call.
    pub fn same_token(&self, other: &Self) -> bool {
        self.token.expose_secret() == other.token.expose_secret()
    }
}

/// Body of `POST users/authenticate`.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticateRequest {
    pub email: String,
    pub password: String,
}

/// Envelope payload returned by `POST users/authenticate`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticateResponse {
    pub token: String,
}

impl ApiClient {
    /// Exchange email + password for a session.
    ///
    /// Unlike the entity operations this is a one-shot call that returns
    /// the failure directly.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthSession, Error> {
        debug!(email, "authenticating");

        let body = AuthenticateRequest {
            email: email.to_owned(),
            password: password.expose_secret().to_owned(),
        };

        let resp: Option<AuthenticateResponse> = self
            .request(
                HttpMethod::Post,
                AUTHENTICATE_PATH,
                &QueryParams::new(),
                Some(&body),
                None,
            )
            .await?;

        let session = resp
            .map(|r| AuthSession::new(r.token))
            .filter(AuthSession::is_valid)
            .ok_or_else(|| Error::Authentication {
                message: "authenticate response carried no token".into(),
            })?;

        debug!("authentication successful");
        Ok(session)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn bearer_header_is_sensitive() {
        let session = AuthSession::new("t1");
        let header = session.bearer_header().unwrap();
        assert_eq!(header.to_str().unwrap(), "Bearer t1");
        assert!(header.is_sensitive());
    }

    #[test]
    fn empty_token_is_not_valid() {
        assert!(!AuthSession::new("").is_valid());
        assert!(AuthSession::new("t").is_valid());
    }

    #[test]
    fn debug_does_not_leak_token() {
        let session = AuthSession::new("super-secret");
        assert!(!format!("{session:?}").contains("super-secret"));
    }

    #[test]
    fn same_token_compares_values() {
        assert!(AuthSession::new("a").same_token(&AuthSession::new("a")));
        assert!(!AuthSession::new("a").same_token(&AuthSession::new("b")));
    }
}
