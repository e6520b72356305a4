// Backend HTTP client
//
// Wraps `reqwest::Client` with base-URL construction, bearer-token
// injection, JSON-valued query encoding, and envelope unwrapping. The
// client knows nothing about entities; callers hand it a relative path.

use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::auth::AuthSession;
use crate::envelope::{Envelope, ErrorBody};
use crate::error::Error;
use crate::query::{QueryParams, encode_query};
use crate::transport::TransportConfig;

/// HTTP verbs used by the backend contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

impl HttpMethod {
    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
        }
    }
}

/// Raw HTTP client for the `{service}/{entity}` backend.
///
/// Every call returns the unwrapped envelope `data`; the envelope is
/// stripped before the caller sees it. The session is passed per call so
/// the client itself holds no auth state.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client for `http://{host}:{port}/v1/`.
    pub fn new(host: &str, port: u16, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let base_url = Self::base_url_for(host, port)?;
        Ok(Self { http, base_url })
    }

    /// Wrap a pre-built `reqwest::Client` and base URL.
    ///
    /// A trailing slash is added to `base_url` if missing so relative
    /// paths join underneath it.
    pub fn with_client(http: reqwest::Client, mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { http, base_url }
    }

    /// The `/v1/` base for a configured host and port.
    pub fn base_url_for(host: &str, port: u16) -> Result<Url, Error> {
        Ok(Url::parse(&format!("http://{host}:{port}/v1/"))?)
    }

    /// The backend base URL (always ends in `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join a relative path (e.g. `"users/user/list"`) onto the base URL.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    // ── Request pipeline ─────────────────────────────────────────────

    /// Issue one backend call and unwrap its envelope.
    ///
    /// `Ok(None)` means the backend answered successfully without a
    /// `data` payload.
    pub async fn request<T, B>(
        &self,
        method: HttpMethod,
        path: &str,
        query: &QueryParams,
        body: Option<&B>,
        session: Option<&AuthSession>,
    ) -> Result<Option<T>, Error>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        let pairs = encode_query(query)?;
        debug!(method = ?method, %url, params = ?pairs, "backend request");

        let mut builder = self.http.request(method.as_reqwest(), url);
        if !pairs.is_empty() {
            builder = builder.query(&pairs);
        }
        if let Some(session) = session.filter(|s| s.is_valid()) {
            builder = builder.header(AUTHORIZATION, session.bearer_header()?);
        }
        if let Some(body) = body {
            let bytes = serde_json::to_vec(body).map_err(Error::BodyEncoding)?;
            builder = builder
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(bytes);
        }

        let resp = builder.send().await?;
        Self::parse_envelope(resp).await
    }

    /// `GET` with query parameters.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &QueryParams,
        session: Option<&AuthSession>,
    ) -> Result<Option<T>, Error> {
        self.request::<T, ()>(HttpMethod::Get, path, query, None, session)
            .await
    }

    /// `POST` with a JSON body.
    pub async fn post<T, B>(
        &self,
        path: &str,
        body: &B,
        session: Option<&AuthSession>,
    ) -> Result<Option<T>, Error>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(HttpMethod::Post, path, &QueryParams::new(), Some(body), session)
            .await
    }

    /// `PUT` with a JSON body.
    pub async fn put<T, B>(
        &self,
        path: &str,
        body: &B,
        session: Option<&AuthSession>,
    ) -> Result<Option<T>, Error>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(HttpMethod::Put, path, &QueryParams::new(), Some(body), session)
            .await
    }

    // ── Response handling ────────────────────────────────────────────

    /// Map status + body onto the failure taxonomy, or strip the envelope.
    async fn parse_envelope<T: DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<Option<T>, Error> {
        let status = resp.status();
        let body = resp.text().await?;
        trace!(status = status.as_u16(), body = %preview(&body), "backend response");

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .filter(|m| !m.is_empty());
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                message,
            });
        }

        let deserialization = |e: serde_json::Error| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        };

        // `error` wins over whatever shape `data` has
        let envelope: Envelope<serde_json::Value> =
            serde_json::from_str(&body).map_err(deserialization)?;
        envelope
            .into_result()?
            .map(serde_json::from_value)
            .transpose()
            .map_err(deserialization)
    }
}

fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_has_v1_prefix() {
        let url = ApiClient::base_url_for("localhost", 8080).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/v1/");
    }

    #[test]
    fn paths_join_under_base() {
        let client = ApiClient::new("example.test", 9000, &TransportConfig::default()).unwrap();
        assert_eq!(
            client.url("users/user/list").unwrap().as_str(),
            "http://example.test:9000/v1/users/user/list"
        );
        assert_eq!(
            client.url("/users/user").unwrap().as_str(),
            "http://example.test:9000/v1/users/user"
        );
    }

    #[test]
    fn with_client_adds_trailing_slash() {
        let client = ApiClient::with_client(
            reqwest::Client::new(),
            Url::parse("http://127.0.0.1:1234/v1").unwrap(),
        );
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:1234/v1/");
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "é".repeat(150);
        assert!(preview(&body).len() <= 200);
    }
}
