// metadmin-api: async client for the generic `{service}/{entity}` REST contract

pub mod auth;
pub mod client;
pub mod envelope;
pub mod error;
pub mod query;
pub mod transport;

pub use auth::{AUTHENTICATE_PATH, AuthSession, AuthenticateRequest, AuthenticateResponse};
pub use client::{ApiClient, HttpMethod};
pub use envelope::Envelope;
pub use error::Error;
pub use query::{QueryParams, encode_query};
pub use transport::TransportConfig;
